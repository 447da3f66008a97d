//! Checkout steps, the order form, and order pricing.
//!
//! Pricing constants are currency-agnostic and fixed:
//!
//! - shipping is free when the subtotal is strictly above 500, else 25
//! - tax is a flat 10% of the subtotal

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartLineItem;

/// Subtotal above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat shipping fee charged at or below the threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Flat tax rate (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Step of the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Contact, address and payment form.
    #[default]
    Details,
    /// Read-only confirmation of the submitted form and cart.
    Review,
    /// Order placed; the checkout closes itself after a delay.
    Success,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Details => "details",
            Self::Review => "review",
            Self::Success => "success",
        })
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    /// Cash on delivery.
    Cash,
}

/// Checkout form fields.
///
/// Missing JSON fields take their defaults, so partial submissions
/// deserialize and are then rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub payment_method: PaymentMethod,
    pub card_number: String,
    pub card_expiry: String,
    #[serde(rename = "cardCVV")]
    pub card_cvv: String,
    pub notes: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            zip_code: String::new(),
            country: "Україна".to_string(),
            payment_method: PaymentMethod::Card,
            card_number: String::new(),
            card_expiry: String::new(),
            card_cvv: String::new(),
            notes: String::new(),
        }
    }
}

impl CheckoutForm {
    /// One-line payment description for the review step.
    ///
    /// Cards show only their last four characters.
    #[must_use]
    pub fn payment_summary(&self) -> String {
        match self.payment_method {
            PaymentMethod::Card => {
                let number = self.card_number.trim();
                let count = number.chars().count();
                let last_four: String = number.chars().skip(count.saturating_sub(4)).collect();
                format!("Card •••• {last_four}")
            }
            PaymentMethod::Cash => "Cash on delivery".to_string(),
        }
    }
}

/// Derived order totals.
///
/// Always computed from the current items and never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Price a set of line items.
    #[must_use]
    pub fn from_items(items: &[CartLineItem]) -> Self {
        let subtotal = items
            .iter()
            .map(|item| Decimal::from(item.line_total()))
            .sum();
        Self::from_subtotal(subtotal)
    }

    /// Apply the shipping and tax rules to a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let tax = subtotal * TAX_RATE;

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// How much more the customer must spend for free shipping, if anything.
    #[must_use]
    pub fn free_shipping_remaining(&self) -> Option<Decimal> {
        (self.subtotal < FREE_SHIPPING_THRESHOLD).then(|| FREE_SHIPPING_THRESHOLD - self.subtotal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ArtworkId, ItemKey};

    fn line(id: i32, quantity: u32, price_value: u64) -> CartLineItem {
        CartLineItem {
            id: ItemKey::Artwork(ArtworkId::new(id)),
            quantity,
            price_value,
            title: String::new(),
            artist: String::new(),
            image: String::new(),
            price: String::new(),
        }
    }

    #[test]
    fn test_summary_below_threshold_charges_shipping() {
        let summary = OrderSummary::from_subtotal(Decimal::from(480));
        assert_eq!(summary.shipping, Decimal::from(25));
        assert_eq!(summary.tax, Decimal::new(480, 1));
        assert_eq!(summary.total, Decimal::new(5530, 1));
    }

    #[test]
    fn test_summary_above_threshold_ships_free() {
        let summary = OrderSummary::from_subtotal(Decimal::from(501));
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::new(501, 1));
        assert_eq!(summary.total, Decimal::new(5511, 1));
    }

    #[test]
    fn test_summary_at_threshold_still_charges_shipping() {
        let summary = OrderSummary::from_subtotal(Decimal::from(500));
        assert_eq!(summary.shipping, SHIPPING_FEE);
        assert_eq!(summary.free_shipping_remaining(), None);
    }

    #[test]
    fn test_summary_from_items() {
        let summary = OrderSummary::from_items(&[line(1, 2, 200), line(2, 1, 80)]);
        assert_eq!(summary.subtotal, Decimal::from(480));
        assert_eq!(summary.total, Decimal::new(5530, 1));
    }

    #[test]
    fn test_summary_empty() {
        let summary = OrderSummary::from_items(&[]);
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::ZERO);
        assert_eq!(summary.total, SHIPPING_FEE);
    }

    #[test]
    fn test_free_shipping_remaining() {
        let summary = OrderSummary::from_subtotal(Decimal::from(320));
        assert_eq!(summary.free_shipping_remaining(), Some(Decimal::from(180)));
    }

    #[test]
    fn test_form_defaults() {
        let form = CheckoutForm::default();
        assert_eq!(form.country, "Україна");
        assert_eq!(form.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_form_deserializes_partial_json() {
        let form: CheckoutForm =
            serde_json::from_str(r#"{"fullName":"Olena","paymentMethod":"cash","cardCVV":"1"}"#)
                .unwrap();
        assert_eq!(form.full_name, "Olena");
        assert_eq!(form.payment_method, PaymentMethod::Cash);
        assert_eq!(form.card_cvv, "1");
        assert_eq!(form.country, "Україна");
    }

    #[test]
    fn test_payment_summary() {
        let mut form = CheckoutForm {
            card_number: "4111 1111 1111 1234".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(form.payment_summary(), "Card •••• 1234");

        form.card_number = "12".to_string();
        assert_eq!(form.payment_summary(), "Card •••• 12");

        form.payment_method = PaymentMethod::Cash;
        assert_eq!(form.payment_summary(), "Cash on delivery");
    }
}
