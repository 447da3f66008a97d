//! Checkout state machine.
//!
//! A checkout is either closed or on one of three steps:
//!
//! ```text
//! closed --open--> Details --submit--> Review --confirm--> Success
//!                     ^                  |                    |
//!                     +------back--------+             auto-close fires
//!                                                             |
//! any --close--> closed <-------------------------------------+
//! ```
//!
//! Every (state, action) pair outside [`next_state`] is rejected with
//! [`CheckoutError::InvalidTransition`]. The session never owns the cart; it
//! reads line items from the caller and clears the cart only when an order
//! completes.

mod timer;

pub use timer::{AutoCloseTimer, DEFAULT_AUTO_CLOSE_DELAY};

use core::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use gallery_core::{CartLineItem, CheckoutForm, CheckoutStep, Money, OrderSummary, PaymentMethod};

use crate::cart::CartEngine;
use crate::storage::KeyValueStore;

/// Something the customer (or the auto-close timer) does to the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutAction {
    Open,
    SubmitDetails,
    Back,
    Confirm,
    Close,
    /// The success-step timer fired.
    Complete,
}

impl fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::SubmitDetails => "submit details",
            Self::Back => "go back",
            Self::Confirm => "confirm",
            Self::Close => "close",
            Self::Complete => "complete",
        })
    }
}

/// Required fields that were left blank.
///
/// Field names use the same camelCase spelling as the form's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("missing required fields: {}", .fields.join(", "))]
pub struct ValidationErrors {
    pub fields: Vec<&'static str>,
}

/// Errors from checkout transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The action is not allowed from the current state.
    #[error("cannot {action} checkout while {}", state_name(.step))]
    InvalidTransition {
        /// Current step, `None` when closed.
        step: Option<CheckoutStep>,
        action: CheckoutAction,
    },

    /// Checkout needs at least one line item.
    #[error("cart is empty")]
    EmptyCart,

    /// The submitted form is incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[allow(clippy::ref_option)]
fn state_name(step: &Option<CheckoutStep>) -> String {
    step.map_or_else(|| "closed".to_owned(), |step| format!("on {step}"))
}

/// The transition table. `None` in and out means "closed".
///
/// Returns `None` when the action is not allowed from `current`.
#[must_use]
pub const fn next_state(
    current: Option<CheckoutStep>,
    action: CheckoutAction,
) -> Option<Option<CheckoutStep>> {
    use CheckoutAction as A;
    use CheckoutStep as S;

    match (current, action) {
        (None, A::Open) => Some(Some(S::Details)),
        (Some(S::Details), A::SubmitDetails) => Some(Some(S::Review)),
        (Some(S::Review), A::Back) => Some(Some(S::Details)),
        (Some(S::Review), A::Confirm) => Some(Some(S::Success)),
        (Some(S::Success), A::Complete) | (_, A::Close) => Some(None),
        _ => None,
    }
}

/// Check every required field, trimmed.
///
/// # Errors
///
/// Returns [`ValidationErrors`] naming each blank field in form order.
pub fn validate(form: &CheckoutForm) -> Result<(), ValidationErrors> {
    let mut required = vec![
        ("fullName", &form.full_name),
        ("email", &form.email),
        ("phone", &form.phone),
        ("address", &form.address),
        ("city", &form.city),
        ("zipCode", &form.zip_code),
    ];
    if form.payment_method == PaymentMethod::Card {
        required.extend([
            ("cardNumber", &form.card_number),
            ("cardExpiry", &form.card_expiry),
            ("cardCVV", &form.card_cvv),
        ]);
    }

    let fields: Vec<&'static str> = required
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { fields })
    }
}

fn prefill_blank(field: &mut String, value: Option<&str>) {
    match value {
        Some(value) if field.trim().is_empty() => value.clone_into(field),
        _ => {}
    }
}

/// Contact details used to prefill an empty form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPrefill {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// What was ordered, frozen when the customer confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    pub items: Vec<CartLineItem>,
    pub summary: OrderSummary,
    pub form: CheckoutForm,
}

/// Serializable view of the checkout for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub open: bool,
    pub step: Option<CheckoutStep>,
    pub form: CheckoutForm,
    pub items: Vec<CartLineItem>,
    pub summary: OrderSummary,
    pub free_shipping_remaining: Option<Decimal>,
    pub payment_summary: String,
    pub display: SummaryDisplay,
}

/// Order totals formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryDisplay {
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<&OrderSummary> for SummaryDisplay {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            subtotal: Money::new(summary.subtotal).display(),
            shipping: Money::new(summary.shipping).display(),
            tax: Money::new(summary.tax).display(),
            total: Money::new(summary.total).display(),
        }
    }
}

/// One visitor's checkout.
#[derive(Debug, Default)]
pub struct CheckoutSession {
    step: Option<CheckoutStep>,
    form: CheckoutForm,
    confirmation: Option<OrderConfirmation>,
    timer: Option<AutoCloseTimer>,
    ticket: u64,
}

impl CheckoutSession {
    /// A closed checkout with a blank form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step, `None` when closed.
    #[must_use]
    pub const fn step(&self) -> Option<CheckoutStep> {
        self.step
    }

    /// Returns `true` unless the checkout is closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.step.is_some()
    }

    /// The form as last submitted or prefilled.
    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// The placed order while on the success step.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    fn apply(&mut self, action: CheckoutAction) -> Result<Option<CheckoutStep>, CheckoutError> {
        let next = next_state(self.step, action).ok_or(CheckoutError::InvalidTransition {
            step: self.step,
            action,
        })?;
        Ok(next)
    }

    /// Open the checkout on the details step.
    ///
    /// Blank name and email fields are filled from `prefill`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when `items` is empty, or
    /// [`CheckoutError::InvalidTransition`] when already open.
    pub fn open(
        &mut self,
        items: &[CartLineItem],
        prefill: &ContactPrefill,
    ) -> Result<(), CheckoutError> {
        let next = self.apply(CheckoutAction::Open)?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        prefill_blank(&mut self.form.full_name, prefill.full_name.as_deref());
        prefill_blank(&mut self.form.email, prefill.email.as_deref());

        self.step = next;
        Ok(())
    }

    /// Submit the details form and move to review.
    ///
    /// The form is stored even when invalid so the customer keeps their
    /// input; the step only advances when validation passes.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] listing blank required fields,
    /// [`CheckoutError::EmptyCart`] when the cart was emptied meanwhile, or
    /// [`CheckoutError::InvalidTransition`] when not on the details step.
    pub fn submit_details(
        &mut self,
        form: CheckoutForm,
        items: &[CartLineItem],
    ) -> Result<(), CheckoutError> {
        let next = self.apply(CheckoutAction::SubmitDetails)?;
        let result = validate(&form);
        self.form = form;
        result?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.step = next;
        Ok(())
    }

    /// Return from review to the details form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] when not on review.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.step = self.apply(CheckoutAction::Back)?;
        Ok(())
    }

    /// Place the order and return the ticket for its auto-close.
    ///
    /// The cart and form are frozen into an [`OrderConfirmation`]. The cart
    /// itself is left untouched until the order completes.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when the cart was emptied during
    /// review, or [`CheckoutError::InvalidTransition`] when not on review.
    pub fn confirm(&mut self, items: &[CartLineItem]) -> Result<u64, CheckoutError> {
        let next = self.apply(CheckoutAction::Confirm)?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.confirmation = Some(OrderConfirmation {
            items: items.to_vec(),
            summary: OrderSummary::from_items(items),
            form: self.form.clone(),
        });
        self.ticket = self.ticket.wrapping_add(1);
        self.step = next;
        Ok(self.ticket)
    }

    /// Attach the auto-close timer for the current success step.
    ///
    /// A previously attached timer is cancelled.
    pub fn arm(&mut self, timer: AutoCloseTimer) {
        self.timer = Some(timer);
    }

    /// Close the checkout from any state.
    ///
    /// The form is discarded and a pending auto-close is cancelled. The cart
    /// is not touched, even after a confirmed order.
    pub fn close(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.ticket = self.ticket.wrapping_add(1);
        self.reset();
    }

    /// Finish a confirmed order: clear the cart and close.
    ///
    /// Does nothing and returns `false` if `ticket` is stale, i.e. the
    /// checkout was closed or re-confirmed since the timer was armed.
    pub fn complete<S: KeyValueStore>(&mut self, ticket: u64, cart: &mut CartEngine<S>) -> bool {
        if ticket != self.ticket || self.apply(CheckoutAction::Complete).is_err() {
            return false;
        }
        if let Some(timer) = self.timer.take() {
            timer.detach();
        }
        cart.clear();
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.step = None;
        self.form = CheckoutForm::default();
        self.confirmation = None;
    }

    /// Render the checkout against the live cart.
    ///
    /// Details and review price the live cart so edits made meanwhile show
    /// up; success shows the confirmed order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when open on details or review
    /// with an empty live cart.
    pub fn view(&self, live: &[CartLineItem]) -> Result<CheckoutView, CheckoutError> {
        let (items, form) = match (self.step, &self.confirmation) {
            (Some(CheckoutStep::Success), Some(order)) => (order.items.clone(), order.form.clone()),
            (Some(_), _) if live.is_empty() => return Err(CheckoutError::EmptyCart),
            _ => (live.to_vec(), self.form.clone()),
        };

        let summary = OrderSummary::from_items(&items);
        Ok(CheckoutView {
            open: self.is_open(),
            step: self.step,
            payment_summary: form.payment_summary(),
            free_shipping_remaining: summary.free_shipping_remaining(),
            display: SummaryDisplay::from(&summary),
            form,
            items,
            summary,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gallery_core::{ArtworkId, ItemKey, NewLineItem};

    use super::*;
    use crate::storage::MemoryStore;

    fn cart_with(prices: &[(i32, u32, u64)]) -> CartEngine<MemoryStore> {
        let mut cart = CartEngine::restore(MemoryStore::new());
        for &(id, quantity, price) in prices {
            cart.add_item(NewLineItem {
                id: ItemKey::Artwork(ArtworkId::new(id)),
                title: format!("artwork{id}"),
                artist: format!("artist{id}"),
                image: String::new(),
                price: price.to_string(),
                price_value: Some(price),
                quantity,
            });
        }
        cart
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            full_name: "Olena Kovalenko".to_owned(),
            email: "olena@example.com".to_owned(),
            phone: "+380501234567".to_owned(),
            address: "Khreshchatyk 1".to_owned(),
            city: "Kyiv".to_owned(),
            zip_code: "01001".to_owned(),
            card_number: "4111111111111234".to_owned(),
            card_expiry: "12/28".to_owned(),
            card_cvv: "123".to_owned(),
            ..CheckoutForm::default()
        }
    }

    fn at_review(cart: &CartEngine<MemoryStore>) -> CheckoutSession {
        let mut session = CheckoutSession::new();
        session.open(cart.items(), &ContactPrefill::default()).unwrap();
        session.submit_details(valid_form(), cart.items()).unwrap();
        session
    }

    #[test]
    fn test_transition_table() {
        use CheckoutAction as A;
        use CheckoutStep as S;

        assert_eq!(next_state(None, A::Open), Some(Some(S::Details)));
        assert_eq!(next_state(Some(S::Details), A::SubmitDetails), Some(Some(S::Review)));
        assert_eq!(next_state(Some(S::Review), A::Back), Some(Some(S::Details)));
        assert_eq!(next_state(Some(S::Review), A::Confirm), Some(Some(S::Success)));
        assert_eq!(next_state(Some(S::Success), A::Complete), Some(None));
        for step in [None, Some(S::Details), Some(S::Review), Some(S::Success)] {
            assert_eq!(next_state(step, A::Close), Some(None));
        }

        assert_eq!(next_state(Some(S::Details), A::Confirm), None);
        assert_eq!(next_state(Some(S::Details), A::Back), None);
        assert_eq!(next_state(Some(S::Success), A::Back), None);
        assert_eq!(next_state(Some(S::Review), A::Complete), None);
        assert_eq!(next_state(None, A::SubmitDetails), None);
        assert_eq!(next_state(Some(S::Details), A::Open), None);
    }

    #[test]
    fn test_open_rejects_empty_cart() {
        let cart = cart_with(&[]);
        let mut session = CheckoutSession::new();
        assert_eq!(
            session.open(cart.items(), &ContactPrefill::default()),
            Err(CheckoutError::EmptyCart)
        );
        assert!(!session.is_open());
    }

    #[test]
    fn test_open_prefills_blank_contact_fields() {
        let cart = cart_with(&[(1, 1, 100)]);
        let mut session = CheckoutSession::new();
        let prefill = ContactPrefill {
            full_name: Some("Taras".to_owned()),
            email: Some("taras@example.com".to_owned()),
        };
        session.open(cart.items(), &prefill).unwrap();

        assert_eq!(session.step(), Some(CheckoutStep::Details));
        assert_eq!(session.form().full_name, "Taras");
        assert_eq!(session.form().email, "taras@example.com");
    }

    #[test]
    fn test_validation_lists_missing_fields() {
        let form = CheckoutForm {
            full_name: "  ".to_owned(),
            ..valid_form()
        };
        assert_eq!(
            validate(&form),
            Err(ValidationErrors {
                fields: vec!["fullName"]
            })
        );

        let blank = CheckoutForm::default();
        let err = validate(&blank).unwrap_err();
        assert_eq!(
            err.fields,
            [
                "fullName", "email", "phone", "address", "city", "zipCode", "cardNumber",
                "cardExpiry", "cardCVV"
            ]
        );
    }

    #[test]
    fn test_cash_payment_skips_card_fields() {
        let form = CheckoutForm {
            payment_method: PaymentMethod::Cash,
            card_number: String::new(),
            card_expiry: String::new(),
            card_cvv: String::new(),
            ..valid_form()
        };
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn test_invalid_submit_stays_on_details_and_keeps_input() {
        let cart = cart_with(&[(1, 1, 100)]);
        let mut session = CheckoutSession::new();
        session.open(cart.items(), &ContactPrefill::default()).unwrap();

        let form = CheckoutForm {
            city: String::new(),
            ..valid_form()
        };
        let err = session.submit_details(form, cart.items()).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(ref v) if v.fields == ["city"]));
        assert_eq!(session.step(), Some(CheckoutStep::Details));
        assert_eq!(session.form().full_name, "Olena Kovalenko");
    }

    #[test]
    fn test_back_then_resubmit() {
        let cart = cart_with(&[(1, 1, 100)]);
        let mut session = at_review(&cart);
        session.back().unwrap();
        assert_eq!(session.step(), Some(CheckoutStep::Details));
        assert_eq!(session.form().city, "Kyiv");

        session.submit_details(valid_form(), cart.items()).unwrap();
        assert_eq!(session.step(), Some(CheckoutStep::Review));
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut session = CheckoutSession::new();
        assert_eq!(
            session.back(),
            Err(CheckoutError::InvalidTransition {
                step: None,
                action: CheckoutAction::Back
            })
        );
        assert!(matches!(
            session.confirm(&[]),
            Err(CheckoutError::InvalidTransition { .. })
        ));

        let cart = cart_with(&[(1, 1, 100)]);
        session.open(cart.items(), &ContactPrefill::default()).unwrap();
        let err = session.confirm(cart.items()).unwrap_err();
        assert_eq!(err.to_string(), "cannot confirm checkout while on details");
    }

    #[test]
    fn test_confirm_locks_order_and_keeps_cart() {
        let mut cart = cart_with(&[(1, 2, 200), (2, 1, 80)]);
        let mut session = at_review(&cart);

        let ticket = session.confirm(cart.items()).unwrap();
        assert_eq!(session.step(), Some(CheckoutStep::Success));
        assert_eq!(cart.item_count(), 3);

        // Edits after confirmation do not change the placed order.
        cart.clear();
        let view = session.view(cart.items()).unwrap();
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.summary.subtotal, Decimal::from(480));
        assert_eq!(view.display.total, "553 ₴");

        assert!(session.complete(ticket, &mut cart));
        assert!(!session.is_open());
    }

    #[test]
    fn test_complete_clears_cart_and_resets_form() {
        let mut cart = cart_with(&[(1, 1, 100)]);
        let mut session = at_review(&cart);
        let ticket = session.confirm(cart.items()).unwrap();

        assert!(session.complete(ticket, &mut cart));
        assert!(cart.is_empty());
        assert_eq!(session.step(), None);
        assert_eq!(session.form(), &CheckoutForm::default());
        assert!(session.confirmation().is_none());
    }

    #[test]
    fn test_close_after_success_cancels_completion() {
        let mut cart = cart_with(&[(1, 1, 100)]);
        let mut session = at_review(&cart);
        let ticket = session.confirm(cart.items()).unwrap();

        session.close();
        assert!(!session.complete(ticket, &mut cart));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_stale_ticket_ignored_after_reopen() {
        let mut cart = cart_with(&[(1, 1, 100)]);
        let mut session = at_review(&cart);
        let stale = session.confirm(cart.items()).unwrap();
        session.close();

        session.open(cart.items(), &ContactPrefill::default()).unwrap();
        session.submit_details(valid_form(), cart.items()).unwrap();
        let fresh = session.confirm(cart.items()).unwrap();

        assert!(!session.complete(stale, &mut cart));
        assert_eq!(session.step(), Some(CheckoutStep::Success));
        assert!(session.complete(fresh, &mut cart));
    }

    #[test]
    fn test_view_uses_live_cart_before_success() {
        let mut cart = cart_with(&[(1, 1, 100)]);
        let session = at_review(&cart);
        cart.add_item(NewLineItem {
            id: ItemKey::Artwork(ArtworkId::new(2)),
            title: String::new(),
            artist: String::new(),
            image: String::new(),
            price: "450".to_owned(),
            price_value: None,
            quantity: 1,
        });

        let view = session.view(cart.items()).unwrap();
        assert_eq!(view.summary.subtotal, Decimal::from(550));
        assert_eq!(view.summary.shipping, Decimal::ZERO);
        assert_eq!(view.free_shipping_remaining, None);
        assert_eq!(view.payment_summary, "Card •••• 1234");
    }

    #[test]
    fn test_view_guard_on_empty_live_cart() {
        let mut cart = cart_with(&[(1, 1, 100)]);
        let session = at_review(&cart);
        cart.clear();
        assert!(matches!(
            session.view(cart.items()),
            Err(CheckoutError::EmptyCart)
        ));

        let closed = CheckoutSession::new();
        let view = closed.view(cart.items()).unwrap();
        assert!(!view.open);
        assert_eq!(view.free_shipping_remaining, Some(Decimal::from(500)));
    }

    #[test]
    fn test_pricing_scenarios() {
        let cart = cart_with(&[(1, 1, 480)]);
        let view = at_review(&cart).view(cart.items()).unwrap();
        assert_eq!(view.summary.shipping, Decimal::from(25));
        assert_eq!(view.summary.tax, Decimal::new(480, 1));
        assert_eq!(view.summary.total, Decimal::new(5530, 1));
        assert_eq!(view.free_shipping_remaining, Some(Decimal::from(20)));

        let cart = cart_with(&[(1, 1, 501)]);
        let view = at_review(&cart).view(cart.items()).unwrap();
        assert_eq!(view.summary.shipping, Decimal::ZERO);
        assert_eq!(view.summary.tax, Decimal::new(501, 1));
        assert_eq!(view.summary.total, Decimal::new(5511, 1));
        assert_eq!(view.display.total, "551.10 ₴");
    }
}
