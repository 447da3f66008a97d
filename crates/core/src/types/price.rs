//! Price parsing and money formatting.
//!
//! Catalog prices are authored as localized display strings such as
//! `"45 000 ₴"`. [`normalize_price`] is the single place where such a string
//! becomes a number. All amounts are whole hryvnia; derived amounts (tax,
//! totals) use [`Decimal`] so that `480 × 0.10` is exactly `48.0`.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Extract the numeric value of a localized display price.
///
/// Every character that is not an ASCII digit is dropped and the remainder
/// is parsed as an integer. An empty or out-of-range result yields `0`.
///
/// ```
/// use gallery_core::normalize_price;
///
/// assert_eq!(normalize_price("45 000 ₴"), 45_000);
/// assert_eq!(normalize_price("61 500 ₴"), 61_500);
/// assert_eq!(normalize_price("price on request"), 0);
/// ```
#[must_use]
pub fn normalize_price(display: &str) -> u64 {
    let digits: String = display.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// ISO 4217 currency codes accepted by the storefront.
///
/// The gallery prices everything in hryvnia; there is no conversion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    UAH,
}

impl CurrencyCode {
    /// Symbol appended to formatted amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::UAH => "₴",
        }
    }
}

/// An amount of money with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create an amount in the default currency.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            currency_code: CurrencyCode::UAH,
        }
    }

    /// Format for display, e.g. `"45 000 ₴"` or `"4 500.50 ₴"`.
    ///
    /// Thousands are grouped with a space; a fractional part is shown with
    /// two digits only when it is non-zero.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = rounded.abs();
        let whole = abs.trunc();
        let cents = ((abs - whole) * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .unwrap_or(0);

        let grouped = group_thousands(&whole.to_string());
        let symbol = self.currency_code.symbol();
        if cents == 0 {
            format!("{sign}{grouped} {symbol}")
        } else {
            format!("{sign}{grouped}.{cents:02} {symbol}")
        }
    }
}

impl From<u64> for Money {
    fn from(amount: u64) -> Self {
        Self::new(Decimal::from(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_price_strips_separators_and_symbol() {
        assert_eq!(normalize_price("45 000 ₴"), 45_000);
        assert_eq!(normalize_price("52\u{a0}000\u{a0}₴"), 52_000);
        assert_eq!(normalize_price("$1,250.00"), 125_000);
    }

    #[test]
    fn test_normalize_price_defaults_to_zero() {
        assert_eq!(normalize_price(""), 0);
        assert_eq!(normalize_price("₴"), 0);
        assert_eq!(normalize_price("99999999999999999999999"), 0);
    }

    #[test]
    fn test_money_display_whole() {
        assert_eq!(Money::from(45_000).display(), "45 000 ₴");
        assert_eq!(Money::from(500).display(), "500 ₴");
        assert_eq!(Money::from(0).display(), "0 ₴");
        assert_eq!(Money::from(1_234_567).display(), "1 234 567 ₴");
    }

    #[test]
    fn test_money_display_fraction() {
        assert_eq!(Money::new(Decimal::new(5010, 2)).display(), "50.10 ₴");
        assert_eq!(Money::new(Decimal::new(45_005, 1)).display(), "4 500.50 ₴");
    }

    #[test]
    fn test_money_display_trait() {
        assert_eq!(format!("{}", Money::from(90_000)), "90 000 ₴");
    }
}
