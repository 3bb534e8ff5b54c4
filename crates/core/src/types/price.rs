//! Type-safe price representation using decimal arithmetic.
//!
//! All storefront amounts are plain `Decimal` values in the currency's
//! standard unit (euros, not cents). [`Price`] pairs an amount with its
//! currency for display; [`vat`] and [`to_minor_units`] hold the two pieces of
//! money arithmetic shared by the cart, the checkout and the payment hand-off.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat VAT rate applied to every cart subtotal (21%).
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// VAT due on a subtotal. Never overflows, since the rate is below one.
///
/// ```
/// use eazyy_core::vat;
/// use rust_decimal::Decimal;
///
/// assert_eq!(vat(Decimal::from(32)), Decimal::new(672, 2));
/// ```
#[must_use]
pub fn vat(subtotal: Decimal) -> Decimal {
    subtotal * VAT_RATE
}

/// Convert an amount to minor units (cents), rounding half away from zero.
///
/// Returns `None` if the result does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the storefront's default currency.
    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EUR)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{}{rounded:.2}", self.currency_code.symbol())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
        }
    }

    /// Lower-case ISO code, as payment processors expect it.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EUR => "eur",
            Self::USD => "usd",
            Self::GBP => "gbp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_rate_is_twenty_one_percent() {
        assert_eq!(VAT_RATE, Decimal::new(21, 2));
    }

    #[test]
    fn test_vat_on_shirt_subtotal() {
        assert_eq!(vat(Decimal::from(5)), Decimal::new(105, 2));
    }

    #[test]
    fn test_to_minor_units_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(3872, 2)), Some(3872));
        assert_eq!(to_minor_units(Decimal::new(10_005, 3)), Some(1001));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_to_minor_units_out_of_range_is_none() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
        assert_eq!(to_minor_units(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_display_formats_two_decimals() {
        assert_eq!(Price::eur(Decimal::new(605, 2)).to_string(), "€6.05");
        assert_eq!(Price::eur(Decimal::from(15)).to_string(), "€15.00");
        assert_eq!(
            Price::new(Decimal::new(12_345, 3), CurrencyCode::USD).to_string(),
            "$12.35"
        );
    }

    #[test]
    fn test_default_currency_is_euro() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::EUR);
        assert_eq!(CurrencyCode::EUR.code(), "eur");
    }
}
