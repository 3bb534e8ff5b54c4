//! Derived cart aggregates.

use eazyy_core::vat;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::model::CartState;

/// Item count and money totals, recomputed from the lines on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_items: u64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Totals for `state`.
    ///
    /// Carts built through [`CartState`]'s mutations always fit; anything
    /// else saturates at `Decimal::MAX` instead of overflowing.
    #[must_use]
    pub fn from_state(state: &CartState) -> Self {
        Self::checked(state).unwrap_or_else(|| {
            warn!("Cart totals overflow, saturating");
            Self {
                total_items: item_count(state),
                subtotal: Decimal::MAX,
                tax: vat(Decimal::MAX),
                total: Decimal::MAX,
            }
        })
    }

    /// Totals for `state`, or `None` if any amount overflows.
    #[must_use]
    pub fn checked(state: &CartState) -> Option<Self> {
        let subtotal = state.checked_subtotal()?;
        let tax = vat(subtotal);

        Some(Self {
            total_items: item_count(state),
            subtotal,
            tax,
            total: subtotal.checked_add(tax)?,
        })
    }
}

fn item_count(state: &CartState) -> u64 {
    state
        .lines()
        .map(|(_, line)| u64::from(line.quantity))
        .fold(0, u64::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::model::{LineInput, ServiceInput};

    const WASH: &str = "6f1c2d3e-4a5b-4c6d-8e7f-901234567890";
    const CARPETS: &str = "0a0b0c0d-1e1f-4a2b-9c3d-4e5f6a7b8c9d";
    const TOPS: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    fn add(state: &mut CartState, service: &str, input: LineInput) {
        let (service, line) = input.validate(&ServiceInput::new(service, "x")).unwrap();
        let _ = state.add_line(service, line);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        assert_eq!(CartTotals::from_state(&CartState::new()), CartTotals::default());
    }

    #[test]
    fn test_mixed_pricing_totals() {
        let mut state = CartState::new();
        add(
            &mut state,
            WASH,
            LineInput::new(
                "11111111-2222-4333-8444-555555555555",
                TOPS,
                "Shirt",
                Some(Decimal::from(5)),
                2,
            ),
        );
        add(
            &mut state,
            CARPETS,
            LineInput::new(
                "22222222-2222-4333-8444-555555555555",
                TOPS,
                "Carpet",
                Some(Decimal::from(11)),
                1,
            )
            .custom_measure(Decimal::from(2), "m2"),
        );

        let totals = CartTotals::from_state(&state);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.subtotal, Decimal::from(32));
        assert_eq!(totals.tax, Decimal::new(672, 2));
        assert_eq!(totals.total, Decimal::new(3872, 2));
    }

    #[test]
    fn test_unpriced_line_counts_items_but_not_money() {
        let mut state = CartState::new();
        add(
            &mut state,
            WASH,
            LineInput::new("33333333-2222-4333-8444-555555555555", TOPS, "Gown", None, 2),
        );

        let totals = CartTotals::from_state(&state);
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_state_saturates() {
        let raw = serde_json::json!({
            WASH: {
                "service": { "id": WASH, "name": "Wash & Iron" },
                "items": [{
                    "id": "11111111-2222-4333-8444-555555555555",
                    "categoryId": TOPS,
                    "name": "Shirt",
                    "price": 5e28,
                    "quantity": 2
                }]
            }
        });
        let state: CartState = serde_json::from_value(raw).unwrap();

        assert_eq!(CartTotals::checked(&state), None);
        let totals = CartTotals::from_state(&state);
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total, Decimal::MAX);
    }
}
