//! Payment processor hand-off.
//!
//! The storefront never touches card data. It asks the processor for a
//! payment intent in minor units and interprets the intent status that comes
//! back.

use eazyy_core::{CurrencyCode, Price, to_minor_units};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Payment methods offered at checkout.
pub const PAYMENT_METHOD_TYPES: [&str; 2] = ["card", "ideal"];

/// Customer name used when the order has none.
const GUEST_NAME: &str = "Guest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Amount {0} cannot be charged")]
    InvalidAmount(Decimal),
}

/// Metadata attached to a payment intent for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMetadata {
    pub order_number: String,
    pub customer_name: String,
    pub email: String,
}

/// A payment intent request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Amount in minor units (cents).
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: &'static str,
    pub description: String,
    pub metadata: PaymentMetadata,
    pub payment_method_types: [&'static str; 2],
}

impl PaymentRequest {
    /// Build an intent request for an order total.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidAmount`] for a non-positive total or one
    /// too large to express in minor units.
    pub fn for_total(
        total: Price,
        order_number: &str,
        customer_name: Option<&str>,
        email: &str,
    ) -> Result<Self, PaymentError> {
        let amount = to_minor_units(total.amount)
            .filter(|cents| *cents > 0)
            .ok_or(PaymentError::InvalidAmount(total.amount))?;

        let customer_name = customer_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(GUEST_NAME);

        Ok(Self {
            amount,
            currency: total.currency_code.code(),
            description: format!("Eazyy order {order_number}"),
            metadata: PaymentMetadata {
                order_number: order_number.to_owned(),
                customer_name: customer_name.to_owned(),
                email: email.to_owned(),
            },
            payment_method_types: PAYMENT_METHOD_TYPES,
        })
    }

    /// Request for a euro total.
    ///
    /// # Errors
    ///
    /// See [`PaymentRequest::for_total`].
    pub fn eur(total: Decimal, order_number: &str, email: &str) -> Result<Self, PaymentError> {
        Self::for_total(Price::new(total, CurrencyCode::EUR), order_number, None, email)
    }
}

/// What happened to a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    /// The customer must complete an extra step (3-D Secure, bank redirect).
    RequiresAction,
    Processing,
    Failed,
}

impl PaymentOutcome {
    /// Map a processor intent status string.
    ///
    /// Anything unrecognised counts as a failure.
    #[must_use]
    pub fn from_intent_status(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "requires_action" | "requires_confirmation" => Self::RequiresAction,
            "processing" => Self::Processing,
            _ => Self::Failed,
        }
    }

    /// Whether the order can be shown as paid.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
