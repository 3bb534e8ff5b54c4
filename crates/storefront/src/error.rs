//! Unified error handling.
//!
//! Each module owns its error enum; [`StorefrontError`] gathers them for
//! callers that drive several modules at once, such as the CLI.

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::orders::DiscrepancyError;
use crate::payment::PaymentError;
use crate::quote::QuoteIntakeError;
use crate::services::{BackendError, GeocodingError};
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Quote request rejected by the intake gate.
    #[error("Quote error: {0}")]
    Quote(#[from] QuoteIntakeError),

    /// Checkout did not complete.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Backend call failed outside checkout.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Geocoding client could not be built.
    #[error("Geocoding error: {0}")]
    Geocoding(#[from] GeocodingError),

    /// Payment request could not be built.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Item discrepancy could not be resolved.
    #[error("Discrepancy error: {0}")]
    Discrepancy(#[from] DiscrepancyError),

    /// Bad input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
