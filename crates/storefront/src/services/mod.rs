//! Clients for the storefront's external collaborators.
//!
//! - `backend` - Hosted backend: orders, discrepancies, quote photos and records
//! - `geocoding` - Address to coordinates

pub mod backend;
pub mod geocoding;

pub use backend::{BackendClient, BackendError};
pub use geocoding::{Coordinates, Geocoder, GeocodingError, GoogleGeocoder};
