//! Eazyy storefront library.
//!
//! The client-side half of the Eazyy laundry storefront: the cart and
//! wishlist with their durable storage, the custom quote intake gate, the
//! checkout hand-off and the clients for the hosted backend and geocoding.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod orders;
pub mod payment;
pub mod quote;
pub mod services;
pub mod storage;
pub mod wishlist;

pub use cart::{AddOutcome, CartStore, CartTotals, LineInput, QuantityChange, ServiceInput};
pub use error::{Result, StorefrontError};
