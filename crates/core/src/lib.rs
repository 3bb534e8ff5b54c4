//! Eazyy Core - Shared types library.
//!
//! This crate provides common types used across the Eazyy components:
//! - `storefront` - Cart store, quote intake, checkout and backend clients
//! - `cli` - Command-line driver for the cart and checkout flows
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - UUID-backed IDs, money and VAT, statuses, e-mail addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
