//! Integration tests for the Eazyy storefront.
//!
//! These drive the public API against a real [`FileStore`] in a temporary
//! directory, the way the CLI does between invocations.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eazyy-integration-tests
//! ```
//!
//! This crate only holds shared fixtures; the tests live under `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use eazyy_storefront::storage::FileStore;
use eazyy_storefront::{CartStore, LineInput, ServiceInput};
use rust_decimal::Decimal;
use tempfile::TempDir;

pub const WASH: &str = "6f1c2d3e-4a5b-4c6d-8e7f-901234567890";
pub const DRY_CLEAN: &str = "7a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d";
pub const SHIRT: &str = "11111111-2222-4333-8444-555555555555";
pub const TROUSERS: &str = "22222222-2222-4333-8444-555555555555";
pub const TOPS: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

/// A fresh data directory. Keep the guard alive for the whole test.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn data_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Open the cart persisted in `dir`, as a new process would.
///
/// # Panics
///
/// Panics if the directory cannot be opened.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn reopen(dir: &TempDir) -> CartStore<FileStore> {
    CartStore::open(FileStore::open(dir.path()).unwrap())
}

#[must_use]
pub fn wash() -> ServiceInput {
    ServiceInput::new(WASH, "Wash & Iron").with_style("shirt", "#3b82f6")
}

#[must_use]
pub fn dry_clean() -> ServiceInput {
    ServiceInput::new(DRY_CLEAN, "Dry Cleaning")
}

/// `quantity` shirts at 5.00 each.
#[must_use]
pub fn shirts(quantity: u32) -> LineInput {
    LineInput::new(SHIRT, TOPS, "Shirt", Some(Decimal::from(5)), quantity)
}

/// `quantity` trousers at 11.00 each.
#[must_use]
pub fn trousers(quantity: u32) -> LineInput {
    LineInput::new(TROUSERS, TOPS, "Trousers", Some(Decimal::from(11)), quantity)
}
