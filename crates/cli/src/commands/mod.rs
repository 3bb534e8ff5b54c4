//! Subcommand implementations.
//!
//! Every command opens the cart's [`FileStore`] itself, so each invocation
//! sees whatever the previous one persisted.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod quote;
pub mod wishlist;

use std::path::{Path, PathBuf};

use eazyy_storefront::CartStore;
use eazyy_storefront::config::StorageConfig;
use eazyy_storefront::storage::FileStore;

/// The data directory from `--data-dir`, else from the environment.
pub fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| StorageConfig::from_env().data_dir)
}

/// Open the persisted cart under `data_dir`.
fn open_cart(data_dir: &Path) -> eazyy_storefront::Result<CartStore<FileStore>> {
    let storage = FileStore::open(data_dir)?;
    tracing::debug!(dir = %storage.dir().display(), "Opened cart storage");
    Ok(CartStore::open(storage))
}
