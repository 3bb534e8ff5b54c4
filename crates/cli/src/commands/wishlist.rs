//! Wishlist commands.

use std::path::Path;

use super::open_cart;

/// Toggle an item on the wishlist.
pub fn toggle(data_dir: &Path, item_id: &str) -> eazyy_storefront::Result<()> {
    let mut cart = open_cart(data_dir)?;
    if cart.toggle_wishlist(item_id) {
        tracing::info!("Added {item_id} to wishlist");
    } else {
        tracing::info!("Removed {item_id} from wishlist");
    }
    Ok(())
}

/// Print wishlisted item IDs in the order they were added.
#[allow(clippy::print_stdout)]
pub fn list(data_dir: &Path) -> eazyy_storefront::Result<()> {
    let cart = open_cart(data_dir)?;
    for item_id in cart.wishlist().iter() {
        println!("{item_id}");
    }
    Ok(())
}
