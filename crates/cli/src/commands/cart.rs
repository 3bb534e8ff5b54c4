//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! ez-cli cart show
//! ez-cli cart update <service-id> <item-id> -1
//! ez-cli cart clear
//! ```

use std::path::Path;

use eazyy_core::{ItemId, Price, ServiceId};
use eazyy_storefront::cart::{CartState, CartTotals};
use eazyy_storefront::{AddOutcome, LineInput, QuantityChange, ServiceInput, StorefrontError};

use super::open_cart;

/// Print the cart.
pub fn show(data_dir: &Path) -> eazyy_storefront::Result<()> {
    let cart = open_cart(data_dir)?;
    print_cart(cart.state(), &cart.totals());
    Ok(())
}

/// Add a line, merging into an existing one for the same item.
pub fn add(data_dir: &Path, (line, service): (LineInput, ServiceInput)) -> eazyy_storefront::Result<()> {
    let mut cart = open_cart(data_dir)?;
    let name = line.name.clone();

    match cart.add_item(line, service) {
        AddOutcome::Added => tracing::info!("Added {name}"),
        AddOutcome::Merged { quantity } => tracing::info!("{name} now x{quantity}"),
        AddOutcome::Rejected(reason) => {
            return Err(StorefrontError::BadRequest(format!(
                "{name} not added: {reason}"
            )));
        }
    }

    print_cart(cart.state(), &cart.totals());
    Ok(())
}

/// Remove a line.
pub fn remove(
    data_dir: &Path,
    service_id: &ServiceId,
    item_id: &ItemId,
) -> eazyy_storefront::Result<()> {
    let mut cart = open_cart(data_dir)?;
    if !cart.remove_item(service_id, item_id) {
        return Err(not_in_cart(service_id, item_id));
    }

    print_cart(cart.state(), &cart.totals());
    Ok(())
}

/// Change a line's quantity by `delta`.
pub fn update(
    data_dir: &Path,
    service_id: &ServiceId,
    item_id: &ItemId,
    delta: i64,
) -> eazyy_storefront::Result<()> {
    let mut cart = open_cart(data_dir)?;
    match cart.update_quantity(service_id, item_id, delta) {
        QuantityChange::Updated(quantity) => tracing::info!(%item_id, quantity, "Quantity updated"),
        QuantityChange::Removed => tracing::info!(%item_id, "Line removed"),
        QuantityChange::NotFound => return Err(not_in_cart(service_id, item_id)),
        QuantityChange::AmountOverflow => {
            return Err(StorefrontError::BadRequest(format!(
                "Quantity change for {item_id} puts the cart total out of range"
            )));
        }
    }

    print_cart(cart.state(), &cart.totals());
    Ok(())
}

/// Empty the cart.
pub fn clear(data_dir: &Path) -> eazyy_storefront::Result<()> {
    let mut cart = open_cart(data_dir)?;
    cart.clear_cart();
    tracing::info!("Cart cleared");
    Ok(())
}

fn not_in_cart(service_id: &ServiceId, item_id: &ItemId) -> StorefrontError {
    StorefrontError::BadRequest(format!("Item {item_id} is not in service {service_id}"))
}

#[allow(clippy::print_stdout)]
fn print_cart(state: &CartState, totals: &CartTotals) {
    if state.is_empty() {
        println!("Cart is empty");
        return;
    }

    for (service_id, bucket) in state.buckets() {
        println!("{} ({service_id})", bucket.service.name);
        for line in &bucket.items {
            let price = line
                .unit_price
                .map_or_else(|| "price on inspection".to_owned(), |p| Price::eur(p).to_string());
            let measure = match (line.custom_input_value, line.unit_label.as_deref()) {
                (Some(value), Some(unit)) => format!(" [{value} {unit}]"),
                _ => String::new(),
            };
            let total = line
                .line_total()
                .map_or_else(|| "out of range".to_owned(), |t| Price::eur(t).to_string());
            println!(
                "  {} x{}{measure} @ {price} = {total}  ({})",
                line.name, line.quantity, line.item_id
            );
        }
    }

    println!();
    println!("Items:    {}", totals.total_items);
    println!("Subtotal: {}", Price::eur(totals.subtotal));
    println!("VAT:      {}", Price::eur(totals.tax));
    println!("Total:    {}", Price::eur(totals.total));
}
