//! Order tracking commands.
//!
//! # Usage
//!
//! ```bash
//! # Orders between pickup and hand-back
//! ez-cli orders active --user-id <uuid>
//!
//! # Delivered orders
//! ez-cli orders history --user-id <uuid>
//!
//! # Answer a facility item count
//! ez-cli orders confirm <order-id> --accept
//!
//! # Record the payment processor's answer for a new order
//! ez-cli orders paid EZ-1042 --intent-status succeeded
//! ```
//!
//! # Environment Variables
//!
//! Every command needs `EAZYY_BACKEND_URL`, `EAZYY_BACKEND_ANON_KEY` and
//! `EAZYY_ACCESS_TOKEN`.

use eazyy_core::{ItemDecision, OrderId, Price, UserId};
use eazyy_storefront::config::StorefrontConfig;
use eazyy_storefront::orders::{
    ItemChange, OrderView, candidate_product_ids, reconcile_discrepancies,
};
use eazyy_storefront::payment::PaymentOutcome;
use eazyy_storefront::services::BackendClient;

fn client() -> eazyy_storefront::Result<BackendClient> {
    let config = StorefrontConfig::from_env()?;
    Ok(BackendClient::new(&config.backend)?)
}

/// Print the orders `view` shows for `user_id`.
#[allow(clippy::print_stdout)]
pub async fn list(user_id: &UserId, view: OrderView) -> eazyy_storefront::Result<()> {
    let orders = client()?.list_orders(user_id).await?;
    let shown = view.select(&orders);
    tracing::debug!(fetched = orders.len(), shown = shown.len(), ?view, "Listed orders");

    if shown.is_empty() {
        match view {
            OrderView::Active => println!("No active orders"),
            OrderView::History => println!("No delivered orders yet"),
        }
        return Ok(());
    }

    for order in shown {
        let total = order
            .total_amount
            .map_or_else(|| "price on inspection".to_owned(), |t| Price::eur(t).to_string());
        println!(
            "{}  {}  {:<26} {} items  {total}",
            order.order_number,
            order.created_at.format("%Y-%m-%d"),
            order.status.label(),
            order.item_count()
        );
    }
    Ok(())
}

/// Accept or decline the facility's item count for `order_id`.
#[allow(clippy::print_stdout)]
pub async fn confirm(order_id: &OrderId, decision: ItemDecision) -> eazyy_storefront::Result<()> {
    let client = client()?;
    let order = client.fetch_order(order_id).await?;

    let discrepancies = if decision == ItemDecision::Accepted {
        client.list_discrepancies(order_id).await?
    } else {
        Vec::new()
    };
    let known = client
        .known_products(&candidate_product_ids(&discrepancies))
        .await?;

    let plan = reconcile_discrepancies(
        order.status,
        &order.order_items,
        &discrepancies,
        decision,
        |id| known.contains(id),
    )?;
    client.apply_reconciliation(order_id, &plan).await?;

    for change in &plan.changes {
        match change {
            ItemChange::Update { quantity, .. } => println!("Updated item to x{quantity}"),
            ItemChange::Insert(item) => {
                println!("Added {} x{}", item.product_name, item.quantity);
            }
        }
    }
    if !plan.skipped.is_empty() {
        println!("{} counted items could not be matched to the catalog", plan.skipped.len());
    }
    println!("Order {} is now {}", order.order_number, plan.next_status.label());
    Ok(())
}

/// Record a payment intent's final status against a new order.
#[allow(clippy::print_stdout)]
pub async fn paid(order_number: &str, intent_status: &str) -> eazyy_storefront::Result<()> {
    let outcome = PaymentOutcome::from_intent_status(intent_status);
    if !outcome.is_paid() {
        println!("Payment not completed ({outcome:?}); order {order_number} stays pending");
        return Ok(());
    }

    if client()?.mark_order_paid(order_number).await? {
        println!("Order {order_number} paid and awaiting pickup");
    } else {
        println!("Order {order_number} was already processed");
    }
    Ok(())
}
