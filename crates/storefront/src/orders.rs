//! Order tracking and item discrepancies.
//!
//! [`OrderView`] splits a customer's orders into the active and history
//! screens.
//!
//! When the facility counts a different set of items than the customer
//! booked, the order is parked in
//! [`OrderStatus::PendingItemConfirmation`] until the customer accepts or
//! declines the facility's count. [`reconcile_discrepancies`] plans the
//! resulting item changes without touching the backend, so the decision
//! logic can be tested on its own.

use chrono::{DateTime, Utc};
use eazyy_core::{
    CategoryId, DiscrepancyItemId, ItemDecision, ItemId, OrderId, OrderItemId, OrderStatus,
    PaymentStatus, ServiceId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscrepancyError {
    #[error("Order is no longer awaiting item confirmation (status: {0})")]
    NotAwaitingConfirmation(OrderStatus),
}

/// An item already on the order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(default)]
    pub product_id: Option<ItemId>,
    pub product_name: String,
    pub quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
}

/// An order with its items, as listed for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl OrderRecord {
    /// Total pieces across the order's items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.order_items
            .iter()
            .fold(0_u64, |count, item| count.saturating_add(u64::from(item.quantity)))
    }
}

/// Which of a customer's orders a screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderView {
    /// Orders between pickup and hand-back.
    Active,
    /// Delivered orders.
    History,
}

impl OrderView {
    #[must_use]
    pub const fn includes(self, status: OrderStatus) -> bool {
        match self {
            Self::Active => status.is_active(),
            Self::History => matches!(status, OrderStatus::Delivered),
        }
    }

    /// The orders this view shows, keeping their order.
    #[must_use]
    pub fn select(self, orders: &[OrderRecord]) -> Vec<&OrderRecord> {
        orders
            .iter()
            .filter(|order| self.includes(order.status))
            .collect()
    }
}

/// Labels of the order item a discrepancy was raised against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OriginalItemRef {
    #[serde(default)]
    pub product_id: Option<ItemId>,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
}

/// An item as counted by the facility.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscrepancyItem {
    pub id: DiscrepancyItemId,
    #[serde(default)]
    pub product_id: Option<ItemId>,
    pub product_name: String,
    pub actual_quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    /// Draft rows the facility has not finalised yet.
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub original_order_item: Option<OriginalItemRef>,
}

/// A facility-added order item to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ItemId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub service_id: Option<ServiceId>,
    pub category_id: Option<CategoryId>,
    pub service_name: Option<String>,
    pub category_name: Option<String>,
    pub is_facility_added: bool,
}

/// One planned write to the order's items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    /// Set an existing item's quantity and subtotal.
    Update {
        order_item_id: OrderItemId,
        quantity: u32,
        subtotal: Decimal,
    },
    Insert(NewOrderItem),
}

/// Everything that has to be written to apply the customer's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub decision: ItemDecision,
    /// Draft discrepancy rows to mark as final.
    pub finalize: Vec<DiscrepancyItemId>,
    pub changes: Vec<ItemChange>,
    /// Discrepancies dropped because no known product could be resolved.
    pub skipped: Vec<DiscrepancyItemId>,
    pub next_status: OrderStatus,
}

/// Product IDs a discrepancy list may fall back on, for a catalog lookup
/// ahead of [`reconcile_discrepancies`].
#[must_use]
pub fn candidate_product_ids(discrepancies: &[DiscrepancyItem]) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = discrepancies
        .iter()
        .flat_map(|item| {
            let original = item
                .original_order_item
                .as_ref()
                .and_then(|original| original.product_id);
            [item.product_id, original]
        })
        .flatten()
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Plan the item changes for a customer's answer to a discrepancy.
///
/// Declining keeps the booked items. Accepting applies the facility's count:
/// items already on the order (matched by product name) get the counted
/// quantity, everything else is inserted as a facility-added item. Either way
/// the order moves on to processing.
///
/// `known_product` tells whether a product ID exists in the catalog. A new
/// item uses the discrepancy's own product ID if known, else the original
/// order item's, and is skipped if neither is.
///
/// # Errors
///
/// Returns [`DiscrepancyError::NotAwaitingConfirmation`] unless the order is
/// in [`OrderStatus::PendingItemConfirmation`].
pub fn reconcile_discrepancies(
    status: OrderStatus,
    order_items: &[OrderItem],
    discrepancies: &[DiscrepancyItem],
    decision: ItemDecision,
    known_product: impl Fn(&ItemId) -> bool,
) -> Result<ReconciliationPlan, DiscrepancyError> {
    if status != OrderStatus::PendingItemConfirmation {
        return Err(DiscrepancyError::NotAwaitingConfirmation(status));
    }

    let mut plan = ReconciliationPlan {
        decision,
        finalize: Vec::new(),
        changes: Vec::new(),
        skipped: Vec::new(),
        next_status: OrderStatus::Processing,
    };
    if decision == ItemDecision::Declined {
        return Ok(plan);
    }

    for item in discrepancies {
        if item.is_temporary {
            plan.finalize.push(item.id);
        }

        let unit_price = item.unit_price.unwrap_or_default();
        let subtotal = unit_price * Decimal::from(item.actual_quantity);

        if let Some(existing) = order_items
            .iter()
            .find(|existing| existing.product_name == item.product_name)
        {
            plan.changes.push(ItemChange::Update {
                order_item_id: existing.id,
                quantity: item.actual_quantity,
                subtotal,
            });
            continue;
        }

        if let Some(ItemChange::Insert(planned)) = plan.changes.iter_mut().find(
            |change| matches!(change, ItemChange::Insert(new) if new.product_name == item.product_name),
        ) {
            planned.quantity = item.actual_quantity;
            planned.subtotal = subtotal;
            continue;
        }

        let original = item.original_order_item.clone().unwrap_or_default();
        let product_id = item
            .product_id
            .filter(|id| known_product(id))
            .or_else(|| original.product_id.filter(|id| known_product(id)));
        let Some(product_id) = product_id else {
            warn!(discrepancy_item_id = %item.id, "No known product for discrepancy item, skipping");
            plan.skipped.push(item.id);
            continue;
        };

        plan.changes.push(ItemChange::Insert(NewOrderItem {
            product_id,
            product_name: item.product_name.clone(),
            quantity: item.actual_quantity,
            unit_price,
            subtotal,
            service_id: item.service_id.or(original.service_id),
            category_id: item.category_id.or(original.category_id),
            service_name: item.service_name.clone().or(original.service_name),
            category_name: item.category_name.clone().or(original.category_name),
            is_facility_added: true,
        }));
    }

    Ok(plan)
}
