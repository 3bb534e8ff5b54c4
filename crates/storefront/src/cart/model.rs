//! Cart data model and its pure mutations.
//!
//! Everything here is plain data: no storage, no logging. [`CartStore`]
//! wraps these operations with persistence.
//!
//! [`CartStore`]: super::CartStore

use std::collections::BTreeMap;

use eazyy_core::{CategoryId, ItemId, ServiceId, vat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display descriptor of the service a bucket belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

/// One item in the cart.
///
/// Field names and numeric money values on the wire match the documents
/// written by the web storefront, so carts persisted there load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "id", alias = "itemId")]
    pub item_id: ItemId,
    #[serde(rename = "categoryId")]
    pub category_id: CategoryId,
    #[serde(default)]
    pub name: String,
    /// `None` while the item waits for a custom quote.
    #[serde(
        rename = "price",
        alias = "unitPrice",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub unit_price: Option<Decimal>,
    pub quantity: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub custom_input_value: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub calculated_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
}

impl CartLine {
    /// Price contribution of this line.
    ///
    /// Custom-measure lines carry their own `calculated_price`; everything
    /// else is `unit_price x quantity`, with a missing price counting as zero.
    /// Returns `None` if the product overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        match self.calculated_price {
            Some(price) => Some(price),
            None => self
                .unit_price
                .unwrap_or_default()
                .checked_mul(Decimal::from(self.quantity)),
        }
    }
}

/// All lines booked under one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBucket {
    pub service: ServiceDescriptor,
    pub items: Vec<CartLine>,
}

impl ServiceBucket {
    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.items.iter().position(|line| &line.item_id == item_id)
    }
}

/// Result of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has this quantity.
    Updated(u32),
    /// The quantity dropped to zero or below and the line was removed.
    Removed,
    /// No such service or item in the cart.
    NotFound,
    /// The new quantity would push the cart total out of range; nothing
    /// changed.
    AmountOverflow,
}

/// Why [`CartStore::add_item`](super::CartStore::add_item) refused a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidItemId,
    InvalidServiceId,
    InvalidCategoryId,
    ZeroQuantity,
    /// The line's price, or the cart total with it, is out of range.
    AmountOverflow,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InvalidItemId => "invalid item id",
            Self::InvalidServiceId => "invalid service id",
            Self::InvalidCategoryId => "invalid category id",
            Self::ZeroQuantity => "quantity must be at least 1",
            Self::AmountOverflow => "amount out of range",
        })
    }
}

/// Result of adding a line to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AddOutcome {
    /// A new line was appended (creating the bucket if needed).
    Added,
    /// The item was already in the bucket; its quantity is now `quantity`.
    Merged { quantity: u32 },
    /// Nothing changed.
    Rejected(RejectReason),
}

impl AddOutcome {
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// The whole cart: service ID to bucket.
///
/// Buckets are never empty, every ID is a valid UUID and the total with VAT
/// is representable. The typed IDs make the second property structural; the
/// mutations below refuse changes that would break the third.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    services: BTreeMap<ServiceId, ServiceBucket>,
}

impl CartState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Number of service buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn bucket(&self, service_id: &ServiceId) -> Option<&ServiceBucket> {
        self.services.get(service_id)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&ServiceId, &ServiceBucket)> {
        self.services.iter()
    }

    /// Every line across all buckets, paired with its service ID.
    pub fn lines(&self) -> impl Iterator<Item = (&ServiceId, &CartLine)> {
        self.services
            .iter()
            .flat_map(|(id, bucket)| bucket.items.iter().map(move |line| (id, line)))
    }

    #[must_use]
    pub fn line(&self, service_id: &ServiceId, item_id: &ItemId) -> Option<&CartLine> {
        self.services
            .get(service_id)?
            .items
            .iter()
            .find(|line| &line.item_id == item_id)
    }

    /// Add a line, merging quantities with an existing line for the same item.
    ///
    /// On merge only the quantity changes; the existing price and custom
    /// fields are kept. A line whose amount would overflow the cart total is
    /// rejected.
    pub fn add_line(&mut self, service: ServiceDescriptor, line: CartLine) -> AddOutcome {
        if line.quantity == 0 {
            return AddOutcome::Rejected(RejectReason::ZeroQuantity);
        }

        let mut next = self.clone();
        let outcome = next.insert_line(service, line);
        if !next.amounts_fit() {
            return AddOutcome::Rejected(RejectReason::AmountOverflow);
        }
        *self = next;
        outcome
    }

    fn insert_line(&mut self, service: ServiceDescriptor, line: CartLine) -> AddOutcome {
        let Some(bucket) = self.services.get_mut(&service.id) else {
            self.services.insert(
                service.id,
                ServiceBucket {
                    service,
                    items: vec![line],
                },
            );
            return AddOutcome::Added;
        };

        if let Some(existing) = bucket
            .items
            .iter_mut()
            .find(|existing| existing.item_id == line.item_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            return AddOutcome::Merged {
                quantity: existing.quantity,
            };
        }

        bucket.items.push(line);
        AddOutcome::Added
    }

    /// Remove a line, dropping its bucket if it was the last one.
    ///
    /// Returns `false` if the service or item was not in the cart.
    pub fn remove_line(&mut self, service_id: &ServiceId, item_id: &ItemId) -> bool {
        let Some(bucket) = self.services.get_mut(service_id) else {
            return false;
        };
        let Some(index) = bucket.position(item_id) else {
            return false;
        };

        bucket.items.remove(index);
        if bucket.items.is_empty() {
            self.services.remove(service_id);
        }
        true
    }

    /// Apply a signed quantity delta. A result of zero or less removes the line.
    pub fn adjust_quantity(
        &mut self,
        service_id: &ServiceId,
        item_id: &ItemId,
        delta: i64,
    ) -> QuantityChange {
        let Some(line) = self
            .services
            .get_mut(service_id)
            .and_then(|bucket| bucket.items.iter_mut().find(|l| &l.item_id == item_id))
        else {
            return QuantityChange::NotFound;
        };

        let next = i64::from(line.quantity).saturating_add(delta);
        if next <= 0 {
            self.remove_line(service_id, item_id);
            return QuantityChange::Removed;
        }

        let previous = line.quantity;
        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        let quantity = line.quantity;
        if !self.amounts_fit() {
            if let Some(line) = self.line_mut(service_id, item_id) {
                line.quantity = previous;
            }
            return QuantityChange::AmountOverflow;
        }
        QuantityChange::Updated(quantity)
    }

    fn line_mut(&mut self, service_id: &ServiceId, item_id: &ItemId) -> Option<&mut CartLine> {
        self.services
            .get_mut(service_id)?
            .items
            .iter_mut()
            .find(|line| &line.item_id == item_id)
    }

    /// Sum of all line totals, or `None` if it overflows.
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.lines()
            .try_fold(Decimal::ZERO, |subtotal, (_, line)| {
                subtotal.checked_add(line.line_total()?)
            })
    }

    /// Whether the subtotal and the total with VAT are both representable.
    fn amounts_fit(&self) -> bool {
        self.checked_subtotal()
            .is_some_and(|subtotal| subtotal.checked_add(vat(subtotal)).is_some())
    }
}

/// Catalog service record, as handed over by the catalog.
///
/// IDs are unvalidated text until [`CartStore::add_item`] checks them.
///
/// [`CartStore::add_item`]: super::CartStore::add_item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

impl ServiceInput {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }
}

/// Catalog item record to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    pub item_id: String,
    pub category_id: String,
    pub name: String,
    pub unit_price: Option<Decimal>,
    pub quantity: u32,
    pub custom_input_value: Option<Decimal>,
    pub calculated_price: Option<Decimal>,
    pub unit_label: Option<String>,
    pub service_name: Option<String>,
    pub category_name: Option<String>,
}

impl LineInput {
    /// A regular, per-piece priced item.
    #[must_use]
    pub fn new(
        item_id: impl Into<String>,
        category_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Option<Decimal>,
        quantity: u32,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            category_id: category_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            custom_input_value: None,
            calculated_price: None,
            unit_label: None,
            service_name: None,
            category_name: None,
        }
    }

    /// Price the line by a customer-entered measure (e.g. 2.5 m2 of carpet).
    ///
    /// `calculated_price` becomes `measure x unit_price`; with no unit price
    /// the line stays unpriced.
    #[must_use]
    pub fn custom_measure(mut self, measure: Decimal, unit_label: impl Into<String>) -> Self {
        self.custom_input_value = Some(measure);
        self.calculated_price = self.unit_price.map(|price| price * measure);
        self.unit_label = Some(unit_label.into());
        self
    }

    /// Attach display names for the order summary.
    #[must_use]
    pub fn with_labels(
        mut self,
        service_name: impl Into<String>,
        category_name: impl Into<String>,
    ) -> Self {
        self.service_name = Some(service_name.into());
        self.category_name = Some(category_name.into());
        self
    }

    /// Validate IDs and quantity, in the order item, service, category.
    pub(crate) fn validate(
        self,
        service: &ServiceInput,
    ) -> Result<(ServiceDescriptor, CartLine), RejectReason> {
        let item_id = ItemId::parse(&self.item_id).map_err(|_| RejectReason::InvalidItemId)?;
        let service_id =
            ServiceId::parse(&service.id).map_err(|_| RejectReason::InvalidServiceId)?;
        let category_id =
            CategoryId::parse(&self.category_id).map_err(|_| RejectReason::InvalidCategoryId)?;
        if self.quantity == 0 {
            return Err(RejectReason::ZeroQuantity);
        }

        let descriptor = ServiceDescriptor {
            id: service_id,
            name: service.name.clone(),
            icon: service.icon.clone(),
            color: service.color.clone(),
        };
        let line = CartLine {
            item_id,
            category_id,
            name: self.name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            custom_input_value: self.custom_input_value,
            calculated_price: self.calculated_price,
            unit_label: self.unit_label,
            service_name: self.service_name,
            category_name: self.category_name,
        };
        Ok((descriptor, line))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SERVICE: &str = "6f1c2d3e-4a5b-4c6d-8e7f-901234567890";
    const SHIRT: &str = "11111111-2222-4333-8444-555555555555";
    const TOPS: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    fn shirt(quantity: u32) -> (ServiceDescriptor, CartLine) {
        LineInput::new(SHIRT, TOPS, "Shirt", Some(Decimal::from(5)), quantity)
            .validate(&ServiceInput::new(SERVICE, "Wash & Iron"))
            .unwrap()
    }

    #[test]
    fn test_line_total_per_piece() {
        let (_, line) = shirt(3);
        assert_eq!(line.line_total(), Some(Decimal::from(15)));
    }

    #[test]
    fn test_line_total_prefers_calculated_price() {
        let input = LineInput::new(SHIRT, TOPS, "Carpet", Some(Decimal::from(12)), 1)
            .custom_measure(Decimal::new(25, 1), "m2");
        assert_eq!(input.calculated_price, Some(Decimal::from(30)));

        let (_, line) = input
            .validate(&ServiceInput::new(SERVICE, "Carpets"))
            .unwrap();
        assert_eq!(line.line_total(), Some(Decimal::from(30)));
    }

    #[test]
    fn test_line_total_unpriced_is_zero() {
        let (_, mut line) = shirt(4);
        line.unit_price = None;
        assert_eq!(line.line_total(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_validate_reports_first_bad_id() {
        let service = ServiceInput::new("bogus", "x");
        let err = LineInput::new("also-bogus", "nope", "x", None, 1)
            .validate(&service)
            .unwrap_err();
        assert_eq!(err, RejectReason::InvalidItemId);

        let err = LineInput::new(SHIRT, "nope", "x", None, 1)
            .validate(&service)
            .unwrap_err();
        assert_eq!(err, RejectReason::InvalidServiceId);

        let err = LineInput::new(SHIRT, "nope", "x", None, 1)
            .validate(&ServiceInput::new(SERVICE, "x"))
            .unwrap_err();
        assert_eq!(err, RejectReason::InvalidCategoryId);
    }

    #[test]
    fn test_add_line_merges_quantity_only() {
        let mut state = CartState::new();
        let (service, line) = shirt(1);
        assert_eq!(state.add_line(service.clone(), line), AddOutcome::Added);

        let (_, mut again) = shirt(2);
        again.unit_price = Some(Decimal::from(99));
        assert_eq!(
            state.add_line(service.clone(), again),
            AddOutcome::Merged { quantity: 3 }
        );

        let line = state
            .line(&service.id, &ItemId::parse(SHIRT).unwrap())
            .unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Some(Decimal::from(5)));
    }

    #[test]
    fn test_remove_last_line_drops_bucket() {
        let mut state = CartState::new();
        let (service, line) = shirt(1);
        let _ = state.add_line(service.clone(), line);

        let item = ItemId::parse(SHIRT).unwrap();
        assert!(state.remove_line(&service.id, &item));
        assert!(state.is_empty());
        assert!(!state.remove_line(&service.id, &item));
    }

    #[test]
    fn test_adjust_quantity() {
        let mut state = CartState::new();
        let (service, line) = shirt(1);
        let _ = state.add_line(service.clone(), line);
        let item = ItemId::parse(SHIRT).unwrap();

        assert_eq!(
            state.adjust_quantity(&service.id, &item, 2),
            QuantityChange::Updated(3)
        );
        assert_eq!(
            state.adjust_quantity(&service.id, &item, -3),
            QuantityChange::Removed
        );
        assert!(state.bucket(&service.id).is_none());
        assert_eq!(
            state.adjust_quantity(&service.id, &item, 1),
            QuantityChange::NotFound
        );
    }

    #[test]
    fn test_line_reads_legacy_and_new_field_names() {
        let legacy = serde_json::json!({
            "id": SHIRT, "categoryId": TOPS, "name": "Shirt",
            "price": 5, "quantity": 1, "serviceId": SERVICE
        });
        let line: CartLine = serde_json::from_value(legacy).unwrap();
        assert_eq!(line.unit_price, Some(Decimal::from(5)));

        let renamed = serde_json::json!({
            "itemId": SHIRT, "categoryId": TOPS, "name": "Shirt",
            "unitPrice": null, "quantity": 2
        });
        let line: CartLine = serde_json::from_value(renamed).unwrap();
        assert_eq!(line.unit_price, None);
        assert_eq!(line.quantity, 2);
    }

    fn huge_shirt(price: &str, quantity: u32) -> (ServiceDescriptor, CartLine) {
        let price = Decimal::from_scientific(price).unwrap();
        LineInput::new(SHIRT, TOPS, "Shirt", Some(price), quantity)
            .validate(&ServiceInput::new(SERVICE, "Wash & Iron"))
            .unwrap()
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let (_, line) = huge_shirt("5e28", 2);
        assert_eq!(line.line_total(), None);
    }

    #[test]
    fn test_add_line_rejects_amount_overflow() {
        let mut state = CartState::new();
        let (service, line) = huge_shirt("5e28", 2);
        assert_eq!(
            state.add_line(service, line),
            AddOutcome::Rejected(RejectReason::AmountOverflow)
        );
        assert!(state.is_empty());

        // Fits alone, but not once VAT is added.
        let (service, line) = huge_shirt("7e28", 1);
        assert_eq!(
            state.add_line(service, line),
            AddOutcome::Rejected(RejectReason::AmountOverflow)
        );
    }

    #[test]
    fn test_adjust_quantity_refuses_overflow() {
        let mut state = CartState::new();
        let price = Decimal::from_scientific("1e26").unwrap();
        let (service, line) = LineInput::new(SHIRT, TOPS, "Shirt", Some(price), 1)
            .validate(&ServiceInput::new(SERVICE, "Wash & Iron"))
            .unwrap();
        assert_eq!(state.add_line(service.clone(), line), AddOutcome::Added);

        let item = ItemId::parse(SHIRT).unwrap();
        assert_eq!(
            state.adjust_quantity(&service.id, &item, 1_000),
            QuantityChange::AmountOverflow
        );
        assert_eq!(state.line(&service.id, &item).unwrap().quantity, 1);
        assert!(state.checked_subtotal().is_some());
    }
}
