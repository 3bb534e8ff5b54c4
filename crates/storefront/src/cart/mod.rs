//! Client-side cart.
//!
//! [`CartStore`] owns the cart and the wishlist and mirrors both into a
//! [`KeyValueStore`] after every change. It never returns an error: storage
//! failures are logged and the in-memory state stays authoritative, and
//! invalid input is rejected with an [`AddOutcome`] instead of a panic.
//!
//! ```
//! use eazyy_storefront::cart::{AddOutcome, CartStore, LineInput, ServiceInput};
//! use eazyy_storefront::storage::MemoryStore;
//! use rust_decimal::Decimal;
//!
//! let mut cart = CartStore::open(MemoryStore::new());
//! let wash = ServiceInput::new("6f1c2d3e-4a5b-4c6d-8e7f-901234567890", "Wash & Iron");
//! let shirt = LineInput::new(
//!     "11111111-2222-4333-8444-555555555555",
//!     "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee",
//!     "Shirt",
//!     Some(Decimal::from(5)),
//!     1,
//! );
//!
//! assert_eq!(cart.add_item(shirt, wash), AddOutcome::Added);
//! assert_eq!(cart.total(), Decimal::new(605, 2));
//! ```

mod model;
mod totals;
pub mod upgrade;

pub use model::{
    AddOutcome, CartLine, CartState, LineInput, QuantityChange, RejectReason, ServiceBucket,
    ServiceDescriptor, ServiceInput,
};
pub use totals::CartTotals;

use eazyy_core::{ItemId, ServiceId};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, keys};
use crate::wishlist::Wishlist;

/// The cart and wishlist, persisted through `S`.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    state: CartState,
    wishlist: Wishlist,
}

impl<S: KeyValueStore> CartStore<S> {
    /// An empty store. Nothing is read until [`load`](Self::load).
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: CartState::new(),
            wishlist: Wishlist::new(),
        }
    }

    /// Create a store and load whatever the slots hold.
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Replace the in-memory state with the persisted one.
    ///
    /// The stored cart is run through [`upgrade::upgrade`] and written back,
    /// so a damaged or outdated document heals on first read. An unreadable
    /// document yields an empty cart. A failing read leaves the slot alone.
    pub fn load(&mut self) {
        match self.storage.get(keys::CART) {
            Ok(raw) => {
                self.state = raw.as_deref().map_or_else(CartState::new, parse_cart);
                self.persist_cart();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart, starting empty");
                self.state = CartState::new();
            }
        }

        self.wishlist = match self.storage.get(keys::WISHLIST) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(items) => Wishlist::from_stored(items),
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored wishlist");
                    Wishlist::new()
                }
            },
            Ok(None) => Wishlist::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored wishlist");
                Wishlist::new()
            }
        };
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// Add a catalog item to the cart.
    ///
    /// Lines with an invalid item, service or category ID, or with a zero
    /// quantity, are logged and rejected without touching the cart. An item
    /// already in the service's bucket has its quantity increased.
    pub fn add_item(&mut self, line: LineInput, service: ServiceInput) -> AddOutcome {
        let raw_item_id = line.item_id.clone();
        let (descriptor, line) = match line.validate(&service) {
            Ok(validated) => validated,
            Err(reason) => {
                warn!(
                    item_id = %raw_item_id,
                    service_id = %service.id,
                    %reason,
                    "Rejected cart item"
                );
                return AddOutcome::Rejected(reason);
            }
        };

        let service_id = descriptor.id;
        let item_id = line.item_id;
        let outcome = self.state.add_line(descriptor, line);
        if !outcome.is_rejected() {
            debug!(%service_id, %item_id, ?outcome, "Added item to cart");
            self.persist_cart();
        }
        outcome
    }

    /// Remove an item. Returns `false` (and changes nothing) if absent.
    pub fn remove_item(&mut self, service_id: &ServiceId, item_id: &ItemId) -> bool {
        let removed = self.state.remove_line(service_id, item_id);
        if removed {
            debug!(%service_id, %item_id, "Removed item from cart");
            self.persist_cart();
        }
        removed
    }

    /// Change an item's quantity by `delta`; zero or less removes it. A
    /// change that would push the total out of range is refused.
    pub fn update_quantity(
        &mut self,
        service_id: &ServiceId,
        item_id: &ItemId,
        delta: i64,
    ) -> QuantityChange {
        let change = self.state.adjust_quantity(service_id, item_id, delta);
        if matches!(change, QuantityChange::Updated(_) | QuantityChange::Removed) {
            debug!(%service_id, %item_id, delta, ?change, "Updated cart quantity");
            self.persist_cart();
        }
        change
    }

    /// Empty the cart and delete its slot.
    pub fn clear_cart(&mut self) {
        self.state = CartState::new();
        if let Err(e) = self.storage.remove(keys::CART) {
            warn!(error = %e, "Failed to remove stored cart");
        }
        debug!("Cleared cart");
    }

    /// Add or remove an item from the wishlist. Returns `true` if it is now
    /// wishlisted.
    pub fn toggle_wishlist(&mut self, item_id: &str) -> bool {
        let added = self.wishlist.toggle(item_id);
        self.persist_wishlist();
        added
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::from_state(&self.state)
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.totals().total_items
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.totals().subtotal
    }

    #[must_use]
    pub fn tax(&self) -> Decimal {
        self.totals().tax
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.totals().total
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist_cart(&mut self) {
        let encoded = upgrade::encode(&self.state).to_string();
        if let Err(e) = self.storage.set(keys::CART, &encoded) {
            warn!(error = %e, "Failed to persist cart");
        }
    }

    fn persist_wishlist(&mut self) {
        let result = serde_json::to_string(&self.wishlist)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .set(keys::WISHLIST, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            warn!(%error, "Failed to persist wishlist");
        }
    }
}

fn parse_cart(raw: &str) -> CartState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => upgrade::upgrade(&value),
        Err(e) => {
            warn!(error = %e, "Failed to parse stored cart, starting empty");
            CartState::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    const WASH: &str = "6f1c2d3e-4a5b-4c6d-8e7f-901234567890";
    const SHIRT: &str = "11111111-2222-4333-8444-555555555555";
    const TROUSERS: &str = "99999999-8888-4777-a666-555555555555";
    const TOPS: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    fn wash() -> ServiceInput {
        ServiceInput::new(WASH, "Wash & Iron").with_style("shirt", "#0ea5e9")
    }

    fn shirt(quantity: u32) -> LineInput {
        LineInput::new(SHIRT, TOPS, "Shirt", Some(Decimal::from(5)), quantity)
    }

    fn ids() -> (ServiceId, ItemId) {
        (ServiceId::parse(WASH).unwrap(), ItemId::parse(SHIRT).unwrap())
    }

    /// A store whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::InvalidKey(key.to_owned()))
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_owned()))
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_owned()))
        }
    }

    #[test]
    fn test_invalid_ids_leave_cart_untouched() {
        let mut cart = CartStore::open(MemoryStore::new());
        let _ = cart.add_item(shirt(1), wash());
        let before = cart.state().clone();

        let bad_item = LineInput::new("shirt-1", TOPS, "Shirt", None, 1);
        assert_eq!(
            cart.add_item(bad_item, wash()),
            AddOutcome::Rejected(RejectReason::InvalidItemId)
        );

        let bad_service = ServiceInput::new("wash", "Wash");
        assert_eq!(
            cart.add_item(shirt(1), bad_service),
            AddOutcome::Rejected(RejectReason::InvalidServiceId)
        );

        let bad_category = LineInput::new(TROUSERS, "bottoms", "Trousers", None, 1);
        assert_eq!(
            cart.add_item(bad_category, wash()),
            AddOutcome::Rejected(RejectReason::InvalidCategoryId)
        );

        assert_eq!(
            cart.add_item(shirt(0), wash()),
            AddOutcome::Rejected(RejectReason::ZeroQuantity)
        );

        assert_eq!(cart.state(), &before);
    }

    #[test]
    fn test_adding_same_item_twice_merges() {
        let mut cart = CartStore::open(MemoryStore::new());
        assert_eq!(cart.add_item(shirt(1), wash()), AddOutcome::Added);
        assert_eq!(
            cart.add_item(shirt(2), wash()),
            AddOutcome::Merged { quantity: 3 }
        );

        let (service_id, _) = ids();
        assert_eq!(cart.state().bucket(&service_id).unwrap().items.len(), 1);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_end_to_end_shirt_flow() {
        let mut cart = CartStore::open(MemoryStore::new());
        let (service_id, item_id) = ids();

        let _ = cart.add_item(shirt(1), wash());
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.subtotal(), Decimal::from(5));
        assert_eq!(cart.tax(), Decimal::new(105, 2));
        assert_eq!(cart.total(), Decimal::new(605, 2));

        assert_eq!(
            cart.update_quantity(&service_id, &item_id, 2),
            QuantityChange::Updated(3)
        );
        assert_eq!(cart.subtotal(), Decimal::from(15));

        assert!(cart.remove_item(&service_id, &item_id));
        assert!(cart.state().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_update_to_zero_removes_bucket() {
        let mut cart = CartStore::open(MemoryStore::new());
        let (service_id, item_id) = ids();
        let _ = cart.add_item(shirt(2), wash());

        assert_eq!(
            cart.update_quantity(&service_id, &item_id, -5),
            QuantityChange::Removed
        );
        assert!(cart.state().bucket(&service_id).is_none());
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = CartStore::open(MemoryStore::new());
        let (service_id, item_id) = ids();

        assert!(!cart.remove_item(&service_id, &item_id));
        assert_eq!(
            cart.update_quantity(&service_id, &item_id, 1),
            QuantityChange::NotFound
        );
        assert!(cart.storage().raw(keys::CART).is_some_and(|raw| raw.contains("\"services\":{}")));
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let mut cart = CartStore::open(MemoryStore::new());
        let _ = cart.add_item(shirt(2), wash());
        cart.toggle_wishlist(SHIRT);

        let reloaded = CartStore::open(cart.into_storage());
        let (service_id, item_id) = ids();
        let line = reloaded.state().line(&service_id, &item_id).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(
            reloaded.state().bucket(&service_id).unwrap().service.color,
            "#0ea5e9"
        );
        assert!(reloaded.wishlist().contains(SHIRT));
    }

    #[test]
    fn test_clear_cart_removes_slot() {
        let mut cart = CartStore::open(MemoryStore::new());
        let _ = cart.add_item(shirt(1), wash());
        assert!(cart.storage().raw(keys::CART).is_some());

        cart.clear_cart();
        assert!(cart.state().is_empty());
        assert!(cart.storage().raw(keys::CART).is_none());
    }

    #[test]
    fn test_load_heals_stored_cart() {
        let legacy = serde_json::json!({
            "not-a-uuid": { "service": { "name": "x" }, "items": [] },
            WASH: {
                "service": { "id": WASH, "name": "Wash & Iron", "icon": "shirt", "color": "blue" },
                "items": [
                    { "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 1 },
                    { "id": "bad", "categoryId": TOPS, "name": "Bad", "price": 5, "quantity": 1 }
                ]
            }
        });
        let storage = MemoryStore::new().with(keys::CART, legacy.to_string());

        let cart = CartStore::open(storage);
        assert_eq!(cart.total_items(), 1);

        let rewritten: Value =
            serde_json::from_str(cart.storage().raw(keys::CART).unwrap()).unwrap();
        assert_eq!(rewritten["version"], 2);
        assert!(rewritten["services"].get("not-a-uuid").is_none());
    }

    #[test]
    fn test_load_survives_garbage() {
        let storage = MemoryStore::new()
            .with(keys::CART, "{not json")
            .with(keys::WISHLIST, "42");

        let cart = CartStore::open(storage);
        assert!(cart.state().is_empty());
        assert!(cart.wishlist().is_empty());
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut cart = CartStore::open(BrokenStore);
        assert_eq!(cart.add_item(shirt(1), wash()), AddOutcome::Added);
        assert!(cart.toggle_wishlist(SHIRT));
        assert_eq!(cart.total_items(), 1);

        cart.clear_cart();
        assert!(cart.state().is_empty());
    }

    #[test]
    fn test_load_drops_out_of_range_line() {
        let stored = serde_json::json!({
            "version": 2,
            "services": {
                WASH: {
                    "service": { "name": "Wash & Iron" },
                    "items": [
                        { "id": SHIRT, "categoryId": TOPS, "name": "Gold", "price": 5e28, "quantity": 2 },
                        { "id": TROUSERS, "categoryId": TOPS, "name": "Trousers", "price": 7, "quantity": 1 }
                    ]
                }
            }
        });
        let cart = CartStore::open(MemoryStore::new().with(keys::CART, stored.to_string()));

        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.subtotal(), Decimal::from(7));
        assert_eq!(cart.total(), Decimal::new(847, 2));
    }

    #[test]
    fn test_add_item_refuses_amount_overflow() {
        let mut cart = CartStore::open(MemoryStore::new());
        let _ = cart.add_item(shirt(1), wash());
        let before = cart.state().clone();

        let gold = LineInput::new(
            TROUSERS,
            TOPS,
            "Gold trousers",
            Some(Decimal::from_scientific("5e28").unwrap()),
            2,
        );
        assert_eq!(
            cart.add_item(gold, wash()),
            AddOutcome::Rejected(RejectReason::AmountOverflow)
        );
        assert_eq!(cart.state(), &before);
        assert_eq!(cart.total(), Decimal::new(605, 2));
    }

    #[test]
    fn test_refused_quantity_change_is_not_persisted() {
        let big = LineInput::new(SHIRT, TOPS, "Shirt", Some(Decimal::from_scientific("1e26").unwrap()), 1);
        let mut cart = CartStore::open(MemoryStore::new());
        let _ = cart.add_item(big, wash());
        let stored = cart.storage().raw(keys::CART).unwrap().to_owned();

        let (service_id, item_id) = ids();
        assert_eq!(
            cart.update_quantity(&service_id, &item_id, 1000),
            QuantityChange::AmountOverflow
        );
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.storage().raw(keys::CART), Some(stored.as_str()));
    }
}
