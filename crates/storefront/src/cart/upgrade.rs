//! Migration of persisted cart documents.
//!
//! The stored document is untrusted: it may come from an older storefront,
//! a hand-edited file or a half-written slot. [`upgrade`] turns any JSON value
//! into a [`CartState`] that satisfies the cart invariants, keeping as much of
//! the input as it can and logging everything it drops.
//!
//! Two shapes are understood:
//!
//! - version 1: the bare `{ "<serviceId>": { "service": .., "items": [..] } }`
//!   map written by the web storefront;
//! - version 2: `{ "version": 2, "services": <version 1 map> }`, written by
//!   [`encode`].

use eazyy_core::{CategoryId, ItemId, ServiceId};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::model::{AddOutcome, CartLine, CartState, ServiceDescriptor};

/// Version written by [`encode`].
pub const CART_SCHEMA_VERSION: u64 = 2;

/// Serialize a cart into the current envelope.
#[must_use]
pub fn encode(state: &CartState) -> Value {
    json!({
        "version": CART_SCHEMA_VERSION,
        "services": state,
    })
}

/// Upgrade any JSON value to a valid cart. Never fails.
#[must_use]
pub fn upgrade(raw: &Value) -> CartState {
    let Some(object) = raw.as_object() else {
        if !raw.is_null() {
            warn!("Stored cart is not an object, starting empty");
        }
        return CartState::new();
    };

    match envelope_version(object) {
        None => prune(object),
        Some(CART_SCHEMA_VERSION) => match object.get("services").and_then(Value::as_object) {
            Some(services) => prune(services),
            None => {
                warn!("Stored cart envelope has no services map, starting empty");
                CartState::new()
            }
        },
        Some(version) => {
            warn!(version, "Unknown cart schema version, starting empty");
            CartState::new()
        }
    }
}

/// The envelope version, or `None` for a bare version 1 map.
///
/// Version 1 keys are service UUIDs, so a numeric `version` next to a
/// `services` key can only be an envelope.
fn envelope_version(object: &Map<String, Value>) -> Option<u64> {
    if !object.contains_key("services") {
        return None;
    }
    object.get("version").and_then(Value::as_u64)
}

/// Service descriptor as stored: only the display fields are trusted, the ID
/// always comes from the bucket's key.
#[derive(Deserialize)]
struct StoredService {
    #[serde(default)]
    name: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    color: String,
}

fn prune(services: &Map<String, Value>) -> CartState {
    let mut state = CartState::new();

    for (key, entry) in services {
        let Ok(service_id) = ServiceId::parse(key) else {
            warn!(service_id = %key, "Skipping invalid service ID");
            continue;
        };

        let Some((service, items)) = service_entry(service_id, entry) else {
            continue;
        };

        // Lines go through add_line, so duplicates merge (also across keys
        // that differ only in case) and out-of-range amounts are refused.
        let mut kept = 0_usize;
        for raw in items {
            let Some(line) = prune_line(service_id, raw) else {
                continue;
            };
            let item_id = line.item_id;
            match state.add_line(service.clone(), line) {
                AddOutcome::Rejected(reason) => {
                    warn!(%service_id, %item_id, %reason, "Skipping item");
                }
                AddOutcome::Added | AddOutcome::Merged { .. } => kept += 1,
            }
        }
        if kept == 0 {
            warn!(%service_id, "Dropping service with no valid items");
        }
    }

    state
}

fn service_entry(service_id: ServiceId, entry: &Value) -> Option<(ServiceDescriptor, &[Value])> {
    let service = entry
        .get("service")
        .filter(|s| s.is_object())
        .and_then(|s| StoredService::deserialize(s).ok());
    let items = entry.get("items").and_then(Value::as_array);

    let (Some(service), Some(items)) = (service, items) else {
        warn!(%service_id, "Invalid service data, skipping");
        return None;
    };

    Some((
        ServiceDescriptor {
            id: service_id,
            name: service.name,
            icon: service.icon,
            color: service.color,
        },
        items.as_slice(),
    ))
}

fn prune_line(service_id: ServiceId, raw: &Value) -> Option<CartLine> {
    let item_id = raw
        .get("id")
        .or_else(|| raw.get("itemId"))
        .and_then(Value::as_str);
    let Some(item_id) = item_id.filter(|id| ItemId::parse(id).is_ok()) else {
        warn!(%service_id, "Skipping invalid item ID");
        return None;
    };

    let category_ok = raw
        .get("categoryId")
        .and_then(Value::as_str)
        .is_some_and(|id| CategoryId::parse(id).is_ok());
    if !category_ok {
        warn!(%service_id, item_id, "Invalid categoryId, skipping item");
        return None;
    }

    match CartLine::deserialize(raw) {
        Ok(line) if line.quantity == 0 => {
            warn!(%service_id, item_id, "Skipping item with zero quantity");
            None
        }
        Ok(line) if line.line_total().is_none() => {
            warn!(%service_id, item_id, "Skipping item with out-of-range amount");
            None
        }
        Ok(line) => Some(line),
        Err(e) => {
            warn!(%service_id, item_id, error = %e, "Skipping malformed item");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const SERVICE: &str = "6f1c2d3e-4a5b-4c6d-8e7f-901234567890";
    const OTHER_SERVICE: &str = "0a0b0c0d-1e1f-4a2b-9c3d-4e5f6a7b8c9d";
    const SHIRT: &str = "11111111-2222-4333-8444-555555555555";
    const TROUSERS: &str = "99999999-8888-4777-a666-555555555555";
    const TOPS: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    fn legacy_cart() -> Value {
        json!({
            SERVICE: {
                "service": { "id": SERVICE, "name": "Wash & Iron", "icon": "shirt", "color": "blue" },
                "items": [
                    { "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 2, "serviceId": SERVICE },
                    { "id": "shirt-1", "categoryId": TOPS, "name": "Bad", "price": 5, "quantity": 1 },
                    { "id": TROUSERS, "categoryId": "tops", "name": "Bad cat", "price": 7, "quantity": 1 }
                ]
            },
            "dry-cleaning": {
                "service": { "id": "dry-cleaning", "name": "Dry Cleaning" },
                "items": [{ "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 1 }]
            },
            OTHER_SERVICE: {
                "service": { "name": "Empty" },
                "items": [{ "id": "nope", "categoryId": TOPS, "name": "x", "price": 1, "quantity": 1 }]
            }
        })
    }

    #[test]
    fn test_upgrade_non_objects_is_empty() {
        for raw in [
            Value::Null,
            json!(42),
            json!("garbage"),
            json!([1, 2, 3]),
            json!({}),
        ] {
            assert!(upgrade(&raw).is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_upgrade_partially_recovers_legacy_cart() {
        let state = upgrade(&legacy_cart());

        assert_eq!(state.len(), 1);
        let bucket = state.bucket(&ServiceId::parse(SERVICE).unwrap()).unwrap();
        assert_eq!(bucket.service.name, "Wash & Iron");
        assert_eq!(bucket.items.len(), 1);
        assert_eq!(bucket.items[0].item_id.to_string(), SHIRT);
        assert_eq!(bucket.items[0].unit_price, Some(Decimal::from(5)));
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let once = upgrade(&legacy_cart());
        let twice = upgrade(&encode(&once));
        assert_eq!(once, twice);

        let bare = serde_json::to_value(&once).unwrap();
        assert_eq!(upgrade(&bare), once);
    }

    #[test]
    fn test_upgrade_drops_entries_missing_service_or_items() {
        let raw = json!({
            SERVICE: { "items": [] },
            OTHER_SERVICE: { "service": { "name": "x" }, "items": "not-a-list" }
        });
        assert!(upgrade(&raw).is_empty());
    }

    #[test]
    fn test_upgrade_service_id_comes_from_key() {
        let raw = json!({
            SERVICE: {
                "service": { "id": OTHER_SERVICE, "name": "Wash" },
                "items": [{ "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 1 }]
            }
        });
        let state = upgrade(&raw);
        let (key, bucket) = state.buckets().next().unwrap();
        assert_eq!(key, &bucket.service.id);
        assert_eq!(key.to_string(), SERVICE);
    }

    #[test]
    fn test_upgrade_merges_duplicates_and_drops_zero_quantity() {
        let raw = json!({
            SERVICE: {
                "service": { "name": "Wash" },
                "items": [
                    { "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 1 },
                    { "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 2 },
                    { "id": TROUSERS, "categoryId": TOPS, "name": "Trousers", "price": 7, "quantity": 0 }
                ]
            }
        });
        let state = upgrade(&raw);
        let bucket = state.bucket(&ServiceId::parse(SERVICE).unwrap()).unwrap();
        assert_eq!(bucket.items.len(), 1);
        assert_eq!(bucket.items[0].quantity, 3);
    }

    #[test]
    fn test_upgrade_unknown_version_is_empty() {
        let raw = json!({ "version": 99, "services": legacy_cart() });
        assert!(upgrade(&raw).is_empty());
    }

    #[test]
    fn test_encode_writes_envelope() {
        let state = upgrade(&legacy_cart());
        let encoded = encode(&state);

        assert_eq!(encoded["version"], json!(CART_SCHEMA_VERSION));
        assert_eq!(encoded["services"][SERVICE]["items"][0]["price"], json!(5.0));
        assert_eq!(upgrade(&encoded), state);
    }

    #[test]
    fn test_upgrade_drops_out_of_range_amounts() {
        let raw = json!({
            SERVICE: {
                "service": { "name": "Wash" },
                "items": [
                    { "id": SHIRT, "categoryId": TOPS, "name": "Gold shirt", "price": 5e28, "quantity": 2 },
                    { "id": TROUSERS, "categoryId": TOPS, "name": "Trousers", "price": 7, "quantity": 1 }
                ]
            },
            OTHER_SERVICE: {
                "service": { "name": "Carpets" },
                "items": [{ "id": SHIRT, "categoryId": TOPS, "name": "Rug", "price": 7e28, "quantity": 1 }]
            }
        });
        let state = upgrade(&raw);

        assert_eq!(state.len(), 1);
        let bucket = state.bucket(&ServiceId::parse(SERVICE).unwrap()).unwrap();
        assert_eq!(bucket.items.len(), 1);
        assert_eq!(bucket.items[0].name, "Trousers");
        assert!(state.checked_subtotal().is_some());
    }

    #[test]
    fn test_upgrade_merges_keys_differing_in_case() {
        let raw = json!({
            SERVICE: {
                "service": { "name": "Wash & Iron" },
                "items": [{ "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 1 }]
            },
            SERVICE.to_uppercase(): {
                "service": { "name": "WASH" },
                "items": [
                    { "id": SHIRT, "categoryId": TOPS, "name": "Shirt", "price": 5, "quantity": 2 },
                    { "id": TROUSERS, "categoryId": TOPS, "name": "Trousers", "price": 7, "quantity": 1 }
                ]
            }
        });
        let state = upgrade(&raw);

        assert_eq!(state.len(), 1);
        let bucket = state.bucket(&ServiceId::parse(SERVICE).unwrap()).unwrap();
        assert_eq!(bucket.items.len(), 2);
        assert_eq!(bucket.items[0].quantity, 3);
    }

    #[test]
    fn test_upgrade_keeps_line_without_name() {
        let raw = json!({
            SERVICE: {
                "service": { "name": "Wash" },
                "items": [{ "id": SHIRT, "categoryId": TOPS, "price": 5, "quantity": 1 }]
            }
        });
        let state = upgrade(&raw);
        let (_, line) = state.lines().next().unwrap();
        assert_eq!(line.name, "");
        assert_eq!(line.quantity, 1);
    }
}
