//! Wishlisted item IDs.

use serde::{Deserialize, Serialize};

/// Ordered set of wishlisted item IDs.
///
/// IDs are opaque strings and are not validated. Insertion order is kept so
/// the list reads back the way the customer built it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<String>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a stored list, dropping repeats.
    #[must_use]
    pub fn from_stored(items: Vec<String>) -> Self {
        let mut wishlist = Self::new();
        for item in items {
            if !wishlist.contains(&item) {
                wishlist.items.push(item);
            }
        }
        wishlist
    }

    /// Add the item if absent, remove it if present.
    ///
    /// Returns `true` if the item is wishlisted afterwards.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if let Some(index) = self.items.iter().position(|id| id == item_id) {
            self.items.remove(index);
            false
        } else {
            self.items.push(item_id.to_owned());
            true
        }
    }

    #[must_use]
    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|id| id == item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::new();
        assert!(wishlist.toggle("a"));
        assert!(wishlist.toggle("b"));
        assert!(wishlist.contains("a"));

        assert!(!wishlist.toggle("a"));
        assert!(!wishlist.contains("a"));
        assert_eq!(wishlist.iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_from_stored_drops_repeats() {
        let wishlist = Wishlist::from_stored(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(wishlist.len(), 2);
        assert_eq!(wishlist.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
