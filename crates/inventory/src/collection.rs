//! Local product collection: the in-memory source of truth for the dashboard.

use std::collections::HashSet;

use stockdash_core::{DomainError, DomainResult, ProductId};
use stockdash_products::Product;

/// Ordered, id-unique list of products.
///
/// Order is the display order: server order after a reload, newest first
/// for locally inserted records. Every mutation bumps [`revision`](Self::revision).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCollection {
    items: Vec<Product>,
    revision: u64,
}

impl ProductCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a server listing (see [`reload`](Self::reload)).
    pub fn from_items(items: Vec<Product>) -> Self {
        let mut collection = Self::new();
        collection.reload(items);
        collection
    }

    /// Atomically replace the whole collection, keeping the given order.
    ///
    /// A repeated id keeps its first occurrence. Returns the number of
    /// records dropped that way.
    pub fn reload(&mut self, items: Vec<Product>) -> usize {
        let mut seen = HashSet::with_capacity(items.len());
        let total = items.len();
        let items: Vec<Product> = items
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();
        let dropped = total - items.len();
        if dropped > 0 {
            tracing::warn!(dropped, "reload listing contained duplicate product ids");
        }

        self.items = items;
        self.revision += 1;
        dropped
    }

    /// Insert a new record at the front (most recent first).
    pub fn insert(&mut self, item: Product) -> DomainResult<()> {
        if self.contains(&item.id) {
            return Err(DomainError::duplicate_id(item.id.as_str()));
        }
        self.items.insert(0, item);
        self.revision += 1;
        Ok(())
    }

    /// Replace the record with `id` in place.
    ///
    /// Returns `Ok(false)` (and changes nothing) when `id` is absent. Fails
    /// when `item` carries a different id that another record already uses.
    pub fn replace(&mut self, id: &ProductId, item: Product) -> DomainResult<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        if item.id != *id && self.contains(&item.id) {
            return Err(DomainError::duplicate_id(item.id.as_str()));
        }
        self.items[pos] = item;
        self.revision += 1;
        Ok(true)
    }

    /// Remove the record with `id`, returning it when present.
    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        let pos = self.position(id)?;
        self.revision += 1;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.items.iter().find(|p| p.id == *id)
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.position(id).is_some()
    }

    pub fn as_slice(&self) -> &[Product] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|p| p.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::product;

    fn ids(c: &ProductCollection) -> Vec<&str> {
        c.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn reload_preserves_server_order_and_dedupes() {
        let mut c = ProductCollection::new();
        let dropped = c.reload(vec![
            product("b", 1, 0),
            product("a", 2, 0),
            product("b", 9, 0),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(ids(&c), vec!["b", "a"]);
        assert_eq!(c.get(&"b".parse().unwrap()).unwrap().stock, 1);
    }

    #[test]
    fn insert_goes_to_the_front_and_rejects_duplicates() {
        let mut c = ProductCollection::from_items(vec![product("a", 1, 0)]);
        c.insert(product("b", 1, 0)).unwrap();
        assert_eq!(ids(&c), vec!["b", "a"]);

        let err = c.insert(product("a", 5, 0)).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId(_)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn replace_is_a_no_op_for_unknown_ids() {
        let mut c = ProductCollection::from_items(vec![product("a", 1, 0)]);
        let before = c.clone();
        assert!(!c.replace(&"zzz".parse().unwrap(), product("zzz", 4, 0)).unwrap());
        assert_eq!(c, before);
    }

    #[test]
    fn replace_keeps_position() {
        let mut c = ProductCollection::from_items(vec![
            product("a", 1, 0),
            product("b", 1, 0),
            product("c", 1, 0),
        ]);
        assert!(c.replace(&"b".parse().unwrap(), product("b", 42, 0)).unwrap());
        assert_eq!(ids(&c), vec!["a", "b", "c"]);
        assert_eq!(c.as_slice()[1].stock, 42);
    }

    #[test]
    fn replace_refuses_to_collide_with_another_id() {
        let mut c = ProductCollection::from_items(vec![product("a", 1, 0), product("b", 1, 0)]);
        let err = c.replace(&"a".parse().unwrap(), product("b", 3, 0)).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId(_)));
    }

    #[test]
    fn remove_returns_the_record() {
        let mut c = ProductCollection::from_items(vec![product("a", 1, 0), product("b", 1, 0)]);
        let removed = c.remove(&"a".parse().unwrap()).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(ids(&c), vec!["b"]);
        assert!(c.remove(&"a".parse().unwrap()).is_none());
    }

    #[test]
    fn revision_moves_only_on_mutation() {
        let mut c = ProductCollection::new();
        let r0 = c.revision();
        c.reload(vec![product("a", 1, 0)]);
        let r1 = c.revision();
        assert!(r1 > r0);

        c.remove(&"missing".parse().unwrap());
        c.replace(&"missing".parse().unwrap(), product("missing", 1, 0)).unwrap();
        assert_eq!(c.revision(), r1);
    }
}
