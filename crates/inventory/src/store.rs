//! Shared handle to the local product collection.

use std::sync::{Arc, PoisonError, RwLock};

use stockdash_core::{DomainResult, ProductId};
use stockdash_products::Product;

use crate::collection::ProductCollection;

/// Injectable store owned by the application shell.
///
/// Cloning yields another handle to the same collection. The lock is never
/// held across an `.await`: callers read a value out, suspend, and re-read
/// afterwards instead of keeping a snapshot alive.
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    inner: Arc<RwLock<ProductCollection>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Product>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProductCollection::from_items(items))),
        }
    }

    pub fn reload(&self, items: Vec<Product>) -> usize {
        self.write(|c| c.reload(items))
    }

    pub fn insert(&self, item: Product) -> DomainResult<()> {
        self.write(|c| c.insert(item))
    }

    pub fn replace(&self, id: &ProductId, item: Product) -> DomainResult<bool> {
        self.write(|c| c.replace(id, item))
    }

    pub fn remove(&self, id: &ProductId) -> Option<Product> {
        self.write(|c| c.remove(id))
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.read(|c| c.get(id).cloned())
    }

    /// Owned copy of the current records, in display order.
    pub fn snapshot(&self) -> Vec<Product> {
        self.read(|c| c.as_slice().to_vec())
    }

    pub fn len(&self) -> usize {
        self.read(ProductCollection::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(ProductCollection::is_empty)
    }

    pub fn revision(&self) -> u64 {
        self.read(ProductCollection::revision)
    }

    /// Run a read-only computation against the current collection.
    pub fn read<T>(&self, f: impl FnOnce(&ProductCollection) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut ProductCollection) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
