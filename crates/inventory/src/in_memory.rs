//! In-memory product repository for tests/dev.
//!
//! Behaves like the remote store: assigns ids and timestamps, enforces id
//! uniqueness and non-negative stock, answers unknown ids with 404. Every
//! call is recorded, and failures can be injected per call kind or per id.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use stockdash_core::ProductId;
use stockdash_products::{Product, ProductDraft};

use crate::repository::{ListQuery, ProductRepository, RepositoryError, StockChange};

/// Kind of repository call, for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryCall {
    List,
    Get,
    Create,
    UpdateStock,
    Replace,
    Remove,
}

impl RepositoryCall {
    fn is_mutation(self) -> bool {
        !matches!(self, RepositoryCall::List | RepositoryCall::Get)
    }
}

#[derive(Debug, Default)]
struct State {
    products: Vec<Product>,
    calls: Vec<RepositoryCall>,
    queued_failures: HashMap<RepositoryCall, VecDeque<RepositoryError>>,
    failing_ids: HashMap<ProductId, RepositoryError>,
}

/// In-memory [`ProductRepository`].
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    state: Mutex<State>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records (kept in the given order).
    pub fn with_products(products: Vec<Product>) -> Self {
        let repo = Self::new();
        repo.lock().products = products;
        repo
    }

    /// Fail the next call of `call` kind with `error`.
    pub fn fail_next(&self, call: RepositoryCall, error: RepositoryError) {
        self.lock().queued_failures.entry(call).or_default().push_back(error);
    }

    /// Fail every mutating call targeting `id` until [`clear_failures`](Self::clear_failures).
    pub fn fail_for_id(&self, id: ProductId, error: RepositoryError) {
        self.lock().failing_ids.insert(id, error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.queued_failures.clear();
        state.failing_ids.clear();
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: RepositoryCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Calls that would have hit the network as writes.
    pub fn mutation_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Stored records, in store order.
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    pub fn stock_of(&self, id: &ProductId) -> Option<u64> {
        self.lock().products.iter().find(|p| p.id == *id).map(|p| p.stock)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and return an injected failure, if any.
    fn begin(
        &self,
        call: RepositoryCall,
        id: Option<&ProductId>,
    ) -> Result<std::sync::MutexGuard<'_, State>, RepositoryError> {
        let mut state = self.lock();
        state.calls.push(call);

        if let Some(err) = state.queued_failures.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if call.is_mutation() {
            if let Some(err) = id.and_then(|id| state.failing_ids.get(id)) {
                return Err(err.clone());
            }
        }
        Ok(state)
    }
}

impl State {
    fn position(&self, id: &ProductId) -> Result<usize, RepositoryError> {
        self.products
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| RepositoryError::not_found(id))
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RepositoryError> {
        let state = self.begin(RepositoryCall::List, None)?;
        let filter = query.as_filter();
        Ok(filter.apply(&state.products).into_iter().cloned().collect())
    }

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let state = self.begin(RepositoryCall::Get, Some(id))?;
        let pos = state.position(id)?;
        Ok(state.products[pos].clone())
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut state = self.begin(RepositoryCall::Create, draft.id.as_ref())?;

        let mut draft = draft.clone();
        if draft.id.is_none() {
            draft.id = Some(ProductId::generate());
        }
        if let Some(id) = &draft.id {
            if state.products.iter().any(|p| p.id == *id) {
                return Err(RepositoryError::Validation(format!("product id {id} already exists")));
            }
        }

        let product = draft
            .into_product(Utc::now())
            .map_err(|e| RepositoryError::Validation(e.to_string()))?;
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        change: &StockChange,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.begin(RepositoryCall::UpdateStock, Some(id))?;
        let pos = state.position(id)?;

        let product = &mut state.products[pos];
        let next = product
            .stock_after(change.delta)
            .ok_or_else(|| RepositoryError::api(400, "stock cannot go negative"))?;
        product.stock = next;
        Ok(product.clone())
    }

    async fn replace(&self, id: &ProductId, product: &Product) -> Result<Product, RepositoryError> {
        let mut state = self.begin(RepositoryCall::Replace, Some(id))?;
        let pos = state.position(id)?;
        product
            .validate()
            .map_err(|e| RepositoryError::api(400, e.to_string()))?;

        let existing = &mut state.products[pos];
        let created_at = existing.created_at;
        *existing = Product {
            id: id.clone(),
            created_at,
            ..product.clone()
        };
        Ok(existing.clone())
    }

    async fn remove(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let mut state = self.begin(RepositoryCall::Remove, Some(id))?;
        let pos = state.position(id)?;
        state.products.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CategorySelector;
    use crate::testing::product;

    fn id(s: &str) -> ProductId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn list_applies_the_query_server_side() {
        let repo =
            InMemoryProductRepository::with_products(vec![product("a", 0, 5), product("b", 9, 5)]);
        let all = repo.list(&ListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let low = repo
            .list(&ListQuery {
                low_stock: true,
                category: CategorySelector::All,
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, id("a"));
    }

    #[tokio::test]
    async fn create_assigns_id_and_rejects_duplicates() {
        let repo = InMemoryProductRepository::new();
        let created = repo.create(&ProductDraft::new("Kalem", "Kırtasiye")).await.unwrap();
        assert!(!created.id.as_str().is_empty());

        let draft = ProductDraft::new("Kalem", "Kırtasiye").with_id(created.id.clone());
        let err = repo.create(&draft).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[tokio::test]
    async fn update_stock_is_authoritative_on_negative_results() {
        let repo = InMemoryProductRepository::with_products(vec![product("a", 5, 2)]);
        let err = repo.update_stock(&id("a"), &StockChange::new(-6)).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(repo.stock_of(&id("a")), Some(5));

        let updated = repo.update_stock(&id("a"), &StockChange::new(-5)).await.unwrap();
        assert_eq!(updated.stock, 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_404() {
        let repo = InMemoryProductRepository::new();
        assert_eq!(repo.get(&id("x")).await.unwrap_err().status(), Some(404));
        assert_eq!(repo.remove(&id("x")).await.unwrap_err().status(), Some(404));
        assert_eq!(
            repo.update_stock(&id("x"), &StockChange::new(1)).await.unwrap_err().status(),
            Some(404)
        );
    }

    #[tokio::test]
    async fn replace_keeps_created_at_and_path_id() {
        let original = product("a", 5, 2);
        let repo = InMemoryProductRepository::with_products(vec![original.clone()]);
        let edited = Product {
            name: "Renamed".into(),
            created_at: crate::testing::at(9),
            ..original.clone()
        };
        let stored = repo.replace(&id("a"), &edited).await.unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.created_at, original.created_at);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let repo = InMemoryProductRepository::with_products(vec![product("a", 5, 2)]);
        repo.fail_next(RepositoryCall::List, RepositoryError::Network("down".into()));
        assert!(matches!(
            repo.list(&ListQuery::default()).await,
            Err(RepositoryError::Network(_))
        ));
        assert!(repo.list(&ListQuery::default()).await.is_ok());
        assert_eq!(repo.call_count(RepositoryCall::List), 2);
    }

    #[tokio::test]
    async fn id_failures_only_hit_mutations() {
        let repo = InMemoryProductRepository::with_products(vec![product("a", 5, 2)]);
        repo.fail_for_id(id("a"), RepositoryError::api(500, "boom"));
        assert!(repo.get(&id("a")).await.is_ok());
        assert!(repo.update_stock(&id("a"), &StockChange::new(1)).await.is_err());
        assert_eq!(repo.mutation_count(), 1);

        repo.clear_failures();
        assert!(repo.update_stock(&id("a"), &StockChange::new(1)).await.is_ok());
    }
}
