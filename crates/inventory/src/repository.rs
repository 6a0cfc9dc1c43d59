//! Remote product store seam.
//!
//! The dashboard never owns product state: it lists, creates, patches and
//! deletes through a [`ProductRepository`]. The HTTP implementation lives in
//! the dashboard crate; [`crate::in_memory::InMemoryProductRepository`] backs
//! tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockdash_core::ProductId;
use stockdash_products::{Product, ProductDraft};

use crate::filter::{CategorySelector, ProductFilter};

/// Failure of a repository call. Nothing is retried automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// Transport-level failure, no response received.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response, with the raw body text.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The store rejected the payload (e.g. duplicate id).
    #[error("rejected by the store: {0}")]
    Validation(String),

    /// A success response whose body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn not_found(id: &ProductId) -> Self {
        Self::api(404, format!("product {id} not found"))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Parameters of a list call (`GET /products`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub query: String,
    pub category: CategorySelector,
    pub low_stock: bool,
}

impl ListQuery {
    /// Request parameters in wire form. Empty query, the "all" category and a
    /// false low-stock flag are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.query.is_empty() {
            params.push(("query", self.query.clone()));
        }
        if let Some(category) = self.category.as_named() {
            params.push(("category", category.to_string()));
        }
        if self.low_stock {
            params.push(("lowStock", "true".to_string()));
        }
        params
    }

    pub fn as_filter(&self) -> ProductFilter {
        ProductFilter::new(self.query.clone(), self.category.clone(), self.low_stock)
    }
}

impl From<&ProductFilter> for ListQuery {
    fn from(filter: &ProductFilter) -> Self {
        Self {
            query: filter.query.clone(),
            category: filter.category.clone(),
            low_stock: filter.only_low,
        }
    }
}

/// Body of `PATCH /products/{id}/stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub delta: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StockChange {
    pub fn new(delta: i64) -> Self {
        Self { delta, note: None }
    }

    /// Attach a note; blank notes are dropped.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }
}

/// Remote product store.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Current matching set, in server order.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RepositoryError>;

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError>;

    /// Persist a draft; the store may assign `id`/`createdAt`.
    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    /// Relative quantity change. The store is authoritative on the
    /// non-negative check and returns the new state.
    async fn update_stock(
        &self,
        id: &ProductId,
        change: &StockChange,
    ) -> Result<Product, RepositoryError>;

    /// Full update.
    async fn replace(&self, id: &ProductId, product: &Product) -> Result<Product, RepositoryError>;

    /// Deletion; an already absent id fails with `Api { status: 404, .. }`.
    async fn remove(&self, id: &ProductId) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<R> ProductRepository for std::sync::Arc<R>
where
    R: ProductRepository + ?Sized,
{
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RepositoryError> {
        (**self).list(query).await
    }

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        (**self).get(id).await
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        (**self).create(draft).await
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        change: &StockChange,
    ) -> Result<Product, RepositoryError> {
        (**self).update_stock(id, change).await
    }

    async fn replace(&self, id: &ProductId, product: &Product) -> Result<Product, RepositoryError> {
        (**self).replace(id, product).await
    }

    async fn remove(&self, id: &ProductId) -> Result<(), RepositoryError> {
        (**self).remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_query_sends_no_params() {
        assert!(ListQuery::default().to_params().is_empty());
    }

    #[test]
    fn params_are_in_wire_form() {
        let query = ListQuery {
            query: "çanta ".into(),
            category: CategorySelector::Named("Aksesuar".into()),
            low_stock: true,
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("query", "çanta ".to_string()),
                ("category", "Aksesuar".to_string()),
                ("lowStock", "true".to_string()),
            ]
        );
    }

    #[test]
    fn stock_change_omits_blank_note() {
        let change = StockChange::new(-3).with_note(Some("  ".into()));
        assert_eq!(serde_json::to_value(&change).unwrap(), serde_json::json!({ "delta": -3 }));

        let change = StockChange::new(4).with_note(Some("sayım".into()));
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({ "delta": 4, "note": "sayım" })
        );
    }

    #[test]
    fn filter_and_query_convert_both_ways() {
        let filter = ProductFilter::new("x", CategorySelector::Named("A".into()), true);
        let query = ListQuery::from(&filter);
        assert_eq!(query.as_filter(), filter);
    }
}
