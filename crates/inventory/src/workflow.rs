//! Mutation workflows: stock adjustments (single and batch) and product CRUD.
//!
//! Every workflow validates locally first, writes through the repository,
//! and only then reconciles the [`ProductStore`] with the record the
//! repository returned. A failed step leaves the store untouched.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use stockdash_core::{DomainError, DomainResult, ProductId};
use stockdash_products::{Product, ProductDraft};

use crate::repository::{ListQuery, ProductRepository, RepositoryError, StockChange};
use crate::store::ProductStore;

/// Error of an inventory workflow.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InventoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The target id is not in the local collection.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),
}

impl InventoryError {
    pub fn is_negative_stock(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_negative_stock())
    }
}

/// Requested quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Signed change relative to the current stock.
    Delta(i64),
    /// Absolute target quantity, converted to a delta against current stock.
    SetTo(u64),
}

impl StockAdjustment {
    /// Delta to apply on top of `current`.
    pub fn delta_from(&self, current: u64) -> DomainResult<i64> {
        match *self {
            StockAdjustment::Delta(delta) => Ok(delta),
            StockAdjustment::SetTo(target) => {
                let delta = i128::from(target) - i128::from(current);
                i64::try_from(delta)
                    .map_err(|_| DomainError::validation("stock change is out of range"))
            }
        }
    }
}

/// Parse a delta typed into the stock form (`"+5"`, `"-3"`, `" 12 "`).
pub fn parse_delta(input: &str) -> DomainResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("stock change cannot be empty"));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| DomainError::validation(format!("not a whole number: {trimmed}")))
}

/// Lifecycle of a single stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Committed,
    Rejected,
}

/// One stock mutation request.
///
/// `Idle -> Validating -> Submitting -> Committed | Rejected`. A negative
/// resulting stock is rejected during validation, before any network call.
#[derive(Debug, Clone)]
pub struct StockMutation {
    product_id: ProductId,
    adjustment: StockAdjustment,
    note: Option<String>,
    state: MutationState,
}

impl StockMutation {
    pub fn new(product_id: ProductId, adjustment: StockAdjustment) -> Self {
        Self {
            product_id,
            adjustment,
            note: None,
            state: MutationState::Idle,
        }
    }

    pub fn delta(product_id: ProductId, delta: i64) -> Self {
        Self::new(product_id, StockAdjustment::Delta(delta))
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Validate against the current local stock and build the request body.
    pub fn validate(&mut self, store: &ProductStore) -> Result<StockChange, InventoryError> {
        self.transition(MutationState::Validating);
        let current = store
            .get(&self.product_id)
            .map(|p| p.stock)
            .ok_or_else(|| InventoryError::UnknownProduct(self.product_id.clone()));
        match current.and_then(|stock| self.change_from(stock)) {
            Ok(change) => Ok(change),
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Validate, submit, and apply the server-returned record on success.
    pub async fn run<R>(
        &mut self,
        store: &ProductStore,
        repo: &R,
    ) -> Result<Product, InventoryError>
    where
        R: ProductRepository + ?Sized,
    {
        let change = self.validate(store)?;
        self.submit(store, repo, &change).await
    }

    /// Send an already validated change. Once the repository accepts it the
    /// mutation is committed, whether or not the local copy could follow.
    async fn submit<R>(
        &mut self,
        store: &ProductStore,
        repo: &R,
        change: &StockChange,
    ) -> Result<Product, InventoryError>
    where
        R: ProductRepository + ?Sized,
    {
        self.transition(MutationState::Submitting);
        let updated = match repo.update_stock(&self.product_id, change).await {
            Ok(product) => product,
            Err(err) => {
                tracing::error!(product_id = %self.product_id, error = %err, "stock update failed");
                return Err(self.reject(err.into()));
            }
        };

        // The collection may have changed while the request was in flight.
        if let Err(err) = store.replace(&self.product_id, updated.clone()) {
            tracing::warn!(
                product_id = %self.product_id,
                error = %err,
                "stock update committed but local copy is out of date"
            );
        }
        self.transition(MutationState::Committed);
        tracing::info!(
            product_id = %self.product_id,
            delta = change.delta,
            stock = updated.stock,
            "stock updated"
        );
        Ok(updated)
    }

    fn change_from(&self, current: u64) -> Result<StockChange, InventoryError> {
        let delta = self.adjustment.delta_from(current)?;
        if current.checked_add_signed(delta).is_none() {
            return Err(DomainError::NegativeStock {
                product_id: self.product_id.to_string(),
                current,
                delta,
            }
            .into());
        }
        Ok(StockChange::new(delta).with_note(self.note.clone()))
    }

    fn transition(&mut self, next: MutationState) {
        tracing::debug!(
            product_id = %self.product_id,
            from = ?self.state,
            to = ?next,
            "stock mutation"
        );
        self.state = next;
    }

    fn reject(&mut self, err: InventoryError) -> InventoryError {
        if matches!(err, InventoryError::Domain(_) | InventoryError::UnknownProduct(_)) {
            tracing::warn!(product_id = %self.product_id, error = %err, "stock mutation rejected");
        }
        self.transition(MutationState::Rejected);
        err
    }
}

/// Failure of a [`BatchStockUpdate`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BatchError {
    /// Entry `index` failed validation; nothing was submitted.
    #[error("batch entry {index} rejected: {source}")]
    Validation {
        index: usize,
        #[source]
        source: InventoryError,
    },

    /// Submission of `failed_id` failed. Entries before it stay committed.
    #[error("batch halted at {failed_id} after {} committed entries: {source}", .committed.len())]
    Submission {
        committed: Vec<Product>,
        failed_id: ProductId,
        #[source]
        source: InventoryError,
    },
}

/// A batch of per-product stock changes.
///
/// The whole batch is validated before the first submission; an invalid
/// entry rejects the batch with zero network calls. Submission is sequential
/// and halts at the first failure without rolling back committed entries.
/// Entries that resolve to a zero change are not sent.
#[derive(Debug, Clone, Default)]
pub struct BatchStockUpdate {
    entries: Vec<StockMutation>,
}

impl BatchStockUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, mutation: StockMutation) -> Self {
        self.entries.push(mutation);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every entry, accumulating changes to the same product.
    pub fn validate(&self, store: &ProductStore) -> Result<Vec<StockChange>, BatchError> {
        let mut projected: HashMap<ProductId, u64> = HashMap::new();
        let mut changes = Vec::with_capacity(self.entries.len());

        for (index, entry) in self.entries.iter().enumerate() {
            let current = match projected.get(&entry.product_id) {
                Some(stock) => *stock,
                None => store
                    .get(&entry.product_id)
                    .map(|p| p.stock)
                    .ok_or_else(|| BatchError::Validation {
                        index,
                        source: InventoryError::UnknownProduct(entry.product_id.clone()),
                    })?,
            };
            let change = entry
                .change_from(current)
                .map_err(|source| BatchError::Validation { index, source })?;
            // change_from already proved this stays non-negative
            projected.insert(entry.product_id.clone(), current.saturating_add_signed(change.delta));
            changes.push(change);
        }
        Ok(changes)
    }

    /// Validate everything, then submit entry by entry.
    pub async fn run<R>(self, store: &ProductStore, repo: &R) -> Result<Vec<Product>, BatchError>
    where
        R: ProductRepository + ?Sized,
    {
        let changes = self.validate(store).inspect_err(|err| {
            tracing::warn!(error = %err, "batch stock update rejected");
        })?;

        let mut committed = Vec::with_capacity(changes.len());
        for (mut entry, change) in self.entries.into_iter().zip(&changes) {
            if change.delta == 0 {
                tracing::debug!(product_id = %entry.product_id, "skipping zero stock change");
                continue;
            }
            match entry.submit(store, repo, change).await {
                Ok(updated) => committed.push(updated),
                Err(source) => {
                    tracing::error!(
                        product_id = %entry.product_id,
                        committed = committed.len(),
                        error = %source,
                        "batch stock update halted"
                    );
                    return Err(BatchError::Submission {
                        committed,
                        failed_id: entry.product_id,
                        source,
                    });
                }
            }
        }

        tracing::info!(entries = committed.len(), "batch stock update committed");
        Ok(committed)
    }
}

/// Replace the local collection with the repository's current listing.
/// Returns the number of records now held.
pub async fn reload<R>(
    store: &ProductStore,
    repo: &R,
    query: &ListQuery,
) -> Result<usize, InventoryError>
where
    R: ProductRepository + ?Sized,
{
    let items = repo.list(query).await.inspect_err(|err| {
        tracing::error!(error = %err, "product list failed");
    })?;
    store.reload(items);
    Ok(store.len())
}

/// Create a product and put the confirmed record at the front.
pub async fn add_product<R>(
    store: &ProductStore,
    repo: &R,
    draft: ProductDraft,
) -> Result<Product, InventoryError>
where
    R: ProductRepository + ?Sized,
{
    let draft = draft.prepare(Utc::now())?;
    let created = repo.create(&draft).await.inspect_err(|err| {
        tracing::error!(name = %draft.name, error = %err, "product create failed");
    })?;

    match store.insert(created.clone()) {
        Ok(()) => {}
        // a reload finished first and already holds the record
        Err(DomainError::DuplicateId(_)) => {
            store.replace(&created.id, created.clone())?;
        }
        Err(err) => return Err(err.into()),
    }
    tracing::info!(product_id = %created.id, "product created");
    Ok(created)
}

/// Full update of an existing product. `id` and `createdAt` of the stored
/// record are kept whatever `product` carries.
pub async fn edit_product<R>(
    store: &ProductStore,
    repo: &R,
    id: &ProductId,
    product: Product,
) -> Result<Product, InventoryError>
where
    R: ProductRepository + ?Sized,
{
    let existing = store
        .get(id)
        .ok_or_else(|| InventoryError::UnknownProduct(id.clone()))?;
    let product = Product {
        id: id.clone(),
        created_at: existing.created_at,
        ..product
    };
    product.validate()?;

    let updated = repo.replace(id, &product).await.inspect_err(|err| {
        tracing::error!(product_id = %id, error = %err, "product update failed");
    })?;
    store.replace(id, updated.clone())?;
    tracing::info!(product_id = %id, "product updated");
    Ok(updated)
}

/// Delete remotely, then drop the local record.
pub async fn delete_product<R>(
    store: &ProductStore,
    repo: &R,
    id: &ProductId,
) -> Result<(), InventoryError>
where
    R: ProductRepository + ?Sized,
{
    repo.remove(id).await.inspect_err(|err| {
        tracing::error!(product_id = %id, error = %err, "product delete failed");
    })?;
    store.remove(id);
    tracing::info!(product_id = %id, "product deleted");
    Ok(())
}
