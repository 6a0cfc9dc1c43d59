//! Application shell: the single entry point views read and mutate through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::NaiveDate;

use stockdash_core::ProductId;
use stockdash_inventory::stats::{
    self, CategoryShare, GroupBreakdown, GroupDomain, InventorySummary,
};
use stockdash_inventory::{
    BatchError, BatchStockUpdate, CategorySelector, InventoryError, ListQuery, ProductFilter,
    ProductRepository, ProductStore, StockAdjustment, StockMutation, workflow,
};
use stockdash_products::{Product, ProductDraft};
use stockdash_reports::{ExportArtifact, ExportError, ExportKind, build_export};

use crate::config::DashboardConfig;
use crate::debounce::Debouncer;

const DEFAULT_TOP_N: usize = 5;
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Result of a list reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The response replaced the collection.
    Applied { ticket: u64, count: usize },
    /// A newer response was already applied; this one was discarded.
    Stale { ticket: u64, newest: u64 },
}

/// Monotonic tickets for list requests.
///
/// A response is applied only if no response to a later request has been
/// applied before it, so an old listing can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request about to be sent.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `apply` if `ticket` is newer than every applied ticket.
    /// Returns the newest applied ticket when `ticket` is stale.
    pub fn apply_if_newest<T>(&self, ticket: u64, apply: impl FnOnce() -> T) -> Result<T, u64> {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket <= *applied {
            return Err(*applied);
        }
        *applied = ticket;
        Ok(apply())
    }

    pub fn newest_applied(&self) -> u64 {
        *self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The parts a background reload needs, cheap to clone into a task.
struct Reloader<R> {
    store: ProductStore,
    repo: Arc<R>,
    filter: Arc<RwLock<ProductFilter>>,
    sequence: Arc<RequestSequence>,
}

impl<R> Clone for Reloader<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            repo: Arc::clone(&self.repo),
            filter: Arc::clone(&self.filter),
            sequence: Arc::clone(&self.sequence),
        }
    }
}

impl<R: ProductRepository> Reloader<R> {
    async fn reload(&self) -> Result<ReloadOutcome, InventoryError> {
        let query = ListQuery::from(&*self.filter.read().unwrap_or_else(PoisonError::into_inner));
        let ticket = self.sequence.issue();

        let items = self.repo.list(&query).await.inspect_err(|err| {
            tracing::error!(ticket, error = %err, "product list failed");
        })?;

        let received = items.len();
        match self.sequence.apply_if_newest(ticket, || self.store.reload(items)) {
            Ok(dropped) => {
                let count = received - dropped;
                tracing::info!(ticket, count, "product list reloaded");
                Ok(ReloadOutcome::Applied { ticket, count })
            }
            Err(newest) => {
                tracing::warn!(ticket, newest, "discarding stale product list response");
                Ok(ReloadOutcome::Stale { ticket, newest })
            }
        }
    }
}

/// Dashboard state and operations over one product repository.
///
/// Reads derive from the local [`ProductStore`]; writes go through the
/// repository first and are reconciled with what it returns.
pub struct Dashboard<R> {
    reloader: Reloader<R>,
    search: Mutex<Debouncer>,
    categories: GroupDomain,
    locations: GroupDomain,
    top_n: usize,
}

impl<R> Dashboard<R>
where
    R: ProductRepository + 'static,
{
    pub fn new(repo: R) -> Self {
        Self::with_shared(Arc::new(repo))
    }

    pub fn with_shared(repo: Arc<R>) -> Self {
        Self {
            reloader: Reloader {
                store: ProductStore::new(),
                repo,
                filter: Arc::new(RwLock::new(ProductFilter::default())),
                sequence: Arc::new(RequestSequence::new()),
            },
            search: Mutex::new(Debouncer::new(DEFAULT_DEBOUNCE)),
            categories: GroupDomain::Derived,
            locations: GroupDomain::Derived,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn from_config(repo: R, config: &DashboardConfig) -> Self {
        Self::new(repo)
            .with_categories(config.categories.clone())
            .with_locations(config.locations.clone())
            .with_top_n(config.top_n)
            .with_search_debounce(config.search_debounce)
    }

    pub fn with_categories(mut self, categories: GroupDomain) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_locations(mut self, locations: GroupDomain) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search = Mutex::new(Debouncer::new(delay));
        self
    }

    pub fn store(&self) -> &ProductStore {
        &self.reloader.store
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.reloader.repo
    }

    fn repo(&self) -> &R {
        &self.reloader.repo
    }

    pub fn filter(&self) -> ProductFilter {
        self.reloader.filter.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Fetch the listing for the current filter and replace the collection,
    /// unless a newer listing got there first.
    pub async fn reload(&self) -> Result<ReloadOutcome, InventoryError> {
        self.reloader.reload().await
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.edit_filter(|f| f.query = query);
    }

    pub fn set_category(&self, category: CategorySelector) {
        self.edit_filter(|f| f.category = category);
    }

    pub fn set_only_low(&self, only_low: bool) {
        self.edit_filter(|f| f.only_low = only_low);
    }

    /// Whether a debounced reload is waiting to fire.
    pub fn search_pending(&self) -> bool {
        self.search.lock().unwrap_or_else(PoisonError::into_inner).is_pending()
    }

    /// Apply `edit` to the filter and restart the search timer. Must be
    /// called from within a tokio runtime.
    fn edit_filter(&self, edit: impl FnOnce(&mut ProductFilter)) {
        {
            let mut filter = self.reloader.filter.write().unwrap_or_else(PoisonError::into_inner);
            edit(&mut filter);
        }

        let reloader = self.reloader.clone();
        let mut search = self.search.lock().unwrap_or_else(PoisonError::into_inner);
        search.schedule(async move {
            // failures are already logged by the reloader
            let _ = reloader.reload().await;
        });
    }

    /// Products passing the current filter, in display order.
    pub fn visible(&self) -> Vec<Product> {
        let filter = self.filter();
        self.store().read(|c| filter.apply(c.as_slice()).into_iter().cloned().collect())
    }

    pub fn summary(&self) -> InventorySummary {
        self.store().read(|c| InventorySummary::compute(c.as_slice()))
    }

    pub fn categories(&self) -> Vec<String> {
        self.store().read(|c| self.categories.categories(c.as_slice()))
    }

    pub fn locations(&self) -> Vec<String> {
        self.store().read(|c| self.locations.locations(c.as_slice()))
    }

    pub fn category_breakdown(&self) -> Vec<GroupBreakdown> {
        self.store().read(|c| {
            let products = c.as_slice();
            stats::category_breakdown(products, &self.categories.categories(products))
        })
    }

    pub fn location_breakdown(&self) -> Vec<GroupBreakdown> {
        self.store().read(|c| {
            let products = c.as_slice();
            stats::location_breakdown(products, &self.locations.locations(products))
        })
    }

    pub fn category_shares(&self) -> Vec<CategoryShare> {
        self.store().read(|c| {
            let products = c.as_slice();
            stats::category_shares(products, &self.categories.categories(products))
        })
    }

    pub fn top_value_items(&self) -> Vec<Product> {
        self.ranked(stats::top_value_items)
    }

    pub fn top_stock_items(&self) -> Vec<Product> {
        self.ranked(stats::top_stock_items)
    }

    pub fn lowest_stock_items(&self) -> Vec<Product> {
        self.ranked(stats::lowest_stock_items)
    }

    pub fn recent_items(&self) -> Vec<Product> {
        self.ranked(stats::recent_items)
    }

    fn ranked(&self, rank: for<'a> fn(&'a [Product], usize) -> Vec<&'a Product>) -> Vec<Product> {
        self.store()
            .read(|c| rank(c.as_slice(), self.top_n).into_iter().cloned().collect())
    }

    pub async fn adjust_stock(
        &self,
        id: ProductId,
        adjustment: StockAdjustment,
        note: Option<String>,
    ) -> Result<Product, InventoryError> {
        let mut mutation = StockMutation::new(id, adjustment);
        if let Some(note) = note {
            mutation = mutation.with_note(note);
        }
        mutation.run(self.store(), self.repo()).await
    }

    pub async fn apply_batch(&self, batch: BatchStockUpdate) -> Result<Vec<Product>, BatchError> {
        batch.run(self.store(), self.repo()).await
    }

    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product, InventoryError> {
        workflow::add_product(self.store(), self.repo(), draft).await
    }

    pub async fn edit_product(
        &self,
        id: &ProductId,
        product: Product,
    ) -> Result<Product, InventoryError> {
        workflow::edit_product(self.store(), self.repo(), id, product).await
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), InventoryError> {
        workflow::delete_product(self.store(), self.repo(), id).await
    }

    /// Render an export dated `date`. The product table follows the current
    /// filter; chart exports cover the whole collection.
    pub fn export(&self, kind: ExportKind, date: NaiveDate) -> Result<ExportArtifact, ExportError> {
        let products = match kind {
            ExportKind::Products => self.visible(),
            _ => self.store().snapshot(),
        };
        let categories = self.categories.categories(&products);
        build_export(kind, &products, &categories, date)
    }
}
