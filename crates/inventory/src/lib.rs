//! Inventory module: the dashboard's client-side state and logic.
//!
//! Holds the local product collection, derives the visible subset and every
//! dashboard aggregate from it, and runs the mutation workflows against a
//! [`ProductRepository`]. No HTTP here; the transport lives in the
//! dashboard crate.

pub mod collection;
pub mod filter;
pub mod in_memory;
pub mod repository;
pub mod stats;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use collection::ProductCollection;
pub use filter::{CategorySelector, ProductFilter, filter_products};
pub use in_memory::{InMemoryProductRepository, RepositoryCall};
pub use repository::{ListQuery, ProductRepository, RepositoryError, StockChange};
pub use stats::{CategoryShare, GroupBreakdown, GroupDomain, InventorySummary};
pub use store::ProductStore;
pub use workflow::{
    BatchError, BatchStockUpdate, InventoryError, MutationState, StockAdjustment, StockMutation,
    add_product, delete_product, edit_product, parse_delta, reload,
};
