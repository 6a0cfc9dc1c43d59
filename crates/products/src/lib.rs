//! Products domain module.
//!
//! The product record as the remote store exposes it, plus the draft used to
//! create one. Pure domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{
    DEFAULT_UNIT, Product, ProductDraft, StockLevel, effective_unit_value,
};
