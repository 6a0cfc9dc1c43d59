//! Reports: tabular export of products and chart data.
//!
//! Rows are shaped from the inventory aggregates, then rendered as
//! comma-delimited text. Writing the artifact anywhere is the caller's job.

pub mod export;
pub mod rows;

pub use export::{DELIMITER, ExportError, quote_field, to_delimited_text};
pub use rows::{ExportArtifact, ExportKind, build_export, truncate_label};
