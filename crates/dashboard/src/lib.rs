//! `stockdash-dashboard`
//!
//! **Responsibility:** application shell of the stock dashboard.
//!
//! This crate provides:
//! - Environment configuration
//! - The HTTP product repository client
//! - Debounced search and stale-response protection for list reloads
//! - The [`Dashboard`] facade every view reads and mutates through
//!
//! The remote API stays the authority; the dashboard keeps a reconciled
//! local copy of what it last listed.

pub mod client;
pub mod config;
pub mod debounce;
pub mod shell;

pub use client::HttpProductRepository;
pub use config::{ConfigError, DashboardConfig};
pub use debounce::Debouncer;
pub use shell::{Dashboard, ReloadOutcome, RequestSequence};
