//! kld-feed
//!
//! Datafeed orchestration: the error taxonomy, per-namespace TTL policy,
//! and the two request services the HTTP surface calls into.
//!
//! This crate owns no transport. The cache (`kld-cache`) and the
//! collaborator boundaries (`kld-md`) are injected at construction; the
//! daemon wires concrete implementations at startup.

pub mod catalog;
pub mod errors;
pub mod history;
pub mod ttl;

pub use catalog::CatalogService;
pub use errors::{DataQualityWarning, FeedError};
pub use history::{HistoryQuery, HistoryResult, HistoryService};
