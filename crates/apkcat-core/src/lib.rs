//! Catalog building for apkcat.
//!
//! The pipeline collects the index of every configured (architecture, repository) pair,
//! reconciles packages published under the same name by several repositories, and projects
//! the result into a [`CatalogDocument`].

pub mod catalog;
pub mod collect;
pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use catalog::{
    load_catalog, write_catalog, CatalogBuilder, CatalogDocument, CatalogMetadata,
    PackageSummary, SearchQuery,
};
pub use collect::{Collection, Collector, FetchOutcome, FetchReport, RecordTally};
pub use error::{ApkcatError, ApkcatResult, ErrorContext};
pub use pipeline::{build_catalog, BuildOutcome};
pub use reconcile::{reconcile, Reconciler, Reconciliation, RepoPriority, Resolution};
