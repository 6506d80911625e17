//! Repository index access for apkcat.
//!
//! This crate knows how to obtain and read the index of an APK repository:
//!
//! - [`fetch`] downloads (or reads) an `APKINDEX.tar.gz` and unpacks the index text,
//! - [`index`] decodes that text into [`PackageRecord`]s,
//! - [`http_client`] holds the process-wide HTTP agent.
//!
//! # Example
//!
//! ```no_run
//! use apkcat_registry::{parse_index, ArchiveIndexSource, IndexSource, RecordOrigin};
//!
//! fn main() -> apkcat_registry::Result<()> {
//!     let url = "https://dl-cdn.alpinelinux.org/alpine/latest-stable/main/x86_64/APKINDEX.tar.gz";
//!     let reader = ArchiveIndexSource.open(url)?;
//!     let records = parse_index(reader, RecordOrigin::new("Alpine Main", "alpine-main", "x86_64"))?;
//!     println!("{} packages", records.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fetch;
pub mod http_client;
pub mod index;
pub mod package;

pub use error::{ErrorContext, RegistryError, Result};
pub use fetch::{extract_index, ArchiveIndexSource, IndexSource};
pub use index::{parse_dependencies, parse_index, parse_provides, IndexDecoder};
pub use package::{PackageRecord, RecordOrigin};
