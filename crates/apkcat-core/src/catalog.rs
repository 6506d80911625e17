//! The consolidated catalog document.
//!
//! A catalog holds a light listing of every package, the full reconciled record of every
//! package keyed by name, and summary metadata:
//!
//! ```json
//! {
//!   "packages": [{ "name": "busybox", "version": "1.36.1-r2", "description": "...", "repo": "Alpine Main", ... }],
//!   "details": { "busybox": { "name": "busybox", "dependencies": ["musl"], ... } },
//!   "metadata": { "total_packages": 1, "last_updated": "2026-01-01T00:00:00Z", ... }
//! }
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use apkcat_registry::PackageRecord;
use apkcat_utils::{
    bytes::{parse_size, whole_mib},
    fs::atomic_write,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    collect::RecordTally,
    error::{ApkcatError, ApkcatResult, ErrorContext},
    reconcile::RepoPriority,
};

/// Listing entry of the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub architectures: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_repo: String,
}

impl From<&PackageRecord> for PackageSummary {
    fn from(record: &PackageRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
            description: record.description.clone(),
            repo: record.repo.clone(),
            architectures: record.architectures.clone(),
            source_repo: record.source_repo.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogMetadata {
    pub total_packages: usize,
    /// Records seen per repository display name, before reconciliation.
    pub repositories: BTreeMap<String, usize>,
    /// Records seen per repository identifier, before reconciliation.
    pub source_repositories: BTreeMap<String, usize>,
    /// Reconciled packages available per architecture.
    pub architectures: BTreeMap<String, usize>,
    pub total_package_size_mb: u64,
    pub total_installed_size_mb: u64,
    pub last_updated: String,
    pub alpine_version: String,
    pub repo_priority: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogDocument {
    pub packages: Vec<PackageSummary>,
    pub details: BTreeMap<String, PackageRecord>,
    pub metadata: CatalogMetadata,
}

/// Projects reconciled packages into a [`CatalogDocument`].
pub struct CatalogBuilder<'a> {
    alpine_version: &'a str,
    priority: &'a RepoPriority,
    generated_at: DateTime<Utc>,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(alpine_version: &'a str, priority: &'a RepoPriority) -> Self {
        Self {
            alpine_version,
            priority,
            generated_at: Utc::now(),
        }
    }

    pub fn generated_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.generated_at = timestamp;
        self
    }

    pub fn build(
        &self,
        packages: BTreeMap<String, PackageRecord>,
        tally: RecordTally,
    ) -> CatalogDocument {
        let (package_bytes, installed_bytes) =
            packages.values().fold((0u64, 0u64), |(pkg, inst), record| {
                (
                    pkg.saturating_add(parse_size(&record.package_size)),
                    inst.saturating_add(parse_size(&record.installed_size)),
                )
            });

        let mut architectures = BTreeMap::<String, usize>::new();
        for arch in packages.values().flat_map(|record| &record.architectures) {
            *architectures.entry(arch.clone()).or_default() += 1;
        }

        let metadata = CatalogMetadata {
            total_packages: packages.len(),
            repositories: tally.repositories,
            source_repositories: tally.source_repositories,
            architectures,
            total_package_size_mb: whole_mib(package_bytes),
            total_installed_size_mb: whole_mib(installed_bytes),
            last_updated: self
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            alpine_version: self.alpine_version.to_string(),
            repo_priority: self.priority.as_slice().to_vec(),
        };

        CatalogDocument {
            packages: packages.values().map(PackageSummary::from).collect(),
            details: packages,
            metadata,
        }
    }
}

/// Filters for [`CatalogDocument::search`].
#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    pub term: String,
    /// Matches either the display name or the identifier of the repository.
    pub repo: Option<String>,
    pub arch: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }
}

fn match_rank(name: &str, term: &str) -> u8 {
    if name == term {
        0
    } else if name.starts_with(term) {
        1
    } else {
        2
    }
}

impl CatalogDocument {
    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.details.get(name)
    }

    /// Case-insensitive search over names and descriptions.
    ///
    /// Exact name matches come first, then name prefix matches, then everything else; each
    /// group is ordered by name.
    pub fn search(&self, query: &SearchQuery) -> Vec<&PackageSummary> {
        let term = query.term.to_lowercase();

        let mut hits: Vec<(u8, &PackageSummary)> = self
            .packages
            .iter()
            .filter(|pkg| {
                query
                    .repo
                    .as_deref()
                    .is_none_or(|repo| pkg.repo == repo || pkg.source_repo == repo)
            })
            .filter(|pkg| {
                query
                    .arch
                    .as_deref()
                    .is_none_or(|arch| pkg.architectures.contains(arch))
            })
            .filter_map(|pkg| {
                let name = pkg.name.to_lowercase();
                if name.contains(&term) || pkg.description.to_lowercase().contains(&term) {
                    Some((match_rank(&name, &term), pkg))
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));

        hits.into_iter()
            .map(|(_, pkg)| pkg)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Serializes `catalog` and atomically replaces `path` with it.
///
/// Nothing is written when serialization fails.
pub fn write_catalog<P: AsRef<Path>>(
    catalog: &CatalogDocument,
    path: P,
    pretty: bool,
) -> ApkcatResult<()> {
    let path = path.as_ref();

    let content = if pretty {
        serde_json::to_vec_pretty(catalog)
    } else {
        serde_json::to_vec(catalog)
    }
    .map_err(ApkcatError::Serialize)?;

    debug!("Writing {} bytes to {}", content.len(), path.display());
    atomic_write(path, &content)?;
    info!(
        "Wrote {} packages to {}",
        catalog.metadata.total_packages,
        path.display()
    );
    Ok(())
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> ApkcatResult<CatalogDocument> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening catalog {}", path.display()))?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        ApkcatError::InvalidCatalog {
            path: path.display().to_string(),
            source,
        }
    })
}
