//! The catalog pipeline: collect, reconcile, build.

use apkcat_config::config::Config;
use apkcat_registry::IndexSource;
use tracing::{debug, info};

use crate::{
    catalog::{CatalogBuilder, CatalogDocument},
    collect::{Collector, FetchReport},
    reconcile::{reconcile, RepoPriority, Resolution},
};

/// Everything a build produces.
#[derive(Debug)]
pub struct BuildOutcome {
    pub catalog: CatalogDocument,
    pub reports: Vec<FetchReport>,
    pub resolutions: Vec<Resolution>,
}

impl BuildOutcome {
    pub fn failed_fetches(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }
}

/// Runs the whole pipeline for a resolved configuration.
///
/// Fetch failures do not fail the build; they show up in [`BuildOutcome::reports`].
pub fn build_catalog(config: &Config, source: &dyn IndexSource) -> BuildOutcome {
    let priority = RepoPriority::new(config.repo_priority.iter().cloned());
    let sources = config.sources();

    debug!(
        architectures = ?config.architectures,
        priority = ?priority.as_slice(),
        "collecting indexes"
    );

    let collection = Collector::new(source, &priority)
        .parallel(config.is_parallel())
        .collect(&sources, |repo| config.display_name(repo).to_string());

    let tally = collection.tally();
    info!(
        "Collected {} records from {} indexes",
        collection.total_records(),
        collection.reports.len()
    );

    let reconciliation = reconcile(collection.records, &priority);
    info!(
        "Reconciled {} packages ({} resolved conflicts)",
        reconciliation.packages.len(),
        reconciliation.resolutions.len()
    );

    let catalog = CatalogBuilder::new(config.alpine_version(), &priority)
        .build(reconciliation.packages, tally);

    BuildOutcome {
        catalog,
        reports: collection.reports,
        resolutions: reconciliation.resolutions,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeMap, BTreeSet},
        io::{BufRead, Cursor},
    };

    use apkcat_config::repository::Repository;
    use apkcat_registry::{RegistryError, Result as RegistryResult};

    use super::*;

    struct StubSource(BTreeMap<&'static str, &'static str>);

    impl IndexSource for StubSource {
        fn open(&self, url: &str) -> RegistryResult<Box<dyn BufRead + Send>> {
            self.0
                .get(url)
                .map(|text| -> Box<dyn BufRead + Send> {
                    Box::new(Cursor::new(text.as_bytes().to_vec()))
                })
                .ok_or_else(|| RegistryError::FailedToFetchRemote(url.to_string()))
        }
    }

    fn config() -> Config {
        let mut core = Repository::new("core", "stub/core/{arch}");
        core.display_name = Some("Core".into());
        let main = Repository::new("main", "stub/main/{arch}");

        let mut config = Config::default_config();
        config.architectures = vec!["a".into(), "b".into()];
        config.repo_priority = vec!["core".into(), "main".into()];
        config.repositories = vec![core, main];
        config.resolve().unwrap();
        config
    }

    #[test]
    fn test_end_to_end() {
        let source = StubSource(BTreeMap::from([
            ("stub/core/a", "P:pkg1\nV:1.0\nS:2048\n"),
            ("stub/main/b", "P:pkg1\nV:0.9\nS:1024\n"),
        ]));

        let outcome = build_catalog(&config(), &source);
        let catalog = &outcome.catalog;

        let pkg1 = catalog.get("pkg1").unwrap();
        assert_eq!(pkg1.version, "1.0");
        assert_eq!(pkg1.repo, "Core");
        assert_eq!(pkg1.source_repo, "core");
        assert_eq!(
            pkg1.architectures,
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );

        assert_eq!(catalog.metadata.total_packages, catalog.details.len());
        assert_eq!(catalog.metadata.total_package_size_mb, 0);
        assert_eq!(catalog.metadata.source_repositories["core"], 1);
        assert_eq!(catalog.metadata.source_repositories["main"], 1);
        assert_eq!(catalog.metadata.repositories["Core"], 1);
        assert_eq!(catalog.metadata.alpine_version, "latest-stable");

        // core/b and main/a have no index.
        assert_eq!(outcome.reports.len(), 4);
        assert_eq!(outcome.failed_fetches(), 2);
        assert!(outcome.resolutions.is_empty());
    }

    #[test]
    fn test_higher_priority_in_later_architecture_wins() {
        let source = StubSource(BTreeMap::from([
            ("stub/main/a", "P:tool\nV:2.0\nT:from main\n"),
            ("stub/core/b", "P:tool\nV:1.0\nT:from core\n"),
        ]));

        let outcome = build_catalog(&config(), &source);
        let tool = outcome.catalog.get("tool").unwrap();

        assert_eq!(tool.description, "from core");
        assert_eq!(tool.architectures.len(), 2);
        assert_eq!(outcome.resolutions.len(), 1);
        assert_eq!(outcome.resolutions[0].previous, "main");
    }

    #[test]
    fn test_all_fetches_failing_yields_empty_catalog() {
        let outcome = build_catalog(&config(), &StubSource(BTreeMap::new()));

        assert_eq!(outcome.catalog.metadata.total_packages, 0);
        assert!(outcome.catalog.packages.is_empty());
        assert_eq!(outcome.failed_fetches(), 4);
    }
}
