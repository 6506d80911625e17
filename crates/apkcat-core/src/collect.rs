//! Multi-architecture index collection.

use std::collections::BTreeMap;

use apkcat_config::config::IndexSources;
use apkcat_registry::{parse_index, IndexSource, PackageRecord, RecordOrigin};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, error, info};

use crate::reconcile::RepoPriority;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(usize),
    Failed(String),
}

/// Result of fetching one repository index for one architecture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchReport {
    pub architecture: String,
    pub repo: String,
    pub display_name: String,
    pub url: String,
    pub outcome: FetchOutcome,
}

impl FetchReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Failed(_))
    }

    pub fn record_count(&self) -> usize {
        match self.outcome {
            FetchOutcome::Fetched(count) => count,
            FetchOutcome::Failed(_) => 0,
        }
    }
}

/// Raw record counts taken before reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordTally {
    pub repositories: BTreeMap<String, usize>,
    pub source_repositories: BTreeMap<String, usize>,
}

/// Records gathered for every architecture, in repository priority order.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: BTreeMap<String, Vec<PackageRecord>>,
    pub reports: Vec<FetchReport>,
}

impl Collection {
    pub fn tally(&self) -> RecordTally {
        let mut tally = RecordTally::default();
        for records in self.records.values() {
            for record in records {
                *tally.repositories.entry(record.repo.clone()).or_default() += 1;
                *tally
                    .source_repositories
                    .entry(record.source_repo.clone())
                    .or_default() += 1;
            }
        }
        tally
    }

    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchReport> {
        self.reports.iter().filter(|report| report.is_failed())
    }
}

/// Fetches and decodes every (architecture, repository) index.
///
/// Architectures are independent and may be collected in parallel; repositories of one
/// architecture are fetched one after another in priority order. A failed fetch is logged and
/// reported, and contributes no records.
pub struct Collector<'a> {
    source: &'a dyn IndexSource,
    priority: &'a RepoPriority,
    parallel: bool,
}

impl<'a> Collector<'a> {
    pub fn new(source: &'a dyn IndexSource, priority: &'a RepoPriority) -> Self {
        Self {
            source,
            priority,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Collects every index in `sources`, labelling records with `display_name(repo)`.
    pub fn collect<F>(&self, sources: &IndexSources, display_name: F) -> Collection
    where
        F: Fn(&str) -> String + Sync,
    {
        let run = |(arch, repos): (&String, &BTreeMap<String, String>)| {
            (arch.clone(), self.collect_arch(arch, repos, &display_name))
        };

        let per_arch: Vec<(String, (Vec<PackageRecord>, Vec<FetchReport>))> = if self.parallel {
            sources.par_iter().map(run).collect()
        } else {
            sources.iter().map(run).collect()
        };

        let mut collection = Collection::default();
        for (arch, (records, reports)) in per_arch {
            collection.records.insert(arch, records);
            collection.reports.extend(reports);
        }
        collection
    }

    fn collect_arch<F>(
        &self,
        arch: &str,
        repos: &BTreeMap<String, String>,
        display_name: &F,
    ) -> (Vec<PackageRecord>, Vec<FetchReport>)
    where
        F: Fn(&str) -> String,
    {
        let mut ordered: Vec<(&String, &String)> = repos.iter().collect();
        ordered.sort_by_key(|(repo, _)| self.priority.rank(repo));

        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(ordered.len());

        for (repo, url) in ordered {
            let shown = display_name(repo);
            let origin = RecordOrigin::new(shown.clone(), repo.clone(), arch);
            debug!(repo = %repo, arch = arch, url = %url, "fetching index");

            let outcome = match self
                .source
                .open(url)
                .and_then(|reader| parse_index(reader, origin))
            {
                Ok(decoded) => {
                    info!("{} ({}): {} packages", shown, arch, decoded.len());
                    let count = decoded.len();
                    records.extend(decoded);
                    FetchOutcome::Fetched(count)
                }
                Err(err) => {
                    error!("Failed to fetch {} ({}): {}", shown, arch, err);
                    FetchOutcome::Failed(err.to_string())
                }
            };

            reports.push(FetchReport {
                architecture: arch.to_string(),
                repo: repo.clone(),
                display_name: shown,
                url: url.clone(),
                outcome,
            });
        }

        (records, reports)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, Cursor};

    use apkcat_registry::{RegistryError, Result as RegistryResult};

    use super::*;

    struct MapSource(BTreeMap<&'static str, &'static str>);

    impl IndexSource for MapSource {
        fn open(&self, url: &str) -> RegistryResult<Box<dyn BufRead + Send>> {
            match self.0.get(url) {
                Some(text) => Ok(Box::new(Cursor::new(text.as_bytes().to_vec()))),
                None => Err(RegistryError::FailedToFetchRemote(url.to_string())),
            }
        }
    }

    fn sources(entries: &[(&str, &[(&str, &str)])]) -> IndexSources {
        entries
            .iter()
            .map(|(arch, repos)| {
                (
                    arch.to_string(),
                    repos
                        .iter()
                        .map(|(repo, url)| (repo.to_string(), url.to_string()))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_collect_orders_by_priority() {
        let source = MapSource(BTreeMap::from([
            ("a/alpha", "P:from-alpha\n"),
            ("a/zeta", "P:from-zeta\n"),
        ]));
        let priority = RepoPriority::new(["zeta", "alpha"]);
        let plan = sources(&[("a", &[("alpha", "a/alpha"), ("zeta", "a/zeta")])]);

        let collection = Collector::new(&source, &priority).collect(&plan, |r| r.to_uppercase());

        let names: Vec<&str> = collection.records["a"]
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["from-zeta", "from-alpha"]);
        assert_eq!(collection.records["a"][0].repo, "ZETA");
        assert_eq!(collection.records["a"][0].source_repo, "zeta");
        assert_eq!(collection.records["a"][0].architecture, "a");
    }

    #[test]
    fn test_failed_fetch_is_reported() {
        let source = MapSource(BTreeMap::from([("b/main", "P:one\n\nP:two\n")]));
        let priority = RepoPriority::new(["core", "main"]);
        let plan = sources(&[
            ("a", &[("core", "a/core")]),
            ("b", &[("core", "b/core"), ("main", "b/main")]),
        ]);

        let collection = Collector::new(&source, &priority)
            .parallel(false)
            .collect(&plan, str::to_string);

        assert_eq!(collection.total_records(), 2);
        assert!(collection.records["a"].is_empty());
        assert_eq!(collection.reports.len(), 3);
        assert_eq!(collection.failures().count(), 2);

        let main = collection
            .reports
            .iter()
            .find(|r| r.repo == "main")
            .unwrap();
        assert_eq!(main.outcome, FetchOutcome::Fetched(2));
        assert_eq!(main.record_count(), 2);
    }

    #[test]
    fn test_tally_counts_raw_records() {
        let source = MapSource(BTreeMap::from([
            ("a/core", "P:pkg\n\nP:other\n"),
            ("b/core", "P:pkg\n"),
            ("b/main", "P:pkg\n"),
        ]));
        let priority = RepoPriority::new(["core", "main"]);
        let plan = sources(&[
            ("a", &[("core", "a/core")]),
            ("b", &[("core", "b/core"), ("main", "b/main")]),
        ]);

        let tally = Collector::new(&source, &priority)
            .collect(&plan, |r| format!("{r} label"))
            .tally();

        assert_eq!(tally.source_repositories["core"], 3);
        assert_eq!(tally.source_repositories["main"], 1);
        assert_eq!(tally.repositories["core label"], 3);
    }
}
