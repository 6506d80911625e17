//! Cross-repository reconciliation.
//!
//! Records sharing a package name are folded into one entry. The fields of the entry come
//! from the highest-priority repository that publishes the name; its architecture set is
//! the union over every repository and architecture the name was seen in. Between records
//! of equal priority the first one seen keeps its fields.

use std::collections::{btree_map::Entry, BTreeMap};

use apkcat_registry::PackageRecord;
use tracing::debug;

/// Repository identifiers ordered from highest to lowest priority.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoPriority {
    order: Vec<String>,
}

impl RepoPriority {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of `repo` in the order; unlisted repositories rank after all listed ones.
    pub fn rank(&self, repo: &str) -> usize {
        self.order
            .iter()
            .position(|r| r == repo)
            .unwrap_or(self.order.len())
    }

    /// Whether `repo` has strictly higher priority than `other`.
    pub fn outranks(&self, repo: &str, other: &str) -> bool {
        self.rank(repo) < self.rank(other)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

/// A package whose fields were taken over by a higher-priority repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub previous: String,
    pub winner: String,
    pub architecture: String,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub packages: BTreeMap<String, PackageRecord>,
    pub resolutions: Vec<Resolution>,
}

/// Stateful fold over package records.
pub struct Reconciler<'a> {
    priority: &'a RepoPriority,
    packages: BTreeMap<String, PackageRecord>,
    resolutions: Vec<Resolution>,
}

impl<'a> Reconciler<'a> {
    pub fn new(priority: &'a RepoPriority) -> Self {
        Self {
            priority,
            packages: BTreeMap::new(),
            resolutions: Vec::new(),
        }
    }

    /// Folds in a record collected for `arch`.
    pub fn insert(&mut self, mut record: PackageRecord, arch: &str) {
        match self.packages.entry(record.name.clone()) {
            Entry::Vacant(slot) => {
                record.architectures.clear();
                record.architectures.insert(arch.to_string());
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get_mut();
                if self
                    .priority
                    .outranks(&record.source_repo, &current.source_repo)
                {
                    debug!(
                        package = %record.name,
                        previous = %current.source_repo,
                        winner = %record.source_repo,
                        arch = arch,
                        "resolved package conflict"
                    );
                    self.resolutions.push(Resolution {
                        name: record.name.clone(),
                        previous: current.source_repo.clone(),
                        winner: record.source_repo.clone(),
                        architecture: arch.to_string(),
                    });

                    record.architectures = std::mem::take(&mut current.architectures);
                    record.architectures.insert(arch.to_string());
                    *current = record;
                } else {
                    current.architectures.insert(arch.to_string());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn finish(self) -> Reconciliation {
        Reconciliation {
            packages: self.packages,
            resolutions: self.resolutions,
        }
    }
}

/// Reconciles per-architecture record lists.
///
/// Architectures are folded in key order, records within one architecture in list order.
pub fn reconcile(
    records: BTreeMap<String, Vec<PackageRecord>>,
    priority: &RepoPriority,
) -> Reconciliation {
    let mut reconciler = Reconciler::new(priority);
    for (arch, arch_records) in records {
        for record in arch_records {
            reconciler.insert(record, &arch);
        }
    }
    reconciler.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn record(name: &str, version: &str, source_repo: &str) -> PackageRecord {
        PackageRecord {
            name: name.into(),
            version: version.into(),
            repo: source_repo.to_uppercase(),
            source_repo: source_repo.into(),
            ..Default::default()
        }
    }

    fn archs(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank() {
        let priority = RepoPriority::new(["r1", "r2", "r3"]);
        assert_eq!(priority.rank("r1"), 0);
        assert_eq!(priority.rank("r3"), 2);
        assert_eq!(priority.rank("unknown"), 3);
        assert!(priority.outranks("r2", "unknown"));
        assert!(!priority.outranks("unknown", "other"));
    }

    #[test]
    fn test_priority_law() {
        let priority = RepoPriority::new(["r1", "r2", "r3"]);
        let records = BTreeMap::from([
            ("a".to_string(), vec![record("X", "2.0", "r2")]),
            ("b".to_string(), vec![record("X", "1.0", "r1")]),
        ]);

        let result = reconcile(records, &priority);
        let x = &result.packages["X"];
        assert_eq!(x.source_repo, "r1");
        assert_eq!(x.version, "1.0");
        assert_eq!(x.architectures, archs(&["a", "b"]));

        assert_eq!(
            result.resolutions,
            vec![Resolution {
                name: "X".into(),
                previous: "r2".into(),
                winner: "r1".into(),
                architecture: "b".into(),
            }]
        );
    }

    #[test]
    fn test_lower_priority_only_adds_architecture() {
        let priority = RepoPriority::new(["core", "main"]);
        let records = BTreeMap::from([
            ("a".to_string(), vec![record("pkg", "1.0", "core")]),
            ("b".to_string(), vec![record("pkg", "0.9", "main")]),
        ]);

        let result = reconcile(records, &priority);
        assert_eq!(result.packages["pkg"].version, "1.0");
        assert_eq!(result.packages["pkg"].architectures, archs(&["a", "b"]));
        assert!(result.resolutions.is_empty());
    }

    #[test]
    fn test_equal_priority_first_seen_wins() {
        let priority = RepoPriority::new(["core"]);
        let mut reconciler = Reconciler::new(&priority);
        reconciler.insert(record("dup", "1", "extra-a"), "x86");
        reconciler.insert(record("dup", "2", "extra-b"), "x86_64");

        let result = reconciler.finish();
        assert_eq!(result.packages["dup"].version, "1");
        assert_eq!(result.packages["dup"].source_repo, "extra-a");
        assert_eq!(result.packages["dup"].architectures, archs(&["x86", "x86_64"]));
    }

    #[test]
    fn test_same_arch_twice_is_not_duplicated() {
        let priority = RepoPriority::new(["core", "main"]);
        let mut reconciler = Reconciler::new(&priority);
        reconciler.insert(record("pkg", "1", "main"), "x86");
        reconciler.insert(record("pkg", "2", "core"), "x86");

        assert_eq!(reconciler.len(), 1);
        let result = reconciler.finish();
        assert_eq!(result.packages["pkg"].version, "2");
        assert_eq!(result.packages["pkg"].architectures, archs(&["x86"]));
    }

    #[test]
    fn test_collection_architecture_is_used() {
        let priority = RepoPriority::default();
        let mut noarch = record("docs", "1", "main");
        noarch.architecture = "noarch".into();

        let mut reconciler = Reconciler::new(&priority);
        reconciler.insert(noarch, "aarch64");

        let result = reconciler.finish();
        let docs = &result.packages["docs"];
        assert_eq!(docs.architecture, "noarch");
        assert_eq!(docs.architectures, archs(&["aarch64"]));
    }

    #[test]
    fn test_winner_is_independent_of_architecture_order() {
        let priority = RepoPriority::new(["r1", "r2", "r3"]);
        let observations = [
            ("a", record("X", "3", "r3")),
            ("b", record("X", "1", "r1")),
            ("c", record("X", "2", "r2")),
        ];

        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut reconciler = Reconciler::new(&priority);
            for idx in order {
                let (arch, rec) = &observations[idx];
                reconciler.insert(rec.clone(), arch);
            }
            let result = reconciler.finish();
            let x = &result.packages["X"];
            assert_eq!(x.source_repo, "r1");
            assert_eq!(x.architectures, archs(&["a", "b", "c"]));
        }
    }

    #[test]
    fn test_one_entry_per_name() {
        let priority = RepoPriority::new(["core", "main"]);
        let records = BTreeMap::from([
            (
                "x86".to_string(),
                vec![record("a", "1", "core"), record("b", "1", "main")],
            ),
            (
                "x86_64".to_string(),
                vec![record("a", "1", "main"), record("c", "1", "main")],
            ),
        ]);

        let result = reconcile(records, &priority);
        assert_eq!(result.packages.len(), 3);
        assert!(result
            .packages
            .values()
            .all(|pkg| !pkg.architectures.is_empty()));
    }
}
