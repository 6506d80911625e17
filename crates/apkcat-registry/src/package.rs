//! Package records decoded from a repository index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One package entry.
///
/// The same type carries the reconciled view of a package: after reconciliation
/// `architectures` holds every architecture the package is published for. Size and
/// timestamp fields are kept as the strings found in the index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,

    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_size: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub installed_size: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub maintainer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build_time: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_if: Vec<String>,

    /// Display label of the repository the fields came from.
    #[serde(default)]
    pub repo: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub architectures: BTreeSet<String>,

    /// Identifier of the repository the fields came from, used for priority comparison.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_repo: String,
}

/// Where a decoded record comes from.
///
/// Stamped onto every record before its field lines are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOrigin {
    pub repo: String,
    pub source_repo: String,
    pub architecture: String,
}

impl RecordOrigin {
    pub fn new(
        repo: impl Into<String>,
        source_repo: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            source_repo: source_repo.into(),
            architecture: architecture.into(),
        }
    }
}

impl PackageRecord {
    /// Starts an empty record tagged with `origin`.
    pub fn with_origin(origin: &RecordOrigin) -> Self {
        Self {
            architecture: origin.architecture.clone(),
            repo: origin.repo.clone(),
            source_repo: origin.source_repo.clone(),
            ..Default::default()
        }
    }
}
