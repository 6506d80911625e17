use std::collections::BTreeMap;

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

/// A binary-package repository publishing one index archive per architecture.
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Repository {
    /// Unique identifier of the repository.
    /// It is matched against `repo_priority` and recorded as `source_repo` in the catalog.
    pub name: String,

    /// Human readable label recorded as `repo` in the catalog.
    /// Default: the repository name
    pub display_name: Option<String>,

    /// URL template of the index archive (APKINDEX.tar.gz).
    /// `{arch}` and `{version}` are substituted. `file://` URLs and plain paths are accepted.
    pub url: String,

    /// Whether the repository is fetched.
    /// Default: true
    pub enabled: Option<bool>,

    /// Architectures the repository publishes.
    /// Default: every configured architecture
    pub architectures: Option<Vec<String>>,

    /// Per-architecture URLs used instead of the template.
    pub urls: Option<BTreeMap<String, String>>,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            url: url.into(),
            enabled: Some(true),
            architectures: None,
            urls: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether the repository publishes an index for `arch`.
    pub fn supports(&self, arch: &str) -> bool {
        let overridden = self
            .urls
            .as_ref()
            .is_some_and(|urls| urls.contains_key(arch));
        let listed = self
            .architectures
            .as_ref()
            .is_none_or(|archs| archs.iter().any(|a| a == arch));
        overridden || listed
    }

    /// Returns the index URL for `arch`, or `None` when the repository does not publish it.
    pub fn url_for(&self, arch: &str, version: &str) -> Option<String> {
        if !self.supports(arch) {
            return None;
        }

        let template = self
            .urls
            .as_ref()
            .and_then(|urls| urls.get(arch))
            .unwrap_or(&self.url);

        Some(
            template
                .replace("{arch}", arch)
                .replace("{version}", version),
        )
    }
}

pub struct DefaultRepositoryInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub url_template: &'static str,
}

pub fn default_repositories() -> Vec<DefaultRepositoryInfo> {
    vec![
        DefaultRepositoryInfo {
            name: "shaanos-core",
            display_name: "ShaanOS Core",
            url_template: "https://dl-os.shvn.tr/core/{arch}/APKINDEX.tar.gz",
        },
        DefaultRepositoryInfo {
            name: "alpine-main",
            display_name: "Alpine Main",
            url_template:
                "https://dl-cdn.alpinelinux.org/alpine/{version}/main/{arch}/APKINDEX.tar.gz",
        },
        DefaultRepositoryInfo {
            name: "alpine-community",
            display_name: "Alpine Community",
            url_template:
                "https://dl-cdn.alpinelinux.org/alpine/{version}/community/{arch}/APKINDEX.tar.gz",
        },
    ]
}

impl From<DefaultRepositoryInfo> for Repository {
    fn from(info: DefaultRepositoryInfo) -> Self {
        Self {
            display_name: Some(info.display_name.to_string()),
            ..Repository::new(info.name, info.url_template)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_substitutes_placeholders() {
        let repo = Repository::new(
            "main",
            "https://mirror.example/alpine/{version}/main/{arch}/APKINDEX.tar.gz",
        );
        assert_eq!(
            repo.url_for("aarch64", "v3.20").as_deref(),
            Some("https://mirror.example/alpine/v3.20/main/aarch64/APKINDEX.tar.gz")
        );
    }

    #[test]
    fn test_url_for_prefers_override() {
        let mut repo = Repository::new("core", "https://core.example/{arch}/APKINDEX.tar.gz");
        repo.urls = Some(BTreeMap::from([(
            "x86".to_string(),
            "file:///srv/core/x86/APKINDEX.tar.gz".to_string(),
        )]));

        assert_eq!(
            repo.url_for("x86", "edge").as_deref(),
            Some("file:///srv/core/x86/APKINDEX.tar.gz")
        );
        assert_eq!(
            repo.url_for("x86_64", "edge").as_deref(),
            Some("https://core.example/x86_64/APKINDEX.tar.gz")
        );
    }

    #[test]
    fn test_architecture_restriction() {
        let mut repo = Repository::new("core", "https://core.example/{arch}/APKINDEX.tar.gz");
        repo.architectures = Some(vec!["x86_64".to_string()]);

        assert!(repo.supports("x86_64"));
        assert!(!repo.supports("x86"));
        assert_eq!(repo.url_for("x86", "edge"), None);

        repo.urls = Some(BTreeMap::from([(
            "x86".to_string(),
            "https://other.example/x86.tar.gz".to_string(),
        )]));
        assert!(repo.supports("x86"));
    }

    #[test]
    fn test_display_name_fallback() {
        let mut repo = Repository::new("alpine-main", "https://example.com");
        assert_eq!(repo.display_name(), "alpine-main");

        repo.display_name = Some("Alpine Main".to_string());
        assert_eq!(repo.display_name(), "Alpine Main");
    }

    #[test]
    fn test_default_repositories() {
        let repos: Vec<Repository> = default_repositories()
            .into_iter()
            .map(Repository::from)
            .collect();

        assert_eq!(repos.len(), 3);
        assert!(repos.iter().all(Repository::is_enabled));
        assert!(repos
            .iter()
            .all(|r| r.url.contains("{arch}") && r.display_name.is_some()));
    }
}
