use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use apkcat_utils::{
    path::{resolve_path, xdg_config_home},
    time::parse_duration,
};
use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info, warn};

use crate::{
    annotations::{annotate_toml_array_of_tables, annotate_toml_table},
    error::{ConfigError, Result},
    repository::{default_repositories, Repository},
};

pub const DEFAULT_ALPINE_VERSION: &str = "latest-stable";
pub const DEFAULT_OUTPUT: &str = "packages.json";

/// Mapping from architecture to repository name to index URL.
pub type IndexSources = BTreeMap<String, BTreeMap<String, String>>;

/// apkcat configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Release tag substituted for `{version}` in repository URLs and recorded in the catalog.
    /// Default: "latest-stable"
    pub alpine_version: Option<String>,

    /// CPU architectures to collect, e.g. ["x86_64", "aarch64"].
    /// Default: ["x86_64", "x86"]
    #[serde(default = "default_architectures")]
    pub architectures: Vec<String>,

    /// Repository names ordered from highest to lowest priority.
    /// When the same package name is published by several repositories, the package fields
    /// come from the repository listed first. Enabled repositories missing here rank last.
    #[serde(default)]
    pub repo_priority: Vec<String>,

    /// Path of the generated catalog.
    /// Default: "packages.json"
    pub output: Option<String>,

    /// Timeout for each index download (e.g. "30s", "2m").
    /// Default: no timeout
    pub timeout: Option<String>,

    /// Collect architectures in parallel.
    /// Default: true
    pub parallel: Option<bool>,

    /// Repositories to fetch.
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

fn default_architectures() -> Vec<String> {
    vec!["x86_64".to_string(), "x86".to_string()]
}

/// Returns the configuration file location.
///
/// `$APKCAT_CONFIG` wins over `$XDG_CONFIG_HOME/apkcat/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("APKCAT_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("apkcat").join("config.toml"),
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            alpine_version: Some(DEFAULT_ALPINE_VERSION.to_string()),
            architectures: default_architectures(),
            repo_priority: default_repositories()
                .iter()
                .map(|info| info.name.to_string())
                .collect(),
            output: Some(DEFAULT_OUTPUT.to_string()),
            timeout: None,
            parallel: Some(true),
            repositories: default_repositories()
                .into_iter()
                .map(Repository::from)
                .collect(),
        }
    }

    /// Loads the configuration from [`default_config_path`].
    ///
    /// With `$APKCAT_STEALTH` set, the file is ignored and the defaults are used.
    pub fn new() -> Result<Self> {
        if std::env::var("APKCAT_STEALTH").is_ok() {
            let mut config = Self::default_config();
            config.resolve()?;
            return Ok(config);
        }

        Self::load_from(default_config_path())
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No configuration at {}, using defaults",
                    path.display()
                );
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        if self.architectures.is_empty() {
            return Err(ConfigError::NoArchitectures);
        }

        let mut seen_archs = HashSet::new();
        for arch in &self.architectures {
            if !seen_archs.insert(arch.as_str()) {
                return Err(ConfigError::DuplicateArchitecture(arch.clone()));
            }
        }

        let mut seen_repos = HashSet::new();
        for repo in &mut self.repositories {
            if repo.name.is_empty() || repo.name.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidRepositoryName(repo.name.clone()));
            }
            if !seen_repos.insert(repo.name.clone()) {
                return Err(ConfigError::DuplicateRepositoryName(repo.name.clone()));
            }

            repo.enabled.get_or_insert(true);

            if let Some(arch) = repo
                .urls
                .iter()
                .flat_map(|urls| urls.keys())
                .find(|arch| !seen_archs.contains(arch.as_str()))
            {
                return Err(ConfigError::UnknownArchitecture {
                    repo: repo.name.clone(),
                    arch: arch.clone(),
                });
            }
        }

        let mut seen_priority = HashSet::new();
        for name in &self.repo_priority {
            if !seen_priority.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePriority(name.clone()));
            }
        }

        self.repo_priority.retain(|name| {
            let known = seen_repos.contains(name);
            if !known {
                warn!(
                    "Ignoring unknown repository '{}' in repo_priority",
                    name
                );
            }
            known
        });

        for repo in &self.repositories {
            if repo.is_enabled() && !self.repo_priority.contains(&repo.name) {
                warn!(
                    "Repository '{}' is not listed in repo_priority; it gets the lowest priority",
                    repo.name
                );
                self.repo_priority.push(repo.name.clone());
            }
        }

        if let Some(timeout) = &self.timeout {
            if parse_duration(timeout).is_none() {
                return Err(ConfigError::InvalidTimeout(timeout.clone()));
            }
        }

        self.alpine_version
            .get_or_insert_with(|| DEFAULT_ALPINE_VERSION.to_string());
        self.output.get_or_insert_with(|| DEFAULT_OUTPUT.to_string());
        self.parallel.get_or_insert(true);

        Ok(())
    }

    /// Restricts the run to the given architectures and repositories.
    ///
    /// Empty filters keep everything. Repositories outside `repos` are disabled rather than
    /// removed so their priority rank is preserved.
    pub fn narrow<T: AsRef<str>>(&mut self, archs: &[T], repos: &[T]) -> Result<()> {
        if !archs.is_empty() {
            let wanted: HashSet<&str> = archs.iter().map(AsRef::as_ref).collect();
            for arch in &wanted {
                if !self.architectures.iter().any(|a| a.as_str() == *arch) {
                    warn!("Architecture '{}' is not configured", arch);
                }
            }
            self.architectures.retain(|a| wanted.contains(a.as_str()));
            if self.architectures.is_empty() {
                return Err(ConfigError::NoArchitectures);
            }
        }

        if !repos.is_empty() {
            let wanted: HashSet<&str> = repos.iter().map(AsRef::as_ref).collect();
            for repo in &mut self.repositories {
                if !wanted.contains(repo.name.as_str()) {
                    repo.enabled = Some(false);
                }
            }
        }

        Ok(())
    }

    pub fn alpine_version(&self) -> &str {
        self.alpine_version
            .as_deref()
            .unwrap_or(DEFAULT_ALPINE_VERSION)
    }

    pub fn output_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("APKCAT_OUTPUT") {
            return Ok(resolve_path(&env_path)?);
        }
        Ok(resolve_path(self.output.as_deref().unwrap_or(DEFAULT_OUTPUT))?)
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|t| parse_duration(t).ok_or_else(|| ConfigError::InvalidTimeout(t.to_string())))
            .transpose()
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn get_repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repo| repo.name == name)
    }

    /// Display label for a repository name; unknown names are returned unchanged.
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get_repository(name)
            .map(Repository::display_name)
            .unwrap_or(name)
    }

    /// Index URL of every enabled repository, per configured architecture.
    ///
    /// Architectures a repository does not publish are left out of that repository's map.
    pub fn sources(&self) -> IndexSources {
        let version = self.alpine_version();

        self.architectures
            .iter()
            .map(|arch| {
                let repos = self
                    .repositories
                    .iter()
                    .filter(|repo| repo.is_enabled())
                    .filter_map(|repo| {
                        repo.url_for(arch, version)
                            .map(|url| (repo.name.clone(), url))
                    })
                    .collect();
                (arch.clone(), repos)
            })
            .collect()
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(repositories) = doc
            .get_mut("repositories")
            .and_then(|item| item.as_array_of_tables_mut())
        {
            annotate_toml_array_of_tables::<Repository>(repositories)?;
        }

        Ok(doc)
    }
}

/// Writes the documented default configuration to `path`.
///
/// # Errors
///
/// Returns [`ConfigError::ConfigAlreadyExists`] rather than overwriting an existing file.
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(
            path.display().to_string(),
        ));
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(())
}
