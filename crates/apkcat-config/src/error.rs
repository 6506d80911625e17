use apkcat_utils::error::{FileSystemError, PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(apkcat_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(apkcat_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists: {0}")]
    #[diagnostic(
        code(apkcat_config::already_exists),
        help("Remove the existing config file or pass a different path with --config")
    )]
    ConfigAlreadyExists(String),

    #[error("No architectures configured")]
    #[diagnostic(
        code(apkcat_config::no_architectures),
        help("Add at least one entry to `architectures`, e.g. [\"x86_64\"]")
    )]
    NoArchitectures,

    #[error("Duplicate architecture: {0}")]
    #[diagnostic(code(apkcat_config::duplicate_architecture))]
    DuplicateArchitecture(String),

    #[error("Duplicate repository name: {0}")]
    #[diagnostic(
        code(apkcat_config::duplicate_repo),
        help("Each repository must have a unique name")
    )]
    DuplicateRepositoryName(String),

    #[error("Invalid repository name: {0:?}")]
    #[diagnostic(
        code(apkcat_config::invalid_repository),
        help("Repository names must be non-empty and contain no whitespace")
    )]
    InvalidRepositoryName(String),

    #[error("Repository '{0}' is listed more than once in repo_priority")]
    #[diagnostic(
        code(apkcat_config::duplicate_priority),
        help("Each repository may appear only once in the priority order")
    )]
    DuplicatePriority(String),

    #[error("Repository '{repo}' overrides the URL for unknown architecture '{arch}'")]
    #[diagnostic(
        code(apkcat_config::unknown_architecture),
        help("Add the architecture to `architectures` or remove the override")
    )]
    UnknownArchitecture { repo: String, arch: String },

    #[error("Invalid timeout: {0}")]
    #[diagnostic(
        code(apkcat_config::invalid_timeout),
        help("Use a duration such as \"30s\", \"2m\" or \"1m30s\"")
    )]
    InvalidTimeout(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(apkcat_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(apkcat_config::utils))]
    Utils(#[from] UtilsError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(apkcat_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(apkcat_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
