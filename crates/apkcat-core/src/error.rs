//! Error types for apkcat-core.

use apkcat_config::error::ConfigError;
use apkcat_registry::RegistryError;
use apkcat_utils::error::FileSystemError;
use miette::Diagnostic;
use thiserror::Error;

/// Fatal errors of a catalog run or a catalog query.
#[derive(Error, Diagnostic, Debug)]
pub enum ApkcatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(code(apkcat::fs), help("Check file permissions and disk space"))]
    FileSystemError(#[from] FileSystemError),

    #[error("Error while {action}")]
    #[diagnostic(code(apkcat::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    #[diagnostic(code(apkcat::serialize))]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to read catalog {path}: {source}")]
    #[diagnostic(
        code(apkcat::catalog),
        help("Run 'apkcat build' to generate the catalog, or pass its location with --catalog")
    )]
    InvalidCatalog {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Package '{0}' not found")]
    #[diagnostic(
        code(apkcat::package_not_found),
        help("Use 'apkcat search' to look for similar names")
    )]
    PackageNotFound(String),
}

pub type ApkcatResult<T> = std::result::Result<T, ApkcatError>;

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> ApkcatResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> ApkcatResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            ApkcatError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApkcatError::PackageNotFound("busybox".into()).to_string(),
            "Package 'busybox' not found"
        );

        let err: ApkcatError = ConfigError::NoArchitectures.into();
        assert_eq!(err.to_string(), "No architectures configured");
    }

    #[test]
    fn test_with_context() {
        let result: std::io::Result<()> = Err(std::io::Error::other("denied"));
        let err = result
            .with_context(|| "reading catalog".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "Error while reading catalog");
    }
}
