//! Error types for the registry crate.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while fetching, unpacking, or decoding a repository index.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(apkcat_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(
        code(apkcat_registry::http),
        help("Check your network connection and the repository URL")
    )]
    UreqError(#[from] ureq::Error),

    #[error("Failed to fetch from remote source: {0}")]
    #[diagnostic(
        code(apkcat_registry::fetch_remote),
        help("Verify the repository URL is correct and accessible")
    )]
    FailedToFetchRemote(String),

    #[error("Invalid URL: {0}")]
    #[diagnostic(
        code(apkcat_registry::invalid_url),
        help("Ensure the URL is valid and properly formatted")
    )]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    #[diagnostic(
        code(apkcat_registry::unsupported_scheme),
        help("Use an http://, https:// or file:// URL, or a plain path")
    )]
    UnsupportedScheme(String),

    #[error("No APKINDEX member found in {0}")]
    #[diagnostic(
        code(apkcat_registry::index_not_found),
        help("The archive should be an APKINDEX.tar.gz as published by the repository")
    )]
    IndexNotFound(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
