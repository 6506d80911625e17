//! Index archive fetching.
//!
//! Repositories publish their index as `APKINDEX.tar.gz`: one or more concatenated gzip
//! members holding a tar stream, of which the `APKINDEX` member is the index text. Signed
//! indexes put the signature in a leading member without an end-of-archive marker.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

use flate2::read::MultiGzDecoder;
use tar::Archive;
use tracing::debug;
use ureq::http::header::{CACHE_CONTROL, PRAGMA};
use url::Url;

use crate::{
    error::{ErrorContext, RegistryError, Result},
    http_client::SHARED_AGENT,
};

/// Name of the index member inside the archive.
pub const INDEX_MEMBER: &str = "APKINDEX";

/// Supplies decompressed index text for a repository URL.
pub trait IndexSource: Sync {
    /// Opens the index published at `url`.
    fn open(&self, url: &str) -> Result<Box<dyn BufRead + Send>>;
}

/// Fetches `APKINDEX.tar.gz` archives over HTTP(S) or from the local filesystem.
///
/// Accepts `http://`, `https://` and `file://` URLs as well as plain paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArchiveIndexSource;

enum Location {
    Remote(Url),
    Local(PathBuf),
}

fn locate(url: &str) -> Result<Location> {
    if !url.contains("://") {
        return Ok(Location::Local(PathBuf::from(url)));
    }

    let parsed = Url::parse(url).map_err(|err| RegistryError::InvalidUrl(format!("{url}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Location::Remote(parsed)),
        "file" => {
            parsed
                .to_file_path()
                .map(Location::Local)
                .map_err(|_| RegistryError::InvalidUrl(url.to_string()))
        }
        scheme => Err(RegistryError::UnsupportedScheme(scheme.to_string())),
    }
}

fn open_remote(url: &Url) -> Result<Box<dyn Read + Send>> {
    debug!("Fetching {}", url);

    let response = SHARED_AGENT
        .get(url.as_str())
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .call()?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistryError::FailedToFetchRemote(format!(
            "{url} [{status}]"
        )));
    }

    Ok(Box::new(response.into_body().into_reader()))
}

fn open_local(path: &Path) -> Result<Box<dyn Read + Send>> {
    debug!("Reading {}", path.display());

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Unpacks the `APKINDEX` member from a gzip-compressed tar stream.
///
/// The archive is read as a stream; only the index member is buffered.
pub fn extract_index<R: Read>(reader: R, label: &str) -> Result<Vec<u8>> {
    let mut archive = Archive::new(MultiGzDecoder::new(reader));
    archive.set_ignore_zeros(true);

    let entries = archive
        .entries()
        .with_context(|| format!("reading archive {label}"))?;

    for entry in entries {
        let mut entry = entry.with_context(|| format!("reading archive entry of {label}"))?;
        let is_index = *entry
            .path()
            .with_context(|| format!("reading entry path in {label}"))?
            == *Path::new(INDEX_MEMBER);

        if is_index {
            // Declared size is untrusted; it is only checked after the read.
            let declared = entry.size();
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .and_then(|_| {
                    if content.len() as u64 == declared {
                        Ok(())
                    } else {
                        Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("member declares {declared} bytes, got {}", content.len()),
                        ))
                    }
                })
                .with_context(|| format!("unpacking {INDEX_MEMBER} from {label}"))?;
            return Ok(content);
        }
    }

    Err(RegistryError::IndexNotFound(label.to_string()))
}

impl IndexSource for ArchiveIndexSource {
    fn open(&self, url: &str) -> Result<Box<dyn BufRead + Send>> {
        let reader = match locate(url)? {
            Location::Remote(url) => open_remote(&url)?,
            Location::Local(path) => open_local(&path)?,
        };

        let content = extract_index(reader, url)?;
        debug!("Unpacked {} bytes of index text from {}", content.len(), url);
        Ok(Box::new(Cursor::new(content)))
    }
}
