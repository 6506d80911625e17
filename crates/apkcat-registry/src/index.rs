//! Decoder for the APKINDEX text format.
//!
//! An index is a sequence of records separated by blank lines. Every other line is a
//! `K:value` pair with a single-letter key:
//!
//! ```text
//! C:Q1kZ0n0sXyPGAh2j1Cz1ZnjCxWBbQ=
//! P:busybox
//! V:1.36.1-r2
//! A:x86_64
//! S:512000
//! D:so:libc.musl-x86_64.so.1 musl>=1.2
//! ```
//!
//! Unknown keys are ignored and lines without a `:` are skipped.

use std::io::BufRead;

use tracing::trace;

use crate::{
    error::{ErrorContext, Result},
    package::{PackageRecord, RecordOrigin},
};

const VIRTUAL_PREFIXES: [&str; 3] = ["so:", "cmd:", "pc:"];
const COMPARATORS: [char; 3] = ['<', '>', '='];

/// Parses a dependency (or install-if) list.
///
/// Virtual dependencies (`so:`, `cmd:`, `pc:`) and conflicts (`!name`) are dropped, and
/// version constraints are cut off so only package names remain, in input order.
///
/// ```
/// use apkcat_registry::index::parse_dependencies;
///
/// assert_eq!(
///     parse_dependencies("so:libc.musl-x86_64.so.1 musl>=1.2 !busybox-static"),
///     vec!["musl"]
/// );
/// ```
pub fn parse_dependencies(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .filter(|dep| !VIRTUAL_PREFIXES.iter().any(|p| dep.starts_with(p)))
        .filter(|dep| !dep.starts_with('!'))
        .map(|dep| dep.split(COMPARATORS).next().unwrap_or_default())
        .filter(|dep| !dep.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a provides list, keeping each entry up to its first `=`.
pub fn parse_provides(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|name| name.split('=').next().unwrap_or_default())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Streaming decoder yielding one [`PackageRecord`] per named index record.
///
/// Lines are read into a growable buffer, so there is no limit on line length. Invalid
/// UTF-8 is replaced rather than rejected. Once the reader fails, the error is yielded and
/// the decoder stops.
pub struct IndexDecoder<R> {
    reader: R,
    origin: RecordOrigin,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> IndexDecoder<R> {
    pub fn new(reader: R, origin: RecordOrigin) -> Self {
        Self {
            reader,
            origin,
            buf: Vec::new(),
            done: false,
        }
    }

    fn apply_line(record: &mut PackageRecord, line: &str) {
        let Some((key, value)) = line.split_once(':') else {
            trace!("Skipping malformed index line: {:?}", line);
            return;
        };

        match key {
            "C" => record.checksum = value.to_string(),
            "P" => record.name = value.to_string(),
            "V" => record.version = value.to_string(),
            "A" => record.architecture = value.to_string(),
            "S" => record.package_size = value.to_string(),
            "I" => record.installed_size = value.to_string(),
            "T" => record.description = value.to_string(),
            "U" => record.url = value.to_string(),
            "L" => record.license = value.to_string(),
            "o" => record.origin = value.to_string(),
            "m" => record.maintainer = value.to_string(),
            "t" => record.build_time = value.to_string(),
            "D" => record.dependencies = parse_dependencies(value),
            "p" => record.provides = parse_provides(value),
            "i" => record.install_if = parse_dependencies(value),
            _ => {}
        }
    }
}

impl<R: BufRead> Iterator for IndexDecoder<R> {
    type Item = Result<PackageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut record = PackageRecord::with_origin(&self.origin);
        loop {
            self.buf.clear();
            let read = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => n,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err).with_context(|| {
                        format!(
                            "reading index of {} ({})",
                            self.origin.source_repo, self.origin.architecture
                        )
                    }));
                }
            };

            if read == 0 {
                self.done = true;
                return (!record.name.is_empty()).then_some(Ok(record));
            }

            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');

            if line.is_empty() {
                if !record.name.is_empty() {
                    return Some(Ok(record));
                }
                record = PackageRecord::with_origin(&self.origin);
                continue;
            }

            Self::apply_line(&mut record, line);
        }
    }
}

/// Decodes a whole index, failing if the reader fails at any point.
pub fn parse_index<R: BufRead>(reader: R, origin: RecordOrigin) -> Result<Vec<PackageRecord>> {
    IndexDecoder::new(reader, origin).collect()
}
