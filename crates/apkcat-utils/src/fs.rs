use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates a directory structure if it doesn't exist.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| {
            FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            }
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Returns the sibling `<file>.part` path used while writing `path`.
pub fn part_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes `content` to `path` atomically.
///
/// The bytes go to a sibling `.part` file which is synced and then renamed over `path`, so a
/// reader never observes a truncated file. The parent directory is created when missing. On
/// failure the `.part` file is removed and any existing file at `path` is left untouched.
///
/// # Example
///
/// ```no_run
/// use apkcat_utils::fs::atomic_write;
///
/// atomic_write("/tmp/packages.json", b"{}").unwrap();
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir_exists(parent)?;
    }

    let tmp_path = part_path(path);
    let result = write_synced(&tmp_path, content).and_then(|_| {
        fs::rename(&tmp_path, path).map_err(|err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "replace",
                source: err,
            }
        })
    });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_synced(path: &Path, content: &[u8]) -> FileSystemResult<()> {
    let err = |action, source| {
        FileSystemError::File {
            path: path.to_path_buf(),
            action,
            source,
        }
    };

    let mut file = File::create(path).map_err(|e| err("create", e))?;
    file.write_all(content).map_err(|e| err("write", e))?;
    file.sync_all().map_err(|e| err("sync", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_exists() {
        let dir = tempdir().unwrap();
        let new_dir = dir.path().join("a/b");
        ensure_dir_exists(&new_dir).unwrap();
        assert!(new_dir.is_dir());
        ensure_dir_exists(&new_dir).unwrap();
    }

    #[test]
    fn test_ensure_dir_exists_file_collision() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.txt");
        fs::write(&file_path, "hello").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file_path),
            Err(FileSystemError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path("/srv/out/packages.json"),
            PathBuf::from("/srv/out/packages.json.part")
        );
    }

    #[test]
    fn test_atomic_write_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/packages.json");

        atomic_write(&target, b"first").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first");

        atomic_write(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert!(!part_path(&target).exists());
    }

    #[test]
    fn test_atomic_write_failure_keeps_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages.json");
        fs::write(&target, "old").unwrap();

        // A directory squatting on the .part path makes File::create fail.
        fs::create_dir(part_path(&target)).unwrap();

        assert!(atomic_write(&target, b"new").is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    }
}
