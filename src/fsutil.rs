//! File accessibility checks applied before every open and create.
//!
//! Inputs must be openable; outputs must not already exist. Both failure
//! modes surface as [`GraphError::FileInaccessible`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::{GraphError, Result};

/// Opens `path` for reading, failing if it is missing or unreadable.
pub(crate) fn open_for_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| GraphError::FileInaccessible {
        path: path.to_path_buf(),
        source,
    })
}

/// Fails if `path` already exists.
pub(crate) fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(GraphError::FileInaccessible {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "output file already exists"),
        });
    }
    Ok(())
}

/// Creates `path` for writing, failing if it exists or cannot be created.
pub(crate) fn create_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| GraphError::FileInaccessible {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new().expect("temp dir");
        let err = open_for_read(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, GraphError::FileInaccessible { .. }));
    }

    #[test]
    fn create_refuses_existing_target() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out");
        std::fs::write(&path, b"x").expect("seed file");
        assert!(ensure_absent(&path).is_err());
        assert!(matches!(
            create_new(&path),
            Err(GraphError::FileInaccessible { .. })
        ));
    }

    #[test]
    fn create_then_open_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fresh");
        ensure_absent(&path).expect("absent");
        create_new(&path).expect("create");
        open_for_read(&path).expect("open");
    }
}
