use crate::error::Error;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// The files making up one run's input
#[derive(Debug, Clone)]
pub struct InputSet {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl InputSet {
    /// Resolve an input path into the list of files to read
    ///
    /// A directory is listed non-recursively; hidden entries and
    /// sub-directories are skipped and the remaining files are sorted by path.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        let metadata = std::fs::metadata(&root).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::InputNotFound { path: root.clone() }
            } else {
                Error::InputUnreadable {
                    path: root.clone(),
                    source,
                }
            }
        })?;

        if !metadata.is_dir() {
            return Ok(InputSet {
                files: vec![root.clone()],
                root,
            });
        }

        let entries = std::fs::read_dir(&root).map_err(|source| Error::InputUnreadable {
            path: root.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::InputUnreadable {
                path: root.clone(),
                source,
            })?;

            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            files.push(path);
        }

        if files.is_empty() {
            return Err(Error::NoInputFiles { path: root }.into());
        }

        files.sort();
        Ok(InputSet { root, files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
