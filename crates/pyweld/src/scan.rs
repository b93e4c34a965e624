//! Source discovery
//!
//! Walks the source root and yields every file with the configured
//! extension. Entries of a directory are visited directories first, then
//! files, each group in file-name order, so runs are reproducible.

use crate::error::{WeldError, WeldResult};
use std::cmp::Ordering;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// Scanner for venue source files
pub struct SourceScanner {
    /// Root directory to search
    root: PathBuf,
    /// Extension to match, without the dot
    extension: String,
}

impl SourceScanner {
    /// Create a new scanner for a directory
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Start the walk.
    ///
    /// Fails only when the root itself is missing; problems further down
    /// are logged and skipped by the returned iterator.
    pub fn scan(&self) -> WeldResult<SourceFiles> {
        if !self.root.is_dir() {
            return Err(WeldError::SourceRootNotFound(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(directories_first)
            .into_iter();

        Ok(SourceFiles {
            walker,
            extension: self.extension.clone(),
        })
    }
}

fn directories_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Lazy, single-pass sequence of matching source files
pub struct SourceFiles {
    walker: walkdir::IntoIter,
    extension: String,
}

impl Iterator for SourceFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    tracing::warn!("skipping unreadable entry {}: {}", path, err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str());
            if matches {
                return Some(entry.into_path());
            }
        }
    }
}
