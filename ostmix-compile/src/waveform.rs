//! Source waveform lookup
//!
//! Decoded sources live anywhere below the source tracks directory as
//! `<sourceId>.wav`. The tree is walked once and indexed by file name.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Index of `*.wav` files keyed by file stem
#[derive(Debug, Clone, Default)]
pub struct WaveformIndex {
    files: HashMap<String, Vec<PathBuf>>,
}

impl WaveformIndex {
    /// Walk `root` recursively and index every `.wav` file
    ///
    /// Symlinks are not followed. Unreadable entries are skipped with a
    /// warning; a missing root is an error.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Source tracks directory {} does not exist",
                root.display()
            )));
        }

        let mut index = WaveformIndex::default();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_wav = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if !is_wav {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                index.insert(stem, path.to_path_buf());
            }
        }

        for paths in index.files.values_mut() {
            paths.sort();
        }
        debug!(
            "Indexed {} source waveform(s) under {}",
            index.files.len(),
            root.display()
        );
        Ok(index)
    }

    pub fn insert(&mut self, source_id: &str, path: PathBuf) {
        self.files.entry(source_id.to_string()).or_default().push(path);
    }

    /// Path of the waveform for `source_id` (full id, suffix included)
    ///
    /// With several candidates the lexicographically first path is used.
    pub fn find(&self, source_id: &str) -> Result<PathBuf> {
        let paths = self
            .files
            .get(source_id)
            .filter(|paths| !paths.is_empty())
            .ok_or_else(|| Error::SourceNotFound(source_id.to_string()))?;

        let first = paths.iter().min().cloned().unwrap_or_default();
        if paths.len() > 1 {
            warn!(
                "{} waveform files match {}, using {}",
                paths.len(),
                source_id,
                first.display()
            );
        }
        Ok(first)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
