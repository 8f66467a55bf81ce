//! Loop metadata store
//!
//! Holds every timing observation loaded from the object database dumps plus
//! the hand-curated override map. Built once per run, read-only afterwards.

mod hirc;
mod overrides;

pub use hirc::parse_database;
pub use overrides::parse_overrides;

use crate::error::{Error, Result};
use ostmix_common::config::HircLayout;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One candidate timing observation for a source
///
/// Offsets are in milliseconds as stored by the audio engine. An end offset
/// `<= 0` is measured from the end of the source.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LoopMetadataRecord {
    #[serde(rename = "fBeginTrimOffset")]
    pub begin_trim_offset_ms: f64,
    #[serde(rename = "fEndTrimOffset")]
    pub end_trim_offset_ms: f64,
    #[serde(rename = "fSrcDuration")]
    pub src_duration_ms: f64,
}

impl LoopMetadataRecord {
    pub fn new(begin_trim_offset_ms: f64, end_trim_offset_ms: f64, src_duration_ms: f64) -> Self {
        Self {
            begin_trim_offset_ms,
            end_trim_offset_ms,
            src_duration_ms,
        }
    }
}

/// Strip the alternate-mix marker (`+suffix`) from a source id
///
/// Alternate mixes share the timing profile of the base source.
pub fn base_source_id(id: &str) -> &str {
    id.split('+').next().unwrap_or(id)
}

/// In-memory index of loop metadata keyed by base source id
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    records: HashMap<String, Vec<LoopMetadataRecord>>,
    overrides: HashMap<String, LoopMetadataRecord>,
}

impl MetadataStore {
    /// Load database dumps and override files
    ///
    /// Database records from all files are merged per source id. Override
    /// collisions are last-write-wins in the given file order.
    pub fn load<P: AsRef<Path>>(
        database_paths: &[P],
        override_paths: &[P],
        layout: &HircLayout,
    ) -> Result<Self> {
        let mut store = MetadataStore::default();

        for path in database_paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::metadata(path, e.to_string()))?;
            let parsed = parse_database(path, &text, layout)?;
            debug!(
                "Parsed {} loop records from {}",
                parsed.len(),
                path.display()
            );
            for (id, record) in parsed {
                store.add_record(id, record);
            }
        }

        for path in override_paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::metadata(path, e.to_string()))?;
            let parsed = parse_overrides(path, &text)?;
            debug!("Parsed {} overrides from {}", parsed.len(), path.display());
            for (id, record) in parsed {
                store.set_override(id, record);
            }
        }

        info!(
            "Metadata store loaded: {} sources from {} database file(s), {} override(s) from {} file(s)",
            store.records.len(),
            database_paths.len(),
            store.overrides.len(),
            override_paths.len()
        );

        Ok(store)
    }

    /// Load every `*.xml` (database) and `*.json` (override) file in `dir`
    ///
    /// Files are processed in file name order.
    pub fn from_directory(dir: &Path, layout: &HircLayout) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::metadata(dir, e.to_string()))?;

        let mut database_paths: Vec<PathBuf> = Vec::new();
        let mut override_paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::metadata(dir, e.to_string()))?.path();
            if !path.is_file() {
                continue;
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some("xml") => database_paths.push(path),
                Some("json") => override_paths.push(path),
                _ => {}
            }
        }
        database_paths.sort();
        override_paths.sort();

        Self::load(&database_paths, &override_paths, layout)
    }

    /// Append one database record for `id`
    pub fn add_record(&mut self, id: impl Into<String>, record: LoopMetadataRecord) {
        self.records.entry(id.into()).or_default().push(record);
    }

    /// Set the override record for `id`, replacing any previous one
    pub fn set_override(&mut self, id: impl Into<String>, record: LoopMetadataRecord) {
        self.overrides.insert(id.into(), record);
    }

    /// All database records for a base source id
    pub fn records(&self, id: &str) -> Option<&[LoopMetadataRecord]> {
        self.records.get(id).map(Vec::as_slice)
    }

    /// Override record for a base source id
    pub fn override_record(&self, id: &str) -> Option<&LoopMetadataRecord> {
        self.overrides.get(id)
    }

    /// Number of distinct sources with database records
    pub fn source_count(&self) -> usize {
        self.records.len()
    }

    /// Number of override records
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}
