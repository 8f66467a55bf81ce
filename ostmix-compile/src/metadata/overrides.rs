//! Manual override files
//!
//! A JSON object mapping base source ids to one timing record each:
//!
//! ```json
//! { "119860714": { "fBeginTrimOffset": 2400.0, "fEndTrimOffset": -800.0, "fSrcDuration": 96000.0 } }
//! ```

use super::LoopMetadataRecord;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Parse one override file
///
/// Entries come back in id order so repeated loads are reproducible.
pub fn parse_overrides(path: &Path, text: &str) -> Result<Vec<(String, LoopMetadataRecord)>> {
    let map: BTreeMap<String, LoopMetadataRecord> =
        serde_json::from_str(text).map_err(|e| Error::metadata(path, e.to_string()))?;
    Ok(map.into_iter().collect())
}
