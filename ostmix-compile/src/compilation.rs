//! Compilation definitions
//!
//! A compilation is a JSON file in the staged directory:
//!
//! ```json
//! {
//!   "meta_data": {
//!     "title": "Night Market OST",
//!     "description": "Tracklist:\n{timestamps}",
//!     "tags": ["ost", "extended"],
//!     "image": "night-market.png"
//!   },
//!   "compilation": [
//!     { "id": "482910", "name": "Lantern Row", "nloop": 2, "fadeout": 8 },
//!     { "id": "482911+calm", "name": "Lantern Row (calm)", "intro": false, "crossfade": 3 }
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// One track in a compilation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompilationEntry {
    #[serde(rename = "id")]
    pub source_id: String,

    /// Chapter label
    pub name: String,

    /// Play from 0 (`true`) or start at the loop begin (`false`)
    #[serde(default = "default_intro")]
    pub intro: bool,

    /// Extra loop repetitions after the base piece
    #[serde(rename = "nloop", default)]
    pub loop_count: u32,

    /// Overlap with the previous segment, seconds
    #[serde(rename = "crossfade", default)]
    pub crossfade_seconds: Option<f64>,

    /// Fade-out length at the end of the segment, seconds
    #[serde(rename = "fadeout", default)]
    pub fadeout_seconds: Option<f64>,
}

fn default_intro() -> bool {
    true
}

impl CompilationEntry {
    pub fn new(source_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            name: name.into(),
            intro: true,
            loop_count: 0,
            crossfade_seconds: None,
            fadeout_seconds: None,
        }
    }

    pub fn without_intro(mut self) -> Self {
        self.intro = false;
        self
    }

    pub fn with_loops(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_crossfade(mut self, seconds: f64) -> Self {
        self.crossfade_seconds = Some(seconds);
        self
    }

    pub fn with_fadeout(mut self, seconds: f64) -> Self {
        self.fadeout_seconds = Some(seconds);
        self
    }
}

/// Publishing metadata of a compilation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilationMetadata {
    pub title: String,
    /// Template; `{timestamps}` is replaced by the chapter list
    pub description: String,
    pub tags: Vec<String>,
    /// Still image file name, relative to the images directory
    pub image: String,
}

/// A complete compilation definition
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Compilation {
    #[serde(rename = "meta_data", default)]
    pub metadata: CompilationMetadata,

    #[serde(rename = "compilation")]
    pub entries: Vec<CompilationEntry>,
}

impl Compilation {
    /// Parse a compilation definition from JSON text
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        let compilation: Compilation = serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        compilation.validate(path)?;
        Ok(compilation)
    }

    /// Load a compilation definition from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_json(path, &text)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            let invalid = |what: &str| {
                Error::Config(format!(
                    "{}: entry {} ({}) has {}",
                    path.display(),
                    index,
                    entry.source_id,
                    what
                ))
            };
            if entry.source_id.is_empty() {
                return Err(invalid("an empty id"));
            }
            if matches!(entry.crossfade_seconds, Some(x) if !x.is_finite() || x < 0.0) {
                return Err(invalid("a negative crossfade"));
            }
            if matches!(entry.fadeout_seconds, Some(x) if !x.is_finite() || x < 0.0) {
                return Err(invalid("a negative fadeout"));
            }
        }
        Ok(())
    }
}
