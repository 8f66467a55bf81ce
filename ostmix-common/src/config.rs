//! Configuration loading and root folder resolution
//!
//! Configuration is a single optional TOML file. Every field has a built-in
//! default, so a missing file is not an error; a present but unparsable file is.
//!
//! # Root Folder Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `OSTMIX_ROOT` environment variable
//! 3. `root_folder` key of the TOML config file
//! 4. Current working directory (fallback)

use crate::{Error, FadeCurve, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable consulted for the project root folder
pub const ROOT_ENV_VAR: &str = "OSTMIX_ROOT";

/// Config file name looked up inside the root folder
pub const CONFIG_FILE_NAME: &str = "ostmix.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Project root folder (optional, see module docs for priority)
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Project directory layout, relative to the root folder
    pub paths: PathsConfig,

    /// Audio processing targets and tools
    pub audio: AudioConfig,

    /// Field names used by the audio engine object database dump
    pub hirc: HircLayout,

    /// Video encoder settings for the published output
    pub video: VideoConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Project directory layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Decoded source waveforms (`<sourceId>.wav`, searched recursively)
    pub src_tracks: PathBuf,
    /// Metadata database dumps (`*.xml`) and manual overrides (`*.json`)
    pub src_track_configs: PathBuf,
    /// Compilations waiting to be processed
    pub staged: PathBuf,
    /// Compilations that were published successfully
    pub committed: PathBuf,
    /// Published output folders
    pub outputs: PathBuf,
    /// Still images referenced by compilations
    pub images: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src_tracks: PathBuf::from("src-tracks"),
            src_track_configs: PathBuf::from("src-track-configs"),
            staged: PathBuf::from("target-configs/staged"),
            committed: PathBuf::from("target-configs/committed"),
            outputs: PathBuf::from("outputs"),
            images: PathBuf::from("images"),
        }
    }
}

impl PathsConfig {
    /// Resolve every relative path against `root`
    ///
    /// Absolute paths are kept as they are.
    pub fn resolved(&self, root: &Path) -> PathsConfig {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        };
        PathsConfig {
            src_tracks: join(&self.src_tracks),
            src_track_configs: join(&self.src_track_configs),
            staged: join(&self.staged),
            committed: join(&self.committed),
            outputs: join(&self.outputs),
            images: join(&self.images),
        }
    }
}

/// Audio processing configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    pub ffmpeg: PathBuf,

    /// Mean volume every segment is set to before assembly (dB)
    pub segment_mean_db: f64,

    /// Integrated loudness of the finished compilation (LUFS)
    pub final_lufs: f64,

    /// Curve used for entry fade-outs
    pub fade_curve: FadeCurve,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            segment_mean_db: -14.0,
            final_lufs: -14.0,
            fade_curve: FadeCurve::default(),
        }
    }
}

/// Element and field names of the object database XML dump
///
/// Different games ship slightly different dumps; the defaults match the
/// common `<obj>` / `<fld na=".." va=".."/>` layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HircLayout {
    pub object_tag: String,
    pub field_tag: String,
    pub name_attr: String,
    pub value_attr: String,
    pub source_id_field: String,
    pub begin_trim_field: String,
    pub end_trim_field: String,
    pub src_duration_field: String,
}

impl Default for HircLayout {
    fn default() -> Self {
        Self {
            object_tag: "obj".to_string(),
            field_tag: "fld".to_string(),
            name_attr: "na".to_string(),
            value_attr: "va".to_string(),
            source_id_field: "sourceID".to_string(),
            begin_trim_field: "fBeginTrimOffset".to_string(),
            end_trim_field: "fEndTrimOffset".to_string(),
            src_duration_field: "fSrcDuration".to_string(),
        }
    }
}

/// Video encoder configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    /// x264 constant rate factor
    pub crf: u8,
    /// x264 preset
    pub preset: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            crf: 18,
            preset: "medium".to_string(),
        }
    }
}

/// Resolve the project root folder
///
/// `config` is consulted only when neither the CLI argument nor the
/// environment variable is set.
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: Option<&TomlConfig>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root) = config.and_then(|c| c.root_folder.as_ref()) {
        return root.clone();
    }

    // Priority 4: Current directory
    PathBuf::from(".")
}

/// Locate the config file to load
///
/// An explicit path is returned as-is (it must exist, checked by
/// [`load_toml_config`]). Otherwise `<root>/ostmix.toml` and then the
/// platform config directory are tried.
pub fn locate_config_file(explicit: Option<&Path>, root_hint: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(root) = root_hint {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("ostmix").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load TOML configuration from `path`
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load configuration, falling back to defaults when no file exists
///
/// An explicitly requested file that cannot be read is an error; a file that
/// was merely looked for and not found yields defaults with a warning.
pub fn load_or_default(explicit: Option<&Path>, root_hint: Option<&Path>) -> Result<TomlConfig> {
    match locate_config_file(explicit, root_hint) {
        Some(path) => load_toml_config(&path),
        None => {
            warn!("No configuration file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}
