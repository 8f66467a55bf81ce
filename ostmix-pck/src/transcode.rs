//! `.wem` to `.wav` conversion
//!
//! Two external tools: `ww2ogg` rebuilds a standard Ogg Vorbis stream next to
//! the input, then `ffmpeg` decodes it to WAV. Both intermediates are removed
//! once the WAV exists.

use crate::error::{PckError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Codebook file shipped with ww2ogg for current Wwise versions
pub const DEFAULT_CODEBOOKS: &str = "packed_codebooks_aoTuV_603.bin";

/// Runs the external conversion tools
#[derive(Debug, Clone)]
pub struct Transcoder {
    ww2ogg: PathBuf,
    codebooks: PathBuf,
    ffmpeg: PathBuf,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new("ww2ogg", DEFAULT_CODEBOOKS, "ffmpeg")
    }
}

impl Transcoder {
    pub fn new(
        ww2ogg: impl Into<PathBuf>,
        codebooks: impl Into<PathBuf>,
        ffmpeg: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ww2ogg: ww2ogg.into(),
            codebooks: codebooks.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Convert `wem` to a sibling `.wav`, removing the `.wem` and `.ogg`
    pub fn transcode(&self, wem: &Path) -> Result<PathBuf> {
        let ogg = wem.with_extension("ogg");
        let wav = wem.with_extension("wav");

        let mut ww2ogg = Command::new(&self.ww2ogg);
        ww2ogg.arg(wem).arg("--pcb").arg(&self.codebooks);
        run_tool(&mut ww2ogg, &self.ww2ogg, wem)?;

        let mut ffmpeg = Command::new(&self.ffmpeg);
        ffmpeg.arg("-y").arg("-i").arg(&ogg).arg(&wav);
        run_tool(&mut ffmpeg, &self.ffmpeg, &ogg)?;

        std::fs::remove_file(wem)?;
        std::fs::remove_file(&ogg)?;
        debug!("Transcoded {}", wav.display());
        Ok(wav)
    }

    /// Transcode every path in order, stopping at the first failure
    pub fn transcode_all(&self, wems: &[PathBuf]) -> Result<Vec<PathBuf>> {
        wems.iter().map(|wem| self.transcode(wem)).collect()
    }
}

fn run_tool(command: &mut Command, tool: &Path, input: &Path) -> Result<()> {
    let tool_error = |reason: String| PckError::Tool {
        tool: tool.display().to_string(),
        path: input.to_path_buf(),
        reason,
    };

    let output = command
        .output()
        .map_err(|e| tool_error(format!("failed to spawn: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last = stderr.lines().last().unwrap_or("").trim().to_string();
        return Err(tool_error(format!("exited with {}: {}", output.status, last)));
    }
    Ok(())
}
