//! Audio engine abstraction
//!
//! The core never touches samples. Every audio operation goes through an
//! [`AudioEngine`], which is expected to be deterministic: the same inputs
//! produce bit-identical output.
//!
//! Two implementations exist:
//! - [`ffmpeg::FfmpegEngine`]: runs `ffmpeg` subprocesses on WAV files in a
//!   scratch directory
//! - [`symbolic::SymbolicEngine`]: tracks durations only and records every
//!   call (dry runs and tests)

pub mod ffmpeg;
pub mod symbolic;

use crate::error::Result;
use std::fmt::Debug;
use std::path::Path;

pub use ffmpeg::{FfmpegEngine, WaveFile};
pub use symbolic::{EngineCall, SymbolicEngine, SymbolicWaveform};

/// Audio processing primitives used by the segment builder and assembler
///
/// Operations never modify their inputs; each returns a new waveform.
/// Callers hand superseded intermediates back through [`AudioEngine::release`].
pub trait AudioEngine {
    /// Handle to one waveform owned by this engine
    type Waveform: Debug;

    /// Open an existing waveform file (never released by the engine)
    fn open(&mut self, path: &Path) -> Result<Self::Waveform>;

    /// Cut `duration` seconds starting at `begin`
    fn trim(&mut self, src: &Self::Waveform, begin: f64, duration: f64) -> Result<Self::Waveform>;

    /// Append `b` to `a`, blending the last `crossfade` seconds of `a` with
    /// the first seconds of `b` when given, plain concatenation otherwise
    fn join(
        &mut self,
        a: &Self::Waveform,
        b: &Self::Waveform,
        crossfade: Option<f64>,
    ) -> Result<Self::Waveform>;

    /// Fade out over `duration` seconds starting at `begin`
    fn fade_out(&mut self, w: &Self::Waveform, begin: f64, duration: f64) -> Result<Self::Waveform>;

    /// Apply a constant gain so the mean volume equals `target_db`
    fn set_mean_loudness(&mut self, w: &Self::Waveform, target_db: f64) -> Result<Self::Waveform>;

    /// EBU R128 normalization to `target_lufs` integrated loudness
    fn normalize_loudness(&mut self, w: &Self::Waveform, target_lufs: f64)
        -> Result<Self::Waveform>;

    /// Give back a waveform that is no longer needed
    fn release(&mut self, w: Self::Waveform) {
        drop(w);
    }
}
