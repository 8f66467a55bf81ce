//! Duration-only audio engine
//!
//! Models each waveform as an id plus a length in seconds and records every
//! primitive call with its exact parameters. Used by `--dry-run` to print the
//! chapter list without rendering audio, and by tests to check the call
//! sequence the builder and assembler produce.

use super::AudioEngine;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Symbolic waveform handle
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicWaveform {
    pub id: usize,
    /// Length in seconds; opened sources report 0.0
    pub duration_seconds: f64,
}

/// One recorded primitive call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Open {
        path: PathBuf,
        result: usize,
    },
    Trim {
        src: usize,
        begin: f64,
        duration: f64,
        result: usize,
    },
    Join {
        a: usize,
        b: usize,
        crossfade: Option<f64>,
        result: usize,
    },
    FadeOut {
        src: usize,
        begin: f64,
        duration: f64,
        result: usize,
    },
    SetMeanLoudness {
        src: usize,
        target_db: f64,
        result: usize,
    },
    NormalizeLoudness {
        src: usize,
        target_lufs: f64,
        result: usize,
    },
    Release {
        id: usize,
    },
}

/// Engine that records calls instead of processing audio
#[derive(Debug, Default)]
pub struct SymbolicEngine {
    next_id: usize,
    calls: Vec<EngineCall>,
    fail_on: Option<&'static str>,
}

impl SymbolicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of the named operation fail (`"trim"`, `"join"`, ...)
    pub fn failing_on(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    fn allocate(&mut self, operation: &'static str, duration_seconds: f64) -> Result<SymbolicWaveform> {
        if self.fail_on == Some(operation) {
            return Err(Error::engine(operation, "simulated failure"));
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(SymbolicWaveform {
            id,
            duration_seconds,
        })
    }
}

impl AudioEngine for SymbolicEngine {
    type Waveform = SymbolicWaveform;

    fn open(&mut self, path: &Path) -> Result<SymbolicWaveform> {
        let w = self.allocate("open", 0.0)?;
        self.calls.push(EngineCall::Open {
            path: path.to_path_buf(),
            result: w.id,
        });
        Ok(w)
    }

    fn trim(&mut self, src: &SymbolicWaveform, begin: f64, duration: f64) -> Result<SymbolicWaveform> {
        let w = self.allocate("trim", duration)?;
        self.calls.push(EngineCall::Trim {
            src: src.id,
            begin,
            duration,
            result: w.id,
        });
        Ok(w)
    }

    fn join(
        &mut self,
        a: &SymbolicWaveform,
        b: &SymbolicWaveform,
        crossfade: Option<f64>,
    ) -> Result<SymbolicWaveform> {
        let overlap = crossfade.unwrap_or(0.0);
        let w = self.allocate("join", a.duration_seconds + b.duration_seconds - overlap)?;
        self.calls.push(EngineCall::Join {
            a: a.id,
            b: b.id,
            crossfade,
            result: w.id,
        });
        Ok(w)
    }

    fn fade_out(&mut self, src: &SymbolicWaveform, begin: f64, duration: f64) -> Result<SymbolicWaveform> {
        let w = self.allocate("fade_out", src.duration_seconds)?;
        self.calls.push(EngineCall::FadeOut {
            src: src.id,
            begin,
            duration,
            result: w.id,
        });
        Ok(w)
    }

    fn set_mean_loudness(&mut self, src: &SymbolicWaveform, target_db: f64) -> Result<SymbolicWaveform> {
        let w = self.allocate("set_mean_loudness", src.duration_seconds)?;
        self.calls.push(EngineCall::SetMeanLoudness {
            src: src.id,
            target_db,
            result: w.id,
        });
        Ok(w)
    }

    fn normalize_loudness(
        &mut self,
        src: &SymbolicWaveform,
        target_lufs: f64,
    ) -> Result<SymbolicWaveform> {
        let w = self.allocate("normalize_loudness", src.duration_seconds)?;
        self.calls.push(EngineCall::NormalizeLoudness {
            src: src.id,
            target_lufs,
            result: w.id,
        });
        Ok(w)
    }

    fn release(&mut self, w: SymbolicWaveform) {
        self.calls.push(EngineCall::Release { id: w.id });
    }
}
