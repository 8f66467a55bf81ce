//! Segment building
//!
//! Turns one compilation entry plus its resolved loop interval into a single
//! level-matched waveform:
//!
//! 1. Base piece: the intro (`0..intro_duration`) or only the loop
//!    (`loop_begin..intro_duration`), extended backwards by the crossfade
//!    length when one is set. The extension stops at the start of the source.
//! 2. `loop_count` extra copies of the unadjusted loop interval
//! 3. Optional fade-out over the last `fadeout` seconds
//! 4. Constant gain to the segment mean volume target

use crate::compilation::CompilationEntry;
use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::resolver::ResolvedLoopInterval;
use tracing::{debug, warn};

/// Default mean volume of every segment (dB)
pub const DEFAULT_SEGMENT_MEAN_DB: f64 = -14.0;

/// A finished segment and its nominal length
#[derive(Debug)]
pub struct BuiltSegment<W> {
    pub waveform: W,
    pub duration_seconds: f64,
}

/// Builds segments through an [`AudioEngine`]
#[derive(Debug, Clone, Copy)]
pub struct SegmentBuilder {
    segment_mean_db: f64,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_MEAN_DB)
    }
}

impl SegmentBuilder {
    pub fn new(segment_mean_db: f64) -> Self {
        Self { segment_mean_db }
    }

    /// Build the segment for `entry` from the opened `source`
    ///
    /// `source` is borrowed and left to the caller. Every intermediate
    /// waveform is released once superseded. A fade-out longer than the
    /// finished segment is a [`Error::Config`] raised before any engine call.
    pub fn build<E: AudioEngine>(
        &self,
        engine: &mut E,
        entry: &CompilationEntry,
        interval: &ResolvedLoopInterval,
        source: &E::Waveform,
    ) -> Result<BuiltSegment<E::Waveform>> {
        let (mut begin, mut duration) = if entry.intro {
            (0.0, interval.intro_duration_seconds)
        } else {
            (interval.loop_begin_seconds, interval.loop_duration_seconds)
        };

        if let Some(crossfade) = entry.crossfade_seconds {
            begin -= crossfade;
            duration += crossfade;
        }

        if begin < 0.0 {
            warn!(
                source_id = %entry.source_id,
                begin,
                "Segment would start before the source, shortening it by {:.3}s",
                -begin
            );
            duration += begin;
            begin = 0.0;
        }

        let total_duration =
            duration + f64::from(entry.loop_count) * interval.loop_duration_seconds;
        if let Some(fadeout) = entry.fadeout_seconds {
            if fadeout > total_duration {
                return Err(Error::Config(format!(
                    "fade-out of {}s for source {} exceeds its {:.3}s segment",
                    fadeout, entry.source_id, total_duration
                )));
            }
        }

        debug!(
            source_id = %entry.source_id,
            begin,
            duration,
            loop_count = entry.loop_count,
            "Building segment"
        );

        let mut segment = engine.trim(source, begin, duration)?;

        for _ in 0..entry.loop_count {
            let piece = engine.trim(
                source,
                interval.loop_begin_seconds,
                interval.loop_duration_seconds,
            )?;
            let joined = engine.join(&segment, &piece, None)?;
            engine.release(piece);
            engine.release(std::mem::replace(&mut segment, joined));
            duration += interval.loop_duration_seconds;
        }

        if let Some(fadeout) = entry.fadeout_seconds {
            let faded = engine.fade_out(&segment, duration - fadeout, fadeout)?;
            engine.release(std::mem::replace(&mut segment, faded));
        }

        let leveled = engine.set_mean_loudness(&segment, self.segment_mean_db)?;
        engine.release(segment);

        Ok(BuiltSegment {
            waveform: leveled,
            duration_seconds: duration,
        })
    }
}
