//! Loop-point resolution
//!
//! Turns the timing records of one source into the intro and loop intervals
//! used by the segment builder.
//!
//! # Algorithm
//!
//! 1. The `+suffix` of the id is ignored for lookup.
//! 2. An override record is authoritative: `end <= 0` is measured from the
//!    end of the source, `begin` is used as-is.
//! 3. Otherwise every database record becomes a normalized `(begin, end)`
//!    candidate in seconds (negative `begin` and non-positive `end` are
//!    measured from the end of the source); duplicates are dropped.
//! 4. The longest candidate is the loop span.
//! 5. Gap fill: if more than one candidate ends where the loop span begins,
//!    the shortest of them is the real pre-loop intro and the loop begin
//!    moves back to its begin. A single match is the span itself seen from
//!    another record and changes nothing.

use crate::error::{Error, Result};
use crate::metadata::{base_source_id, LoopMetadataRecord, MetadataStore};
use std::cmp::Ordering;
use tracing::debug;

/// Absolute tolerance (seconds) for "ends where the loop begins"
///
/// 0.1 ms, about five samples at 48 kHz, and well above the rounding error of
/// millisecond offsets divided by 1000.
pub const GAP_FILL_TOLERANCE_SECONDS: f64 = 1e-4;

/// Intro and loop intervals of one source, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLoopInterval {
    /// Length of the playable intro, from 0 to the end of the loop span
    pub intro_duration_seconds: f64,
    /// Start of the repeatable part
    pub loop_begin_seconds: f64,
    /// `intro_duration_seconds - loop_begin_seconds`
    pub loop_duration_seconds: f64,
}

impl ResolvedLoopInterval {
    fn from_span(begin: f64, end: f64) -> Self {
        Self {
            intro_duration_seconds: end,
            loop_begin_seconds: begin,
            loop_duration_seconds: end - begin,
        }
    }
}

/// Loop-point resolver over a loaded metadata store
#[derive(Debug, Clone, Copy)]
pub struct LoopPointResolver<'a> {
    store: &'a MetadataStore,
}

impl<'a> LoopPointResolver<'a> {
    pub fn new(store: &'a MetadataStore) -> Self {
        Self { store }
    }

    /// Resolve the loop interval of `id`
    ///
    /// Fails with [`Error::UnresolvedLoopPoint`] (carrying the id as given)
    /// when neither an override nor a database record exists.
    pub fn resolve(&self, id: &str) -> Result<ResolvedLoopInterval> {
        let base = base_source_id(id);

        if let Some(record) = self.store.override_record(base) {
            let interval = from_override(record);
            debug!(source_id = %id, ?interval, "Resolved from override");
            return Ok(interval);
        }

        let candidates = self
            .store
            .records(base)
            .map(normalized_candidates)
            .unwrap_or_default();

        let interval = select_interval(&candidates)
            .ok_or_else(|| Error::UnresolvedLoopPoint(id.to_string()))?;
        debug!(
            source_id = %id,
            candidates = candidates.len(),
            ?interval,
            "Resolved from database"
        );
        Ok(interval)
    }
}

fn from_override(record: &LoopMetadataRecord) -> ResolvedLoopInterval {
    let begin = record.begin_trim_offset_ms / 1000.0;
    let mut end = record.end_trim_offset_ms / 1000.0;
    if end <= 0.0 {
        end += record.src_duration_ms / 1000.0;
    }
    ResolvedLoopInterval::from_span(begin, end)
}

/// Normalize records into distinct `(begin, end)` candidates in seconds
///
/// The result is sorted by `(begin, end)`, so selection does not depend on
/// the order in which records were loaded.
pub fn normalized_candidates(records: &[LoopMetadataRecord]) -> Vec<(f64, f64)> {
    let mut candidates: Vec<(f64, f64)> = records
        .iter()
        .map(|record| {
            let src_duration = record.src_duration_ms / 1000.0;
            let mut begin = record.begin_trim_offset_ms / 1000.0;
            let mut end = record.end_trim_offset_ms / 1000.0;
            if begin < 0.0 {
                begin += src_duration;
            }
            if end <= 0.0 {
                end += src_duration;
            }
            (begin, end)
        })
        .collect();

    candidates.sort_by(|a, b| compare_points(*a, *b));
    candidates.dedup();
    candidates
}

/// Pick the loop span from normalized candidates
///
/// Ties on span length go to the earliest begin. Returns `None` for an empty
/// candidate set.
pub fn select_interval(candidates: &[(f64, f64)]) -> Option<ResolvedLoopInterval> {
    // Candidates are sorted, so the first maximum is the earliest one
    let (mut best_begin, best_end) = candidates.iter().copied().fold(None, |best, point| {
        match best {
            Some(current) if span(point) <= span(current) => Some(current),
            _ => Some(point),
        }
    })?;

    let extension_points: Vec<(f64, f64)> = candidates
        .iter()
        .copied()
        .filter(|&(_, end)| (end - best_begin).abs() <= GAP_FILL_TOLERANCE_SECONDS)
        .collect();

    if extension_points.len() > 1 {
        let shortest = extension_points.iter().copied().fold(None, |best, point| {
            match best {
                Some(current) if span(point) >= span(current) => Some(current),
                _ => Some(point),
            }
        });
        if let Some((begin, _)) = shortest {
            best_begin = begin;
        }
    }

    Some(ResolvedLoopInterval::from_span(best_begin, best_end))
}

fn span((begin, end): (f64, f64)) -> f64 {
    end - begin
}

fn compare_points(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}
