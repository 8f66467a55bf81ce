//! Compilation assembly
//!
//! Folds the entries of a compilation into one continuous track while
//! keeping the running elapsed time used for chapter markers.
//!
//! Elapsed time follows the nominal segment durations: an entry with a
//! crossfade overlaps the previous segment by that many seconds, so its
//! chapter starts that much earlier in the finished track.

use crate::cache::ResolutionCache;
use crate::compilation::CompilationEntry;
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::segment::SegmentBuilder;
use crate::waveform::WaveformIndex;
use ostmix_common::human_time::format_chapter_line;
use tracing::{debug, info};

/// Default integrated loudness of the finished track (LUFS)
pub const DEFAULT_FINAL_LUFS: f64 = -14.0;

/// Chapter marker at the start of one entry
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub elapsed_seconds: f64,
    pub name: String,
}

impl Chapter {
    /// `H:MM:SS - name`
    pub fn line(&self) -> String {
        format_chapter_line(self.elapsed_seconds, &self.name)
    }
}

/// Running elapsed time and chapter list of one compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineState {
    pub elapsed_seconds: f64,
    pub chapters: Vec<Chapter>,
}

impl TimelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chapter at the current elapsed time
    pub fn mark_chapter(&mut self, name: &str) -> &Chapter {
        self.chapters.push(Chapter {
            elapsed_seconds: self.elapsed_seconds,
            name: name.to_string(),
        });
        &self.chapters[self.chapters.len() - 1]
    }

    /// Advance past a segment, minus the part that overlaps the previous one
    pub fn advance(&mut self, duration_seconds: f64, crossfade_seconds: Option<f64>) {
        self.elapsed_seconds += match crossfade_seconds {
            Some(crossfade) => duration_seconds - crossfade,
            None => duration_seconds,
        };
    }
}

/// Result of assembling one compilation
#[derive(Debug)]
pub struct AssembledCompilation<W> {
    /// Finished track, `None` for a compilation without entries
    pub track: Option<W>,
    pub total_duration_seconds: f64,
    pub chapters: Vec<Chapter>,
}

impl<W> AssembledCompilation<W> {
    /// Chapter lines joined by newlines
    pub fn timestamps(&self) -> String {
        self.chapters
            .iter()
            .map(Chapter::line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Assembles compilations from resolved, built segments
pub struct CompilationAssembler<'s, 'm> {
    cache: &'s mut ResolutionCache<'m>,
    waveforms: &'s WaveformIndex,
    builder: SegmentBuilder,
    final_lufs: f64,
}

impl<'s, 'm> CompilationAssembler<'s, 'm> {
    pub fn new(cache: &'s mut ResolutionCache<'m>, waveforms: &'s WaveformIndex) -> Self {
        Self {
            cache,
            waveforms,
            builder: SegmentBuilder::default(),
            final_lufs: DEFAULT_FINAL_LUFS,
        }
    }

    pub fn with_segment_builder(mut self, builder: SegmentBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_final_lufs(mut self, final_lufs: f64) -> Self {
        self.final_lufs = final_lufs;
        self
    }

    /// Assemble `entries` in order
    ///
    /// The first error aborts assembly; nothing partial is returned.
    pub fn assemble<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        entries: &[CompilationEntry],
    ) -> Result<AssembledCompilation<E::Waveform>> {
        let mut timeline = TimelineState::new();
        let mut track: Option<E::Waveform> = None;

        for entry in entries {
            let chapter = timeline.mark_chapter(&entry.name);
            info!("{}", chapter.line());

            let interval = self.cache.resolve(&entry.source_id)?;
            let path = self.waveforms.find(&entry.source_id)?;

            let source = engine.open(&path)?;
            let segment = self.builder.build(engine, entry, &interval, &source)?;
            engine.release(source);

            track = Some(match track {
                None => segment.waveform,
                Some(previous) => {
                    let joined = engine.join(&previous, &segment.waveform, entry.crossfade_seconds)?;
                    engine.release(previous);
                    engine.release(segment.waveform);
                    joined
                }
            });

            timeline.advance(segment.duration_seconds, entry.crossfade_seconds);
            debug!(
                source_id = %entry.source_id,
                segment_seconds = segment.duration_seconds,
                elapsed_seconds = timeline.elapsed_seconds,
                "Segment appended"
            );
        }

        let track = match track {
            Some(assembled) => {
                let normalized = engine.normalize_loudness(&assembled, self.final_lufs)?;
                engine.release(assembled);
                Some(normalized)
            }
            None => None,
        };

        info!(
            "Assembled {} chapter(s), {:.3}s total",
            timeline.chapters.len(),
            timeline.elapsed_seconds
        );

        Ok(AssembledCompilation {
            track,
            total_duration_seconds: timeline.elapsed_seconds,
            chapters: timeline.chapters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, SymbolicEngine};
    use crate::error::Error;
    use crate::metadata::{LoopMetadataRecord, MetadataStore};
    use crate::resolver::LoopPointResolver;
    use std::path::PathBuf;

    fn store(spans: &[(&str, f64, f64)]) -> MetadataStore {
        let mut store = MetadataStore::default();
        for &(id, begin, end) in spans {
            store.add_record(id, LoopMetadataRecord::new(begin * 1000.0, end * 1000.0, 600_000.0));
        }
        store
    }

    fn index(ids: &[&str]) -> WaveformIndex {
        let mut index = WaveformIndex::default();
        for id in ids {
            index.insert(id, PathBuf::from(format!("/src/{}.wav", id)));
        }
        index
    }

    #[test]
    fn test_timeline_advance() {
        let mut timeline = TimelineState::new();
        timeline.mark_chapter("a");
        timeline.advance(10.0, None);
        timeline.mark_chapter("b");
        timeline.advance(8.0, Some(2.0));
        timeline.mark_chapter("c");
        timeline.advance(5.0, None);

        let lines: Vec<String> = timeline.chapters.iter().map(Chapter::line).collect();
        assert_eq!(lines, vec!["0:00:00 - a", "0:00:10 - b", "0:00:16 - c"]);
        assert_eq!(timeline.elapsed_seconds, 21.0);
    }

    #[test]
    fn test_crossfaded_chapters_and_total() {
        // Segments of 10 s, 8 s (2 s crossfade, base piece 2..10) and 5 s
        let store = store(&[("1", 0.0, 10.0), ("2", 4.0, 10.0), ("3", 0.0, 5.0)]);
        let waveforms = index(&["1", "2", "3"]);
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let entries = vec![
            CompilationEntry::new("1", "First"),
            CompilationEntry::new("2", "Second").without_intro().with_crossfade(2.0),
            CompilationEntry::new("3", "Third"),
        ];

        let assembled = CompilationAssembler::new(&mut cache, &waveforms)
            .assemble(&mut engine, &entries)
            .unwrap();

        assert_eq!(
            assembled.timestamps(),
            "0:00:00 - First\n0:00:10 - Second\n0:00:16 - Third"
        );
        assert_eq!(assembled.total_duration_seconds, 21.0);

        let track = assembled.track.unwrap();
        assert_eq!(track.duration_seconds, 21.0);

        let joins: Vec<Option<f64>> = engine
            .calls()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Join { crossfade, .. } => Some(*crossfade),
                _ => None,
            })
            .collect();
        assert_eq!(joins, vec![Some(2.0), None]);
    }

    #[test]
    fn test_final_normalization_applied_once() {
        let store = store(&[("1", 0.0, 10.0)]);
        let waveforms = index(&["1"]);
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let assembled = CompilationAssembler::new(&mut cache, &waveforms)
            .with_final_lufs(-16.0)
            .assemble(&mut engine, &[CompilationEntry::new("1", "Only")])
            .unwrap();

        let normalizations: Vec<&EngineCall> = engine
            .calls()
            .iter()
            .filter(|call| matches!(call, EngineCall::NormalizeLoudness { .. }))
            .collect();
        assert_eq!(normalizations.len(), 1);
        assert!(matches!(
            normalizations[0],
            EngineCall::NormalizeLoudness { target_lufs, result, .. }
                if *target_lufs == -16.0 && Some(*result) == assembled.track.as_ref().map(|t| t.id)
        ));
    }

    #[test]
    fn test_empty_compilation() {
        let store = MetadataStore::default();
        let waveforms = WaveformIndex::default();
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let assembled = CompilationAssembler::new(&mut cache, &waveforms)
            .assemble(&mut engine, &[])
            .unwrap();

        assert!(assembled.track.is_none());
        assert_eq!(assembled.total_duration_seconds, 0.0);
        assert!(assembled.chapters.is_empty());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_unresolved_source_aborts() {
        let store = store(&[("1", 0.0, 10.0)]);
        let waveforms = index(&["1", "2"]);
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let result = CompilationAssembler::new(&mut cache, &waveforms).assemble(
            &mut engine,
            &[CompilationEntry::new("1", "One"), CompilationEntry::new("2", "Two")],
        );
        assert!(matches!(result, Err(Error::UnresolvedLoopPoint(id)) if id == "2"));
    }

    #[test]
    fn test_missing_waveform_aborts_before_engine_use() {
        let store = store(&[("1", 0.0, 10.0)]);
        let waveforms = WaveformIndex::default();
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let result = CompilationAssembler::new(&mut cache, &waveforms)
            .assemble(&mut engine, &[CompilationEntry::new("1", "One")]);
        assert!(matches!(result, Err(Error::SourceNotFound(id)) if id == "1"));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_alternate_mix_uses_base_timing_and_own_waveform() {
        let store = store(&[("5", 2.0, 12.0)]);
        let waveforms = index(&["5+vocal"]);
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let mut engine = SymbolicEngine::new();

        let assembled = CompilationAssembler::new(&mut cache, &waveforms)
            .assemble(&mut engine, &[CompilationEntry::new("5+vocal", "Vocal")])
            .unwrap();

        assert_eq!(assembled.total_duration_seconds, 12.0);
        assert!(matches!(
            &engine.calls()[0],
            EngineCall::Open { path, .. } if path == &PathBuf::from("/src/5+vocal.wav")
        ));
    }
}
