//! Run orchestration
//!
//! One run loads the metadata store and the waveform index once, then
//! processes every staged compilation in file name order. The first failure
//! aborts the run; compilations already published stay committed, the
//! failing one and everything after it stay staged.

use crate::assembler::{AssembledCompilation, Chapter, CompilationAssembler};
use crate::cache::ResolutionCache;
use crate::compilation::Compilation;
use crate::engine::{AudioEngine, FfmpegEngine, SymbolicEngine};
use crate::error::{Error, Result};
use crate::metadata::MetadataStore;
use crate::publish::Publisher;
use crate::resolver::{LoopPointResolver, ResolvedLoopInterval};
use crate::segment::SegmentBuilder;
use crate::waveform::WaveformIndex;
use ostmix_common::config::{PathsConfig, TomlConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How compilations are processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Render audio with ffmpeg and publish
    Publish,
    /// Compute chapters and durations only; nothing is written or moved
    DryRun,
}

/// Outcome of one processed compilation
#[derive(Debug, Clone)]
pub struct CompilationReport {
    pub config_path: PathBuf,
    pub chapters: Vec<Chapter>,
    pub total_duration_seconds: f64,
    /// Output directory (publish mode only)
    pub output_dir: Option<PathBuf>,
}

/// A project root with its resolved layout
#[derive(Debug, Clone)]
pub struct Project {
    config: TomlConfig,
    paths: PathsConfig,
}

impl Project {
    pub fn new(root: &Path, config: TomlConfig) -> Self {
        let paths = config.paths.resolved(root);
        Self { config, paths }
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    pub fn load_metadata(&self) -> Result<MetadataStore> {
        MetadataStore::from_directory(&self.paths.src_track_configs, &self.config.hirc)
    }

    /// Staged compilation files, sorted by file name
    pub fn staged_compilations(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.paths.staged;
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::Config(format!("Read staged directory {} failed: {}", dir.display(), e))
        })?;

        let mut staged = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                staged.push(path);
            }
        }
        staged.sort();
        Ok(staged)
    }

    /// Resolve loop intervals without building anything
    pub fn resolve_ids(&self, ids: &[String]) -> Result<Vec<(String, ResolvedLoopInterval)>> {
        let store = self.load_metadata()?;
        let resolver = LoopPointResolver::new(&store);
        ids.iter()
            .map(|id| resolver.resolve(id).map(|interval| (id.clone(), interval)))
            .collect()
    }

    /// Process every staged compilation
    pub fn run(&self, mode: RunMode) -> Result<Vec<CompilationReport>> {
        let staged = self.staged_compilations()?;
        if staged.is_empty() {
            warn!("No staged compilations in {}", self.paths.staged.display());
            return Ok(Vec::new());
        }
        info!("{} staged compilation(s)", staged.len());

        let store = self.load_metadata()?;
        let waveforms = WaveformIndex::scan(&self.paths.src_tracks)?;
        let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
        let publisher = Publisher::new(
            &self.paths.outputs,
            &self.paths.images,
            &self.paths.committed,
        );

        if mode == RunMode::Publish {
            FfmpegEngine::new(&self.config.audio.ffmpeg)?.check_available()?;
        }

        let mut reports = Vec::with_capacity(staged.len());
        for config_path in staged {
            info!("Processing {}", config_path.display());
            let compilation = Compilation::load(&config_path)?;

            let report = match mode {
                RunMode::DryRun => {
                    let mut engine = SymbolicEngine::new();
                    let assembled =
                        self.assemble(&mut engine, &mut cache, &waveforms, &compilation)?;
                    to_report(config_path, assembled, None)
                }
                RunMode::Publish => {
                    let mut engine =
                        FfmpegEngine::from_config(&self.config.audio, &self.config.video)?;
                    let assembled =
                        self.assemble(&mut engine, &mut cache, &waveforms, &compilation)?;
                    let output_dir =
                        publisher.publish(&mut engine, &config_path, &compilation, &assembled)?;
                    to_report(config_path, assembled, Some(output_dir))
                }
            };
            reports.push(report);
        }

        info!(
            "Run complete: {} compilation(s), {} cached resolution hit(s)",
            reports.len(),
            cache.hits()
        );
        Ok(reports)
    }

    fn assemble<E: AudioEngine>(
        &self,
        engine: &mut E,
        cache: &mut ResolutionCache<'_>,
        waveforms: &WaveformIndex,
        compilation: &Compilation,
    ) -> Result<AssembledCompilation<E::Waveform>> {
        CompilationAssembler::new(cache, waveforms)
            .with_segment_builder(SegmentBuilder::new(self.config.audio.segment_mean_db))
            .with_final_lufs(self.config.audio.final_lufs)
            .assemble(engine, &compilation.entries)
    }
}

fn to_report<W>(
    config_path: PathBuf,
    assembled: AssembledCompilation<W>,
    output_dir: Option<PathBuf>,
) -> CompilationReport {
    CompilationReport {
        config_path,
        chapters: assembled.chapters,
        total_duration_seconds: assembled.total_duration_seconds,
        output_dir,
    }
}
