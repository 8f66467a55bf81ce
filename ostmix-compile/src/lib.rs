//! ostmix-compile library interface
//!
//! Loop-point resolution and track assembly for extended game soundtrack
//! compilations. Exposed as a library for the binary and for integration
//! tests.

pub mod assembler;
pub mod cache;
pub mod compilation;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod publish;
pub mod resolver;
pub mod segment;
pub mod waveform;

pub use crate::error::{Error, Result};
pub use assembler::{AssembledCompilation, Chapter, CompilationAssembler, TimelineState};
pub use cache::ResolutionCache;
pub use compilation::{Compilation, CompilationEntry, CompilationMetadata};
pub use engine::AudioEngine;
pub use metadata::{LoopMetadataRecord, MetadataStore};
pub use pipeline::{CompilationReport, Project, RunMode};
pub use resolver::{LoopPointResolver, ResolvedLoopInterval};
pub use segment::{BuiltSegment, SegmentBuilder};
pub use waveform::WaveformIndex;
