//! Output publishing
//!
//! For a compilation read from `<staged>/<stem>.json` the publisher writes
//! `<outputs>/<stem>/` containing `video.mp4`, `title.txt`, `tags.txt` and
//! `description.txt`, then moves the definition to the committed directory.
//! The move is the last step, so a definition is committed at most once and
//! only after every output exists.

use crate::assembler::AssembledCompilation;
use crate::compilation::Compilation;
use crate::engine::ffmpeg::{move_file, FfmpegEngine, WaveFile};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Placeholder in the description template replaced by the chapter list
pub const TIMESTAMPS_PLACEHOLDER: &str = "{timestamps}";

/// Renders the still-image video for a finished track
pub trait VideoMuxer<W> {
    fn mux(&mut self, image: &Path, track: &W, duration_seconds: f64, output: &Path) -> Result<()>;
}

impl VideoMuxer<WaveFile> for FfmpegEngine {
    fn mux(
        &mut self,
        image: &Path,
        track: &WaveFile,
        duration_seconds: f64,
        output: &Path,
    ) -> Result<()> {
        self.render_video(image, track, duration_seconds, output)
    }
}

/// Fill the description template with the chapter lines
pub fn render_description(template: &str, timestamps: &str) -> String {
    template.replace(TIMESTAMPS_PLACEHOLDER, timestamps)
}

/// Writes published outputs and commits compilation definitions
#[derive(Debug, Clone)]
pub struct Publisher {
    outputs_dir: PathBuf,
    images_dir: PathBuf,
    committed_dir: PathBuf,
}

impl Publisher {
    pub fn new(
        outputs_dir: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        committed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
            images_dir: images_dir.into(),
            committed_dir: committed_dir.into(),
        }
    }

    /// Publish one assembled compilation and commit its definition
    ///
    /// Returns the output directory.
    pub fn publish<W, M: VideoMuxer<W>>(
        &self,
        muxer: &mut M,
        staged_path: &Path,
        compilation: &Compilation,
        assembled: &AssembledCompilation<W>,
    ) -> Result<PathBuf> {
        let track = assembled.track.as_ref().ok_or_else(|| {
            Error::Publish(format!(
                "{} has no entries, nothing to publish",
                staged_path.display()
            ))
        })?;

        let stem = staged_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::Publish(format!("invalid file name {}", staged_path.display()))
            })?;
        let file_name = staged_path.file_name().ok_or_else(|| {
            Error::Publish(format!("invalid file name {}", staged_path.display()))
        })?;

        let image = self.images_dir.join(&compilation.metadata.image);
        if !image.is_file() {
            return Err(Error::Publish(format!(
                "image {} not found",
                image.display()
            )));
        }

        let output_dir = self.outputs_dir.join(stem);
        fs::create_dir_all(&output_dir)
            .map_err(|e| Error::Publish(format!("create {}: {}", output_dir.display(), e)))?;

        muxer.mux(
            &image,
            track,
            assembled.total_duration_seconds,
            &output_dir.join("video.mp4"),
        )?;

        let metadata = &compilation.metadata;
        write_text(&output_dir.join("title.txt"), &metadata.title)?;
        write_text(&output_dir.join("tags.txt"), &metadata.tags.join(", "))?;
        write_text(
            &output_dir.join("description.txt"),
            &render_description(&metadata.description, &assembled.timestamps()),
        )?;

        fs::create_dir_all(&self.committed_dir).map_err(|e| {
            Error::Publish(format!("create {}: {}", self.committed_dir.display(), e))
        })?;
        let committed = self.committed_dir.join(file_name);
        move_file(staged_path, &committed)?;

        info!(
            "Published {} to {}, committed {}",
            stem,
            output_dir.display(),
            committed.display()
        );
        Ok(output_dir)
    }
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| Error::Publish(format!("write {}: {}", path.display(), e)))
}
