//! ostmix-pck - AKPK sound bank extractor
//!
//! Unpacks every stream of each given `.pck` container into
//! `<OUTPUT>/<container stem>/<id>.wem` and, unless disabled, converts them
//! to `<id>.wav` for use as compilation sources.

use anyhow::{Context, Result};
use clap::Parser;
use ostmix_common::config::load_or_default;
use ostmix_pck::transcode::DEFAULT_CODEBOOKS;
use ostmix_pck::{extract, Transcoder};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for ostmix-pck
#[derive(Parser, Debug)]
#[command(name = "ostmix-pck")]
#[command(about = "Extract and transcode streams from AKPK sound banks")]
#[command(version)]
struct Args {
    /// Containers to extract
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory (one subdirectory per container)
    #[arg(short, long)]
    output: PathBuf,

    /// ww2ogg executable
    #[arg(long, default_value = "ww2ogg", env = "OSTMIX_WW2OGG")]
    ww2ogg: PathBuf,

    /// ww2ogg packed codebooks
    #[arg(long, default_value = DEFAULT_CODEBOOKS)]
    codebooks: PathBuf,

    /// Configuration file (ffmpeg path and log level)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep the extracted .wem files without converting them
    #[arg(long)]
    no_transcode: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config =
        load_or_default(args.config.as_deref(), None).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str())),
        )
        .with_target(false)
        .init();

    info!(
        "ostmix-pck v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let transcoder = Transcoder::new(&args.ww2ogg, &args.codebooks, &config.audio.ffmpeg);

    for pck in &args.files {
        let stem = pck
            .file_stem()
            .with_context(|| format!("Invalid container path {}", pck.display()))?;
        let out_dir = args.output.join(stem);

        let wems = extract(pck, &out_dir)
            .with_context(|| format!("Failed to extract {}", pck.display()))?;

        if args.no_transcode {
            info!("{}: {} stream(s) extracted", pck.display(), wems.len());
            continue;
        }

        let wavs = transcoder
            .transcode_all(&wems)
            .with_context(|| format!("Failed to transcode streams of {}", pck.display()))?;
        info!(
            "{}: {} stream(s) written to {}",
            pck.display(),
            wavs.len(),
            out_dir.display()
        );
    }

    Ok(())
}
