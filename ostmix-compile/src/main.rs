//! ostmix-compile - extended soundtrack compiler
//!
//! Processes the compilations staged under `target-configs/staged/`: resolves
//! loop points from the audio engine metadata, assembles one continuous
//! level-matched track per compilation and publishes it as a still-image
//! video with title, tags and a chaptered description.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ostmix_common::config::{load_or_default, resolve_root_folder};
use ostmix_common::human_time::format_chapter_timestamp;
use ostmix_common::FadeCurve;
use ostmix_compile::{Chapter, Project, RunMode};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for ostmix-compile
#[derive(Parser, Debug)]
#[command(name = "ostmix-compile")]
#[command(about = "Assemble extended soundtrack compilations from looped game audio")]
#[command(version)]
struct Args {
    /// Project root folder
    #[arg(short, long, global = true, env = "OSTMIX_ROOT")]
    root: Option<PathBuf>,

    /// Configuration file (default: <root>/ostmix.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every staged compilation
    Run {
        /// Print chapters and durations without rendering or publishing
        #[arg(long)]
        dry_run: bool,

        /// Fade-out curve, overrides `[audio] fade_curve`
        #[arg(long, value_parser = parse_fade_curve)]
        fade_curve: Option<FadeCurve>,
    },
    /// Print the resolved loop interval of each source id
    Resolve {
        /// Source ids (an optional +suffix is ignored for lookup)
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn parse_fade_curve(value: &str) -> std::result::Result<FadeCurve, String> {
    FadeCurve::from_str(value).ok_or_else(|| {
        let known: Vec<String> = FadeCurve::all_variants()
            .iter()
            .map(|c| format!("{:?}", c).to_lowercase())
            .collect();
        format!("unknown fade curve '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration is loaded first because it may set the log level
    let root_hint = resolve_root_folder(args.root.as_deref(), None);
    let mut config = load_or_default(args.config.as_deref(), Some(&root_hint))
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str())),
        )
        .with_target(false)
        .init();

    info!(
        "ostmix-compile v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Command::Run {
        fade_curve: Some(curve),
        ..
    } = &args.command
    {
        config.audio.fade_curve = *curve;
    }

    let root = resolve_root_folder(args.root.as_deref(), Some(&config));
    info!("Root folder: {}", root.display());
    let project = Project::new(&root, config);

    match args.command {
        Command::Run { dry_run, .. } => {
            let mode = if dry_run { RunMode::DryRun } else { RunMode::Publish };
            let reports = project.run(mode).map_err(|e| {
                error!("Run aborted: {}", e);
                e
            })?;

            for report in &reports {
                println!("{}", report.config_path.display());
                for line in report.chapters.iter().map(Chapter::line) {
                    println!("  {}", line);
                }
                println!(
                    "  total {} ({:.3}s)",
                    format_chapter_timestamp(report.total_duration_seconds),
                    report.total_duration_seconds
                );
                if let Some(output_dir) = &report.output_dir {
                    println!("  published to {}", output_dir.display());
                }
            }
        }
        Command::Resolve { ids } => {
            let resolved = project
                .resolve_ids(&ids)
                .context("Failed to resolve loop points")?;
            for (id, interval) in resolved {
                println!(
                    "{}\tintro {:.3}s\tloop {:.3}s + {:.3}s",
                    id,
                    interval.intro_duration_seconds,
                    interval.loop_begin_seconds,
                    interval.loop_duration_seconds
                );
            }
        }
    }

    Ok(())
}
