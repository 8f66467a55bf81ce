//! ffmpeg subprocess engine
//!
//! Each primitive is one (or, for measurement, two) blocking `ffmpeg` runs.
//! Results are written to numbered WAV files inside a private scratch
//! directory that is removed when the engine is dropped, whether the
//! compilation succeeded or not.

use super::AudioEngine;
use crate::error::{Error, Result};
use ostmix_common::config::{AudioConfig, VideoConfig};
use ostmix_common::FadeCurve;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Sample rate of every file written by the engine
///
/// `loudnorm` resamples to 192 kHz internally, so the output rate is pinned.
pub const OUTPUT_SAMPLE_RATE: u32 = 48_000;

/// True-peak ceiling for loudness normalization (dBTP)
const TRUE_PEAK_DB: f64 = -1.0;

/// WAV file handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFile {
    path: PathBuf,
    scratch: bool,
}

impl WaveFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Audio engine backed by the `ffmpeg` command-line tool
#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    fade_curve: FadeCurve,
    video: VideoConfig,
    scratch: TempDir,
    next_file: usize,
}

impl FfmpegEngine {
    /// Create an engine with its own scratch directory
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("ostmix-").tempdir()?;
        debug!("Scratch directory: {}", scratch.path().display());
        Ok(Self {
            binary: binary.into(),
            fade_curve: FadeCurve::default(),
            video: VideoConfig::default(),
            scratch,
            next_file: 0,
        })
    }

    /// Create an engine from the `[audio]` and `[video]` config sections
    pub fn from_config(audio: &AudioConfig, video: &VideoConfig) -> Result<Self> {
        debug!("Fade curve: {}", audio.fade_curve);
        Ok(Self::new(&audio.ffmpeg)?
            .with_fade_curve(audio.fade_curve)
            .with_video(video.clone()))
    }

    pub fn with_fade_curve(mut self, curve: FadeCurve) -> Self {
        self.fade_curve = curve;
        self
    }

    pub fn with_video(mut self, video: VideoConfig) -> Self {
        self.video = video;
        self
    }

    /// Verify that the ffmpeg binary can be executed
    pub fn check_available(&self) -> Result<()> {
        match Command::new(&self.binary).arg("-version").output() {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(Error::engine(
                "check_available",
                format!("ffmpeg -version exited with {}", output.status),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::engine(
                "check_available",
                format!("{} not found in PATH", self.binary.display()),
            )),
            Err(e) => Err(Error::engine("check_available", e.to_string())),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    fn scratch_file(&mut self, extension: &str) -> PathBuf {
        let path = self
            .scratch
            .path()
            .join(format!("{:06}.{}", self.next_file, extension));
        self.next_file += 1;
        path
    }

    fn output_wave(&mut self) -> WaveFile {
        WaveFile {
            path: self.scratch_file("wav"),
            scratch: true,
        }
    }

    /// Run ffmpeg with `-y -hide_banner` prepended, failing on non-zero exit
    fn run<I, S>(&self, operation: &'static str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        debug!(
            operation,
            "{} -y -hide_banner {}",
            self.binary.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-hide_banner")
            .args(&args)
            .output()
            .map_err(|e| Error::engine(operation, format!("failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(Error::engine(
                operation,
                format!("ffmpeg exited with {}: {}", output.status, stderr_tail(&output)),
            ));
        }
        Ok(output)
    }

    /// Run a measurement pass (`-f null -`) and return its stderr
    fn measure(&self, operation: &'static str, input: &Path, filter: &str) -> Result<String> {
        let output = self.run(
            operation,
            [
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-af"),
                OsStr::new(filter),
                OsStr::new("-f"),
                OsStr::new("null"),
                OsStr::new("-"),
            ],
        )?;
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    /// Apply one audio filter to `input`, writing a new scratch file
    fn filter(&mut self, operation: &'static str, input: &WaveFile, filter: &str) -> Result<WaveFile> {
        let out = self.output_wave();
        self.run(
            operation,
            [
                OsStr::new("-i"),
                input.path.as_os_str(),
                OsStr::new("-af"),
                OsStr::new(filter),
                out.path.as_os_str(),
            ],
        )?;
        Ok(out)
    }

    /// Render a still-image video with `audio` as its soundtrack
    ///
    /// Written to the scratch directory first, then moved to `output`.
    pub fn render_video(
        &mut self,
        image: &Path,
        audio: &WaveFile,
        duration_seconds: f64,
        output: &Path,
    ) -> Result<()> {
        let staging = self.scratch_file("mp4");
        let duration = format_seconds(duration_seconds);
        let crf = self.video.crf.to_string();
        let preset = self.video.preset.clone();
        self.run(
            "render_video",
            [
                OsStr::new("-loop"),
                OsStr::new("1"),
                OsStr::new("-framerate"),
                OsStr::new("1"),
                OsStr::new("-i"),
                image.as_os_str(),
                OsStr::new("-i"),
                audio.path.as_os_str(),
                OsStr::new("-t"),
                OsStr::new(&duration),
                OsStr::new("-c:v"),
                OsStr::new("libx264"),
                OsStr::new("-preset"),
                OsStr::new(&preset),
                OsStr::new("-tune"),
                OsStr::new("stillimage"),
                OsStr::new("-crf"),
                OsStr::new(&crf),
                OsStr::new("-c:a"),
                OsStr::new("aac"),
                OsStr::new("-pix_fmt"),
                OsStr::new("yuv420p"),
                staging.as_os_str(),
            ],
        )?;
        move_file(&staging, output)
    }
}

impl AudioEngine for FfmpegEngine {
    type Waveform = WaveFile;

    fn open(&mut self, path: &Path) -> Result<WaveFile> {
        if !path.is_file() {
            return Err(Error::engine(
                "open",
                format!("{} is not a file", path.display()),
            ));
        }
        Ok(WaveFile {
            path: path.to_path_buf(),
            scratch: false,
        })
    }

    fn trim(&mut self, src: &WaveFile, begin: f64, duration: f64) -> Result<WaveFile> {
        let begin = if begin < 0.0 {
            warn!(
                "Trim of {} starts at {:.3}s, clamping to 0",
                src.path.display(),
                begin
            );
            0.0
        } else {
            begin
        };
        let out = self.output_wave();
        let (begin, duration) = (format_seconds(begin), format_seconds(duration));
        self.run(
            "trim",
            [
                OsStr::new("-i"),
                src.path.as_os_str(),
                OsStr::new("-ss"),
                OsStr::new(&begin),
                OsStr::new("-t"),
                OsStr::new(&duration),
                out.path.as_os_str(),
            ],
        )?;
        Ok(out)
    }

    fn join(&mut self, a: &WaveFile, b: &WaveFile, crossfade: Option<f64>) -> Result<WaveFile> {
        let graph = match crossfade {
            Some(seconds) if seconds > 0.0 => format!("acrossfade=d={}", format_seconds(seconds)),
            _ => "[0:0][1:0]concat=n=2:v=0:a=1[out]".to_string(),
        };
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            a.path.clone().into(),
            "-i".into(),
            b.path.clone().into(),
            "-filter_complex".into(),
            graph.into(),
        ];
        if !matches!(crossfade, Some(seconds) if seconds > 0.0) {
            args.push("-map".into());
            args.push("[out]".into());
        }
        let out = self.output_wave();
        args.push(out.path.clone().into());
        self.run("join", args)?;
        Ok(out)
    }

    fn fade_out(&mut self, w: &WaveFile, begin: f64, duration: f64) -> Result<WaveFile> {
        let filter = format!(
            "afade=t=out:st={}:d={}:curve={}",
            format_seconds(begin),
            format_seconds(duration),
            self.fade_curve.ffmpeg_name()
        );
        self.filter("fade_out", w, &filter)
    }

    fn set_mean_loudness(&mut self, w: &WaveFile, target_db: f64) -> Result<WaveFile> {
        let report = self.measure("set_mean_loudness", &w.path, "volumedetect")?;
        let mean = parse_mean_volume(&report).ok_or_else(|| {
            Error::engine("set_mean_loudness", "volumedetect reported no mean_volume")
        })?;
        let offset = target_db - mean;
        debug!(
            "Mean volume of {} is {:.1} dB, applying {:+.2} dB",
            w.path.display(),
            mean,
            offset
        );
        self.filter("set_mean_loudness", w, &format!("volume={}dB", offset))
    }

    fn normalize_loudness(&mut self, w: &WaveFile, target_lufs: f64) -> Result<WaveFile> {
        let first_pass = format!(
            "loudnorm=I={}:TP={}:print_format=json",
            target_lufs, TRUE_PEAK_DB
        );
        let report = self.measure("normalize_loudness", &w.path, &first_pass)?;
        let stats = parse_loudnorm_stats(&report)?;
        debug!(
            "Measured {:.1} LUFS (LRA {:.1}) in {}",
            stats.input_i,
            stats.input_lra,
            w.path.display()
        );

        // Keep the measured loudness range instead of compressing it
        let out = self.output_wave();
        let second_pass = format!(
            "loudnorm=I={}:TP={}:LRA={}:measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}:linear=true",
            target_lufs,
            TRUE_PEAK_DB,
            stats.input_lra.clamp(1.0, 50.0),
            stats.input_i,
            stats.input_tp,
            stats.input_lra,
            stats.input_thresh,
            stats.target_offset
        );
        let rate = OUTPUT_SAMPLE_RATE.to_string();
        self.run(
            "normalize_loudness",
            [
                OsStr::new("-i"),
                w.path.as_os_str(),
                OsStr::new("-af"),
                OsStr::new(&second_pass),
                OsStr::new("-ar"),
                OsStr::new(&rate),
                out.path.as_os_str(),
            ],
        )?;
        Ok(out)
    }

    fn release(&mut self, w: WaveFile) {
        if w.scratch {
            if let Err(e) = std::fs::remove_file(&w.path) {
                warn!("Failed to remove {}: {}", w.path.display(), e);
            }
        }
    }
}

/// Measured values reported by the first `loudnorm` pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnormStats {
    pub input_i: f64,
    pub input_tp: f64,
    pub input_lra: f64,
    pub input_thresh: f64,
    pub target_offset: f64,
}

#[derive(Deserialize)]
struct RawLoudnormStats {
    input_i: String,
    input_tp: String,
    input_lra: String,
    input_thresh: String,
    target_offset: String,
}

/// Extract the JSON block `loudnorm` prints at the end of stderr
pub fn parse_loudnorm_stats(stderr: &str) -> Result<LoudnormStats> {
    let start = stderr
        .rfind('{')
        .ok_or_else(|| Error::engine("normalize_loudness", "loudnorm printed no statistics"))?;
    let end = stderr[start..]
        .find('}')
        .map(|i| start + i + 1)
        .ok_or_else(|| Error::engine("normalize_loudness", "truncated loudnorm statistics"))?;

    let raw: RawLoudnormStats = serde_json::from_str(&stderr[start..end])
        .map_err(|e| Error::engine("normalize_loudness", e.to_string()))?;

    let number = |name: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                Error::engine(
                    "normalize_loudness",
                    format!("loudnorm reported {} = {:?}", name, value),
                )
            })
    };

    Ok(LoudnormStats {
        input_i: number("input_i", &raw.input_i)?,
        input_tp: number("input_tp", &raw.input_tp)?,
        input_lra: number("input_lra", &raw.input_lra)?,
        input_thresh: number("input_thresh", &raw.input_thresh)?,
        target_offset: number("target_offset", &raw.target_offset)?,
    })
}

/// Extract `mean_volume: X dB` from `volumedetect` output
pub fn parse_mean_volume(stderr: &str) -> Option<f64> {
    stderr
        .lines()
        .find_map(|line| line.split("mean_volume:").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse::<f64>().ok())
}

/// Seconds as passed on the ffmpeg command line (microsecond precision)
pub fn format_seconds(seconds: f64) -> String {
    let formatted = format!("{:.6}", seconds);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join(" | ")
}

/// Move a file, falling back to copy + remove across filesystems
pub(crate) fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLUMEDETECT: &str = "\
[Parsed_volumedetect_0 @ 0x55d0] n_samples: 5292000
[Parsed_volumedetect_0 @ 0x55d0] mean_volume: -21.4 dB
[Parsed_volumedetect_0 @ 0x55d0] max_volume: -3.1 dB
";

    const LOUDNORM: &str = r#"size=N/A time=00:02:00.00 bitrate=N/A speed= 512x
[Parsed_loudnorm_0 @ 0x5618]
{
	"input_i" : "-19.82",
	"input_tp" : "-2.31",
	"input_lra" : "6.40",
	"input_thresh" : "-30.11",
	"output_i" : "-14.03",
	"output_tp" : "-1.00",
	"output_lra" : "5.90",
	"output_thresh" : "-24.30",
	"normalization_type" : "dynamic",
	"target_offset" : "0.03"
}
"#;

    #[test]
    fn test_parse_mean_volume() {
        assert_eq!(parse_mean_volume(VOLUMEDETECT), Some(-21.4));
        assert_eq!(parse_mean_volume("no report here"), None);
    }

    #[test]
    fn test_parse_loudnorm_stats() {
        let stats = parse_loudnorm_stats(LOUDNORM).unwrap();
        assert_eq!(stats.input_i, -19.82);
        assert_eq!(stats.input_tp, -2.31);
        assert_eq!(stats.input_lra, 6.40);
        assert_eq!(stats.input_thresh, -30.11);
        assert_eq!(stats.target_offset, 0.03);
    }

    #[test]
    fn test_parse_loudnorm_rejects_missing_block() {
        assert!(parse_loudnorm_stats("size=N/A").is_err());
    }

    #[test]
    fn test_parse_loudnorm_rejects_silence_marker() {
        let silent = LOUDNORM.replace("\"-19.82\"", "\"-inf\"");
        assert!(parse_loudnorm_stats(&silent).is_err());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0");
        assert_eq!(format_seconds(10.0), "10");
        assert_eq!(format_seconds(12.5), "12.5");
        assert_eq!(format_seconds(1.0 / 3.0), "0.333333");
        assert_eq!(format_seconds(-0.0000001), "0");
    }

    #[test]
    fn test_open_requires_existing_file() {
        let mut engine = FfmpegEngine::new("ffmpeg").unwrap();
        let result = engine.open(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(Error::AudioEngine { operation: "open", .. })));
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let engine = FfmpegEngine::new("ffmpeg").unwrap();
        let scratch = engine.scratch_dir().to_path_buf();
        assert!(scratch.is_dir());
        drop(engine);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_release_only_removes_scratch_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        std::fs::write(&source, b"RIFF").unwrap();

        let mut engine = FfmpegEngine::new("ffmpeg").unwrap();
        let opened = engine.open(&source).unwrap();
        engine.release(opened);
        assert!(source.exists());

        let scratch = engine.output_wave();
        std::fs::write(scratch.path(), b"RIFF").unwrap();
        let scratch_path = scratch.path().to_path_buf();
        engine.release(scratch);
        assert!(!scratch_path.exists());
    }
}
