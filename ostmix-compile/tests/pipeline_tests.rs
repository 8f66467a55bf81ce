//! End-to-end tests over a project directory
//!
//! Audio is never rendered here: runs use the symbolic engine (dry run) or
//! drive the assembler and publisher directly with a fake muxer.

use ostmix_common::config::TomlConfig;
use ostmix_compile::engine::SymbolicEngine;
use ostmix_compile::publish::{Publisher, VideoMuxer};
use ostmix_compile::{
    Compilation, CompilationAssembler, Error, LoopPointResolver, Project, ResolutionCache,
    RunMode, WaveformIndex,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DATABASE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <obj na="CAkSound">
    <fld na="sourceID" va="1001"/>
    <fld na="fBeginTrimOffset" va="0"/>
    <fld na="fEndTrimOffset" va="10000"/>
    <fld na="fSrcDuration" va="60000"/>
  </obj>
  <obj na="CAkSound">
    <fld na="sourceID" va="1001"/>
    <fld na="fBeginTrimOffset" va="10000"/>
    <fld na="fEndTrimOffset" va="40000"/>
    <fld na="fSrcDuration" va="60000"/>
  </obj>
  <obj na="CAkSound">
    <fld na="sourceID" va="1001"/>
    <fld na="fBeginTrimOffset" va="4000"/>
    <fld na="fEndTrimOffset" va="10000"/>
    <fld na="fSrcDuration" va="60000"/>
  </obj>
  <obj na="CAkSound">
    <fld na="sourceID" va="2002"/>
    <fld na="fBeginTrimOffset" va="0"/>
    <fld na="fEndTrimOffset" va="0"/>
    <fld na="fSrcDuration" va="30000"/>
  </obj>
  <obj na="CAkBus">
    <fld na="sourceID" va="9999"/>
  </obj>
</root>
"#;

const OVERRIDES: &str = r#"{
  "3003": {"fBeginTrimOffset": 5000, "fEndTrimOffset": -5000, "fSrcDuration": 50000}
}"#;

const COMPILATION: &str = r#"{
  "meta_data": {
    "title": "Harbor Town Extended",
    "description": "Tracklist\n{timestamps}",
    "tags": ["ost", "harbor"],
    "image": "harbor.png"
  },
  "compilation": [
    {"id": "1001", "name": "Harbor Theme", "nloop": 1},
    {"id": "2002+night", "name": "Harbor at Night", "intro": false, "crossfade": 3},
    {"id": "3003", "name": "Lighthouse", "fadeout": 5}
  ]
}"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("src-track-configs/bank.xml"), DATABASE);
    write(&root.join("src-track-configs/overrides.json"), OVERRIDES);
    write(&root.join("src-tracks/bgm/1001.wav"), "RIFF");
    write(&root.join("src-tracks/bgm/2002+night.wav"), "RIFF");
    write(&root.join("src-tracks/3003.wav"), "RIFF");
    write(&root.join("images/harbor.png"), "png");
    write(&root.join("target-configs/staged/harbor.json"), COMPILATION);
    dir
}

#[test]
fn test_dry_run_reports_chapters_and_keeps_staged() {
    let dir = project_dir();
    let project = Project::new(dir.path(), TomlConfig::default());

    let reports = project.run(RunMode::DryRun).unwrap();
    assert_eq!(reports.len(), 1);

    // 1001 gap-fills to loop 4..40: intro 40 s + one 36 s loop = 76 s
    // 2002+night: loop only 0..30, the 3 s crossfade has nothing before 0 to
    // reach back into, so 30 s advancing 27 s
    // 3003 (override): 0..45 = 45 s
    let report = &reports[0];
    let lines: Vec<String> = report.chapters.iter().map(|c| c.line()).collect();
    assert_eq!(
        lines,
        vec![
            "0:00:00 - Harbor Theme",
            "0:01:16 - Harbor at Night",
            "0:01:43 - Lighthouse",
        ]
    );
    assert_eq!(report.total_duration_seconds, 148.0);
    assert!(report.output_dir.is_none());

    assert!(dir.path().join("target-configs/staged/harbor.json").exists());
    assert!(!dir.path().join("target-configs/committed").exists());
    assert!(!dir.path().join("outputs").exists());
}

#[test]
fn test_dry_run_aborts_on_unresolved_source() {
    let dir = project_dir();
    write(
        &dir.path().join("target-configs/staged/broken.json"),
        r#"{"compilation": [{"id": "4004", "name": "Unknown"}]}"#,
    );
    write(&dir.path().join("src-tracks/4004.wav"), "RIFF");
    let project = Project::new(dir.path(), TomlConfig::default());

    let result = project.run(RunMode::DryRun);
    assert!(matches!(result, Err(Error::UnresolvedLoopPoint(id)) if id == "4004"));
}

#[test]
fn test_malformed_database_fails_run() {
    let dir = project_dir();
    write(&dir.path().join("src-track-configs/bad.xml"), "<root><obj>");
    let project = Project::new(dir.path(), TomlConfig::default());

    let result = project.run(RunMode::DryRun);
    assert!(matches!(result, Err(Error::MetadataLoad { path, .. }) if path.ends_with("bad.xml")));
}

#[test]
fn test_resolve_ids() {
    let dir = project_dir();
    let project = Project::new(dir.path(), TomlConfig::default());

    let resolved = project
        .resolve_ids(&["1001".to_string(), "3003+alt".to_string()])
        .unwrap();

    assert_eq!(resolved[0].0, "1001");
    assert_eq!(resolved[0].1.loop_begin_seconds, 4.0);
    assert_eq!(resolved[0].1.intro_duration_seconds, 40.0);
    assert_eq!(resolved[1].1.loop_begin_seconds, 5.0);
    assert_eq!(resolved[1].1.intro_duration_seconds, 45.0);
}

struct MarkerMuxer;

impl VideoMuxer<ostmix_compile::engine::SymbolicWaveform> for MarkerMuxer {
    fn mux(
        &mut self,
        _image: &Path,
        track: &ostmix_compile::engine::SymbolicWaveform,
        duration_seconds: f64,
        output: &Path,
    ) -> ostmix_compile::Result<()> {
        assert_eq!(track.duration_seconds, duration_seconds);
        fs::write(output, b"mp4")?;
        Ok(())
    }
}

#[test]
fn test_assemble_and_publish_with_symbolic_engine() {
    let dir = project_dir();
    let project = Project::new(dir.path(), TomlConfig::default());
    let paths = project.paths().clone();
    let staged = paths.staged.join("harbor.json");

    let store = project.load_metadata().unwrap();
    let waveforms = WaveformIndex::scan(&paths.src_tracks).unwrap();
    let mut cache = ResolutionCache::new(LoopPointResolver::new(&store));
    let compilation = Compilation::load(&staged).unwrap();

    let mut engine = SymbolicEngine::new();
    let assembled = CompilationAssembler::new(&mut cache, &waveforms)
        .assemble(&mut engine, &compilation.entries)
        .unwrap();

    let publisher = Publisher::new(&paths.outputs, &paths.images, &paths.committed);
    let out = publisher
        .publish(&mut MarkerMuxer, &staged, &compilation, &assembled)
        .unwrap();

    assert!(out.join("video.mp4").is_file());
    assert_eq!(
        fs::read_to_string(out.join("description.txt")).unwrap(),
        "Tracklist\n0:00:00 - Harbor Theme\n0:01:16 - Harbor at Night\n0:01:43 - Lighthouse"
    );
    assert_eq!(
        fs::read_to_string(out.join("tags.txt")).unwrap(),
        "ost, harbor"
    );
    assert!(!staged.exists());
    assert!(paths.committed.join("harbor.json").is_file());
}
