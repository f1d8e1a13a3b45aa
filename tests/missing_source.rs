use std::path::PathBuf;

use simplot::Error;
use simplot::config::RenderConfig;
use simplot::core::loader::load_table;
use simplot::core::schema::SchemaDescriptor;
use simplot::pipeline::{Pipeline, Stage};
use simplot::sink::OutputSink;
use tempfile::tempdir;

#[test]
fn missing_file_reports_exact_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trayectoria1.txt");
    let err = load_table("p1", &path, &SchemaDescriptor::new(["t", "x", "y"])).unwrap_err();
    match &err {
        Error::SourceUnavailable { path: p } => assert_eq!(p, &path),
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn missing_preset_input_halts_before_rendering() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let cfg = RenderConfig::default();
    let exp = simplot::battery::preset("annular", &cfg, data.path(), out.path()).unwrap();

    let mut pipeline = Pipeline::new(exp);
    let mut sink = OutputSink::headless(cfg.text.clone());
    let err = pipeline.run(&mut sink).unwrap_err();

    let expected: PathBuf = data.path().join("trayectoria1.txt");
    assert!(matches!(err, Error::SourceUnavailable { ref path } if *path == expected));
    assert_eq!(pipeline.failed_at(), Some(Stage::Loaded));
    assert!(pipeline.figures().is_empty());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
