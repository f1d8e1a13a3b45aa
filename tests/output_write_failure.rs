use std::fs;

use simplot::Error;
use simplot::core::table::{SeriesTable, TableSet};
use simplot::plot::spec::{OutputTarget, PlotKind, PlotSpec, SeriesRef};
use simplot::plot::style::Typography;
use simplot::plot::render_plot;
use simplot::sink::OutputSink;
use tempfile::tempdir;

fn tables() -> TableSet {
    let mut tables = TableSet::new();
    tables
        .add(SeriesTable::from_columns("e", [("t", vec![0.0, 1.0]), ("energy", vec![1.0, 2.0])]).unwrap())
        .unwrap();
    tables
}

fn spec(output: OutputTarget) -> PlotSpec {
    PlotSpec::builder(PlotKind::Line)
        .series(SeriesRef::new("e", "t", "energy"))
        .output(output.size_in(1.0, 1.0))
        .build()
        .unwrap()
}

#[test]
fn unwritable_directory_leaves_no_partial_file() {
    let dir = tempdir().unwrap();
    // A regular file where the output directory should be.
    let blocker = dir.path().join("figures");
    fs::write(&blocker, "not a directory").unwrap();
    let target = blocker.join("energy.png");

    let figure = render_plot(&spec(OutputTarget::file(&target)), &tables()).unwrap();
    let mut sink = OutputSink::headless(Typography::default());
    match sink.emit(&figure).unwrap_err() {
        Error::OutputWriteFailure { path, .. } => assert_eq!(path, target),
        other => panic!("expected OutputWriteFailure, got {other:?}"),
    }
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the blocking file remains");
}

#[test]
fn unsupported_extension_names_the_path() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("fit.pdf");
    let figure = render_plot(&spec(OutputTarget::file(&target)), &tables()).unwrap();
    let err = OutputSink::headless(Typography::default())
        .emit(&figure)
        .unwrap_err();
    assert!(matches!(err, Error::OutputWriteFailure { ref path, .. } if *path == target));
    assert!(!target.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn nested_output_directories_are_created() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("a/b/energy.png");
    let figure = render_plot(&spec(OutputTarget::file(&target).dpi(50)), &tables()).unwrap();
    let emitted = OutputSink::headless(Typography::default()).emit(&figure).unwrap();
    assert_eq!(emitted.path.as_deref(), Some(target.as_path()));
    assert_eq!(emitted.bytes, fs::metadata(&target).unwrap().len());
    assert!(!emitted.shown);
}
