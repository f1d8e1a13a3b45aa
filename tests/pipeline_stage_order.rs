use std::fs;

use simplot::Error;
use simplot::core::derive::DerivedStep;
use simplot::core::schema::SchemaDescriptor;
use simplot::pipeline::{Experiment, Pipeline, Source, Stage};
use simplot::plot::spec::{OutputTarget, PlotKind, PlotSpec, SeriesRef};
use simplot::plot::style::Typography;
use simplot::sink::OutputSink;
use tempfile::tempdir;

fn pendulum(dir: &std::path::Path, fit_field: &str) -> Experiment {
    let data = dir.join("periods.txt");
    fs::write(&data, "0.2 0.37\n0.4 1.21\n0.6 2.05\n0.8 2.91\n").unwrap();
    Experiment::new("pendulum")
        .source(Source::new("pendulum", data, SchemaDescriptor::new(["L", "T2"])))
        .derive(DerivedStep::LinearFit {
            table: "pendulum".into(),
            x: "L".into(),
            output: fit_field.into(),
            slope: 4.24,
            intercept: -0.48,
        })
        .figure(
            PlotSpec::builder(PlotKind::Scatter)
                .series(SeriesRef::new("pendulum", "L", "T2"))
                .series(SeriesRef::new("pendulum", "L", "T2_fit"))
                .output(OutputTarget::file(dir.join("fit.svg")))
                .build()
                .unwrap(),
        )
}

#[test]
fn full_run_walks_every_stage() {
    let dir = tempdir().unwrap();
    let mut pipeline = Pipeline::new(pendulum(dir.path(), "T2_fit"));
    assert_eq!(pipeline.stage(), Stage::Configured);

    pipeline.load().unwrap();
    assert_eq!(pipeline.stage(), Stage::Loaded);
    pipeline.derive().unwrap();
    assert_eq!(pipeline.stage(), Stage::Derived);
    let fit = pipeline.tables().get("pendulum").unwrap().field("T2_fit").unwrap();
    assert!((fit[2] - (4.24 * 0.6 - 0.48)).abs() < 1e-12);

    pipeline.render().unwrap();
    let mut sink = OutputSink::headless(Typography::default());
    let report = pipeline.persist(&mut sink).unwrap();
    assert_eq!(report.experiment, "pendulum");
    assert_eq!(report.figures, 1);
    assert_eq!(report.shown, 0);
    assert!(fs::read_to_string(dir.path().join("fit.svg")).unwrap().contains("<svg"));
}

#[test]
fn persist_before_render_is_out_of_order() {
    let dir = tempdir().unwrap();
    let mut pipeline = Pipeline::new(pendulum(dir.path(), "T2_fit"));
    pipeline.load().unwrap();
    let mut sink = OutputSink::headless(Typography::default());
    let err = pipeline.persist(&mut sink).unwrap_err();
    assert!(matches!(
        err,
        Error::StageOrder {
            expected: "persisted",
            actual: "loaded"
        }
    ));
    assert!(pipeline.load().is_err(), "load only runs once");
}

#[test]
fn render_failure_halts_before_persistence() {
    let dir = tempdir().unwrap();
    // Fit written under another name, so the figure references a missing field.
    let mut pipeline = Pipeline::new(pendulum(dir.path(), "fit"));
    let mut sink = OutputSink::headless(Typography::default());
    let err = pipeline.run(&mut sink).unwrap_err();
    assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "T2_fit"));
    assert_eq!(pipeline.failed_at(), Some(Stage::Rendered));
    assert_eq!(pipeline.stage(), Stage::Derived);
    assert!(!dir.path().join("fit.svg").exists());
}
