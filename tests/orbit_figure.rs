use std::fmt::Write as _;
use std::fs;

use simplot::battery::preset;
use simplot::config::RenderConfig;
use simplot::core::table::{SeriesTable, TableSet};
use simplot::pipeline::{Pipeline, Stage};
use simplot::plot::figure::Points;
use simplot::plot::render_plot;
use simplot::plot::spec::{OutputTarget, PlotKind, PlotSpec, SeriesRef};
use simplot::plot::style::Typography;
use simplot::sink::OutputSink;
use tempfile::tempdir;

/// Forward-Euler Lorenz orbit with the classic parameters.
fn lorenz_rows(steps: usize) -> Vec<[f64; 4]> {
    let (sigma, rho, beta, dt) = (10.0, 28.0, 8.0 / 3.0, 0.01);
    let (mut x, mut y, mut z) = (1.0, 1.0, 1.0);
    (0..steps)
        .map(|i| {
            let row = [i as f64 * dt, x, y, z];
            let (dx, dy, dz) = (sigma * (y - x), x * (rho - z) - y, x * y - beta * z);
            x += dt * dx;
            y += dt * dy;
            z += dt * dz;
            row
        })
        .collect()
}

#[test]
fn orbit_svg_carries_all_three_axis_labels() {
    let rows = lorenz_rows(400);
    let column = |k: usize| rows.iter().map(|r| r[k]).collect::<Vec<_>>();
    let mut tables = TableSet::new();
    tables
        .add(
            SeriesTable::from_columns(
                "lorenz",
                [("x", column(1)), ("y", column(2)), ("z", column(3))],
            )
            .unwrap(),
        )
        .unwrap();

    let out = tempdir().unwrap();
    let target = out.path().join("orbit.svg");
    let spec = PlotSpec::builder(PlotKind::Orbit3d)
        .xlabel("x")
        .ylabel("y")
        .zlabel("z")
        .series(SeriesRef::xyz("lorenz", "x", "y", "z"))
        .output(OutputTarget::file(&target).dpi(72).size_in(5.0, 4.0))
        .build()
        .unwrap();

    let figure = render_plot(&spec, &tables).unwrap();
    let panel = &figure.panels[0];
    assert!(panel.is_spatial());
    assert_eq!(panel.zlabel, "z");
    let (z_lo, z_hi) = panel.z_range.expect("3D panel has a z range");
    let Points::Spatial(points) = &panel.layers[0].points else {
        panic!("orbit layer must hold 3D points");
    };
    assert_eq!(points.len(), 400);
    assert!(points.iter().all(|p| p.2 >= z_lo && p.2 <= z_hi));

    let bytes = OutputSink::headless(Typography::default())
        .persist(&figure, &target)
        .unwrap();
    assert!(bytes > 0);
    let svg = fs::read_to_string(&target).unwrap();
    for label in ["x", "y", "z"] {
        assert!(svg.contains(&format!(">{label}</text>")), "axis label {label} missing");
    }
    assert!(svg.contains("<polyline"), "orbit path missing");
}

#[test]
fn lorenz_preset_writes_series_and_orbit() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let mut text = String::from("# Lorenz system, RK4\n# t x y z\n");
    for [t, x, y, z] in lorenz_rows(300) {
        writeln!(text, "{t} {x} {y} {z}").unwrap();
    }
    fs::write(data.path().join("lorenz.dat"), text).unwrap();

    let cfg = RenderConfig::default();
    let exp = preset("lorenz", &cfg, data.path(), out.path()).unwrap();
    let mut pipeline = Pipeline::new(exp);
    let mut sink = OutputSink::headless(cfg.text.clone());
    let report = pipeline.run(&mut sink).unwrap();

    assert_eq!(pipeline.stage(), Stage::Persisted);
    assert_eq!(pipeline.tables().get("lorenz").unwrap().len(), 300);
    let orbit = &pipeline.figures()[1].panels[0];
    assert!(orbit.is_spatial());
    assert_eq!(orbit.zlabel, "z");

    let expected = [
        out.path().join("lorenz_vs_t.png"),
        out.path().join("lorenz_orbita_3d.png"),
    ];
    assert_eq!(report.written, expected);
    for path in &expected {
        assert!(fs::metadata(path).unwrap().len() > 0, "{} is empty", path.display());
    }
}
