use std::fmt::Write as _;
use std::fs;

use simplot::core::loader::load_table;
use simplot::core::schema::SchemaDescriptor;
use simplot::core::table::{SeriesTable, TableSet};
use simplot::plot::figure::Points;
use simplot::plot::spec::{OutputTarget, PlotKind, PlotSpec, SeriesRef};
use simplot::plot::style::Rgb;
use simplot::plot::render_plot;
use tempfile::tempdir;

#[test]
fn two_fields_against_time_give_two_layers_of_equal_length() {
    let t: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
    let mut text = String::from("t x y\n");
    for &ti in &t {
        writeln!(text, "{ti} {} {}", (10.0 * ti).sin(), (10.0 * ti).cos()).unwrap();
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("heart.dat");
    fs::write(&path, text).unwrap();

    let schema = SchemaDescriptor::new(["t", "x", "y"]).with_skip_rows(1);
    let mut tables = TableSet::new();
    tables.add(load_table("heart", &path, &schema).unwrap()).unwrap();

    let spec = PlotSpec::builder(PlotKind::Line)
        .title("x, y vs t")
        .xlabel("t")
        .legend(true)
        .series(SeriesRef::new("heart", "t", "x").label("x(t)"))
        .series(SeriesRef::new("heart", "t", "y").label("y(t)"))
        .output(OutputTarget::file("xy.png"))
        .build()
        .unwrap();

    let figure = render_plot(&spec, &tables).unwrap();
    assert_eq!(figure.panels.len(), 1);
    let panel = &figure.panels[0];
    assert_eq!(panel.layers.len(), 2);
    for (layer, label) in panel.layers.iter().zip(["x(t)", "y(t)"]) {
        assert_eq!(layer.len(), 100);
        assert_eq!(layer.label.as_deref(), Some(label));
        let Points::Planar(points) = &layer.points else {
            panic!("time series must be planar");
        };
        assert_eq!(points[0].0, t[0]);
        assert_eq!(points[99].0, t[99]);
    }
    assert_ne!(panel.layers[0].color, panel.layers[1].color);
    assert_eq!(panel.layers[0].color, Rgb::cycle(0));
    assert!(panel.x_range.0 <= 0.0 && panel.x_range.1 >= 0.99);
}

#[test]
fn rendering_twice_is_deterministic() {
    let mut tables = TableSet::new();
    tables
        .add(SeriesTable::from_columns("e", [("t", vec![0.0, 1.0, 2.0]), ("energy", vec![3.0, 2.0, 1.0])]).unwrap())
        .unwrap();
    let spec = PlotSpec::builder(PlotKind::Line)
        .series(SeriesRef::new("e", "t", "energy"))
        .build()
        .unwrap();
    assert_eq!(render_plot(&spec, &tables).unwrap(), render_plot(&spec, &tables).unwrap());
}
