use simplot::Error;
use simplot::core::table::{SeriesTable, TableSet};
use simplot::plot::spec::{Aspect, FigureSpec, OutputTarget, PlotKind, PlotSpec, Scale, Selection, SeriesRef};
use simplot::plot::render_figure;

fn energy_tables(values: Vec<f64>) -> TableSet {
    let t = (0..values.len()).map(|i| i as f64).collect();
    let mut tables = TableSet::new();
    tables
        .add(SeriesTable::from_columns("traj", [("t", t), ("kinetic_energy", values)]).unwrap())
        .unwrap();
    tables
}

fn log_plot() -> PlotSpec {
    PlotSpec::builder(PlotKind::Line)
        .yscale(Scale::Log)
        .series(SeriesRef::new("traj", "t", "kinetic_energy"))
        .build()
        .unwrap()
}

#[test]
fn zero_energy_sample_is_rejected_before_any_figure() {
    let tables = energy_tables(vec![1.0, 0.5, 0.0, 0.25]);
    let spec = FigureSpec::composite(OutputTarget::file("never.png"))
        .panel(log_plot())
        .panel(
            PlotSpec::builder(PlotKind::Line)
                .series(SeriesRef::new("traj", "t", "kinetic_energy"))
                .build()
                .unwrap(),
        );
    match render_figure(&spec, &tables).unwrap_err() {
        Error::InvalidAxisScale {
            axis,
            series,
            index,
            value,
        } => {
            assert_eq!(axis, "y");
            assert_eq!(series, "traj.t/traj.kinetic_energy");
            assert_eq!(index, 2);
            assert_eq!(value, 0.0);
        }
        other => panic!("expected InvalidAxisScale, got {other:?}"),
    }
}

#[test]
fn negative_values_fail_and_positive_ones_pass() {
    let spec = FigureSpec::single(log_plot());
    assert!(matches!(
        render_figure(&spec, &energy_tables(vec![1.0, -3.0])),
        Err(Error::InvalidAxisScale { index: 1, .. })
    ));
    let figure = render_figure(&spec, &energy_tables(vec![1e-6, 1.0, 1e3])).unwrap();
    let (lo, hi) = figure.panels[0].y_range;
    assert!(lo > 0.0 && lo < 1e-6 && hi > 1e3, "{lo} {hi}");
}

#[test]
fn only_selected_rows_are_checked() {
    let spec = FigureSpec::single(
        PlotSpec::builder(PlotKind::Scatter)
            .yscale(Scale::Log)
            .series(SeriesRef::new("traj", "t", "kinetic_energy").select(Selection::Last))
            .build()
            .unwrap(),
    );
    let figure = render_figure(&spec, &energy_tables(vec![0.0, 2.0])).unwrap();
    assert_eq!(figure.panels[0].layers[0].len(), 1);
}

#[test]
fn equal_aspect_on_a_log_axis_is_refused() {
    let err = PlotSpec::builder(PlotKind::Line)
        .aspect(Aspect::Equal)
        .yscale(Scale::Log)
        .series(SeriesRef::new("traj", "t", "kinetic_energy"))
        .build()
        .unwrap_err();
    match err {
        Error::InvalidPlot(msg) => assert!(msg.contains("equal aspect"), "{msg}"),
        other => panic!("expected InvalidPlot, got {other:?}"),
    }

    // Linear equal aspect over the same data still renders.
    let spec = FigureSpec::single(
        PlotSpec::builder(PlotKind::Line)
            .aspect(Aspect::Equal)
            .series(SeriesRef::new("traj", "t", "kinetic_energy"))
            .build()
            .unwrap(),
    );
    let figure = render_figure(&spec, &energy_tables(vec![1.0, 5.0, 10.0])).unwrap();
    let (_, y) = figure.panels[0].ranges_for(200, 200);
    assert!(y.1 - y.0 >= 9.0, "{y:?}");
}
