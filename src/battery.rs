//! Built-in experiments for the data files the simulation exercises export.
//!
//! Each preset names its input files relative to a data directory and its
//! figures relative to an output directory.

use std::path::Path;

use crate::config::RenderConfig;
use crate::core::derive::DerivedStep;
use crate::core::field::{Grid2D, Potential};
use crate::core::schema::{Delimiter, SchemaDescriptor};
use crate::error::{Error, Result};
use crate::pipeline::{Experiment, Source};
use crate::plot::spec::{
    Aspect, Background, FigureSpec, Layout, OutputTarget, PlotKind, PlotSpec, Scale, Selection,
    SeriesRef, Shape,
};
use crate::plot::style::{Colormap, DrawMode, Marker, Rgb};

pub const PRESETS: &[&str] = &["lorenz", "heart", "annular", "spline", "pendulum", "energy"];

const CYAN: Rgb = Rgb(0, 255, 255);
const MAGENTA: Rgb = Rgb(255, 0, 255);
const PURPLE: Rgb = Rgb(128, 0, 128);
const DODGER_BLUE: Rgb = Rgb(30, 144, 255);
const DARK_ORANGE: Rgb = Rgb(255, 140, 0);
const LIME_GREEN: Rgb = Rgb(50, 205, 50);

/// Paths and defaults shared by every preset.
struct Ctx<'a> {
    cfg: &'a RenderConfig,
    data_dir: &'a Path,
    out_dir: &'a Path,
}

impl Ctx<'_> {
    fn source(&self, name: &str, file: &str, schema: SchemaDescriptor) -> Source {
        Source::new(name, self.data_dir.join(file), schema)
    }

    fn output(&self, file: &str, width_in: f64, height_in: f64, dpi: u32) -> OutputTarget {
        OutputTarget::file(self.out_dir.join(file))
            .size_in(width_in, height_in)
            .dpi(dpi)
            .show(self.cfg.output.show)
    }

    /// Output at the configured default size and resolution.
    fn default_output(&self, file: &str) -> OutputTarget {
        self.cfg.output_target(Some(self.out_dir.join(file)))
    }
}

pub fn preset(name: &str, cfg: &RenderConfig, data_dir: &Path, out_dir: &Path) -> Result<Experiment> {
    let ctx = Ctx {
        cfg,
        data_dir,
        out_dir,
    };
    match name {
        "lorenz" => lorenz(&ctx),
        "heart" => heart(&ctx),
        "annular" => annular(&ctx),
        "spline" => spline(&ctx),
        "pendulum" => pendulum(&ctx),
        "energy" => energy(&ctx),
        _ => Err(Error::UnknownPreset {
            name: name.to_string(),
            known: PRESETS,
        }),
    }
}

fn lorenz(ctx: &Ctx) -> Result<Experiment> {
    let schema = SchemaDescriptor::new(["t", "x", "y", "z"]).with_skip_rows(2);

    let mut series = PlotSpec::builder(PlotKind::Line)
        .title("Lorenz system variables vs time")
        .xlabel("t")
        .ylabel("variables")
        .legend(true);
    for field in ["x", "y", "z"] {
        series = series.series(SeriesRef::new("lorenz", "t", field).label(format!("{field}(t)")));
    }
    let series = series
        .output(ctx.output("lorenz_vs_t.png", 10.0, 6.0, 300))
        .build()?;

    let orbit = PlotSpec::builder(PlotKind::Orbit3d)
        .title("Phase-space orbit (Lorenz)")
        .xlabel("x")
        .ylabel("y")
        .zlabel("z")
        .series(SeriesRef::xyz("lorenz", "x", "y", "z").linewidth(1.0))
        .output(ctx.output("lorenz_orbita_3d.png", 8.0, 6.0, 300))
        .build()?;

    Ok(Experiment::new("lorenz")
        .source(ctx.source("lorenz", "lorenz.dat", schema))
        .figure(series)
        .figure(orbit))
}

fn heart(ctx: &Ctx) -> Result<Experiment> {
    let schema =
        SchemaDescriptor::new(["t", "x", "vx", "y", "vy", "theta", "omega"]).with_skip_rows(1);

    let mut exp = Experiment::new("heart")
        .source(ctx.source("heart", "trayectoria_corazon.dat", schema))
        .figure(
            PlotSpec::builder(PlotKind::Line)
                .title("Particle trajectory")
                .xlabel("x")
                .ylabel("y")
                .aspect(Aspect::Equal)
                .series(SeriesRef::new("heart", "x", "y"))
                .output(ctx.output("trayectoria_xy.png", 6.0, 6.0, ctx.cfg.figure.dpi))
                .build()?,
        );

    for field in ["x", "y", "theta", "omega"] {
        exp = exp.figure(
            PlotSpec::builder(PlotKind::Line)
                .title(format!("{field} vs t"))
                .xlabel("t")
                .ylabel(field)
                .series(SeriesRef::new("heart", "t", field))
                .output(ctx.default_output(&format!("{field}_vs_t.png")))
                .build()?,
        );
    }
    Ok(exp)
}

fn annular(ctx: &Ctx) -> Result<Experiment> {
    let schema = SchemaDescriptor::new(["t", "x", "y"]);
    let r0 = 10.0;
    let background = Background::new(
        Grid2D::square(15.0, 400),
        Potential::Annular {
            center: [0.0, 0.0],
            r0,
            sigma: 10.0,
        },
    )
    .levels(20)
    .colormap(Colormap::Viridis)
    .alpha(0.6)
    .label("Potential U(x,y)");

    let mut plot = PlotSpec::builder(PlotKind::ContourOverlay)
        .title("Two particles in an annular potential (PEFRL)")
        .xlabel("x")
        .ylabel("y")
        .aspect(Aspect::Equal)
        .legend(true)
        .background(background)
        .shape(
            Shape::circle([0.0, 0.0], r0)
                .dashed()
                .color(Rgb::RED)
                .labeled(format!("Ring (r0={r0})")),
        );

    for (table, label, line, accent) in [("p1", "1", CYAN, Rgb::BLUE), ("p2", "2", MAGENTA, PURPLE)] {
        plot = plot
            .series(
                SeriesRef::new(table, "x", "y")
                    .label(format!("Particle {label}"))
                    .color(line)
                    .linewidth(1.5),
            )
            .series(
                SeriesRef::new(table, "x", "y")
                    .select(Selection::First)
                    .mode(DrawMode::Markers)
                    .marker(Marker::Circle)
                    .marker_size(8.0)
                    .color(accent)
                    .label(format!("Start P{label}")),
            )
            .series(
                SeriesRef::new(table, "x", "y")
                    .select(Selection::Last)
                    .mode(DrawMode::Markers)
                    .marker(Marker::Cross)
                    .marker_size(10.0)
                    .color(accent)
                    .label(format!("End P{label}")),
            );
    }
    let plot = plot
        .output(ctx.output("trayectorias.png", 10.0, 10.0, 300))
        .build()?;

    Ok(Experiment::new("annular")
        .source(ctx.source("p1", "trayectoria1.txt", schema.clone()))
        .source(ctx.source("p2", "trayectoria2.txt", schema))
        .figure(plot))
}

fn spline(ctx: &Ctx) -> Result<Experiment> {
    let trajectory = PlotSpec::builder(PlotKind::Line)
        .title("Particle trajectory")
        .xlabel("position x")
        .ylabel("position y")
        .aspect(Aspect::Equal)
        .legend(true)
        .series(
            SeriesRef::new("trajectory", "x", "y")
                .color(DODGER_BLUE)
                .linewidth(1.0),
        )
        .series(
            SeriesRef::new("trajectory", "x", "y")
                .select(Selection::First)
                .mode(DrawMode::Markers)
                .color(Rgb::RED)
                .label("Start"),
        )
        .build()?;

    let energy = PlotSpec::builder(PlotKind::Line)
        .title("Kinetic energy vs time")
        .xlabel("time (t)")
        .ylabel("kinetic energy (E_k)")
        .yscale(Scale::Log)
        .series(
            SeriesRef::new("trajectory", "t", "kinetic_energy")
                .color(DARK_ORANGE)
                .linewidth(1.5),
        )
        .build()?;

    let composite = FigureSpec::composite(ctx.output("trajectory_energy.png", 12.0, 12.0, 100))
        .layout(Layout::Rows)
        .panel(trajectory)
        .panel(energy);

    let restoration = PlotSpec::builder(PlotKind::Scatter)
        .title("Trajectory restoration with a cubic spline")
        .xlabel("position x")
        .ylabel("position y")
        .aspect(Aspect::Equal)
        .legend(true)
        .series(
            SeriesRef::new("nodes", "x", "y")
                .marker(Marker::Circle)
                .marker_size(8.0)
                .color(Rgb::BLUE)
                .label("Interpolation nodes (x_2k)"),
        )
        .series(
            SeriesRef::new("removed", "x", "y")
                .marker(Marker::Cross)
                .marker_size(8.0)
                .color(Rgb::RED)
                .label("Removed samples (x_2k+1)"),
        )
        .series(
            SeriesRef::new("interpolation", "x_restored", "y_restored")
                .marker(Marker::Plus)
                .marker_size(10.0)
                .color(LIME_GREEN)
                .label("Restored by spline"),
        )
        .output(ctx.output("spline_restoration.png", 14.0, 8.0, 100))
        .build()?;

    Ok(Experiment::new("spline")
        .source(Source::with_header(
            "trajectory",
            ctx.data_dir.join("trajectory.csv"),
            Delimiter::Comma,
        ))
        .source(Source::with_header(
            "interpolation",
            ctx.data_dir.join("interpolation_results.csv"),
            Delimiter::Comma,
        ))
        .derive(DerivedStep::Subsample {
            table: "trajectory".into(),
            stride: 2,
            prefix_fraction: Some(0.01),
            kept: "nodes".into(),
            removed: "removed".into(),
        })
        .figure(composite)
        .figure(restoration))
}

fn pendulum(ctx: &Ctx) -> Result<Experiment> {
    let plot = PlotSpec::builder(PlotKind::Scatter)
        .title("T² as a function of pendulum length L")
        .xlabel("L [m]")
        .ylabel("T² [s²]")
        .grid(false)
        .legend(true)
        .series(SeriesRef::new("pendulum", "L", "T2").label("Data"))
        .series(
            SeriesRef::new("pendulum", "L", "T2_fit")
                .mode(DrawMode::Line)
                .color(Rgb::RED)
                .label("Linear fit"),
        )
        .output(ctx.default_output("grafica_pendulo_simple.svg"))
        .build()?;

    Ok(Experiment::new("pendulum")
        .source(ctx.source(
            "pendulum",
            "datos_periodo2_vs_largo.txt",
            SchemaDescriptor::new(["L", "T2"]),
        ))
        .derive(DerivedStep::LinearFit {
            table: "pendulum".into(),
            x: "L".into(),
            output: "T2_fit".into(),
            slope: 4.24,
            intercept: -0.48,
        })
        .figure(plot))
}

fn energy(ctx: &Ctx) -> Result<Experiment> {
    let plot = PlotSpec::builder(PlotKind::Line)
        .title("Kinetic energy vs time")
        .xlabel("time (t)")
        .ylabel("kinetic energy (E)")
        .legend(true)
        .series(SeriesRef::new("energy", "t", "energy").label("Kinetic energy"))
        .output(ctx.output("energia_cinetica.png", 12.0, 6.0, 100))
        .build()?;

    Ok(Experiment::new("energy")
        .source(ctx.source(
            "energy",
            "energia_cinetica.dat",
            SchemaDescriptor::new(["t", "energy"]).with_skip_rows(1),
        ))
        .figure(plot))
}
