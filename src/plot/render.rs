//! Renderer: resolves plot specs against loaded tables.
//!
//! Every check that can fail is done here, before a single pixel is drawn.
//! That includes field lookup, selection bounds, and log-axis positivity.
//! Tables are only read.

use std::f64::consts::TAU;
use std::ops::Range;

use tracing::{debug, warn};

use crate::core::field::ScalarField2D;
use crate::core::table::TableSet;
use crate::error::{Error, Result};
use crate::plot::figure::{ContourLayer, Figure, Layer, Outline, Panel, Points};
use crate::plot::spec::{FigureSpec, PlotKind, PlotSpec, Scale, Selection, SeriesRef, Shape};
use crate::plot::style::Rgb;

/// Fraction of the data span added on each side of an auto-scaled axis.
const AUTO_PAD: f64 = 0.05;
/// Segments used to flatten a reference circle.
const CIRCLE_SEGMENTS: usize = 360;

/// Render a single plot spec as its own figure.
pub fn render_plot(spec: &PlotSpec, tables: &TableSet) -> Result<Figure> {
    render_figure(&FigureSpec::single(spec.clone()), tables)
}

/// Render a figure spec; panels keep the order they were declared in.
pub fn render_figure(spec: &FigureSpec, tables: &TableSet) -> Result<Figure> {
    spec.validate()?;
    let (rows, cols) = spec.layout.shape(spec.panels.len())?;
    let panels = spec
        .panels
        .iter()
        .map(|panel| resolve_panel(panel, tables))
        .collect::<Result<Vec<_>>>()?;

    let figure = Figure {
        title: spec.title.clone(),
        rows,
        cols,
        panels,
        output: spec.output.clone(),
    };
    debug!(
        figure = %figure.describe(),
        panels = figure.panels.len(),
        layers = figure.n_layers(),
        "rendered figure"
    );
    Ok(figure)
}

fn resolve_panel(spec: &PlotSpec, tables: &TableSet) -> Result<Panel> {
    let log_y = spec.axes.yscale == Scale::Log;

    let layers = spec
        .series
        .iter()
        .enumerate()
        .map(|(idx, series)| resolve_layer(idx, series, spec.kind, log_y, tables))
        .collect::<Result<Vec<_>>>()?;

    let outlines = spec.shapes.iter().map(flatten_shape).collect::<Vec<_>>();
    if log_y {
        for (outline, shape) in outlines.iter().zip(&spec.shapes) {
            let Shape::Circle { radius, .. } = shape;
            require_positive(
                &format!("circle of radius {radius}"),
                outline.points.iter().map(|p| p.1),
            )?;
        }
    }

    let background = match &spec.background {
        Some(bg) => {
            if log_y {
                require_positive("background grid", [bg.grid.y_min, bg.grid.y_max].into_iter())?;
            }
            Some(ContourLayer {
                field: ScalarField2D::from_potential(&bg.grid, &bg.potential)?,
                levels: bg.levels,
                colormap: bg.colormap,
                alpha: bg.alpha,
                label: bg.label.clone(),
            })
        }
        None => None,
    };

    let mut xb = Bounds::default();
    let mut yb = Bounds::default();
    let mut zb = Bounds::default();
    for layer in &layers {
        match &layer.points {
            Points::Planar(points) => {
                for &(x, y) in points {
                    xb.push(x);
                    yb.push(y);
                }
            }
            Points::Spatial(points) => {
                for &(x, y, z) in points {
                    xb.push(x);
                    yb.push(y);
                    zb.push(z);
                }
            }
        }
    }
    for outline in &outlines {
        for &(x, y) in &outline.points {
            xb.push(x);
            yb.push(y);
        }
    }

    // Filled backgrounds fix the axes to the sampled extent, as long as
    // the overlays stay inside it.
    let tight = background.is_some();
    if let Some(bg) = &spec.background {
        xb.push(bg.grid.x_min);
        xb.push(bg.grid.x_max);
        yb.push(bg.grid.y_min);
        yb.push(bg.grid.y_max);
    }

    let x_range = match spec.axes.x_range {
        Some([lo, hi]) => (lo, hi),
        None => xb.resolve(Scale::Linear, tight),
    };
    let y_range = match spec.axes.y_range {
        Some([lo, hi]) => {
            if log_y {
                require_positive("explicit y range", [lo, hi].into_iter())?;
            }
            (lo, hi)
        }
        None => yb.resolve(spec.axes.yscale, tight),
    };
    let z_range = (spec.kind == PlotKind::Orbit3d).then(|| zb.resolve(Scale::Linear, false));

    Ok(Panel {
        kind: spec.kind,
        title: spec.axes.title.clone(),
        xlabel: spec.axes.xlabel.clone(),
        ylabel: spec.axes.ylabel.clone(),
        zlabel: spec.axes.zlabel.clone().unwrap_or_default(),
        yscale: spec.axes.yscale,
        aspect: spec.axes.aspect,
        grid: spec.axes.grid,
        legend: spec.legend,
        x_range,
        y_range,
        z_range,
        background,
        outlines,
        layers,
    })
}

fn resolve_layer(
    idx: usize,
    series: &SeriesRef,
    kind: PlotKind,
    log_y: bool,
    tables: &TableSet,
) -> Result<Layer> {
    let table = tables.get(&series.table)?;
    let xs = table.field(&series.x)?;
    let ys = table.field(&series.y)?;
    let zs = series.z.as_deref().map(|z| table.field(z)).transpose()?;
    let rows = selected_rows(series, table.len())?;

    if log_y {
        if let Some(i) = rows.clone().find(|&i| ys[i] <= 0.0) {
            return Err(Error::InvalidAxisScale {
                axis: "y".into(),
                series: series.describe(),
                index: i,
                value: ys[i],
            });
        }
    }

    let requested = rows.len();
    let points = match zs {
        Some(zs) => Points::Spatial(
            rows.map(|i| (xs[i], ys[i], zs[i]))
                .filter(|p| p.0.is_finite() && p.1.is_finite() && p.2.is_finite())
                .collect(),
        ),
        None => Points::Planar(
            rows.map(|i| (xs[i], ys[i]))
                .filter(|p| p.0.is_finite() && p.1.is_finite())
                .collect(),
        ),
    };
    if points.len() < requested {
        warn!(
            series = %series.describe(),
            dropped = requested - points.len(),
            "skipping non-finite samples"
        );
    }
    if points.is_empty() {
        warn!(series = %series.describe(), "series has no points to draw");
    }

    let style = &series.style;
    Ok(Layer {
        source: series.describe(),
        label: style.label.clone(),
        mode: style.mode.unwrap_or_else(|| kind.default_mode()),
        color: style.color.unwrap_or_else(|| Rgb::cycle(idx)),
        marker: style.marker,
        linewidth: style.linewidth,
        marker_size: style.marker_size,
        points,
    })
}

fn selected_rows(series: &SeriesRef, len: usize) -> Result<Range<usize>> {
    match series.select {
        Selection::All => Ok(0..len),
        Selection::First if len > 0 => Ok(0..1),
        Selection::Last if len > 0 => Ok(len - 1..len),
        Selection::Index(i) if i < len => Ok(i..i + 1),
        other => Err(Error::InvalidPlot(format!(
            "series {} selects {other:?} but table `{}` has {len} rows",
            series.describe(),
            series.table
        ))),
    }
}

fn require_positive(what: &str, values: impl Iterator<Item = f64>) -> Result<()> {
    for (index, value) in values.enumerate() {
        if value <= 0.0 {
            return Err(Error::InvalidAxisScale {
                axis: "y".into(),
                series: what.to_string(),
                index,
                value,
            });
        }
    }
    Ok(())
}

fn flatten_shape(shape: &Shape) -> Outline {
    let Shape::Circle {
        center,
        radius,
        color,
        dashed,
        linewidth,
        label,
    } = shape;
    let points = (0..=CIRCLE_SEGMENTS)
        .map(|k| {
            let theta = TAU * k as f64 / CIRCLE_SEGMENTS as f64;
            (center[0] + radius * theta.cos(), center[1] + radius * theta.sin())
        })
        .collect();
    Outline {
        points,
        color: *color,
        dashed: *dashed,
        linewidth: *linewidth,
        label: label.clone(),
    }
}

/// Running min/max of one axis.
#[derive(Clone, Copy, Debug, Default)]
struct Bounds(Option<(f64, f64)>);

impl Bounds {
    fn push(&mut self, v: f64) {
        if !v.is_finite() {
            return;
        }
        self.0 = Some(match self.0 {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        });
    }

    fn resolve(self, scale: Scale, tight: bool) -> (f64, f64) {
        match (self.0, scale) {
            (None, Scale::Linear) => (0.0, 1.0),
            (None, Scale::Log) => (1.0, 10.0),
            (Some((lo, hi)), _) if tight && hi > lo => (lo, hi),
            (Some(b), Scale::Linear) => pad_linear(b),
            (Some(b), Scale::Log) => pad_log(b),
        }
    }
}

fn pad_linear((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = hi - lo;
    if span > 0.0 {
        return (lo - AUTO_PAD * span, hi + AUTO_PAD * span);
    }
    let d = if lo == 0.0 { 0.5 } else { lo.abs() * AUTO_PAD };
    (lo - d, hi + d)
}

fn pad_log((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        let f = (hi / lo).powf(AUTO_PAD);
        (lo / f, hi * f)
    } else {
        (lo * 0.5, hi * 2.0)
    }
}
