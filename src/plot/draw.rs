//! Drawing of rendered figures onto any plotters backend.
//!
//! Sizes in a `Figure` are in points; they are converted to pixels here with
//! the figure's dpi, so the same figure looks alike at 100 and at 300 dpi.

use std::error::Error;

use plotters::coord::Shift;
use plotters::coord::ranged1d::ValueFormatter;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::plot::figure::{ContourLayer, Figure, Layer, Outline, Panel, Points};
use crate::plot::spec::Scale;
use crate::plot::style::{Marker, Typography};

type DrawResult = Result<(), Box<dyn Error>>;

/// Share of a contour panel's width given to the colorbar.
const COLORBAR_SHARE: f64 = 0.14;
/// Segments per dash (and per gap) of a dashed outline.
const DASH_SEGMENTS: usize = 5;

/// Point-to-pixel conversion for one figure.
struct Metrics<'t> {
    text: &'t Typography,
    dpi: f64,
}

impl<'t> Metrics<'t> {
    fn px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    fn stroke(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    fn marker_radius(&self, points: f64) -> i32 {
        (0.5 * self.px(points)).round().max(1.0) as i32
    }

    fn font(&self, points: f64) -> FontDesc<'t> {
        (self.text.font_family.as_str(), self.px(points)).into_font()
    }

    fn caption_font(&self) -> FontDesc<'t> {
        self.font(self.text.caption_pt)
    }

    fn label_font(&self) -> FontDesc<'t> {
        self.font(self.text.label_pt)
    }

    fn margin(&self) -> u32 {
        self.px(8.0).round() as u32
    }

    fn x_label_area(&self) -> u32 {
        (self.px(self.text.label_pt) * 3.2).round() as u32
    }

    fn y_label_area(&self) -> u32 {
        (self.px(self.text.label_pt) * 5.5).round() as u32
    }
}

/// Draw `figure` onto `root` and present the backend.
pub fn draw_figure<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure, text: &Typography) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let m = Metrics {
        text,
        dpi: figure.output.dpi as f64,
    };
    root.fill(&WHITE)?;

    let body = match &figure.title {
        Some(title) => root.titled(title, m.font(text.caption_pt * 1.2))?,
        None => root.clone(),
    };
    let cells = body.split_evenly((figure.rows, figure.cols));
    for (panel, cell) in figure.panels.iter().zip(&cells) {
        let area = if panel.title.is_empty() {
            cell.clone()
        } else {
            cell.titled(&panel.title, m.caption_font())?
        };
        if panel.is_spatial() {
            draw_spatial(&area, panel, &m)?;
        } else {
            draw_planar(&area, panel, &m)?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_planar<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel, m: &Metrics<'_>) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (plot_area, bar_area) = match &panel.background {
        Some(_) => {
            let (w, _) = area.dim_in_pixel();
            let split = (w as f64 * (1.0 - COLORBAR_SHARE)).round() as i32;
            let (left, right) = area.split_horizontally(split);
            (left, Some(right))
        }
        None => (area.clone(), None),
    };

    let margin = m.margin();
    let (xla, yla) = (m.x_label_area(), m.y_label_area());
    let (w, h) = plot_area.dim_in_pixel();
    let inner_w = w.saturating_sub(2 * margin + yla);
    let inner_h = h.saturating_sub(2 * margin + xla);
    let (xr, yr) = panel.ranges_for(inner_w, inner_h);

    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(margin)
        .x_label_area_size(xla)
        .y_label_area_size(yla);
    match panel.yscale {
        Scale::Linear => {
            let mut chart = builder.build_cartesian_2d(xr.0..xr.1, yr.0..yr.1)?;
            draw_planar_body(&mut chart, panel, m)?;
        }
        Scale::Log => {
            let mut chart = builder.build_cartesian_2d(xr.0..xr.1, (yr.0..yr.1).log_scale())?;
            draw_planar_body(&mut chart, panel, m)?;
        }
    }

    if let (Some(bar), Some(bg)) = (bar_area, &panel.background) {
        draw_colorbar(&bar, bg, m)?;
    }
    Ok(())
}

fn draw_planar_body<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    panel: &Panel,
    m: &Metrics<'_>,
) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    // Background bands go underneath the grid lines.
    if let Some(bg) = &panel.background {
        draw_contour_cells(chart, bg)?;
    }

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(panel.xlabel.as_str())
            .y_desc(panel.ylabel.as_str())
            .label_style(m.label_font())
            .axis_desc_style(m.label_font());
        if !panel.grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;
    }

    for outline in &panel.outlines {
        draw_outline(chart, outline, panel.legend, m)?;
    }

    // Lines first, then markers, so highlighted points sit on top.
    for layer in panel.layers.iter().filter(|l| l.mode.draws_line()) {
        let Points::Planar(points) = &layer.points else {
            continue;
        };
        let color = layer.color.to_plotters();
        let width = m.stroke(layer.linewidth);
        let anno = chart.draw_series(LineSeries::new(
            points.iter().copied(),
            color.stroke_width(width),
        ))?;
        if let Some(label) = layer.label.as_ref().filter(|_| panel.legend) {
            anno.label(label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
            });
        }
    }
    for layer in panel.layers.iter().filter(|l| l.mode.draws_markers()) {
        draw_markers(chart, layer, panel.legend, m)?;
    }

    let labeled = panel.layers.iter().any(|l| l.label.is_some())
        || panel.outlines.iter().any(|o| o.label.is_some());
    if panel.legend && labeled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(m.label_font())
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_contour_cells<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    bg: &ContourLayer,
) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let field = &bg.field;
    let cols = field.nx().saturating_sub(1);
    let colors = bg.cell_colors();
    let cells = colors.iter().enumerate().map(|(k, c)| {
        let (i, j) = (k % cols, k / cols);
        Rectangle::new(
            [(field.xs[i], field.ys[j]), (field.xs[i + 1], field.ys[j + 1])],
            c.to_plotters().mix(bg.alpha).filled(),
        )
    });
    chart.draw_series(cells)?;
    Ok(())
}

fn draw_outline<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    outline: &Outline,
    legend: bool,
    m: &Metrics<'_>,
) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let color = outline.color.to_plotters();
    let width = m.stroke(outline.linewidth);
    let pieces = dash_pieces(&outline.points, outline.dashed);
    let anno = chart.draw_series(
        pieces
            .into_iter()
            .map(|piece| PathElement::new(piece, color.stroke_width(width))),
    )?;
    if let Some(label) = outline.label.as_ref().filter(|_| legend) {
        let dashed = outline.dashed;
        anno.label(label.as_str()).legend(move |(x, y)| {
            let end = if dashed { x + 8 } else { x + 20 };
            PathElement::new(vec![(x, y), (end, y)], color.stroke_width(width))
        });
    }
    Ok(())
}

/// Split a polyline into dashes, or keep it whole.
fn dash_pieces(points: &[(f64, f64)], dashed: bool) -> Vec<Vec<(f64, f64)>> {
    if !dashed || points.len() < 2 {
        return vec![points.to_vec()];
    }
    let last = points.len() - 1;
    (0..last)
        .step_by(2 * DASH_SEGMENTS)
        .map(|start| points[start..=(start + DASH_SEGMENTS).min(last)].to_vec())
        .collect()
}

fn draw_markers<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    layer: &Layer,
    legend: bool,
    m: &Metrics<'_>,
) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let Points::Planar(points) = &layer.points else {
        return Ok(());
    };
    let color = layer.color.to_plotters();
    let r = m.marker_radius(layer.marker_size);
    let w = m.stroke(layer.linewidth.max(1.0));
    // A line+marker series already has its legend entry from the line pass.
    let label = layer
        .label
        .clone()
        .filter(|_| legend && !layer.mode.draws_line());

    macro_rules! markers {
        ($glyph:expr) => {{
            let anno = chart.draw_series(points.iter().map(|&p| ($glyph)(p)))?;
            if let Some(label) = label {
                anno.label(label).legend(move |(x, y)| ($glyph)((x + 10, y)));
            }
        }};
    }

    match layer.marker {
        Marker::Circle => markers!(|p| Circle::new(p, r, color.filled())),
        Marker::Cross => markers!(|p| Cross::new(p, r, color.stroke_width(w))),
        Marker::Triangle => markers!(|p| TriangleMarker::new(p, r, color.filled())),
        Marker::Square => markers!(|p| {
            EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], color.filled())
        }),
        Marker::Plus => markers!(|p| {
            EmptyElement::at(p)
                + PathElement::new(vec![(-r, 0), (r, 0)], color.stroke_width(w))
                + PathElement::new(vec![(0, -r), (0, r)], color.stroke_width(w))
        }),
    }
    Ok(())
}

fn draw_colorbar<DB>(area: &DrawingArea<DB, Shift>, bg: &ContourLayer, m: &Metrics<'_>) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (lo, hi) = bg.value_range();
    let hi = if hi > lo { hi } else { lo + 1.0 };
    let levels = bg.levels.max(1);
    let step = (hi - lo) / levels as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(m.margin())
        .x_label_area_size(m.x_label_area())
        .y_label_area_size(m.y_label_area())
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh()
            .disable_x_axis()
            .label_style(m.label_font())
            .axis_desc_style(m.label_font());
        if let Some(label) = &bg.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;
    }

    chart.draw_series((0..levels).map(|band| {
        let y0 = lo + step * band as f64;
        let color = bg.colormap.band(band, levels).to_plotters().mix(bg.alpha);
        Rectangle::new([(0.0, y0), (1.0, y0 + step)], color.filled())
    }))?;
    Ok(())
}

fn draw_spatial<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel, m: &Metrics<'_>) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x, y) = (panel.x_range, panel.y_range);
    let z = panel.z_range.unwrap_or((0.0, 1.0));

    // plotters draws its second axis upright; data z goes there.
    let mut chart = ChartBuilder::on(area)
        .margin(m.margin())
        .build_cartesian_3d(x.0..x.1, z.0..z.1, y.0..y.1)?;
    chart.with_projection(|mut pb| {
        pb.pitch = 0.35;
        pb.yaw = 0.65;
        pb.scale = 0.8;
        pb.into_matrix()
    });

    {
        let mut axes = chart.configure_axes();
        axes.label_style(m.label_font())
            .light_grid_style(BLACK.mix(0.08))
            .max_light_lines(3);
        if !panel.grid {
            axes.light_grid_style(TRANSPARENT)
                .bold_grid_style(TRANSPARENT);
        }
        axes.draw()?;
    }

    for layer in &panel.layers {
        let Points::Spatial(points) = &layer.points else {
            continue;
        };
        let color = layer.color.to_plotters();
        let width = m.stroke(layer.linewidth);
        let anno = chart.draw_series(LineSeries::new(
            points.iter().map(|&(px, py, pz)| (px, pz, py)),
            color.stroke_width(width),
        ))?;
        if let Some(label) = layer.label.as_ref().filter(|_| panel.legend) {
            anno.label(label.as_str()).legend(move |(lx, ly)| {
                PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(width))
            });
        }
    }

    let axis_labels = [
        (panel.xlabel.as_str(), (x.1, z.0, y.0)),
        (panel.ylabel.as_str(), (x.0, z.0, y.1)),
        (panel.zlabel.as_str(), (x.0, z.1, y.0)),
    ];
    chart.draw_series(
        axis_labels
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .map(|(text, at)| Text::new(text.to_string(), at, m.label_font())),
    )?;

    if panel.legend && panel.layers.iter().any(|l| l.label.is_some()) {
        chart
            .configure_series_labels()
            .label_font(m.label_font())
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}
