//! Rendered figures: specs resolved against table data.
//!
//! A `Figure` owns copies of every point it draws, so it no longer refers to
//! the tables it came from. It is consumed by the output sink and dropped.

use crate::core::field::{ScalarField2D, band_index};
use crate::plot::spec::{Aspect, OutputTarget, PlotKind, Scale};
use crate::plot::style::{Colormap, DrawMode, Marker, Rgb};

#[derive(Clone, Debug, PartialEq)]
pub enum Points {
    Planar(Vec<(f64, f64)>),
    Spatial(Vec<(f64, f64, f64)>),
}

impl Points {
    pub fn len(&self) -> usize {
        match self {
            Points::Planar(p) => p.len(),
            Points::Spatial(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One series, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// `table.x/table.y` description of the source fields.
    pub source: String,
    pub label: Option<String>,
    pub mode: DrawMode,
    pub color: Rgb,
    pub marker: Marker,
    /// Points (1/72 inch).
    pub linewidth: f64,
    pub marker_size: f64,
    pub points: Points,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Filled background bands of a scalar field.
#[derive(Clone, Debug, PartialEq)]
pub struct ContourLayer {
    pub field: ScalarField2D,
    pub levels: usize,
    pub colormap: Colormap,
    pub alpha: f64,
    pub label: Option<String>,
}

impl ContourLayer {
    pub fn value_range(&self) -> (f64, f64) {
        self.field.value_range()
    }

    /// Band color of every grid cell, row-major in y.
    pub fn cell_colors(&self) -> Vec<Rgb> {
        let (lo, hi) = self.value_range();
        let cols = self.field.nx().saturating_sub(1);
        let rows = self.field.ny().saturating_sub(1);
        let mut out = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            for i in 0..cols {
                let band = band_index(self.field.cell_value(i, j), lo, hi, self.levels);
                out.push(self.colormap.band(band, self.levels));
            }
        }
        out
    }
}

/// A reference shape flattened to a closed polyline in data coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb,
    pub dashed: bool,
    pub linewidth: f64,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub kind: PlotKind,
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub zlabel: String,
    pub yscale: Scale,
    pub aspect: Aspect,
    pub grid: bool,
    pub legend: bool,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Only set for 3D panels.
    pub z_range: Option<(f64, f64)>,
    pub background: Option<ContourLayer>,
    pub outlines: Vec<Outline>,
    /// Declaration order; markers are still drawn above lines.
    pub layers: Vec<Layer>,
}

impl Panel {
    pub fn is_spatial(&self) -> bool {
        self.kind == PlotKind::Orbit3d
    }

    /// Axis ranges to draw into a plotting area of `width_px` by `height_px`.
    ///
    /// With equal aspect the narrower range is widened about its center until
    /// one data unit spans the same number of pixels on both axes. Equal
    /// aspect is only defined for linear axes; a log panel keeps its ranges.
    pub fn ranges_for(&self, width_px: u32, height_px: u32) -> ((f64, f64), (f64, f64)) {
        match (self.aspect, self.yscale) {
            (Aspect::Equal, Scale::Linear) => {
                equalize_ranges(self.x_range, self.y_range, width_px, height_px)
            }
            _ => (self.x_range, self.y_range),
        }
    }
}

/// Widen one of two linear ranges so both have the same units per pixel.
pub fn equalize_ranges(
    x: (f64, f64),
    y: (f64, f64),
    width_px: u32,
    height_px: u32,
) -> ((f64, f64), (f64, f64)) {
    let w = width_px.max(1) as f64;
    let h = height_px.max(1) as f64;
    let x_upp = (x.1 - x.0) / w;
    let y_upp = (y.1 - y.0) / h;
    if !(x_upp > 0.0 && y_upp > 0.0) {
        return (x, y);
    }
    let widen = |r: (f64, f64), span: f64| {
        let mid = 0.5 * (r.0 + r.1);
        (mid - 0.5 * span, mid + 0.5 * span)
    };
    if x_upp < y_upp {
        (widen(x, y_upp * w), y)
    } else {
        (x, widen(y, x_upp * h))
    }
}

/// A complete figure: panels in caller order laid out on a `rows` x `cols`
/// grid, plus where it goes.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
    pub output: OutputTarget,
}

impl Figure {
    pub fn pixel_size(&self) -> (u32, u32) {
        self.output.pixel_size()
    }

    pub fn n_layers(&self) -> usize {
        self.panels.iter().map(|p| p.layers.len()).sum()
    }

    /// Short name for logs: the output file, else the first panel title.
    pub fn describe(&self) -> String {
        if let Some(path) = &self.output.path {
            return path.display().to_string();
        }
        self.title
            .clone()
            .or_else(|| self.panels.first().map(|p| p.title.clone()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "untitled figure".to_string())
    }
}
