//! Declarative figure descriptions.
//!
//! A `PlotSpec` describes one panel; a `FigureSpec` places one or more panels
//! in a figure and says where it goes. Both are plain configuration: they are
//! built once (in code via [`PlotSpecBuilder`] or from a TOML manifest) and
//! never changed by rendering.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::field::{Grid2D, Potential};
use crate::error::{Error, Result};
use crate::plot::style::{Colormap, DrawMode, Marker, Rgb, Style};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlotKind {
    Line,
    Scatter,
    ContourOverlay,
    Orbit3d,
}

impl PlotKind {
    /// How series are drawn when their style does not say.
    pub fn default_mode(self) -> DrawMode {
        match self {
            PlotKind::Scatter => DrawMode::Markers,
            PlotKind::Line | PlotKind::ContourOverlay | PlotKind::Orbit3d => DrawMode::Line,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aspect {
    #[default]
    Auto,
    /// One data unit spans the same number of pixels on both axes.
    Equal,
}

/// Which samples of a series reference are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    All,
    First,
    Last,
    Index(usize),
}

/// Fields of one table drawn as one series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub table: String,
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub z: Option<String>,
    #[serde(default)]
    pub select: Selection,
    #[serde(flatten)]
    pub style: Style,
}

impl SeriesRef {
    pub fn new(table: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            x: x.into(),
            y: y.into(),
            z: None,
            select: Selection::All,
            style: Style::default(),
        }
    }

    pub fn xyz(
        table: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        z: impl Into<String>,
    ) -> Self {
        Self {
            z: Some(z.into()),
            ..Self::new(table, x, y)
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.style.label = Some(label.into());
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.style.color = Some(color);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.style.marker = marker;
        self
    }

    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.style.mode = Some(mode);
        self
    }

    pub fn linewidth(mut self, points: f64) -> Self {
        self.style.linewidth = points;
        self
    }

    pub fn marker_size(mut self, points: f64) -> Self {
        self.style.marker_size = points;
        self
    }

    pub fn select(mut self, select: Selection) -> Self {
        self.select = select;
        self
    }

    /// `table.x/table.y` style name used in logs and errors.
    pub fn describe(&self) -> String {
        match &self.z {
            Some(z) => format!("{}.{}/{}.{}/{}.{}", self.table, self.x, self.table, self.y, self.table, z),
            None => format!("{}.{}/{}.{}", self.table, self.x, self.table, self.y),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub xlabel: String,
    #[serde(default)]
    pub ylabel: String,
    #[serde(default)]
    pub zlabel: Option<String>,
    #[serde(default)]
    pub aspect: Aspect,
    #[serde(default)]
    pub yscale: Scale,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default)]
    pub x_range: Option<[f64; 2]>,
    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            title: String::new(),
            xlabel: String::new(),
            ylabel: String::new(),
            zlabel: None,
            aspect: Aspect::Auto,
            yscale: Scale::Linear,
            grid: true,
            x_range: None,
            y_range: None,
        }
    }
}

fn default_levels() -> usize {
    20
}

fn default_alpha() -> f64 {
    1.0
}

/// Filled scalar-field background of a contour overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub grid: Grid2D,
    pub potential: Potential,
    #[serde(default = "default_levels")]
    pub levels: usize,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Colorbar caption.
    #[serde(default)]
    pub label: Option<String>,
}

impl Background {
    pub fn new(grid: Grid2D, potential: Potential) -> Self {
        Self {
            grid,
            potential,
            levels: default_levels(),
            colormap: Colormap::default(),
            alpha: default_alpha(),
            label: None,
        }
    }

    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

fn default_shape_color() -> Rgb {
    Rgb::RED
}

fn default_shape_width() -> f64 {
    2.0
}

fn origin() -> [f64; 2] {
    [0.0, 0.0]
}

/// Geometric reference drawn in data coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Shape {
    Circle {
        #[serde(default = "origin")]
        center: [f64; 2],
        radius: f64,
        #[serde(default = "default_shape_color")]
        color: Rgb,
        #[serde(default)]
        dashed: bool,
        #[serde(default = "default_shape_width")]
        linewidth: f64,
        #[serde(default)]
        label: Option<String>,
    },
}

impl Shape {
    pub fn circle(center: [f64; 2], radius: f64) -> Self {
        Shape::Circle {
            center,
            radius,
            color: default_shape_color(),
            dashed: false,
            linewidth: default_shape_width(),
            label: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        let Shape::Circle { dashed, .. } = &mut self;
        *dashed = true;
        self
    }

    pub fn color(mut self, c: Rgb) -> Self {
        let Shape::Circle { color, .. } = &mut self;
        *color = c;
        self
    }

    pub fn labeled(mut self, text: impl Into<String>) -> Self {
        let Shape::Circle { label, .. } = &mut self;
        *label = Some(text.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let Shape::Circle {
            center,
            radius,
            linewidth,
            ..
        } = self;
        if !(radius.is_finite() && *radius > 0.0) || !center.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidPlot(format!(
                "circle needs a finite center and a positive radius, got center {center:?} radius {radius}"
            )));
        }
        if !(linewidth.is_finite() && *linewidth >= 0.0) {
            return Err(Error::InvalidPlot(format!("circle linewidth {linewidth} is invalid")));
        }
        Ok(())
    }
}

fn default_dpi() -> u32 {
    100
}

fn default_size_in() -> [f64; 2] {
    [6.4, 4.8]
}

/// Where and how a figure is emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    /// File to write; the extension (`png` or `svg`) selects the format.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Present interactively after writing (blocks until dismissed).
    #[serde(default)]
    pub show: bool,
    /// Width and height in inches.
    #[serde(default = "default_size_in")]
    pub size_in: [f64; 2],
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self {
            path: None,
            dpi: default_dpi(),
            show: false,
            size_in: default_size_in(),
        }
    }
}

impl OutputTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn size_in(mut self, width: f64, height: f64) -> Self {
        self.size_in = [width, height];
        self
    }

    pub fn show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    /// Canvas size in pixels: inches times dpi.
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64).round() as u32).max(1);
        (px(self.size_in[0]), px(self.size_in[1]))
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(Error::InvalidPlot("output dpi must be positive".into()));
        }
        if !self.size_in.iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(Error::InvalidPlot(format!(
                "figure size {:?} in must be positive",
                self.size_in
            )));
        }
        Ok(())
    }
}

/// One panel: what to draw and how its axes look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub kind: PlotKind,
    #[serde(default)]
    pub series: Vec<SeriesRef>,
    #[serde(default)]
    pub axes: Axes,
    #[serde(default)]
    pub legend: bool,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default, rename = "shape")]
    pub shapes: Vec<Shape>,
    /// Used when this plot is rendered as its own figure; ignored for panels
    /// of a composite.
    #[serde(default)]
    pub output: OutputTarget,
}

impl PlotSpec {
    pub fn builder(kind: PlotKind) -> PlotSpecBuilder {
        PlotSpecBuilder {
            spec: PlotSpec {
                kind,
                series: Vec::new(),
                axes: Axes::default(),
                legend: false,
                background: None,
                shapes: Vec::new(),
                output: OutputTarget::default(),
            },
        }
    }

    /// Check the plot on its own, before any table is consulted.
    pub fn validate(&self) -> Result<()> {
        let what = if self.axes.title.is_empty() {
            format!("{:?} plot", self.kind)
        } else {
            format!("plot `{}`", self.axes.title)
        };

        match self.kind {
            PlotKind::Orbit3d => {
                if let Some(s) = self.series.iter().find(|s| s.z.is_none()) {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: orbit3d series {} has no z field",
                        s.describe()
                    )));
                }
                if self.axes.yscale == Scale::Log {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: log scale is not supported on 3D axes"
                    )));
                }
            }
            _ => {
                if self.axes.yscale == Scale::Log && self.axes.aspect == Aspect::Equal {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: equal aspect needs a linear y axis, not log"
                    )));
                }
                if let Some(s) = self.series.iter().find(|s| s.z.is_some()) {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: series {} has a z field but the plot is 2D",
                        s.describe()
                    )));
                }
            }
        }

        match (&self.background, self.kind) {
            (None, PlotKind::ContourOverlay) => {
                return Err(Error::InvalidPlot(format!(
                    "{what}: contour-overlay needs a background field"
                )));
            }
            (Some(_), kind) if kind != PlotKind::ContourOverlay => {
                return Err(Error::InvalidPlot(format!(
                    "{what}: only contour-overlay plots take a background field"
                )));
            }
            (Some(bg), _) => {
                bg.grid.validate()?;
                bg.potential.validate()?;
                if bg.levels == 0 || !(0.0..=1.0).contains(&bg.alpha) {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: background needs levels >= 1 and alpha in [0, 1]"
                    )));
                }
            }
            (None, _) => {}
        }

        if self.series.is_empty() && self.background.is_none() {
            return Err(Error::InvalidPlot(format!("{what}: nothing to draw")));
        }
        if !self.shapes.is_empty() && self.kind == PlotKind::Orbit3d {
            return Err(Error::InvalidPlot(format!(
                "{what}: reference shapes are only drawn on 2D axes"
            )));
        }
        for shape in &self.shapes {
            shape.validate()?;
        }
        for series in &self.series {
            let st = &series.style;
            if !(st.linewidth.is_finite() && st.linewidth >= 0.0)
                || !(st.marker_size.is_finite() && st.marker_size >= 0.0)
            {
                return Err(Error::InvalidPlot(format!(
                    "{what}: series {} has a negative or non-finite size",
                    series.describe()
                )));
            }
        }
        for (axis, range) in [("x", self.axes.x_range), ("y", self.axes.y_range)] {
            if let Some([lo, hi]) = range {
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(Error::InvalidPlot(format!(
                        "{what}: {axis} range [{lo}, {hi}] is empty"
                    )));
                }
            }
        }
        self.output.validate()
    }
}

/// Assembles a [`PlotSpec`] step by step; `build` validates it.
#[derive(Clone, Debug)]
pub struct PlotSpecBuilder {
    spec: PlotSpec,
}

impl PlotSpecBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.spec.axes.title = title.into();
        self
    }

    pub fn xlabel(mut self, label: impl Into<String>) -> Self {
        self.spec.axes.xlabel = label.into();
        self
    }

    pub fn ylabel(mut self, label: impl Into<String>) -> Self {
        self.spec.axes.ylabel = label.into();
        self
    }

    pub fn zlabel(mut self, label: impl Into<String>) -> Self {
        self.spec.axes.zlabel = Some(label.into());
        self
    }

    pub fn aspect(mut self, aspect: Aspect) -> Self {
        self.spec.axes.aspect = aspect;
        self
    }

    pub fn yscale(mut self, scale: Scale) -> Self {
        self.spec.axes.yscale = scale;
        self
    }

    pub fn grid(mut self, on: bool) -> Self {
        self.spec.axes.grid = on;
        self
    }

    pub fn x_range(mut self, lo: f64, hi: f64) -> Self {
        self.spec.axes.x_range = Some([lo, hi]);
        self
    }

    pub fn y_range(mut self, lo: f64, hi: f64) -> Self {
        self.spec.axes.y_range = Some([lo, hi]);
        self
    }

    pub fn series(mut self, series: SeriesRef) -> Self {
        self.spec.series.push(series);
        self
    }

    pub fn legend(mut self, on: bool) -> Self {
        self.spec.legend = on;
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        self.spec.background = Some(background);
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.spec.shapes.push(shape);
        self
    }

    pub fn output(mut self, output: OutputTarget) -> Self {
        self.spec.output = output;
        self
    }

    pub fn build(self) -> Result<PlotSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

/// Arrangement of panels within a figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Panels stacked top to bottom.
    #[default]
    Rows,
    /// Panels side by side, left to right.
    Columns,
    /// Row-major grid.
    Grid { rows: usize, cols: usize },
}

impl Layout {
    /// `(rows, cols)` for `n` panels.
    pub fn shape(self, n: usize) -> Result<(usize, usize)> {
        let n = n.max(1);
        match self {
            Layout::Rows => Ok((n, 1)),
            Layout::Columns => Ok((1, n)),
            Layout::Grid { rows, cols } if rows * cols >= n && rows > 0 && cols > 0 => {
                Ok((rows, cols))
            }
            Layout::Grid { rows, cols } => Err(Error::InvalidPlot(format!(
                "a {rows}x{cols} grid cannot hold {n} panels"
            ))),
        }
    }
}

/// A whole figure: ordered panels plus its output target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureSpec {
    #[serde(rename = "panel")]
    pub panels: Vec<PlotSpec>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub output: OutputTarget,
}

impl FigureSpec {
    /// A figure holding just `spec`, written where `spec.output` says.
    pub fn single(spec: PlotSpec) -> Self {
        let output = spec.output.clone();
        Self {
            panels: vec![spec],
            layout: Layout::Rows,
            title: None,
            output,
        }
    }

    pub fn composite(output: OutputTarget) -> Self {
        Self {
            panels: Vec::new(),
            layout: Layout::Rows,
            title: None,
            output,
        }
    }

    pub fn panel(mut self, spec: PlotSpec) -> Self {
        self.panels.push(spec);
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.panels.is_empty() {
            return Err(Error::InvalidPlot("figure has no panels".into()));
        }
        self.layout.shape(self.panels.len())?;
        for panel in &self.panels {
            panel.validate()?;
        }
        self.output.validate()
    }
}

impl From<PlotSpec> for FigureSpec {
    fn from(spec: PlotSpec) -> Self {
        FigureSpec::single(spec)
    }
}
