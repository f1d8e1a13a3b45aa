//! Plot specs, their resolution against tables, and drawing.

pub mod draw;
pub mod figure;
pub mod render;
pub mod spec;
pub mod style;

pub use figure::Figure;
pub use render::{render_figure, render_plot};
pub use spec::{
    Aspect, Axes, Background, FigureSpec, Layout, OutputTarget, PlotKind, PlotSpec,
    PlotSpecBuilder, Scale, Selection, SeriesRef, Shape,
};
pub use style::{Colormap, DrawMode, Marker, Rgb, Style, Typography};
