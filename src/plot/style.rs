//! Colors, markers and colormaps shared by plot specs and the drawing code.

use std::fmt;
use std::str::FromStr;

use plotters::style::{Palette, Palette99, RGBColor};
use serde::{Deserialize, Serialize};

/// An opaque RGB color, written as `#rrggbb` or a named color in manifests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    const NAMED: [(&'static str, Rgb); 20] = [
        ("black", Rgb(0, 0, 0)),
        ("white", Rgb(255, 255, 255)),
        ("gray", Rgb(128, 128, 128)),
        ("red", Rgb(255, 0, 0)),
        ("green", Rgb(0, 128, 0)),
        ("blue", Rgb(0, 0, 255)),
        ("cyan", Rgb(0, 255, 255)),
        ("magenta", Rgb(255, 0, 255)),
        ("yellow", Rgb(255, 255, 0)),
        ("purple", Rgb(128, 0, 128)),
        ("orange", Rgb(255, 165, 0)),
        ("darkorange", Rgb(255, 140, 0)),
        ("dodgerblue", Rgb(30, 144, 255)),
        ("limegreen", Rgb(50, 205, 50)),
        ("navy", Rgb(0, 0, 128)),
        ("teal", Rgb(0, 128, 128)),
        ("brown", Rgb(165, 42, 42)),
        ("crimson", Rgb(220, 20, 60)),
        ("gold", Rgb(255, 215, 0)),
        ("darkgreen", Rgb(0, 100, 0)),
    ];

    /// Default color of the `idx`-th series in a panel.
    pub fn cycle(idx: usize) -> Rgb {
        let (r, g, b) = Palette99::COLORS[idx % Palette99::COLORS.len()];
        Rgb(r, g, b)
    }

    #[inline]
    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("color `{s}` must be #rrggbb"));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("color `{s}` has a non-hex digit"))
            };
            return Ok(Rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let lower = s.to_ascii_lowercase();
        Self::NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, c)| *c)
            .ok_or_else(|| format!("unknown color `{s}`"))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    #[default]
    Circle,
    /// Diagonal cross (`x`).
    Cross,
    Plus,
    Square,
    Triangle,
}

/// Whether a series is drawn as a polyline, as discrete markers, or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    Line,
    Markers,
    LineMarkers,
}

impl DrawMode {
    #[inline]
    pub fn draws_line(self) -> bool {
        matches!(self, DrawMode::Line | DrawMode::LineMarkers)
    }

    #[inline]
    pub fn draws_markers(self) -> bool {
        matches!(self, DrawMode::Markers | DrawMode::LineMarkers)
    }
}

fn default_linewidth() -> f64 {
    1.5
}

fn default_marker_size() -> f64 {
    6.0
}

/// Per-series appearance. Sizes are in points (1/72 inch).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub marker: Marker,
    /// Overrides the plot kind's default draw mode.
    #[serde(default)]
    pub mode: Option<DrawMode>,
    #[serde(default = "default_linewidth")]
    pub linewidth: f64,
    #[serde(default = "default_marker_size")]
    pub marker_size: f64,
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: None,
            marker: Marker::default(),
            mode: None,
            linewidth: default_linewidth(),
            marker_size: default_marker_size(),
            label: None,
        }
    }
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

fn default_caption_pt() -> f64 {
    12.0
}

fn default_label_pt() -> f64 {
    10.0
}

/// Font settings for captions, axis descriptions and tick labels, in points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_caption_pt")]
    pub caption_pt: f64,
    #[serde(default = "default_label_pt")]
    pub label_pt: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            caption_pt: default_caption_pt(),
            label_pt: default_label_pt(),
        }
    }
}

/// Sequential colormaps for filled contour backgrounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Colormap {
    #[default]
    Viridis,
    Magma,
    Gray,
}

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const MAGMA: [(u8, u8, u8); 9] = [
    (0, 0, 4),
    (28, 16, 68),
    (79, 18, 123),
    (129, 37, 129),
    (181, 54, 122),
    (229, 80, 100),
    (251, 135, 97),
    (254, 194, 135),
    (252, 253, 191),
];

const GRAY: [(u8, u8, u8); 2] = [(0, 0, 0), (255, 255, 255)];

impl Colormap {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Magma => &MAGMA,
            Colormap::Gray => &GRAY,
        }
    }

    /// Color at `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (stops.len() - 1) as f64;
        let lo = (pos.floor() as usize).min(stops.len() - 1);
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = pos - lo as f64;
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (stops[lo], stops[hi]);
        Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// Color of band `band` out of `n_bands`, spread from the first to the
    /// last stop.
    pub fn band(self, band: usize, n_bands: usize) -> Rgb {
        if n_bands <= 1 {
            return self.at(0.5);
        }
        self.at(band as f64 / (n_bands - 1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_named_colors_parse() {
        assert_eq!("#1e90ff".parse::<Rgb>().unwrap(), Rgb(30, 144, 255));
        assert_eq!("DodgerBlue".parse::<Rgb>().unwrap(), Rgb(30, 144, 255));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
    }

    #[test]
    fn color_displays_as_hex() {
        assert_eq!(Rgb(255, 0, 128).to_string(), "#ff0080");
    }

    #[test]
    fn colormap_endpoints_match_stops() {
        assert_eq!(Colormap::Viridis.at(0.0), Rgb(68, 1, 84));
        assert_eq!(Colormap::Viridis.at(1.0), Rgb(253, 231, 37));
        assert_eq!(Colormap::Gray.at(0.5), Rgb(128, 128, 128));
        assert_eq!(Colormap::Magma.band(19, 20), Colormap::Magma.at(1.0));
    }

    #[test]
    fn style_defaults_fill_in() {
        let style: Style = toml::from_str(r#"color = "red""#).unwrap();
        assert_eq!(style.color, Some(Rgb::RED));
        assert_eq!(style.linewidth, 1.5);
        assert_eq!(style.marker, Marker::Circle);
        assert!(style.mode.is_none());
    }
}
