use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::derive::DerivedStep;
use crate::error::{Error, Result};
use crate::pipeline::{Experiment, Source};
use crate::plot::spec::{FigureSpec, Layout, OutputTarget, PlotSpec};
use crate::plot::style::Typography;

/// Default size and resolution of figures that do not declare their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FigureConfig {
    #[serde(default = "FigureConfig::default_width_in")]
    pub width_in: f64,
    #[serde(default = "FigureConfig::default_height_in")]
    pub height_in: f64,
    #[serde(default = "FigureConfig::default_dpi")]
    pub dpi: u32,
}

impl FigureConfig {
    fn default_width_in() -> f64 {
        6.4
    }
    fn default_height_in() -> f64 {
        4.8
    }
    fn default_dpi() -> u32 {
        100
    }
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: Self::default_width_in(),
            height_in: Self::default_height_in(),
            dpi: Self::default_dpi(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Where relative figure paths are written.
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
    /// Present figures interactively unless a figure says otherwise.
    #[serde(default)]
    pub show: bool,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("figures")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            show: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub figure: FigureConfig,
    #[serde(default)]
    pub text: Typography,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RenderConfig {
    fn round_f64(x: f64) -> f64 {
        (x * 1_000_000.0).round() / 1_000_000.0
    }

    fn format_f64_compact(x: f64) -> String {
        let mut s = format!("{:.6}", x);
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        if s.is_empty() { "0".to_string() } else { s }
    }

    fn rounded(mut self) -> Self {
        self.figure.width_in = Self::round_f64(self.figure.width_in);
        self.figure.height_in = Self::round_f64(self.figure.height_in);
        self.text.caption_pt = Self::round_f64(self.text.caption_pt);
        self.text.label_pt = Self::round_f64(self.text.label_pt);
        self
    }

    /// Output target for `path` using the configured size, dpi and show flag.
    pub fn output_target(&self, path: Option<PathBuf>) -> OutputTarget {
        OutputTarget {
            path,
            dpi: self.figure.dpi,
            show: self.output.show,
            size_in: [self.figure.width_in, self.figure.height_in],
        }
    }

    /// Read `path`; when it does not exist, write the defaults there as a
    /// commented-out template and return them. Unreadable or unparsable files
    /// fall back to the defaults with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => {
                        debug!(path = %path.display(), "loaded render config");
                        return cfg;
                    }
                    Err(err) => {
                        warn!(path = %path.display(), %err, "failed to parse config, using defaults");
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to read config, using defaults");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default().rounded();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        commented.push('\n');
                    } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                        commented.push_str(line);
                        commented.push('\n');
                    } else {
                        let mut out_line = line.to_string();
                        if let Some((lhs, rhs)) = line.split_once('=') {
                            let rhs_trim = rhs.trim();
                            if rhs_trim.contains('.') && !rhs_trim.contains('"') {
                                if let Ok(val) = rhs_trim.parse::<f64>() {
                                    let mut formatted = Self::format_f64_compact(val);
                                    if !formatted.contains('.') {
                                        formatted.push_str(".0");
                                    }
                                    out_line = format!("{} = {}", lhs.trim(), formatted);
                                }
                            }
                        }
                        commented.push_str("# ");
                        commented.push_str(&out_line);
                        commented.push('\n');
                    }
                }
                if let Err(err) = fs::write(path, commented) {
                    warn!(path = %path.display(), %err, "failed to write default config");
                }
            }
            Err(err) => warn!(%err, "failed to serialize default config, continuing with defaults"),
        }
        default_cfg
    }
}

/// Experiments declared in a TOML file.
///
/// ```toml
/// [[experiment]]
/// name = "lorenz"
///
/// [[experiment.source]]
/// name = "lorenz"
/// path = "lorenz.dat"
/// schema = { fields = ["t", "x", "y", "z"], skip_rows = 2 }
///
/// [[experiment.figure]]
/// output = { path = "lorenz_vs_t.png", dpi = 300, size_in = [10.0, 6.0] }
///
/// [[experiment.figure.panel]]
/// kind = "line"
/// axes = { title = "Lorenz variables", xlabel = "t" }
/// series = [{ table = "lorenz", x = "t", y = "x", label = "x(t)" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Manifest {
    #[serde(default, rename = "experiment")]
    pub experiments: Vec<ExperimentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentEntry {
    pub name: String,
    #[serde(default, rename = "source")]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub derive: Vec<DerivedStep>,
    #[serde(default, rename = "figure")]
    pub figures: Vec<FigureEntry>,
}

/// A figure as written in a manifest: unset output fields fall back to the
/// render config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FigureEntry {
    #[serde(rename = "panel")]
    pub panels: Vec<PlotSpec>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub output: OutputEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputEntry {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub dpi: Option<u32>,
    #[serde(default)]
    pub show: Option<bool>,
    #[serde(default)]
    pub size_in: Option<[f64; 2]>,
}

impl Manifest {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Turn entries into runnable experiments. Relative source paths are
    /// joined to `data_dir`, relative figure paths to `out_dir`.
    pub fn into_experiments(
        self,
        cfg: &RenderConfig,
        data_dir: &Path,
        out_dir: &Path,
    ) -> Vec<Experiment> {
        self.experiments
            .into_iter()
            .map(|entry| entry.into_experiment(cfg, data_dir, out_dir))
            .collect()
    }
}

impl ExperimentEntry {
    pub fn into_experiment(self, cfg: &RenderConfig, data_dir: &Path, out_dir: &Path) -> Experiment {
        let sources = self
            .sources
            .into_iter()
            .map(|mut source| {
                source.path = data_dir.join(&source.path);
                source
            })
            .collect();
        let figures = self
            .figures
            .into_iter()
            .map(|figure| figure.into_spec(cfg, out_dir))
            .collect();
        Experiment {
            name: self.name,
            sources,
            derive: self.derive,
            figures,
        }
    }
}

impl FigureEntry {
    pub fn into_spec(self, cfg: &RenderConfig, out_dir: &Path) -> FigureSpec {
        let mut output = cfg.output_target(self.output.path.map(|p| out_dir.join(p)));
        if let Some(dpi) = self.output.dpi {
            output.dpi = dpi;
        }
        if let Some(show) = self.output.show {
            output.show = show;
        }
        if let Some(size) = self.output.size_in {
            output.size_in = size;
        }
        FigureSpec {
            panels: self.panels,
            layout: self.layout,
            title: self.title,
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::spec::PlotKind;
    use tempfile::tempdir;

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("simplot.toml");

        let cfg = RenderConfig::load_or_default(&path);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.figure.dpi, 100);
        assert_eq!(cfg.figure.width_in, 6.4);
        assert_eq!(cfg.text.font_family, "sans-serif");
        assert!(!cfg.output.show);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[figure]"), "{contents}");
        assert!(contents.contains("# width_in = 6.4"), "{contents}");
        assert!(contents.contains("# caption_pt = 12.0"), "{contents}");
        assert!(contents.contains("# show = false"), "{contents}");

        // The commented template parses back to the defaults.
        assert_eq!(RenderConfig::load_or_default(&path), RenderConfig::default());
    }

    #[test]
    fn load_or_default_reads_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let custom = RenderConfig {
            figure: FigureConfig {
                width_in: 10.0,
                height_in: 10.0,
                dpi: 300,
            },
            text: Typography {
                font_family: "serif".into(),
                caption_pt: 16.0,
                label_pt: 12.0,
            },
            output: OutputConfig {
                dir: PathBuf::from("out"),
                show: true,
            },
        };
        fs::write(&path, toml::to_string_pretty(&custom).unwrap()).unwrap();

        let cfg = RenderConfig::load_or_default(&path);
        assert_eq!(cfg, custom);
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[figure]\ndpi = \"lots\"\n").unwrap();
        assert_eq!(RenderConfig::load_or_default(&path), RenderConfig::default());
    }

    #[test]
    fn manifest_resolves_paths_and_output_defaults() {
        let text = r##"
            [[experiment]]
            name = "pendulum"

            [[experiment.source]]
            name = "pendulum"
            path = "periods.txt"
            schema = { fields = ["L", "T2"] }

            [[experiment.derive]]
            op = "linear-fit"
            table = "pendulum"
            x = "L"
            output = "T2_fit"
            slope = 4.24
            intercept = -0.48

            [[experiment.figure]]
            output = { path = "pendulum.svg", dpi = 150 }

            [[experiment.figure.panel]]
            kind = "scatter"
            legend = true
            axes = { title = "T^2 vs L", xlabel = "L [m]", ylabel = "T^2 [s^2]", grid = false }
            series = [
                { table = "pendulum", x = "L", y = "T2", label = "data" },
                { table = "pendulum", x = "L", y = "T2_fit", mode = "line", color = "red", label = "fit" },
            ]
        "##;
        let manifest = Manifest::parse(Path::new("m.toml"), text).unwrap();
        let mut cfg = RenderConfig::default();
        cfg.figure.width_in = 8.0;
        let experiments =
            manifest.into_experiments(&cfg, Path::new("/data"), Path::new("/out"));
        assert_eq!(experiments.len(), 1);
        let exp = &experiments[0];
        assert_eq!(exp.sources[0].path, PathBuf::from("/data/periods.txt"));
        assert_eq!(exp.derive.len(), 1);

        let figure = &exp.figures[0];
        assert_eq!(figure.output.path, Some(PathBuf::from("/out/pendulum.svg")));
        assert_eq!(figure.output.dpi, 150);
        assert_eq!(figure.output.size_in, [8.0, 4.8]);
        assert_eq!(figure.panels[0].kind, PlotKind::Scatter);
        assert!(!figure.panels[0].axes.grid);
        assert!(figure.validate().is_ok());
    }

    #[test]
    fn manifest_errors_name_the_file() {
        let err = Manifest::parse(Path::new("bad.toml"), "[[experiment]]\n").unwrap_err();
        assert!(err.to_string().contains("bad.toml"), "{err}");
    }
}
