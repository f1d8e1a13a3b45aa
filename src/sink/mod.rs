//! Output sink: persists rendered figures and optionally presents them.
//!
//! Files are drawn into a staging file next to the target and renamed into
//! place only once the backend has flushed a non-empty image, so a failed
//! write never leaves a partial file at the target path.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::plot::draw::draw_figure;
use crate::plot::figure::Figure;
use crate::plot::style::Typography;

mod viewer;

pub use viewer::{Presenter, TerminalPresenter};
#[cfg(feature = "gui")]
pub use viewer::WindowPresenter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(ImageFormat::Png),
            Some("svg") => Ok(ImageFormat::Svg),
            Some(other) => Err(Error::write_failure(
                path,
                format!("unsupported image format `.{other}` (use .png or .svg)"),
            )),
            None => Err(Error::write_failure(
                path,
                "no file extension to pick an image format from (use .png or .svg)",
            )),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// What happened to one figure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emitted {
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub shown: bool,
}

pub struct OutputSink {
    text: Typography,
    presenter: Option<Box<dyn Presenter>>,
}

impl OutputSink {
    /// A sink that presents with the default presenter for this build.
    pub fn new(text: Typography) -> Self {
        Self {
            text,
            presenter: Some(viewer::default_presenter()),
        }
    }

    /// A sink that never blocks: figures asking to be shown are only written.
    pub fn headless(text: Typography) -> Self {
        Self {
            text,
            presenter: None,
        }
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn typography(&self) -> &Typography {
        &self.text
    }

    /// Write the figure to its output path (if any), then present it when
    /// the output asks for it. Presentation blocks until dismissed.
    pub fn emit(&mut self, figure: &Figure) -> Result<Emitted> {
        let mut emitted = Emitted::default();
        if let Some(path) = &figure.output.path {
            emitted.bytes = self.persist(figure, path)?;
            emitted.path = Some(path.clone());
        }

        if figure.output.show {
            match self.presenter.as_mut() {
                Some(presenter) => {
                    presenter.present(figure, emitted.path.as_deref(), &self.text)?;
                    emitted.shown = true;
                }
                None => warn!(figure = %figure.describe(), "no presenter configured, not showing"),
            }
        } else if emitted.path.is_none() {
            warn!(figure = %figure.describe(), "figure has neither an output path nor show set");
        }
        Ok(emitted)
    }

    /// Draw `figure` to `path`, all or nothing. Returns the file size.
    pub fn persist(&self, figure: &Figure, path: &Path) -> Result<u64> {
        let format = ImageFormat::from_path(path)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::write_failure(path, e))?;
        }

        let staging = staging_path(path, format);
        File::create(&staging).map_err(|e| Error::write_failure(path, e))?;

        let result = self.draw_to(figure, &staging, format, path).and_then(|()| {
            let bytes = fs::metadata(&staging)
                .map_err(|e| Error::write_failure(path, e))?
                .len();
            if bytes == 0 {
                return Err(Error::write_failure(path, "backend produced an empty image"));
            }
            fs::rename(&staging, path).map_err(|e| Error::write_failure(path, e))?;
            Ok(bytes)
        });

        match &result {
            Ok(bytes) => {
                let (w, h) = figure.pixel_size();
                info!(path = %path.display(), bytes, width = w, height = h, "wrote figure");
            }
            Err(_) => {
                if fs::remove_file(&staging).is_ok() {
                    debug!(staging = %staging.display(), "removed staging file");
                }
            }
        }
        result
    }

    fn draw_to(&self, figure: &Figure, staging: &Path, format: ImageFormat, target: &Path) -> Result<()> {
        let size = figure.pixel_size();
        let drawn = match format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(staging, size).into_drawing_area();
                draw_figure(&root, figure, &self.text)
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(staging, size).into_drawing_area();
                draw_figure(&root, figure, &self.text)
            }
        };
        drawn.map_err(|e| Error::Draw {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Hidden sibling of `path` that keeps the real extension, so the backend
/// still encodes the right format.
fn staging_path(path: &Path, format: ImageFormat) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "figure".to_string());
    let staged = format!(".{name}.{}.partial.{}", std::process::id(), format.extension());
    path.with_file_name(staged)
}

/// Draw `figure` into an RGB buffer of its pixel size.
pub fn rasterize(figure: &Figure, text: &Typography) -> Result<(u32, u32, Vec<u8>)> {
    let (w, h) = figure.pixel_size();
    let mut buf = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        draw_figure(&root, figure, text).map_err(|e| Error::Draw {
            path: figure
                .output
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from("<memory>")),
            reason: e.to_string(),
        })?;
    }
    Ok((w, h, buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("a/b.PNG")).unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path(Path::new("b.svg")).unwrap(), ImageFormat::Svg);
        let err = ImageFormat::from_path(Path::new("fit.pdf")).unwrap_err();
        assert!(matches!(err, Error::OutputWriteFailure { .. }));
        assert!(err.to_string().contains("fit.pdf"));
        assert!(ImageFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn staging_file_is_a_hidden_sibling() {
        let staged = staging_path(Path::new("/out/lorenz.png"), ImageFormat::Png);
        assert_eq!(staged.parent(), Some(Path::new("/out")));
        let name = staged.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".lorenz.png."), "{name}");
        assert!(name.ends_with(".png"), "{name}");
    }
}
