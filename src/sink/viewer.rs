//! Interactive presentation of figures. Every presenter blocks the caller
//! until the user dismisses the figure.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::plot::figure::Figure;
use crate::plot::style::Typography;

pub trait Presenter {
    /// Show `figure`; `written` is where the sink just saved it, if anywhere.
    fn present(&mut self, figure: &Figure, written: Option<&Path>, text: &Typography) -> Result<()>;
}

#[cfg(feature = "gui")]
pub(super) fn default_presenter() -> Box<dyn Presenter> {
    Box::new(WindowPresenter::default())
}

#[cfg(not(feature = "gui"))]
pub(super) fn default_presenter() -> Box<dyn Presenter> {
    Box::new(TerminalPresenter::stdio())
}

/// Prints where the figure went and waits for Enter.
pub struct TerminalPresenter {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl TerminalPresenter {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())), Box::new(io::stderr()))
    }
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, figure: &Figure, written: Option<&Path>, _text: &Typography) -> Result<()> {
        let io_err = |e: io::Error| Error::Presentation(e.to_string());
        match written {
            Some(path) => writeln!(self.output, "figure written to {}", path.display()),
            None => writeln!(self.output, "figure `{}` (not saved)", figure.describe()),
        }
        .map_err(io_err)?;
        write!(self.output, "press Enter to continue... ").map_err(io_err)?;
        self.output.flush().map_err(io_err)?;

        let mut line = String::new();
        self.input.read_line(&mut line).map_err(io_err)?;
        debug!(figure = %figure.describe(), "terminal presentation dismissed");
        Ok(())
    }
}

/// Opens a native window showing the rasterized figure; returns when the
/// window is closed.
#[cfg(feature = "gui")]
#[derive(Clone, Debug)]
pub struct WindowPresenter {
    /// Initial inner window size in logical points.
    pub max_size: [f32; 2],
}

#[cfg(feature = "gui")]
impl Default for WindowPresenter {
    fn default() -> Self {
        Self {
            max_size: [1200.0, 900.0],
        }
    }
}

#[cfg(feature = "gui")]
impl Presenter for WindowPresenter {
    fn present(&mut self, figure: &Figure, _written: Option<&Path>, text: &Typography) -> Result<()> {
        let (w, h, rgb) = super::rasterize(figure, text)?;
        let image = egui::ColorImage::from_rgb([w as usize, h as usize], &rgb);

        // Fit the window to the figure without exceeding max_size.
        let scale = (self.max_size[0] / w as f32)
            .min(self.max_size[1] / h as f32)
            .min(1.0);
        let native_options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([w as f32 * scale, h as f32 * scale]),
            ..Default::default()
        };

        let title = figure.describe();
        eframe::run_native(
            &title,
            native_options,
            Box::new(|cc| Ok(Box::new(FigureWindow::new(cc, image)))),
        )
        .map_err(|e| Error::Presentation(e.to_string()))?;
        debug!(figure = %title, "window closed");
        Ok(())
    }
}

#[cfg(feature = "gui")]
struct FigureWindow {
    texture: egui::TextureHandle,
}

#[cfg(feature = "gui")]
impl FigureWindow {
    fn new(cc: &eframe::CreationContext<'_>, image: egui::ColorImage) -> Self {
        let texture = cc
            .egui_ctx
            .load_texture("figure", image, egui::TextureOptions::LINEAR);
        Self { texture }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for FigureWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::WHITE))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(&self.texture).shrink_to_fit());
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::spec::OutputTarget;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Write half that can be inspected after the presenter is done with it.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn empty_figure() -> Figure {
        Figure {
            title: Some("empty".into()),
            rows: 1,
            cols: 1,
            panels: Vec::new(),
            output: OutputTarget::default(),
        }
    }

    #[test]
    fn terminal_presenter_waits_for_a_line() {
        let out = Shared::default();
        let mut presenter =
            TerminalPresenter::new(Box::new(Cursor::new(b"\n".to_vec())), Box::new(out.clone()));
        presenter
            .present(&empty_figure(), Some(Path::new("/tmp/x.png")), &Typography::default())
            .unwrap();
        let printed = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(printed.contains("/tmp/x.png"), "{printed}");
        assert!(printed.contains("press Enter"), "{printed}");
    }
}
