//! # Interactive Surface
//!
//! An eframe window showing the preview frame at 1:1 scale inside a
//! scrollable canvas, with the mode, start time and duration inputs and the
//! Save/Cancel controls below it.

mod app;

pub use app::RegionFxApp;

use crate::error::{RegionFxError, Result};
use crate::save::SaveRunner;
use crate::session::Session;
use crate::transform::TransformMode;

/// Open the window and block until it is closed
pub fn run(session: Session, runner: SaveRunner, mode: TransformMode) -> Result<()> {
    let ui_config = session.config().ui.clone();
    let title = format!(
        "region-fx - {}",
        session
            .source_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([ui_config.window_width, ui_config.window_height])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(RegionFxApp::new(session, runner, mode)))),
    )
    .map_err(|e| RegionFxError::generic(format!("window error: {}", e)))
}
