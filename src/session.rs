use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::{Result, SelectionError};
use crate::region::{Point, Region, RegionSelector};
use crate::save::{SaveRequest, TransformWindow};
use crate::transform::TransformMode;
use crate::video::{self, Frame, VideoMetadata};

/// State of one interactive editing session over a single source file
///
/// Owned by the UI controller and handed to event handlers by reference.
pub struct Session {
    config: Config,
    metadata: VideoMetadata,
    preview: Frame,
    preview_seconds: f64,
    selector: RegionSelector,
    /// Text of the start time field
    pub start_input: String,
    /// Text of the duration field
    pub duration_input: String,
}

impl Session {
    /// Probe `path` and decode the frame at `start_seconds`
    ///
    /// Any failure here is a startup failure.
    pub fn open<P: AsRef<Path>>(config: Config, path: P, start_seconds: f64) -> Result<Self> {
        let metadata = video::probe(&config.tools, path.as_ref())?;
        let (preview, preview_seconds) = decode_preview(&config, &metadata, start_seconds)?;

        Ok(Self {
            config,
            metadata,
            preview,
            preview_seconds,
            selector: RegionSelector::new(),
            start_input: format_seconds(preview_seconds),
            duration_input: String::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn source_path(&self) -> &PathBuf {
        &self.metadata.path
    }

    pub fn preview(&self) -> &Frame {
        &self.preview
    }

    /// Presentation time of the frame on screen; saves start here
    pub fn preview_seconds(&self) -> f64 {
        self.preview_seconds
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn press(&mut self, point: Point) {
        self.selector.press(point);
    }

    pub fn drag(&mut self, point: Point) {
        self.selector.drag(point);
    }

    pub fn release(&mut self, point: Option<Point>) {
        self.selector.release(point);
    }

    /// Decode the frame at the time typed into the start field
    ///
    /// The selection is cleared because it belonged to the old frame.
    pub fn load_preview_from_input(&mut self) -> Result<()> {
        let seconds = parse_seconds(&self.start_input)
            .filter(|s| *s >= 0.0)
            .ok_or_else(|| SelectionError::InvalidStartTime { input: self.start_input.clone() })?;
        self.load_preview(seconds)
    }

    pub fn load_preview(&mut self, seconds: f64) -> Result<()> {
        let (preview, preview_seconds) = decode_preview(&self.config, &self.metadata, seconds)?;
        self.preview = preview;
        self.preview_seconds = preview_seconds;
        self.start_input = format_seconds(preview_seconds);
        self.selector.clear();
        Ok(())
    }

    /// The committed selection, normalized against the preview frame
    pub fn region(&self) -> std::result::Result<Region, SelectionError> {
        self.selector.committed_region(self.metadata.width, self.metadata.height)
    }

    /// Validate the current inputs into an immutable save request
    pub fn build_request(&self, mode: TransformMode) -> Result<SaveRequest> {
        let region = self.region()?;

        let duration = parse_seconds(&self.duration_input)
            .filter(|d| *d > 0.0)
            .ok_or_else(|| SelectionError::InvalidDuration { input: self.duration_input.clone() })?;

        let window = TransformWindow::new(self.metadata.frame_rate, self.preview_seconds, duration)?;

        Ok(SaveRequest {
            source: self.metadata.clone(),
            window,
            region,
            mode,
            config: self.config.clone(),
        })
    }
}

fn decode_preview(config: &Config, metadata: &VideoMetadata, seconds: f64) -> Result<(Frame, f64)> {
    let frame_rate = metadata.frame_rate;
    let aligned = frame_rate.seconds_at(frame_rate.frame_index_at(seconds));
    let frame = video::grab_frame(&config.tools, &metadata.path, metadata, aligned)?;
    info!("Loaded preview frame {} at {:.3}s", frame_rate.frame_index_at(seconds), aligned);
    Ok((frame, aligned))
}

/// Parse a seconds field; non-finite values count as unparseable
pub fn parse_seconds(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}
