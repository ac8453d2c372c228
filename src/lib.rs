//! # region-fx
//!
//! Select a rectangle on one frame of a video and crop or pixelate that
//! region over a time window, writing a new video file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use region_fx::{
//!     config::Config,
//!     region::Point,
//!     save::{SaveRunner, SaveProgress},
//!     session::Session,
//!     transform::TransformMode,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mut session = Session::open(Config::default(), "input.mp4", 2.0)?;
//! session.press(Point::new(100.0, 100.0));
//! session.release(Some(Point::new(301.0, 241.0)));
//! session.duration_input = "3.0".to_string();
//!
//! let request = session.build_request(TransformMode::Mosaic)?;
//! let mut runner = SaveRunner::new(tokio::runtime::Handle::current());
//! runner.start(request)?;
//! if let Some(result) = runner.wait(|p: SaveProgress| println!("{}/{}", p.frames_written, p.frames_requested)).await {
//!     let report = result?;
//!     println!("wrote {}", report.output.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`region`] - Corner normalization and the press/drag/release selector
//! - [`transform`] - Crop and mosaic frame transforms
//! - [`video`] - FFmpeg probing, decoding and encoding
//! - [`save`] - The frame loop and its background runner
//! - [`session`] - Per-window interaction state
//! - [`ui`] - The eframe window
//! - [`config`] - Configuration management
//!
//! ## Output
//!
//! Every save writes to the configured output path (`output.mov` by
//! default) and replaces whatever file is already there.

pub mod config;
pub mod error;
pub mod region;
pub mod save;
pub mod session;
pub mod transform;
pub mod ui;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{RegionFxError, Result},
    region::{Point, Region, RegionSelector},
    save::{SaveReport, SaveRequest, SaveRunner},
    session::Session,
    transform::{RegionTransform, TransformMode},
};
