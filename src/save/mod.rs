//! # Save Execution
//!
//! `job` holds the frame loop; `runner` puts it on a background worker with
//! progress reporting, cancellation and a single-flight guard.

pub mod job;
pub mod runner;

pub use job::{run_save, SaveProgress, SaveReport, SaveRequest, TransformWindow};
pub use runner::{SaveEvent, SaveRunner};
