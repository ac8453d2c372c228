// Frame loop shared by both transform modes

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SaveError, SelectionError};
use crate::region::Region;
use crate::transform::TransformMode;
use crate::video::{AudioSource, EncodeSettings, FrameDecoder, FrameEncoder, FrameRate, VideoMetadata};

/// Time span a save covers, aligned to the source frame grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformWindow {
    /// First frame of the window (the preview frame)
    pub start_frame: u64,
    /// Presentation time of `start_frame`
    pub start_seconds: f64,
    pub duration_seconds: f64,
    /// `floor(duration * fps)`
    pub frame_count: u64,
}

impl TransformWindow {
    pub fn new(frame_rate: FrameRate, start_seconds: f64, duration_seconds: f64) -> std::result::Result<Self, SelectionError> {
        if !start_seconds.is_finite() || start_seconds < 0.0 {
            return Err(SelectionError::InvalidStartTime { input: start_seconds.to_string() });
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(SelectionError::InvalidDuration { input: duration_seconds.to_string() });
        }

        let start_frame = frame_rate.frame_index_at(start_seconds);
        let frame_count = frame_rate.frame_index_at(duration_seconds);
        if frame_count == 0 {
            return Err(SelectionError::EmptyWindow {
                seconds: duration_seconds,
                fps: frame_rate.as_f64(),
            });
        }

        Ok(Self {
            start_frame,
            start_seconds: frame_rate.seconds_at(start_frame),
            duration_seconds,
            frame_count,
        })
    }
}

/// A fully validated save, fixed at the moment Save was pressed
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub source: VideoMetadata,
    pub window: TransformWindow,
    pub region: Region,
    pub mode: TransformMode,
    pub config: Config,
}

impl SaveRequest {
    pub fn output(&self) -> &PathBuf {
        &self.config.output.path
    }
}

/// Frames written so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveProgress {
    pub frames_written: u64,
    pub frames_requested: u64,
}

impl SaveProgress {
    pub fn fraction(&self) -> f32 {
        if self.frames_requested == 0 {
            0.0
        } else {
            (self.frames_written as f64 / self.frames_requested as f64).min(1.0) as f32
        }
    }
}

/// Outcome of a completed save
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub output: PathBuf,
    pub mode: TransformMode,
    pub width: u32,
    pub height: u32,
    pub frames_requested: u64,
    pub frames_written: u64,
    /// The source ran out before the requested duration
    pub truncated: bool,
    pub file_size: u64,
    pub elapsed: Duration,
}

/// Run a save to completion on the calling thread
///
/// Opens a decoder of its own at the window start, so concurrent readers of
/// the same file never share a position. `cancel` is checked before every
/// frame; on cancellation or error the partial output is removed.
pub fn run_save(
    request: &SaveRequest,
    cancel: &AtomicBool,
    on_progress: &dyn Fn(SaveProgress),
) -> Result<SaveReport> {
    let started = Instant::now();
    let source = &request.source;
    let config = &request.config;
    let region = request.region;
    let window = request.window;

    let transform = request.mode.build(config);
    let frame_size = (source.width, source.height);
    transform.validate(frame_size, &region)?;
    let (width, height) = transform.output_dimensions(frame_size, &region);

    let audio = if transform.keeps_audio() && source.has_audio {
        Some(AudioSource {
            path: source.path.clone(),
            start_seconds: window.start_seconds,
            duration_seconds: window.duration_seconds,
        })
    } else {
        None
    };

    info!(
        "Saving {} of {} from {:.3}s for {:.3}s ({} frames) to {}",
        transform.name(), region, window.start_seconds, window.duration_seconds,
        window.frame_count, request.output().display()
    );

    let mut decoder = FrameDecoder::open(&config.tools, &source.path, source, window.start_seconds)?;
    let mut encoder = FrameEncoder::create(&config.tools, EncodeSettings {
        output: request.output().clone(),
        width,
        height,
        frame_rate: source.frame_rate,
        codec: request.mode.codec(config).to_string(),
        quality: config.encoding.quality,
        pixel_format: config.encoding.pixel_format.clone(),
        threads: config.encoding.threads,
        audio,
    })?;

    let mut progress = SaveProgress { frames_written: 0, frames_requested: window.frame_count };
    on_progress(progress);

    while progress.frames_written < progress.frames_requested {
        if cancel.load(Ordering::Relaxed) {
            info!("Save cancelled after {} frames", progress.frames_written);
            encoder.abort();
            return Err(SaveError::Cancelled { frames_written: progress.frames_written }.into());
        }

        let Some(frame) = decoder.next_frame()? else {
            debug!("Source exhausted after {} frames", decoder.frames_read());
            break;
        };

        let out = transform.apply(frame, &region)?;
        encoder.write_frame(&out)?;

        progress.frames_written = encoder.frames_written();
        on_progress(progress);
    }
    drop(decoder);

    if progress.frames_written == 0 {
        encoder.abort();
        return Err(SaveError::NoFrames { seconds: window.start_seconds }.into());
    }

    let encoded = encoder.finish()?;
    let truncated = progress.frames_written < progress.frames_requested;
    if truncated {
        warn!(
            "Source ended early: wrote {} of {} requested frames",
            progress.frames_written, progress.frames_requested
        );
    }

    let report = SaveReport {
        output: encoded.path,
        mode: request.mode,
        width,
        height,
        frames_requested: progress.frames_requested,
        frames_written: encoded.frame_count,
        truncated,
        file_size: encoded.file_size,
        elapsed: started.elapsed(),
    };

    info!(
        "Output saved to {} ({}x{}, {} frames, {} KB, {:.1}s)",
        report.output.display(), report.width, report.height, report.frames_written,
        report.file_size / 1024, report.elapsed.as_secs_f64()
    );
    Ok(report)
}
