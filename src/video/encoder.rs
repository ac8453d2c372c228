use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::error::{Result, VideoError};
use crate::video::types::{Frame, FrameRate};

/// Audio taken from the source for the same time window
#[derive(Debug, Clone)]
pub struct AudioSource {
    pub path: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Everything the encoder process needs up front
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub codec: String,
    /// Quality setting (1-100, higher is better)
    pub quality: u8,
    pub pixel_format: String,
    pub threads: usize,
    pub audio: Option<AudioSource>,
}

/// Represents a finished output file
#[derive(Debug, Clone)]
pub struct EncodedOutput {
    pub path: PathBuf,
    pub frame_count: u64,
    pub file_size: u64,
}

/// Writes frames to ffmpeg's stdin as raw RGB24
pub struct FrameEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    settings: EncodeSettings,
    frames_written: u64,
    done: bool,
}

impl FrameEncoder {
    pub fn create(tools: &ToolsConfig, settings: EncodeSettings) -> Result<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(VideoError::InvalidParameters {
                details: format!("output size {}x{}", settings.width, settings.height),
            }.into());
        }

        if settings.output.exists() {
            warn!("Overwriting existing output {}", settings.output.display());
        }

        let mut cmd = Command::new(&tools.ffmpeg);
        cmd.args(build_args(&settings));
        cmd.stdin(Stdio::piped()).stdout(Stdio::null()).stderr(Stdio::piped());

        debug!("Spawning encoder: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| VideoError::EncodingFailed {
            reason: format!("could not start {}: {}", tools.ffmpeg, e),
        })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(super::drain_stderr);

        info!(
            "Encoding {}x{} @ {} with {} to {}",
            settings.width, settings.height, settings.frame_rate, settings.codec,
            settings.output.display()
        );

        Ok(Self {
            child,
            stdin,
            stderr,
            settings,
            frames_written: 0,
            done: false,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != self.dimensions() {
            return Err(VideoError::FrameProcessingFailed {
                reason: format!(
                    "frame is {}x{}, encoder expects {}x{}",
                    frame.width(), frame.height(), self.settings.width, self.settings.height
                ),
            }.into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "encoder input already closed".to_string(),
        })?;

        if let Err(e) = stdin.write_all(frame.as_rgb_bytes()) {
            // A broken pipe means ffmpeg died; its stderr says why
            let stderr = self.collect_failure();
            return Err(VideoError::EncodingFailed {
                reason: format!("pipe write failed ({}): {}", e, stderr),
            }.into());
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Close the input and wait for the container to be finalized
    pub fn finish(mut self) -> Result<EncodedOutput> {
        drop(self.stdin.take());
        self.done = true;

        let status = self.child.wait()?;
        let stderr = self.stderr.take().and_then(|h| h.join().ok()).unwrap_or_default();

        if !status.success() {
            remove_partial(&self.settings.output);
            return Err(VideoError::EncodingFailed {
                reason: format!("ffmpeg exited with {}: {}", status, stderr.trim()),
            }.into());
        }

        let file_size = std::fs::metadata(&self.settings.output)?.len();
        Ok(EncodedOutput {
            path: self.settings.output.clone(),
            frame_count: self.frames_written,
            file_size,
        })
    }

    /// Kill the process and delete whatever was written
    pub fn abort(mut self) {
        self.kill_and_cleanup();
    }

    fn collect_failure(&mut self) -> String {
        drop(self.stdin.take());
        let _ = self.child.wait();
        self.stderr
            .take()
            .and_then(|h| h.join().ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn kill_and_cleanup(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        remove_partial(&self.settings.output);
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        self.kill_and_cleanup();
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

fn build_args(settings: &EncodeSettings) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner", "-nostdin", "-loglevel", "error", "-y",
        "-f", "rawvideo",
        "-pix_fmt", "rgb24",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.extend([
        "-s".to_string(), format!("{}x{}", settings.width, settings.height),
        "-r".to_string(), settings.frame_rate.to_string(),
        "-i".to_string(), "-".to_string(),
    ]);

    if let Some(audio) = &settings.audio {
        args.extend([
            "-ss".to_string(), format!("{:.6}", audio.start_seconds),
            "-t".to_string(), format!("{:.6}", audio.duration_seconds),
            "-i".to_string(), audio.path.display().to_string(),
            "-map".to_string(), "0:v:0".to_string(),
            "-map".to_string(), "1:a:0?".to_string(),
            "-c:a".to_string(), "aac".to_string(),
            "-shortest".to_string(),
        ]);
    } else {
        args.push("-an".to_string());
    }

    args.extend([
        "-c:v".to_string(), settings.codec.clone(),
    ]);
    args.extend(quality_args(&settings.codec, settings.quality));
    args.extend([
        "-pix_fmt".to_string(), settings.pixel_format.clone(),
        "-threads".to_string(), settings.threads.to_string(),
        settings.output.display().to_string(),
    ]);
    args
}

/// Map the 1-100 quality knob onto the codec's own rate control
fn quality_args(codec: &str, quality: u8) -> Vec<String> {
    match codec {
        "libx264" | "libx265" => vec!["-crf".to_string(), quality_to_crf(quality).to_string()],
        _ => vec!["-q:v".to_string(), quality_to_qscale(quality).to_string()],
    }
}

fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

fn quality_to_qscale(quality: u8) -> u8 {
    (31 - ((quality.min(100) as f32 / 100.0) * 29.0) as u8).clamp(2, 31)
}
