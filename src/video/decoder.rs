use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::config::ToolsConfig;
use crate::error::{Result, VideoError};
use crate::video::types::{Frame, VideoMetadata};

/// Sequential RGB24 frame reader over an ffmpeg child process
///
/// Each decoder owns its own process and read position. Saves open a fresh
/// decoder at their recorded start time rather than sharing one.
pub struct FrameDecoder {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frames_read: u64,
    finished: bool,
}

impl FrameDecoder {
    /// Start decoding `path` from `start_seconds`
    pub fn open<P: AsRef<Path>>(
        tools: &ToolsConfig,
        path: P,
        metadata: &VideoMetadata,
        start_seconds: f64,
    ) -> Result<Self> {
        Self::spawn(tools, path.as_ref(), metadata, start_seconds, None)
    }

    fn spawn(
        tools: &ToolsConfig,
        path: &Path,
        metadata: &VideoMetadata,
        start_seconds: f64,
        max_frames: Option<u64>,
    ) -> Result<Self> {
        if !start_seconds.is_finite() || start_seconds < 0.0 {
            return Err(VideoError::InvalidParameters {
                details: format!("start time {}", start_seconds),
            }.into());
        }

        let mut cmd = Command::new(&tools.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-noautorotate"]);
        // Input seeking, then decode-and-discard up to the exact frame
        cmd.args(["-ss", &format!("{:.6}", start_seconds)]);
        cmd.arg("-i").arg(path);
        if let Some(frames) = max_frames {
            cmd.args(["-frames:v", &frames.to_string()]);
        }
        cmd.args(["-map", "0:v:0", "-an", "-sn", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("Spawning decoder: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| VideoError::DecodingFailed {
            reason: format!("could not start {}: {}", tools.ffmpeg, e),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::DecodingFailed {
            reason: "decoder stdout unavailable".to_string(),
        })?;
        let stderr = child.stderr.take().map(super::drain_stderr);

        Ok(Self {
            child,
            stdout,
            stderr,
            width: metadata.width,
            height: metadata.height,
            frame_bytes: metadata.frame_bytes(),
            frames_read: 0,
            finished: false,
        })
    }

    /// Read the next frame; `None` once the source is exhausted
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let mut data = vec![0u8; self.frame_bytes];
        let mut filled = 0;
        while filled < data.len() {
            match self.stdout.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(VideoError::DecodingFailed {
                        reason: format!("pipe read failed: {}", e),
                    }.into())
                }
            }
        }

        if filled == 0 {
            self.finish_process()?;
            return Ok(None);
        }

        if filled < data.len() {
            self.finished = true;
            return Err(VideoError::DecodingFailed {
                reason: format!(
                    "truncated frame {} ({} of {} bytes)",
                    self.frames_read, filled, self.frame_bytes
                ),
            }.into());
        }

        self.frames_read += 1;
        Frame::from_rgb_bytes(self.width, self.height, data)
            .map(Some)
            .ok_or_else(|| VideoError::DecodingFailed {
                reason: "frame buffer size mismatch".to_string(),
            }.into())
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Reap the process at end of stream and surface decoder errors
    fn finish_process(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        let stderr = self.stderr.take().and_then(|h| h.join().ok()).unwrap_or_default();

        if !status.success() {
            return Err(VideoError::DecodingFailed {
                reason: format!("ffmpeg exited with {}: {}", status, stderr.trim()),
            }.into());
        }
        if !stderr.trim().is_empty() {
            warn!("Decoder reported: {}", stderr.trim());
        }
        Ok(())
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Decode the single frame shown at `seconds`
pub fn grab_frame<P: AsRef<Path>>(
    tools: &ToolsConfig,
    path: P,
    metadata: &VideoMetadata,
    seconds: f64,
) -> Result<Frame> {
    let unavailable = || VideoError::FrameUnavailable { seconds };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(unavailable().into());
    }

    let mut decoder = FrameDecoder::spawn(tools, path.as_ref(), metadata, seconds, Some(1))?;
    match decoder.next_frame() {
        Ok(Some(frame)) => Ok(frame),
        Ok(None) => Err(unavailable().into()),
        Err(e) => {
            warn!("Frame grab at {:.3}s failed: {}", seconds, e);
            Err(unavailable().into())
        }
    }
}
