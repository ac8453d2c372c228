use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::error::{Result, VideoError};
use crate::video::types::{FrameRate, VideoMetadata};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Check that an executable answers `-version`
pub fn check_tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Fail fast when either FFmpeg executable is missing
pub fn ensure_tools(tools: &ToolsConfig) -> Result<()> {
    for program in [&tools.ffmpeg, &tools.ffprobe] {
        if !check_tool_available(program) {
            return Err(VideoError::ToolMissing { tool: program.clone() }.into());
        }
    }
    debug!("FFmpeg tools available: {}, {}", tools.ffmpeg, tools.ffprobe);
    Ok(())
}

/// Read the attributes of the first video stream of `path`
pub fn probe<P: AsRef<Path>>(tools: &ToolsConfig, path: P) -> Result<VideoMetadata> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(VideoError::LoadFailed { path: path.display().to_string() }.into());
    }

    let output = Command::new(&tools.ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
        .arg(path)
        .output()
        .map_err(|_| VideoError::ToolMissing { tool: tools.ffprobe.clone() })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("ffprobe failed for {}: {}", path.display(), stderr.trim());
        return Err(VideoError::LoadFailed { path: path.display().to_string() }.into());
    }

    let metadata = parse_probe_json(path, &output.stdout)?;
    info!(
        "Video metadata: {}x{} @ {} ({:.3} fps), {}, codec {}",
        metadata.width,
        metadata.height,
        metadata.frame_rate,
        metadata.fps(),
        metadata.duration.map(|d| format!("{:.2}s", d)).unwrap_or_else(|| "unknown duration".to_string()),
        metadata.codec,
    );
    Ok(metadata)
}

fn parse_probe_json(path: &Path, json: &[u8]) -> Result<VideoMetadata> {
    let load_failed = || VideoError::LoadFailed { path: path.display().to_string() };

    let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| {
        warn!("Unreadable ffprobe output for {}: {}", path.display(), e);
        load_failed()
    })?;

    let has_audio = parsed.streams.iter().any(|s| s.codec_type.as_deref() == Some("audio"));
    let video = parsed
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(load_failed)?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(load_failed().into()),
    };

    // avg_frame_rate is 0/0 for some streams; r_frame_rate is the fallback
    let frame_rate = video
        .avg_frame_rate
        .as_deref()
        .and_then(FrameRate::parse)
        .or_else(|| video.r_frame_rate.as_deref().and_then(FrameRate::parse))
        .ok_or_else(|| VideoError::InvalidParameters {
            details: format!("{}: no usable frame rate", path.display()),
        })?;

    let duration = video
        .duration
        .as_deref()
        .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    Ok(VideoMetadata {
        path: path.to_path_buf(),
        width,
        height,
        frame_rate,
        duration,
        codec: video.codec_name.unwrap_or_else(|| "unknown".to_string()),
        frame_count: video.nb_frames.and_then(|n| n.parse().ok()),
        has_audio,
    })
}
