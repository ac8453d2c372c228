//! # Video Processing Module
//!
//! Probing, frame decoding and encoding through external FFmpeg processes.
//! Frames cross the process boundary as packed RGB24 on pipes.

pub mod types;
pub mod probe;
pub mod decoder;
pub mod encoder;

use std::io::Read;
use std::process::ChildStderr;
use std::thread::JoinHandle;

pub use types::{Frame, FrameRate, VideoMetadata};
pub use probe::{check_tool_available, ensure_tools, probe};
pub use decoder::{grab_frame, FrameDecoder};
pub use encoder::{AudioSource, EncodeSettings, EncodedOutput, FrameEncoder};

/// Collect a child's stderr on a helper thread; a full stderr pipe would
/// stall the child while we are blocked on its stdin or stdout
pub(crate) fn drain_stderr(mut stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = stderr.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}
