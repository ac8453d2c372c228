use std::fmt;
use std::path::PathBuf;

use image::{imageops, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::region::Region;

/// Represents a single decoded video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// the region-level operations used by the transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| {
            Rgb(color)
        });
        Self { buffer }
    }

    /// Create a frame from raw packed RGB24 bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Packed RGB24 bytes, row-major, as written to the encoder pipe
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    /// Whether `region` lies entirely inside this frame
    pub fn contains(&self, region: &Region) -> bool {
        region.end_x <= self.width() && region.end_y <= self.height()
    }

    /// Copy the pixels inside `region` into a new frame
    pub fn crop(&self, region: &Region) -> Frame {
        let view = imageops::crop_imm(
            &self.buffer,
            region.start_x,
            region.start_y,
            region.width(),
            region.height(),
        );
        Frame::new(view.to_image())
    }

    /// Write `patch` back with its top-left corner at the region origin
    pub fn paste(&mut self, region: &Region, patch: &RgbImage) {
        imageops::replace(
            &mut self.buffer,
            patch,
            i64::from(region.start_x),
            i64::from(region.start_y),
        );
    }

    /// Save the frame as an image file (format picked from the extension)
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Exact frame rate as reported by the container, e.g. `30000/1001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Option<Self> {
        (num > 0 && den > 0).then_some(Self { num, den })
    }

    /// Parse ffprobe's `num/den` notation; plain numbers are accepted too
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().split_once('/') {
            Some((num, den)) => Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?),
            None => Self::new(text.trim().parse().ok()?, 1),
        }
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Index of the frame shown at `seconds`, truncated toward zero
    pub fn frame_index_at(&self, seconds: f64) -> u64 {
        // 0.7 * 30.0 evaluates to 20.999999999999996
        (seconds * self.as_f64() + 1e-9).floor().max(0.0) as u64
    }

    /// Presentation time of frame `index`
    pub fn seconds_at(&self, index: u64) -> f64 {
        index as f64 * f64::from(self.den) / f64::from(self.num)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Attributes of an opened video source
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Duration in seconds, when the container reports one
    pub duration: Option<f64>,
    pub codec: String,
    pub frame_count: Option<u64>,
    pub has_audio: bool,
}

impl VideoMetadata {
    pub fn fps(&self) -> f64 {
        self.frame_rate.as_f64()
    }

    /// Bytes of one packed RGB24 frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}
