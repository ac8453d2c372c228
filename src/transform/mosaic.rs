use image::{imageops::{self, FilterType}, ImageBuffer, RgbImage};

use crate::{
    error::Result,
    region::Region,
    transform::traits::{ensure_fits, RegionTransform},
    video::types::Frame,
};

/// Pixelates the region in place, leaving the rest of the frame untouched
pub struct MosaicTransform {
    block_size: u32,
}

impl MosaicTransform {
    /// `block_size` is the number of blocks along each axis, clamped to at least 1
    pub fn new(block_size: u32) -> Self {
        Self { block_size: block_size.max(1) }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Downsample with a linear filter, then blow back up with nearest-neighbour
    fn pixelate(&self, patch: &RgbImage) -> RgbImage {
        let (width, height) = patch.dimensions();
        // Regions narrower than the grid keep one block per pixel on that axis
        let grid_w = self.block_size.min(width);
        let grid_h = self.block_size.min(height);

        let small = imageops::resize(patch, grid_w, grid_h, FilterType::Triangle);

        ImageBuffer::from_fn(width, height, |x, y| {
            let sx = (u64::from(x) * u64::from(grid_w) / u64::from(width)) as u32;
            let sy = (u64::from(y) * u64::from(grid_h) / u64::from(height)) as u32;
            *small.get_pixel(sx, sy)
        })
    }
}

impl Default for MosaicTransform {
    fn default() -> Self {
        Self::new(10)
    }
}

impl RegionTransform for MosaicTransform {
    fn name(&self) -> &str {
        "mosaic"
    }

    fn description(&self) -> &str {
        "Pixelate the selected rectangle, keeping the full frame"
    }

    fn output_dimensions(&self, frame_size: (u32, u32), _region: &Region) -> (u32, u32) {
        frame_size
    }

    fn apply(&self, mut frame: Frame, region: &Region) -> Result<Frame> {
        ensure_fits(&frame, region)?;
        let patch = frame.crop(region).into_image();
        let blocks = self.pixelate(&patch);
        frame.paste(region, &blocks);
        Ok(frame)
    }
}
