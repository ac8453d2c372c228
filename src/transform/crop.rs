use crate::{
    error::Result,
    region::Region,
    transform::traits::{ensure_fits, RegionTransform},
    video::types::Frame,
};

/// Keeps only the pixels inside the region
pub struct CropTransform {
    keep_audio: bool,
}

impl CropTransform {
    pub fn new(keep_audio: bool) -> Self {
        Self { keep_audio }
    }
}

impl Default for CropTransform {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RegionTransform for CropTransform {
    fn name(&self) -> &str {
        "crop"
    }

    fn description(&self) -> &str {
        "Re-encode only the selected rectangle over the time window"
    }

    fn output_dimensions(&self, _frame_size: (u32, u32), region: &Region) -> (u32, u32) {
        (region.width(), region.height())
    }

    fn apply(&self, frame: Frame, region: &Region) -> Result<Frame> {
        ensure_fits(&frame, region)?;
        Ok(frame.crop(region))
    }

    fn keeps_audio(&self) -> bool {
        self.keep_audio
    }
}
