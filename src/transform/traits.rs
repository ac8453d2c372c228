use crate::{
    error::{Result, SelectionError},
    region::Region,
    video::types::Frame,
};

/// Core trait for the per-frame region transforms
pub trait RegionTransform: Send + Sync {
    /// Returns the unique name of this transform
    fn name(&self) -> &str;

    /// Returns a human-readable description of this transform
    fn description(&self) -> &str;

    /// Dimensions of the frames this transform produces
    ///
    /// # Arguments
    ///
    /// * `frame_size` - Source frame width and height
    /// * `region` - The committed, normalized selection
    fn output_dimensions(&self, frame_size: (u32, u32), region: &Region) -> (u32, u32);

    /// Apply the transform to one decoded frame
    ///
    /// The region is the same for every frame of a save.
    fn apply(&self, frame: Frame, region: &Region) -> Result<Frame>;

    /// Whether the source audio of the window belongs in the output
    fn keeps_audio(&self) -> bool {
        false
    }

    /// Check the region before any frame is decoded
    fn validate(&self, frame_size: (u32, u32), region: &Region) -> Result<()> {
        region.validate(frame_size.0, frame_size.1)?;
        Ok(())
    }
}

/// Shared guard for `apply` implementations
pub(crate) fn ensure_fits(frame: &Frame, region: &Region) -> Result<()> {
    if region.is_empty() {
        return Err(SelectionError::EmptyRegion {
            width: region.width(),
            height: region.height(),
        }.into());
    }
    if !frame.contains(region) {
        return Err(SelectionError::OutOfBounds {
            region: region.to_string(),
            frame_width: frame.width(),
            frame_height: frame.height(),
        }.into());
    }
    Ok(())
}
