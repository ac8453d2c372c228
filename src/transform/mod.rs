//! # Region Transforms
//!
//! Per-frame operations applied to the selected rectangle across a save.
//!
//! ## Built-in Transforms
//!
//! - **Crop**: output frames are the rectangle only
//! - **Mosaic**: full frames with the rectangle pixelated in place
//!
//! ## Usage
//!
//! ```rust,no_run
//! use region_fx::config::Config;
//! use region_fx::transform::TransformMode;
//!
//! let transform = TransformMode::Mosaic.build(&Config::default());
//! assert_eq!(transform.name(), "mosaic");
//! ```

pub mod traits;
pub mod crop;
pub mod mosaic;

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::Config;

pub use traits::RegionTransform;
pub use crop::CropTransform;
pub use mosaic::MosaicTransform;

/// Which transform a save runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    Crop,
    Mosaic,
}

impl TransformMode {
    pub const ALL: [TransformMode; 2] = [TransformMode::Crop, TransformMode::Mosaic];

    /// Instantiate the transform with its configured parameters
    pub fn build(self, config: &Config) -> Box<dyn RegionTransform> {
        match self {
            TransformMode::Crop => Box::new(CropTransform::new(config.encoding.crop_keeps_audio)),
            TransformMode::Mosaic => Box::new(MosaicTransform::new(config.mosaic.block_size)),
        }
    }

    /// Encoder used for this mode's output
    pub fn codec(self, config: &Config) -> &str {
        match self {
            TransformMode::Crop => &config.encoding.crop_codec,
            TransformMode::Mosaic => &config.encoding.mosaic_codec,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransformMode::Crop => "Crop",
            TransformMode::Mosaic => "Mosaic",
        }
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_uses_config() {
        let mut config = Config::default();
        config.encoding.crop_keeps_audio = false;

        let crop = TransformMode::Crop.build(&config);
        assert_eq!(crop.name(), "crop");
        assert!(!crop.keeps_audio());

        let mosaic = TransformMode::Mosaic.build(&config);
        assert_eq!(mosaic.name(), "mosaic");
        assert!(!mosaic.keeps_audio());
    }

    #[test]
    fn test_codec_per_mode() {
        let config = Config::default();
        assert_eq!(TransformMode::Crop.codec(&config), "libx264");
        assert_eq!(TransformMode::Mosaic.codec(&config), "mpeg4");
    }

    #[test]
    fn test_parse_from_cli_value() {
        assert_eq!(TransformMode::from_str("mosaic", true), Ok(TransformMode::Mosaic));
        assert!(TransformMode::from_str("blur", true).is_err());
    }
}
