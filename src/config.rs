use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for region-fx
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where saves are written
    pub output: OutputConfig,

    /// Encoder settings for both transform modes
    pub encoding: EncodingConfig,

    /// Pixelation settings
    pub mosaic: MosaicConfig,

    /// External FFmpeg executables
    pub tools: ToolsConfig,

    /// Window settings
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.encoding.validate()?;
        self.mosaic.validate()?;
        self.tools.validate()?;
        Ok(())
    }
}

/// Output file settings
///
/// Every save writes to the same path. An existing file there is replaced
/// without asking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output video path, relative to the working directory
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.mov"),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.path".to_string(),
                value: String::new(),
            }.into());
        }
        Ok(())
    }
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// FFmpeg encoder for cropped output
    pub crop_codec: String,

    /// FFmpeg encoder for mosaic output (`mpeg4` writes the mp4v FourCC)
    pub mosaic_codec: String,

    /// Quality setting (1-100, higher is better)
    pub quality: u8,

    /// Output pixel format
    pub pixel_format: String,

    /// Encoder thread count
    pub threads: usize,

    /// Carry the source audio of the window into cropped output
    pub crop_keeps_audio: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            crop_codec: "libx264".to_string(),
            mosaic_codec: "mpeg4".to_string(),
            quality: 85,
            pixel_format: "yuv420p".to_string(),
            threads: num_cpus::get(),
            crop_keeps_audio: true,
        }
    }
}

impl EncodingConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidValue {
                key: "encoding.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "encoding.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        for (key, codec) in [("encoding.crop_codec", &self.crop_codec), ("encoding.mosaic_codec", &self.mosaic_codec)] {
            if codec.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: codec.clone()
                }.into());
            }
        }

        Ok(())
    }
}

/// Pixelation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Number of blocks along each axis of the region
    pub block_size: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self { block_size: 10 }
    }
}

impl MosaicConfig {
    fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "mosaic.block_size".to_string(),
                value: self.block_size.to_string()
            }.into());
        }
        Ok(())
    }
}

/// Paths to the FFmpeg executables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg.trim().is_empty() || self.ffprobe.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools".to_string(),
                value: format!("ffmpeg={:?}, ffprobe={:?}", self.ffmpeg, self.ffprobe)
            }.into());
        }
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_width: f32,
    pub window_height: f32,

    /// Outline width of the selection rectangle in points
    pub selection_stroke: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_width: 1280.0,
            window_height: 800.0,
            selection_stroke: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.path, PathBuf::from("output.mov"));
        assert_eq!(config.mosaic.block_size, 10);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.mosaic.block_size = 16;
        original_config.encoding.crop_codec = "libx265".to_string();

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.mosaic.block_size, 16);
        assert_eq!(loaded_config.encoding.crop_codec, "libx265");
        assert_eq!(loaded_config.output.path, original_config.output.path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[mosaic]\nblock_size = 4\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.mosaic.block_size, 4);
        assert_eq!(config.encoding.quality, 85);
        assert_eq!(config.tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(Config::from_file(dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_invalid_block_size() {
        let mut config = Config::default();
        config.mosaic.block_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_quality() {
        let mut config = Config::default();
        config.encoding.quality = 0;
        assert!(config.validate().is_err());
    }
}
