use thiserror::Error;

/// Main error type for the region-fx library
#[derive(Error, Debug)]
pub enum RegionFxError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors from probing, decoding and encoding video
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to load video file: {path}")]
    LoadFailed { path: String },

    #[error("FFmpeg tool not available: {tool}")]
    ToolMissing { tool: String },

    #[error("Could not read a frame at {seconds:.3}s")]
    FrameUnavailable { seconds: f64 },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Errors from the region selection and the user-entered window
#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("No rectangle drawn")]
    NoSelection,

    #[error("Selected region is empty ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    #[error("Region {region} does not fit inside a {frame_width}x{frame_height} frame")]
    OutOfBounds {
        region: String,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("Invalid duration: {input:?}")]
    InvalidDuration { input: String },

    #[error("Invalid start time: {input:?}")]
    InvalidStartTime { input: String },

    #[error("Duration of {seconds}s covers no frames at {fps:.3} fps")]
    EmptyWindow { seconds: f64, fps: f64 },

    #[error("Invalid rectangle: {input:?} (expected X0,Y0,X1,Y1)")]
    InvalidRectangle { input: String },
}

/// Errors from running a save
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("A save is already in progress")]
    AlreadyRunning,

    #[error("Save cancelled after {frames_written} frames")]
    Cancelled { frames_written: u64 },

    #[error("No frames could be read from {seconds:.3}s onwards")]
    NoFrames { seconds: f64 },

    #[error("Save worker failed: {reason}")]
    WorkerFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using RegionFxError
pub type Result<T> = std::result::Result<T, RegionFxError>;

impl RegionFxError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check whether the interactive session stays usable after this error
    ///
    /// Validation and save failures only abort the current operation. Broken
    /// sources, missing tools and bad configuration end the process.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Selection(_) => true,
            Self::Save(_) => true,
            Self::Video(VideoError::FrameUnavailable { .. }) => true,
            Self::Video(VideoError::EncodingFailed { .. }) => true,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::LoadFailed { path }) => {
                format!("Could not load video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::ToolMissing { tool }) => {
                format!("'{}' was not found. Please install FFmpeg or point [tools] in the config at it.", tool)
            }
            Self::Selection(SelectionError::NoSelection) => {
                "Error: No rectangle drawn. Drag over the frame to select a region.".to_string()
            }
            Self::Selection(SelectionError::InvalidDuration { .. }) => {
                "Error: Invalid duration. Enter a positive number of seconds.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
