use thiserror::Error;

/// Main error type for the Love Booth library
#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Camera acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Camera/media source acquisition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Camera permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("No compatible camera device: {reason}")]
    NoDevice { reason: String },

    #[error("Capture profile rejected: {profile}")]
    ProfileRejected { profile: String },

    #[error("Camera stream failed: {reason}")]
    StreamFailed { reason: String },
}

/// Snapshot failures raised while the machine is triggering
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No active media stream")]
    NoStream,

    #[error("Frame unavailable: {reason}")]
    FrameUnavailable { reason: String },

    #[error("Photo set is full ({target} photos)")]
    SetFull { target: usize },
}

/// Decorative asset failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset not ready: {key}")]
    NotReady { key: String },

    #[error("Failed to load asset {key}: {reason}")]
    LoadFailed { key: String, reason: String },

    #[error("Failed to decode asset {key}: {reason}")]
    DecodeFailed { key: String, reason: String },
}

/// Strip export failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Exported artifact is incomplete: {size} bytes (minimum {minimum})")]
    Incomplete { size: usize, minimum: usize },

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Nothing to export: the photo set is empty")]
    NothingToExport,
}

/// Delivery failures (save, share, relay)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Relay endpoint returned {status}: {description}")]
    Status { status: u16, description: String },

    #[error("Network failure: {reason}")]
    Network { reason: String },

    #[error("Invalid relay response: {reason}")]
    InvalidResponse { reason: String },

    #[error("No relay endpoint configured")]
    NotConfigured,

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Share hand-off failed: {reason}")]
    ShareFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Unknown catalog entry: {kind} '{id}'")]
    UnknownOption { kind: String, id: String },
}

/// Convenience type alias for Results using BoothError
pub type Result<T> = std::result::Result<T, BoothError>;

impl BoothError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (the user can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Export(ExportError::Incomplete { .. }) => true,
            Self::Transport(TransportError::NotConfigured) => false,
            Self::Transport(_) => true,
            Self::Capture(CaptureError::NoStream) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Acquisition(_) => {
                "Please allow camera access to start the love booth!".to_string()
            }
            Self::Export(ExportError::Incomplete { .. }) => {
                "Image capture failed. Please try again.".to_string()
            }
            Self::Transport(TransportError::Status { description, .. }) => {
                format!("Sync failed: {}", description)
            }
            Self::Transport(TransportError::Network { .. }) => {
                "Sync failed: network unavailable. Please retry.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
