//! Error types shared across Sharecast crates.

/// Top-level error type for Sharecast operations.
#[derive(Debug, thiserror::Error)]
pub enum SharecastError {
    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Signaling error: {message}")]
    Signaling { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Viewer registry error: {message}")]
    Registry { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SharecastError.
pub type SharecastResult<T> = Result<T, SharecastError>;

impl SharecastError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
        }
    }

    pub fn signaling(msg: impl Into<String>) -> Self {
        Self::Signaling {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry {
            message: msg.into(),
        }
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
