/// Result alias that carries the custom [`VisualiserError`] type.
pub type Result<T> = std::result::Result<T, VisualiserError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VisualiserError {
    /// A tunable parameter is outside of the range the pipeline accepts.
    /// Raised by validation, before any pass sees the value.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// The left and right channel windows disagree in length.
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelMismatch { left: usize, right: usize },
    /// An interleaved block ends part way through a frame.
    #[error("interleaved block of {samples} samples does not divide into {channels} channels")]
    UnevenBlock { samples: usize, channels: usize },
    /// Free-form failure, e.g. poisoned shared state.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Preset files that fail to (de)serialise.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VisualiserError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<&str> for VisualiserError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VisualiserError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
