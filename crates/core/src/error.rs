/// Result alias that carries the custom [`CodeFreqError`] type.
pub type Result<T> = std::result::Result<T, CodeFreqError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CodeFreqError {
    /// Free-form failure with a readable message.
    #[error("{0}")]
    Message(String),
    /// The data feed or the asset set could not be loaded. The animation
    /// stays in the loading phase once this has been reported.
    #[error("failed to load animation content: {0}")]
    LoadFailure(String),
    /// A sprite was requested for a texture the asset store does not know.
    #[error("unknown texture `{0}`")]
    UnknownTexture(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl CodeFreqError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn load<T: Into<String>>(reason: T) -> Self {
        Self::LoadFailure(reason.into())
    }
}

impl From<&str> for CodeFreqError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CodeFreqError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
