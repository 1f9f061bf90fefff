pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Out-of-range or inconsistent configuration, rejected before any side effect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No codec/container in the preference list is available.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The drawing surface was released or never allocated.
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Stopping an encoder that is already stopped (or whose process is gone).
    #[error("encoder stop failure: {0}")]
    EncoderStopFailure(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn surface_unavailable(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    pub fn encoder_stop(msg: impl Into<String>) -> Self {
        Self::EncoderStopFailure(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error means the drawing surface went away mid-session.
    pub fn is_surface_loss(&self) -> bool {
        matches!(self, Self::SurfaceUnavailable(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
