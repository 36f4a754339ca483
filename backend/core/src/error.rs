use thiserror::Error;

/// Error taxonomy shared by every flatframe component.
///
/// All variants except `Config` are caught by the studio and turned into the
/// message of a `Failed` state.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("frame extraction failed: {0}")]
    Decode(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation result invalid: {0}")]
    Integrity(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    /// Wrap an extraction failure, keeping the full context chain.
    pub fn decode(err: anyhow::Error) -> Self {
        Self::Decode(format!("{err:#}"))
    }

    /// Wrap a submission, polling, or download failure.
    pub fn generation(err: anyhow::Error) -> Self {
        Self::Generation(format!("{err:#}"))
    }

    /// True for failures that should abort startup instead of landing in `Failed`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn generation_keeps_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = inner.context("status request failed").unwrap_err();
        let wrapped = StudioError::generation(err);
        let text = wrapped.to_string();
        assert!(text.starts_with("generation failed: "));
        assert!(text.contains("status request failed"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn only_config_is_fatal() {
        assert!(StudioError::Config("missing key".into()).is_fatal());
        assert!(!StudioError::Decode("bad file".into()).is_fatal());
        assert!(!StudioError::Integrity("no uri".into()).is_fatal());
    }
}
