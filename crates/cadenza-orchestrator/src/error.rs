/// Failure reported by the sink buffer manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("sink is not open")]
    NotOpen,
    #[error("unsupported buffer configuration: {0}")]
    Unsupported(String),
}

/// Reason passed along with a failing end-of-stream signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStreamError {
    Network,
    Decode,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no rendition is available to act on")]
    NoRenditionContext,

    #[error("orchestrator has been disposed")]
    Disposed,

    #[error("manifest has no renditions")]
    EmptyManifest,
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Result of routing a fault through fault isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    /// The target was excluded and a replacement selected.
    Excluded,
    /// The target was the last viable rendition; the manifest is reloaded.
    RetryingFinal,
    /// No rendition to act on; playback cannot recover.
    Fatal,
}
