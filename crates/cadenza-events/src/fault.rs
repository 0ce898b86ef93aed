use cadenza_manifest::{ExclusionSpan, RenditionId};

/// Fetch pipeline a loader event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Main,
    Audio,
    Subtitle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// A manifest or media playlist failed to load.
    ManifestLoad,
    /// A segment failed to load after the loader's own retries.
    SegmentLoad,
    /// A live playlist stopped growing while playback caught up with it.
    StalledPlaylist,
    /// A segment download was dropped because bandwidth was insufficient.
    EarlyAbort,
    /// The sink could not be configured for the codec layout.
    SinkConfiguration,
}

impl FaultKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManifestLoad => "manifest load",
            Self::SegmentLoad => "segment load",
            Self::StalledPlaylist => "stalled playlist",
            Self::EarlyAbort => "early abort",
            Self::SinkConfiguration => "sink configuration",
        }
    }
}

/// A failure reported to the orchestrator, ready for fault isolation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct Fault {
    pub kind: FaultKind,
    /// Rendition at fault; the active selection when `None`.
    pub target: Option<RenditionId>,
    pub message: String,
    /// How long the target should stay excluded, if the reporter knows.
    pub exclusion: Option<ExclusionSpan>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            message: message.into(),
            exclusion: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: RenditionId) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_exclusion(mut self, exclusion: impl Into<ExclusionSpan>) -> Self {
        self.exclusion = Some(exclusion.into());
        self
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind == FaultKind::SinkConfiguration
    }
}
