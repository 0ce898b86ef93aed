use cadenza_manifest::{RenditionId, TimeRange};

use crate::TrackKind;

/// Timeline, loading and terminal notifications.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Metadata for the initial selection is available.
    LoadedMetadata { duration: f64 },
    /// The main loader now fetches from `rendition`.
    MediaChange { rendition: RenditionId },
    Progress { track: TrackKind },
    BandwidthUpdate { bandwidth_bps: u64 },
    SeekableChanged { range: TimeRange },
    DurationChanged { duration: f64 },
    TimestampOffset { track: TrackKind, offset: f64 },
    /// First play started; live streams seek to `seek_to`.
    FirstPlay { seek_to: Option<f64> },
    /// Alternate audio fell back to another alternative of its group.
    AudioFallback {
        group: String,
        from: Option<String>,
        to: String,
    },
    EndOfStream,
    Error { message: String, fatal: bool },
}
