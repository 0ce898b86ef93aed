//! Interfaces of the collaborators the orchestrator drives.
//!
//! Collaborators receive commands through these traits and report back by
//! posting [`Inbound`](crate::Inbound) events to the orchestrator's inbox.

use std::time::Duration;

use cadenza_manifest::{MediaEntry, Rendition, TimeRange};
#[cfg(any(test, feature = "test-utils"))]
use unimock::unimock;

use crate::{EndOfStreamError, LoaderStats, SinkError, SourceLayout};

/// Options a track loader applies to its segment requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// `None` means requests never time out.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Timeout in milliseconds, `0` when requests never time out.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout
            .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Track types found in the first segment a loader appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartingMedia {
    pub contains_audio: bool,
    pub contains_video: bool,
}

/// Host preload hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preload {
    None,
    Metadata,
    #[default]
    Auto,
}

/// Holds the manifest tree upstream and performs directed refreshes.
///
/// Parsed manifests and media playlists come back as
/// [`DirectoryEvent`](crate::DirectoryEvent)s.
pub trait ManifestDirectory: Send {
    /// Fetch, or refetch, the manifest.
    fn load(&mut self);

    /// Switch to `rendition` and start refreshing its media playlist.
    fn select_media(&mut self, rendition: &Rendition);

    fn dispose(&mut self);
}

/// One independently controllable fetch pipeline.
///
/// Every command is legal in every state; `abort` and `pause` are idempotent.
pub trait TrackLoader: Send {
    /// Bind the loader to a manifest entry.
    fn assign(&mut self, entry: MediaEntry, options: RequestOptions);

    fn load(&mut self);

    /// Stop scheduling new fetches, keeping progress.
    fn pause(&mut self);

    /// Drop any in-flight fetch.
    fn abort(&mut self);

    /// Forget the fetch position so the next fetch re-syncs; keeps buffered data.
    fn reset_loader(&mut self);

    /// Forget the fetch position and discard buffered-ahead content.
    fn reset_everything(&mut self);

    /// Forward buffer, in seconds, the loader should try to keep.
    fn set_goal_buffer_length(&mut self, seconds: f64);

    /// Seconds of media loaded so far.
    fn seconds_loaded(&self) -> f64;

    fn ended(&self) -> bool;

    /// `None` until the first segment has been probed.
    fn starting_media(&self) -> Option<StartingMedia>;

    fn stats(&self) -> LoaderStats;

    fn dispose(&mut self);
}

/// Maps manifest entries onto the presentation timeline.
#[cfg_attr(any(test, feature = "test-utils"), unimock(api = SyncResolverMock))]
pub trait SyncResolver: Send {
    /// Seconds of content that already slid out of `entry`'s window, or
    /// `None` while unknown.
    fn expired_time(&self, entry: &MediaEntry, sink_duration: Option<f64>) -> Option<f64>;
}

/// Owns the append buffers of the host media pipeline.
#[cfg_attr(any(test, feature = "test-utils"), unimock(api = SinkBufferManagerMock))]
pub trait SinkBufferManager: Send {
    /// Create the append buffers for `layout`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the sink rejects the configuration.
    fn create_buffers(&mut self, layout: &SourceLayout) -> Result<(), SinkError>;

    /// Signal the end of the stream, optionally as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the sink cannot accept the signal.
    fn end_of_stream(&mut self, error: Option<EndOfStreamError>) -> Result<(), SinkError>;

    fn set_duration(&mut self, duration: f64);

    fn add_seekable_range(&mut self, range: TimeRange);
}

/// Read access to the host's playback clock plus the few commands the
/// orchestrator issues to it.
pub trait HostClock: Send {
    fn current_time(&self) -> f64;

    /// `f64::INFINITY` for live presentations, `NaN` while unknown.
    fn duration(&self) -> f64;

    fn seeking(&self) -> bool;

    fn paused(&self) -> bool;

    /// Buffered ranges in presentation order.
    fn buffered(&self) -> Vec<TimeRange>;

    fn seekable(&self) -> Option<TimeRange>;

    fn autoplay(&self) -> bool;

    fn play(&mut self);

    fn set_current_time(&mut self, time: f64);

    fn preload(&self) -> Preload;
}

/// Host decode-capability query.
#[cfg_attr(any(test, feature = "test-utils"), unimock(api = CodecSupportMock))]
pub trait CodecSupport: Send {
    /// `mime` looks like `video/mp4; codecs="avc1.4d401f,mp4a.40.2"`.
    fn is_type_supported(&self, mime: &str) -> bool;
}

/// Accept every type.
#[derive(Clone, Copy, Debug, Default)]
pub struct SupportAll;

impl CodecSupport for SupportAll {
    fn is_type_supported(&self, _mime: &str) -> bool {
        true
    }
}
