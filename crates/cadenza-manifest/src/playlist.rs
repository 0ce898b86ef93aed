//! Media playlist data and timeline arithmetic.

use std::time::Duration;

use crate::TimeRange;

/// Container format information (best-effort, from segment URIs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// MPEG-2 Transport Stream.
    Ts,
    /// Fragmented MP4 / CMAF.
    Fmp4,
    /// Packed audio (ADTS AAC, MP3, ...).
    PackedAudio,
}

impl ContainerFormat {
    /// Guess a container from a URI's extension, ignoring query and fragment.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
        match ext.as_str() {
            "ts" | "m2ts" | "mts" => Some(Self::Ts),
            "mp4" | "m4s" | "m4a" | "m4v" | "cmfv" | "cmfa" => Some(Self::Fmp4),
            "aac" | "mp3" | "ac3" | "ec3" => Some(Self::PackedAudio),
            _ => None,
        }
    }

    /// MIME type prefix for a buffer of this container.
    #[must_use]
    pub fn mime(self, video: bool) -> &'static str {
        match (self, video) {
            (Self::Ts, true) => "video/mp2t",
            (Self::Ts, false) => "audio/mp2t",
            (Self::Fmp4, true) => "video/mp4",
            (Self::Fmp4, false) => "audio/mp4",
            (Self::PackedAudio, _) => "audio/aac",
        }
    }
}

/// One media segment entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// URL of the segment (absolute or relative to the playlist URI).
    pub uri: String,
    pub duration: Duration,
}

impl Segment {
    pub fn new(uri: impl Into<String>, duration: Duration) -> Self {
        Self {
            uri: uri.into(),
            duration,
        }
    }
}

/// Loaded media playlist for one manifest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    /// Segments in playlist order.
    pub segments: Vec<Segment>,
    /// Target segment duration.
    pub target_duration: Duration,
    /// Whether the playlist is complete (VOD, or live that ended).
    pub end_list: bool,
}

impl MediaPlaylist {
    pub fn new(segments: Vec<Segment>, target_duration: Duration, end_list: bool) -> Self {
        Self {
            segments,
            target_duration,
            end_list,
        }
    }

    /// Open-ended (live) playlists keep growing until `end_list` shows up.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.end_list
    }

    /// Sum of segment durations in seconds.
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.sum_durations(self.segments.len())
    }

    /// Presentation duration: the total for complete playlists,
    /// `f64::INFINITY` while open-ended.
    #[must_use]
    pub fn duration(&self) -> f64 {
        if self.end_list {
            self.total_duration()
        } else {
            f64::INFINITY
        }
    }

    /// Index of the last segment that is at least three target durations
    /// away from the live edge.
    #[must_use]
    pub fn safe_live_index(&self) -> usize {
        let Some(last) = self.segments.last() else {
            return 0;
        };
        let target = self.target_duration.as_secs_f64();
        let last_duration = last.duration.as_secs_f64();
        let mut distance = if last_duration > 0.0 {
            last_duration
        } else {
            target
        };
        let safe_distance = distance + target * 2.0;

        let mut i = self.segments.len() - 1;
        while i > 0 {
            i -= 1;
            distance += self.segments[i].duration.as_secs_f64();
            if distance >= safe_distance {
                return i;
            }
        }
        0
    }

    /// Absolute end of the playlist on the presentation timeline.
    ///
    /// `expired` is the amount of content that already slid out of a live
    /// window. With `safe` set, the last segments near the live edge are
    /// left out (see [`Self::safe_live_index`]).
    #[must_use]
    pub fn playlist_end(&self, expired: f64, safe: bool) -> f64 {
        if self.end_list {
            return self.total_duration();
        }
        let end_index = if safe {
            self.safe_live_index()
        } else {
            self.segments.len()
        };
        expired + self.sum_durations(end_index)
    }

    /// Seekable window given the expired time, `None` when it is empty.
    #[must_use]
    pub fn seekable(&self, expired: f64) -> Option<TimeRange> {
        let start = expired.max(0.0);
        let end = self.playlist_end(expired, true);
        (end >= start && !self.segments.is_empty()).then(|| TimeRange::new(start, end))
    }

    /// Container detected from the first segment URI.
    #[must_use]
    pub fn detect_container(&self) -> Option<ContainerFormat> {
        self.segments
            .first()
            .and_then(|segment| ContainerFormat::from_uri(&segment.uri))
    }

    fn sum_durations(&self, count: usize) -> f64 {
        self.segments
            .iter()
            .take(count)
            .map(|segment| segment.duration.as_secs_f64())
            .sum()
    }
}
