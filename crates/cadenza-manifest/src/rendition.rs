use std::time::Duration;

use derive_setters::Setters;
use web_time::Instant;

use crate::{CodecSet, EntryKey, MediaEntry, MediaPlaylist};

/// Identifies a rendition within a manifest (its arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenditionId(pub usize);

/// Exclusion marker stored on a rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Ineligible while `now < deadline`.
    Until(Instant),
    /// Never eligible again for the life of the manifest.
    Permanent,
}

impl Exclusion {
    #[must_use]
    pub fn is_active(&self, now: Instant) -> bool {
        match self {
            Self::Until(deadline) => now < *deadline,
            Self::Permanent => true,
        }
    }
}

/// How long a fault keeps a rendition out of selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionSpan {
    For(Duration),
    Permanent,
}

impl ExclusionSpan {
    /// Marker for an exclusion starting at `now`.
    #[must_use]
    pub fn starting_at(self, now: Instant) -> Exclusion {
        match self {
            Self::For(duration) => now
                .checked_add(duration)
                .map_or(Exclusion::Permanent, Exclusion::Until),
            Self::Permanent => Exclusion::Permanent,
        }
    }
}

impl From<Duration> for ExclusionSpan {
    fn from(duration: Duration) -> Self {
        Self::For(duration)
    }
}

/// One selectable quality/codec variant of the content.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct Rendition {
    /// Arena index, stable for the manifest's life.
    #[setters(skip)]
    pub id: RenditionId,
    /// URI of the rendition's media playlist.
    #[setters(skip)]
    pub uri: String,
    /// Advertised bandwidth in bits per second.
    pub bandwidth: Option<u64>,
    /// Raw `CODECS` attribute, e.g. `avc1.64001f,mp4a.40.2`.
    pub codecs: Option<String>,
    /// Alternate audio group this rendition refers to.
    pub audio_group: Option<String>,
    /// Subtitle group this rendition refers to.
    pub subtitle_group: Option<String>,
    /// Media playlist, once the directory has loaded it.
    pub playlist: Option<MediaPlaylist>,
    #[setters(skip)]
    pub exclude_until: Option<Exclusion>,
}

impl Rendition {
    pub fn new(id: RenditionId, uri: impl Into<String>) -> Self {
        Self {
            id,
            uri: uri.into(),
            bandwidth: None,
            codecs: None,
            audio_group: None,
            subtitle_group: None,
            playlist: None,
            exclude_until: None,
        }
    }

    #[must_use]
    pub fn is_excluded(&self, now: Instant) -> bool {
        self.exclude_until.is_some_and(|e| e.is_active(now))
    }

    #[must_use]
    pub fn is_eligible(&self, now: Instant) -> bool {
        !self.is_excluded(now)
    }

    #[must_use]
    pub fn codec_set(&self) -> CodecSet {
        CodecSet::from_attribute(self.codecs.as_deref())
    }

    /// Whether the loaded playlist is open-ended. Unknown until loaded.
    #[must_use]
    pub fn is_live(&self) -> Option<bool> {
        self.playlist.as_ref().map(MediaPlaylist::is_live)
    }

    /// Snapshot handed to track loaders.
    #[must_use]
    pub fn entry(&self) -> MediaEntry {
        MediaEntry {
            key: EntryKey::Rendition(self.id),
            uri: self.uri.clone(),
            playlist: self.playlist.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_exclusion_expires() {
        let now = Instant::now();
        let mut r = Rendition::new(RenditionId(0), "low.m3u8");
        r.exclude_until = Some(ExclusionSpan::For(Duration::from_secs(5)).starting_at(now));

        assert!(r.is_excluded(now));
        assert!(r.is_excluded(now + Duration::from_secs(4)));
        assert!(r.is_eligible(now + Duration::from_secs(5)));
    }

    #[test]
    fn permanent_exclusion_never_expires() {
        let now = Instant::now();
        let mut r = Rendition::new(RenditionId(0), "low.m3u8");
        r.exclude_until = Some(Exclusion::Permanent);
        assert!(r.is_excluded(now + Duration::from_secs(86_400 * 365)));
    }

    #[test]
    fn setters_fill_optional_fields() {
        let r = Rendition::new(RenditionId(3), "hi.m3u8")
            .with_bandwidth(4_000_000)
            .with_codecs("avc1.640028,mp4a.40.2".to_string())
            .with_audio_group("aac".to_string());
        assert_eq!(r.bandwidth, Some(4_000_000));
        assert_eq!(r.codec_set().video_family(), Some("avc1"));
        assert_eq!(r.audio_group.as_deref(), Some("aac"));
        assert_eq!(r.entry().key, EntryKey::Rendition(RenditionId(3)));
    }
}
