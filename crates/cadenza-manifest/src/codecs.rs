//! Best-effort reading of `CODECS="..."` attribute values.

const VIDEO_FAMILIES: &[&str] = &[
    "avc1", "avc3", "hvc1", "hev1", "dvh1", "dvhe", "vp08", "vp8", "vp09", "vp9", "av01", "mp4v",
];

const AUDIO_FAMILIES: &[&str] = &[
    "mp4a", "ac-3", "ec-3", "opus", "flac", "mp3", "alac", "vorbis",
];

/// Codec layout advertised by a rendition.
///
/// `codec_count` counts the recognised video and audio entries only, so a
/// muxed `avc1,mp4a` stream has a count of 2 and an audio-only stream 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecSet {
    /// Full video codec entry, e.g. `avc1.4d401f`.
    pub video: Option<String>,
    /// Full audio codec entry, e.g. `mp4a.40.2`.
    pub audio: Option<String>,
    pub codec_count: usize,
}

impl CodecSet {
    /// Parse a comma separated codec list.
    #[must_use]
    pub fn parse(codecs: &str) -> Self {
        let mut video = None;
        let mut audio = None;

        for entry in codecs.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let family = family_of(entry).to_ascii_lowercase();
            if video.is_none() && VIDEO_FAMILIES.contains(&family.as_str()) {
                video = Some(entry.to_string());
            } else if audio.is_none() && AUDIO_FAMILIES.contains(&family.as_str()) {
                audio = Some(entry.to_string());
            }
        }

        let codec_count = usize::from(video.is_some()) + usize::from(audio.is_some());
        Self {
            video,
            audio,
            codec_count,
        }
    }

    /// Layout for an optional attribute.
    ///
    /// Renditions without a `CODECS` attribute are assumed to be muxed
    /// audio/video with an unknown video family.
    #[must_use]
    pub fn from_attribute(codecs: Option<&str>) -> Self {
        match codecs {
            Some(codecs) => Self::parse(codecs),
            None => Self {
                video: None,
                audio: None,
                codec_count: 2,
            },
        }
    }

    /// Video codec family (`avc1`, `hvc1`, ...), without profile/level.
    #[must_use]
    pub fn video_family(&self) -> Option<&str> {
        self.video.as_deref().map(family_of)
    }
}

fn family_of(entry: &str) -> &str {
    entry.split('.').next().unwrap_or(entry)
}

/// Rewrite legacy `avc1.<profile>.<level>` entries (decimal) into the
/// `avc1.PPCCLL` hex form decoders understand. Other entries pass through.
#[must_use]
pub fn translate_legacy_avc(codecs: &str) -> String {
    codecs
        .split(',')
        .map(|entry| {
            let trimmed = entry.trim();
            let mut parts = trimmed.split('.');
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(family), Some(profile), Some(level), None)
                    if family.eq_ignore_ascii_case("avc1") =>
                {
                    match (profile.parse::<u8>(), level.parse::<u8>()) {
                        (Ok(profile), Ok(level)) => format!("avc1.{profile:02x}00{level:02x}"),
                        _ => trimmed.to_string(),
                    }
                }
                _ => trimmed.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
