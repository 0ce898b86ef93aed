//! Sink buffer layout derived from a rendition's codecs and media groups.

use std::fmt;

use cadenza_manifest::{CodecSet, ContainerFormat, GroupKind, Manifest, Rendition, RenditionId};

/// Video codec assumed when a rendition advertises no `CODECS`.
pub const DEFAULT_VIDEO_CODEC: &str = "avc1.4d400d";
/// Audio codec assumed when none can be derived.
pub const DEFAULT_AUDIO_CODEC: &str = "mp4a.40.2";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferMedia {
    Video,
    Audio,
}

/// Configuration of one append buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    pub media: BufferMedia,
    pub container: ContainerFormat,
    pub codecs: Vec<String>,
}

impl BufferConfig {
    /// More than one codec carried by one buffer.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.codecs.len() > 1
    }

    /// e.g. `video/mp2t; codecs="avc1.4d400d, mp4a.40.2"`.
    #[must_use]
    pub fn mime_type(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BufferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mime = self.container.mime(self.media == BufferMedia::Video);
        write!(f, "{mime}; codecs=\"{}\"", self.codecs.join(", "))
    }
}

/// How the sink's buffers get created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLayout {
    /// Separate audio and video buffers, created right away.
    EagerDemuxed {
        audio: BufferConfig,
        video: BufferConfig,
    },
    /// Buffers are created once the loaders have sniffed the container.
    DeferredUntilContainerSniff { configs: Vec<BufferConfig> },
}

impl SourceLayout {
    /// Commit to a layout, or `None` when there is nothing to configure.
    #[must_use]
    pub fn from_configs(mut configs: Vec<BufferConfig>) -> Option<Self> {
        if configs.is_empty() {
            return None;
        }
        if configs.len() == 2
            && !configs[0].is_joined()
            && !configs[1].is_joined()
            && configs[0] != configs[1]
        {
            let audio = configs.pop()?;
            let video = configs.pop()?;
            return Some(Self::EagerDemuxed { audio, video });
        }
        Some(Self::DeferredUntilContainerSniff { configs })
    }
}

/// Buffer configurations for playing `rendition`.
///
/// The first entry feeds the main loader, the second (if any) the
/// alternate-audio loader. Empty when no codec can be derived at all.
#[must_use]
pub fn buffer_configs(manifest: &Manifest, rendition: &Rendition) -> Vec<BufferConfig> {
    let container = rendition
        .playlist
        .as_ref()
        .and_then(|p| p.detect_container())
        .unwrap_or(ContainerFormat::Ts);

    let (video, mut audio) = match rendition.codecs.as_deref() {
        Some(codecs) => {
            let set = CodecSet::parse(codecs);
            (set.video, set.audio)
        }
        None => (
            Some(DEFAULT_VIDEO_CODEC.to_string()),
            Some(DEFAULT_AUDIO_CODEC.to_string()),
        ),
    };

    // Alternate audio: demuxed unless some alternative lives in the main stream.
    let group = rendition
        .audio_group
        .as_deref()
        .and_then(|name| manifest.media_groups.group(GroupKind::Audio, name));
    let alternate_audio = group.is_some();
    let muxed = group.is_none_or(|alts| alts.iter().any(|alt| !alt.is_demuxed()));

    if alternate_audio && audio.is_none() {
        tracing::warn!(
            uri = %rendition.uri,
            codec = DEFAULT_AUDIO_CODEC,
            "alternate audio without an audio codec, assuming default"
        );
        audio = Some(DEFAULT_AUDIO_CODEC.to_string());
    }

    if video.is_none() && audio.is_none() {
        return Vec::new();
    }

    let config = |media, codecs: Vec<&Option<String>>| BufferConfig {
        media,
        container,
        codecs: codecs.into_iter().flatten().cloned().collect(),
    };
    let just_audio = config(BufferMedia::Audio, vec![&audio]);

    match (alternate_audio, muxed, video.is_some()) {
        (true, false, true) => vec![config(BufferMedia::Video, vec![&video]), just_audio],
        (true, false, false) => vec![just_audio.clone(), just_audio],
        (true, true, _) => vec![config(BufferMedia::Video, vec![&video, &audio]), just_audio],
        (false, _, false) => vec![just_audio],
        (false, _, true) => vec![config(BufferMedia::Video, vec![&video, &audio])],
    }
}

/// Renditions whose codec layout cannot share buffers with `layout`.
#[must_use]
pub fn incompatible_renditions(manifest: &Manifest, layout: &CodecSet) -> Vec<RenditionId> {
    manifest
        .renditions()
        .iter()
        .filter(|r| {
            let other = r.codec_set();
            other.codec_count != layout.codec_count || other.video_family() != layout.video_family()
        })
        .map(|r| r.id)
        .collect()
}
