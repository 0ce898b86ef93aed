use cadenza_manifest::{GroupKind, Manifest, MediaAlternative, MediaEntry, Rendition};

/// Alternative chosen for one media group.
#[derive(Clone, Debug, PartialEq)]
pub struct AlternateChoice {
    pub kind: GroupKind,
    pub group: String,
    pub name: String,
    /// Loader entry; `None` when the alternative is muxed into the main stream.
    pub entry: Option<MediaEntry>,
}

impl AlternateChoice {
    fn new(kind: GroupKind, group: &str, alt: &MediaAlternative) -> Self {
        Self {
            kind,
            group: group.to_string(),
            name: alt.name.clone(),
            entry: alt.entry(kind, group),
        }
    }

    /// Needs a loader of its own.
    #[must_use]
    pub fn is_demuxed(&self) -> bool {
        self.entry.is_some()
    }
}

/// Picks alternate audio and subtitle tracks for a rendition.
pub trait MediaGroupCoordinator: Send {
    fn audio(&self, manifest: &Manifest, rendition: &Rendition) -> Option<AlternateChoice>;

    fn subtitles(&self, manifest: &Manifest, rendition: &Rendition) -> Option<AlternateChoice>;

    /// Replacement for a failed audio alternative, `None` when the failed one
    /// is already the group default.
    fn fallback_audio(
        &self,
        manifest: &Manifest,
        failed: &AlternateChoice,
    ) -> Option<AlternateChoice>;
}

/// Default alternative (else the first) for audio; subtitles only when an
/// alternative is both default and autoselect.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultMediaGroups;

impl MediaGroupCoordinator for DefaultMediaGroups {
    fn audio(&self, manifest: &Manifest, rendition: &Rendition) -> Option<AlternateChoice> {
        let group = rendition.audio_group.as_deref()?;
        let alt = manifest
            .media_groups
            .default_alternative(GroupKind::Audio, group)?;
        Some(AlternateChoice::new(GroupKind::Audio, group, alt))
    }

    fn subtitles(&self, manifest: &Manifest, rendition: &Rendition) -> Option<AlternateChoice> {
        let group = rendition.subtitle_group.as_deref()?;
        let alt = manifest
            .media_groups
            .group(GroupKind::Subtitles, group)?
            .iter()
            .find(|alt| alt.default && alt.autoselect)?;
        Some(AlternateChoice::new(GroupKind::Subtitles, group, alt))
    }

    fn fallback_audio(
        &self,
        manifest: &Manifest,
        failed: &AlternateChoice,
    ) -> Option<AlternateChoice> {
        let alt = manifest
            .media_groups
            .default_alternative(GroupKind::Audio, &failed.group)?;
        (alt.name != failed.name).then(|| AlternateChoice::new(GroupKind::Audio, &failed.group, alt))
    }
}

#[cfg(test)]
mod tests {
    use cadenza_manifest::{MediaGroups, RenditionId};

    use super::*;

    fn manifest() -> Manifest {
        Manifest::new(vec![
            Rendition::new(RenditionId(0), "v.m3u8")
                .with_audio_group("aac".to_string())
                .with_subtitle_group("subs".to_string()),
        ])
        .with_media_groups(
            MediaGroups::default()
                .insert(
                    GroupKind::Audio,
                    "aac",
                    MediaAlternative::new("en")
                        .with_default(true)
                        .with_uri("audio/en.m3u8"),
                )
                .insert(
                    GroupKind::Audio,
                    "aac",
                    MediaAlternative::new("fr").with_uri("audio/fr.m3u8"),
                )
                .insert(
                    GroupKind::Subtitles,
                    "subs",
                    MediaAlternative::new("en-cc").with_uri("subs/en.m3u8"),
                ),
        )
    }

    #[test]
    fn picks_default_audio() {
        let m = manifest();
        let choice = DefaultMediaGroups.audio(&m, &m.renditions()[0]).unwrap();
        assert_eq!(choice.name, "en");
        assert!(choice.is_demuxed());
        assert_eq!(choice.entry.unwrap().uri, "audio/en.m3u8");
    }

    #[test]
    fn subtitles_need_default_and_autoselect() {
        let m = manifest();
        assert!(DefaultMediaGroups.subtitles(&m, &m.renditions()[0]).is_none());
    }

    #[test]
    fn fallback_goes_to_default_once() {
        let m = manifest();
        let fr = AlternateChoice::new(
            GroupKind::Audio,
            "aac",
            m.media_groups.alternative(GroupKind::Audio, "aac", "fr").unwrap(),
        );
        let fallback = DefaultMediaGroups.fallback_audio(&m, &fr).unwrap();
        assert_eq!(fallback.name, "en");
        assert!(DefaultMediaGroups.fallback_audio(&m, &fallback).is_none());
    }
}
