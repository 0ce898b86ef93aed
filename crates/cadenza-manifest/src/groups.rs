use std::collections::BTreeMap;

use crate::{EntryKey, ManifestError, ManifestResult, MediaEntry, MediaPlaylist};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Audio,
    Subtitles,
}

/// One alternative inside a media group (`#EXT-X-MEDIA` style).
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAlternative {
    pub name: String,
    pub language: Option<String>,
    pub default: bool,
    pub autoselect: bool,
    /// Own playlist URI. `None` means the track is muxed into the main rendition.
    pub uri: Option<String>,
    pub playlist: Option<MediaPlaylist>,
}

impl MediaAlternative {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: None,
            default: false,
            autoselect: false,
            uri: None,
            playlist: None,
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn with_autoselect(mut self, autoselect: bool) -> Self {
        self.autoselect = autoselect;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_playlist(mut self, playlist: MediaPlaylist) -> Self {
        self.playlist = Some(playlist);
        self
    }

    /// Demuxed alternatives carry their own playlist and need their own loader.
    #[must_use]
    pub fn is_demuxed(&self) -> bool {
        self.uri.is_some()
    }

    /// Loader snapshot; `None` for muxed alternatives.
    #[must_use]
    pub fn entry(&self, kind: GroupKind, group: &str) -> Option<MediaEntry> {
        let uri = self.uri.clone()?;
        Some(MediaEntry {
            key: EntryKey::Alternate {
                kind,
                group: group.to_string(),
                name: self.name.clone(),
            },
            uri,
            playlist: self.playlist.clone(),
        })
    }
}

/// Named alternate audio and subtitle groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaGroups {
    pub audio: BTreeMap<String, Vec<MediaAlternative>>,
    pub subtitles: BTreeMap<String, Vec<MediaAlternative>>,
}

impl MediaGroups {
    #[must_use]
    pub fn insert(mut self, kind: GroupKind, group: impl Into<String>, alt: MediaAlternative) -> Self {
        self.groups_mut(kind).entry(group.into()).or_default().push(alt);
        self
    }

    #[must_use]
    pub fn group(&self, kind: GroupKind, group: &str) -> Option<&[MediaAlternative]> {
        self.groups(kind).get(group).map(Vec::as_slice)
    }

    #[must_use]
    pub fn alternative(&self, kind: GroupKind, group: &str, name: &str) -> Option<&MediaAlternative> {
        self.group(kind, group)?.iter().find(|alt| alt.name == name)
    }

    /// The group's `DEFAULT=YES` alternative, else its first one.
    #[must_use]
    pub fn default_alternative(&self, kind: GroupKind, group: &str) -> Option<&MediaAlternative> {
        let alts = self.group(kind, group)?;
        alts.iter().find(|alt| alt.default).or_else(|| alts.first())
    }

    /// Store a freshly loaded playlist on one alternative.
    pub fn set_playlist(
        &mut self,
        kind: GroupKind,
        group: &str,
        name: &str,
        playlist: MediaPlaylist,
    ) -> ManifestResult<()> {
        let alt = self
            .groups_mut(kind)
            .get_mut(group)
            .and_then(|alts| alts.iter_mut().find(|alt| alt.name == name))
            .ok_or_else(|| ManifestError::UnknownAlternative {
                kind,
                group: group.to_string(),
                name: name.to_string(),
            })?;
        alt.playlist = Some(playlist);
        Ok(())
    }

    /// Move loaded playlists out of `previous` onto alternatives of the same
    /// group and URI that have none yet.
    pub(crate) fn carry_playlists(&mut self, previous: &mut Self) {
        for kind in [GroupKind::Audio, GroupKind::Subtitles] {
            for (group, alts) in self.groups_mut(kind).iter_mut() {
                let Some(old_alts) = previous.groups_mut(kind).get_mut(group) else {
                    continue;
                };
                for alt in alts.iter_mut().filter(|alt| alt.playlist.is_none()) {
                    let Some(uri) = alt.uri.as_deref() else {
                        continue;
                    };
                    if let Some(old) = old_alts.iter_mut().find(|old| old.uri.as_deref() == Some(uri)) {
                        alt.playlist = old.playlist.take();
                    }
                }
            }
        }
    }

    fn groups(&self, kind: GroupKind) -> &BTreeMap<String, Vec<MediaAlternative>> {
        match kind {
            GroupKind::Audio => &self.audio,
            GroupKind::Subtitles => &self.subtitles,
        }
    }

    fn groups_mut(&mut self, kind: GroupKind) -> &mut BTreeMap<String, Vec<MediaAlternative>> {
        match kind {
            GroupKind::Audio => &mut self.audio,
            GroupKind::Subtitles => &mut self.subtitles,
        }
    }
}
