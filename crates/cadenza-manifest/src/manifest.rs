use web_time::Instant;

use crate::{
    Exclusion, GroupKind, ManifestError, ManifestResult, MediaGroups, MediaPlaylist, Rendition,
    RenditionId,
};

/// Identity of a manifest entry a track loader can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Rendition(RenditionId),
    Alternate {
        kind: GroupKind,
        group: String,
        name: String,
    },
}

/// Snapshot of one manifest entry handed to a track loader.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEntry {
    pub key: EntryKey,
    pub uri: String,
    pub playlist: Option<MediaPlaylist>,
}

impl MediaEntry {
    #[must_use]
    pub fn rendition_id(&self) -> Option<RenditionId> {
        match self.key {
            EntryKey::Rendition(id) => Some(id),
            EntryKey::Alternate { .. } => None,
        }
    }
}

/// Parsed manifest tree: a rendition arena plus media groups.
///
/// Rendition ids are arena indices and never change for the life of the
/// manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    renditions: Vec<Rendition>,
    pub media_groups: MediaGroups,
}

impl Manifest {
    /// Build a manifest, re-numbering renditions by position.
    #[must_use]
    pub fn new(renditions: Vec<Rendition>) -> Self {
        let renditions = renditions
            .into_iter()
            .enumerate()
            .map(|(index, mut rendition)| {
                rendition.id = RenditionId(index);
                rendition
            })
            .collect();
        Self {
            renditions,
            media_groups: MediaGroups::default(),
        }
    }

    #[must_use]
    pub fn with_media_groups(mut self, media_groups: MediaGroups) -> Self {
        self.media_groups = media_groups;
        self
    }

    #[must_use]
    pub fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    #[must_use]
    pub fn rendition(&self, id: RenditionId) -> Option<&Rendition> {
        self.renditions.get(id.0)
    }

    pub fn rendition_mut(&mut self, id: RenditionId) -> Option<&mut Rendition> {
        self.renditions.get_mut(id.0)
    }

    /// Renditions not excluded at `now`.
    pub fn eligible(&self, now: Instant) -> impl Iterator<Item = &Rendition> {
        self.renditions.iter().filter(move |r| r.is_eligible(now))
    }

    #[must_use]
    pub fn eligible_count(&self, now: Instant) -> usize {
        self.eligible(now).count()
    }

    /// Set the exclusion marker of a rendition.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnknownRendition`] for an id outside the arena.
    pub fn exclude(&mut self, id: RenditionId, exclusion: Exclusion) -> ManifestResult<()> {
        let rendition = self
            .rendition_mut(id)
            .ok_or(ManifestError::UnknownRendition(id))?;
        rendition.exclude_until = Some(exclusion);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ManifestError::UnknownRendition`] for an id outside the arena.
    pub fn clear_exclusion(&mut self, id: RenditionId) -> ManifestResult<()> {
        let rendition = self
            .rendition_mut(id)
            .ok_or(ManifestError::UnknownRendition(id))?;
        rendition.exclude_until = None;
        Ok(())
    }

    /// Attach a freshly loaded media playlist to a rendition.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnknownRendition`] for an id outside the arena.
    pub fn set_playlist(&mut self, id: RenditionId, playlist: MediaPlaylist) -> ManifestResult<()> {
        let rendition = self
            .rendition_mut(id)
            .ok_or(ManifestError::UnknownRendition(id))?;
        rendition.playlist = Some(playlist);
        Ok(())
    }

    /// True when no other eligible rendition advertises a lower bandwidth.
    ///
    /// A single-rendition manifest is always at its lowest. A missing
    /// bandwidth counts as 0 for the others and as the maximum for `id`.
    #[must_use]
    pub fn is_lowest_eligible(&self, id: RenditionId, now: Instant) -> bool {
        if self.renditions.len() == 1 {
            return true;
        }
        let current = self
            .rendition(id)
            .and_then(|r| r.bandwidth)
            .unwrap_or(u64::MAX);
        !self
            .eligible(now)
            .any(|r| r.bandwidth.unwrap_or(0) < current)
    }

    /// Replace this manifest with a refreshed one, carrying exclusion
    /// markers and loaded media playlists over to renditions and
    /// alternatives with the same URI. Values already present on `next` win.
    pub fn merge_refresh(&mut self, next: Self) {
        let mut next = next;
        for rendition in &mut next.renditions {
            let Some(old) = self.renditions.iter_mut().find(|old| old.uri == rendition.uri) else {
                continue;
            };
            if rendition.exclude_until.is_none() {
                rendition.exclude_until = old.exclude_until;
            }
            if rendition.playlist.is_none() {
                rendition.playlist = old.playlist.take();
            }
        }
        next.media_groups.carry_playlists(&mut self.media_groups);
        *self = next;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn ladder() -> Manifest {
        Manifest::new(vec![
            Rendition::new(RenditionId(9), "low.m3u8").with_bandwidth(256_000),
            Rendition::new(RenditionId(9), "mid.m3u8").with_bandwidth(512_000),
            Rendition::new(RenditionId(9), "high.m3u8").with_bandwidth(1_024_000),
        ])
    }

    #[rstest]
    fn ids_follow_arena_positions(ladder: Manifest) {
        let ids: Vec<_> = ladder.renditions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RenditionId(0), RenditionId(1), RenditionId(2)]);
    }

    #[rstest]
    fn exclusion_hides_from_eligible(mut ladder: Manifest) {
        let now = Instant::now();
        ladder
            .exclude(RenditionId(1), Exclusion::Until(now + Duration::from_secs(60)))
            .unwrap();
        let eligible: Vec<_> = ladder.eligible(now).map(|r| r.id).collect();
        assert_eq!(eligible, vec![RenditionId(0), RenditionId(2)]);
        assert_eq!(ladder.eligible_count(now + Duration::from_secs(61)), 3);
    }

    #[rstest]
    fn unknown_rendition_is_an_error(mut ladder: Manifest) {
        assert_eq!(
            ladder.exclude(RenditionId(7), Exclusion::Permanent),
            Err(ManifestError::UnknownRendition(RenditionId(7)))
        );
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    #[case(2, false)]
    fn lowest_eligible(ladder: Manifest, #[case] index: usize, #[case] expected: bool) {
        assert_eq!(
            ladder.is_lowest_eligible(RenditionId(index), Instant::now()),
            expected
        );
    }

    #[rstest]
    fn lowest_eligible_ignores_excluded(mut ladder: Manifest) {
        let now = Instant::now();
        ladder.exclude(RenditionId(0), Exclusion::Permanent).unwrap();
        assert!(ladder.is_lowest_eligible(RenditionId(1), now));
    }

    #[test]
    fn single_rendition_is_always_lowest() {
        let m = Manifest::new(vec![Rendition::new(RenditionId(0), "only.m3u8")]);
        assert!(m.is_lowest_eligible(RenditionId(0), Instant::now()));
    }

    #[rstest]
    fn refresh_keeps_exclusions_by_uri(mut ladder: Manifest) {
        ladder.exclude(RenditionId(2), Exclusion::Permanent).unwrap();
        let refreshed = Manifest::new(vec![
            Rendition::new(RenditionId(0), "high.m3u8").with_bandwidth(1_024_000),
            Rendition::new(RenditionId(0), "low.m3u8").with_bandwidth(256_000),
        ]);
        ladder.merge_refresh(refreshed);

        assert_eq!(ladder.len(), 2);
        assert_eq!(
            ladder.rendition(RenditionId(0)).unwrap().exclude_until,
            Some(Exclusion::Permanent)
        );
        assert_eq!(ladder.rendition(RenditionId(1)).unwrap().exclude_until, None);
    }

    #[rstest]
    fn refresh_keeps_loaded_playlists(mut ladder: Manifest) {
        let playlist = MediaPlaylist::new(Vec::new(), Duration::from_secs(6), false);
        ladder.set_playlist(RenditionId(1), playlist.clone()).unwrap();
        let refreshed = Manifest::new(vec![
            Rendition::new(RenditionId(0), "mid.m3u8").with_bandwidth(512_000),
        ]);
        ladder.merge_refresh(refreshed);
        assert_eq!(ladder.rendition(RenditionId(0)).unwrap().playlist, Some(playlist));
    }
}
