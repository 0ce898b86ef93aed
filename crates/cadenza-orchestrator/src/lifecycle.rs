//! Handlers for directory, loader and host events.

use cadenza_events::{Fault, FaultKind, PlaybackEvent, SelectionEvent, SwitchCause, TrackKind};
use cadenza_manifest::{
    Exclusion, ExclusionSpan, GroupKind, Manifest, MediaPlaylist, Rendition, RenditionId,
};
use tracing::{debug, info, trace, warn};
use web_time::Instant;

use crate::{
    DirectoryEvent, HostEvent, LoaderEvent, Orchestrator, PlaylistUpdate, Preload,
    RunState, end_of_stream::is_end_of_stream, groups::AlternateChoice, seekable::reconcile,
    track::Track,
};

const STALLED_MESSAGE: &str = "Playlist no longer updating.";
const EARLY_ABORT_MESSAGE: &str =
    "Aborted early because there isn't enough bandwidth to complete the request without rebuffering.";
const DEFAULT_AUDIO_MESSAGE: &str = "Problem encountered loading the default audio track.";

impl Orchestrator {
    // -- directory ----------------------------------------------------------------

    pub(crate) fn on_directory_event(&mut self, event: DirectoryEvent, now: Instant) {
        match event {
            DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(manifest)) => {
                self.on_master_loaded(manifest, now);
            }
            DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Media {
                rendition,
                playlist,
            }) => self.on_media_refreshed(rendition, playlist),
            DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Alternate {
                kind,
                group,
                name,
                playlist,
            }) => self.on_alternate_refreshed(kind, &group, &name, playlist),
            DirectoryEvent::LoadedMetadata {
                rendition,
                playlist,
            } => self.on_loaded_metadata(rendition, playlist, now),
            DirectoryEvent::MediaChanging { rendition } => {
                debug!(rendition = rendition.0, "media changing, halting main loader");
                self.main.abort();
                self.main.pause();
            }
            DirectoryEvent::MediaChange { rendition } => self.on_media_change(rendition, now),
            DirectoryEvent::PlaylistUnchanged { rendition } => self.check_stalled(rendition, now),
            DirectoryEvent::Error(fault) => {
                self.isolate_fault(fault, None, now);
            }
            DirectoryEvent::RenditionDisabled(rendition) => {
                self.toggle_rendition(rendition, Some(Exclusion::Permanent), now);
            }
            DirectoryEvent::RenditionEnabled(rendition) => {
                self.toggle_rendition(rendition, None, now);
            }
        }
    }

    fn on_master_loaded(&mut self, manifest: Manifest, now: Instant) {
        if manifest.is_empty() {
            self.fail_fatal("manifest has no renditions");
            return;
        }
        let active_uri = self.media().map(|r| r.uri.clone());
        self.manifest.merge_refresh(manifest);
        debug!(renditions = self.manifest.len(), "manifest loaded");
        // Refreshes may introduce URIs neither codec gate has seen.
        if self.unsupported_filtered {
            self.exclude_unsupported_variants();
        }
        self.exclude_incompatible_variants();

        let Some(uri) = active_uri else {
            self.select_initial(now);
            return;
        };
        let still_listed = self
            .manifest
            .renditions()
            .iter()
            .find(|r| r.uri == uri)
            .map(|r| r.id);
        match still_listed {
            Some(id) => self.selection.rendition = Some(id),
            None => {
                warn!(%uri, "active rendition dropped by manifest refresh");
                self.selection.rendition = None;
                self.select_initial(now);
            }
        }
    }

    fn select_initial(&mut self, now: Instant) {
        if !self.unsupported_filtered {
            self.exclude_unsupported_variants();
        }
        match self.select_now(now) {
            Some(id) => self.switch_to(id, SwitchCause::Initial),
            None => {
                let fault = Fault::new(
                    FaultKind::ManifestLoad,
                    "no rendition in the manifest is playable",
                );
                self.isolate_fault(fault, None, now);
            }
        }
    }

    fn on_loaded_metadata(&mut self, rendition: RenditionId, playlist: MediaPlaylist, now: Instant) {
        if let Err(err) = self.manifest.set_playlist(rendition, playlist) {
            warn!(%err, "metadata for unknown rendition");
            return;
        }
        let first = !self.metadata_loaded;
        self.selection.rendition = Some(rendition);
        if !self.unsupported_filtered {
            self.exclude_unsupported_variants();
        }
        self.metadata_loaded = true;
        self.request_options = self.compute_request_options(now);

        let Some(active) = self.media() else {
            return;
        };
        let entry = active.entry();
        let complete = active.is_live() == Some(false);
        self.main.assign(entry, self.request_options);
        if complete && self.clock.preload() != Preload::None {
            self.load_main();
        }

        self.setup_media_groups();
        self.update_duration();
        self.try_commit_layout();
        self.first_play();

        if first {
            let timeout_ms = self.request_options.timeout_ms();
            info!(rendition = rendition.0, timeout_ms, "initial selection ready");
            self.publish(SelectionEvent::InitialSelected {
                rendition,
                timeout_ms,
            });
            self.publish(PlaybackEvent::LoadedMetadata {
                duration: self.duration(),
            });
        }
    }

    fn on_media_refreshed(&mut self, rendition: RenditionId, playlist: MediaPlaylist) {
        if let Err(err) = self.manifest.set_playlist(rendition, playlist) {
            warn!(%err, "refresh for unknown rendition");
            return;
        }
        if self.selection.rendition != Some(rendition) {
            return;
        }
        let Some(active) = self.media() else {
            return;
        };
        let entry = active.entry();
        let live = active.is_live() == Some(true);

        self.main.assign(entry, self.request_options);
        self.update_duration();
        if self.main_is_idle() && !self.clock.paused() {
            self.load_main();
        }
        if live {
            self.register_seekable_when_finite();
        }
    }

    /// Store an alternate's playlist and hand it to the loader if that
    /// alternate is the one bound.
    fn on_alternate_refreshed(
        &mut self,
        kind: GroupKind,
        group: &str,
        name: &str,
        playlist: MediaPlaylist,
    ) {
        if let Err(err) = self
            .manifest
            .media_groups
            .set_playlist(kind, group, name, playlist.clone())
        {
            warn!(%err, "refresh for unknown alternate");
            return;
        }
        let (which, choice) = match kind {
            GroupKind::Audio => (TrackKind::Audio, self.selection.audio.as_mut()),
            GroupKind::Subtitles => (TrackKind::Subtitle, self.selection.subtitles.as_mut()),
        };
        let Some(entry) = choice
            .filter(|c| c.group == group && c.name == name)
            .and_then(|c| c.entry.as_mut())
        else {
            trace!(group, name, "refresh for unbound alternate");
            return;
        };
        entry.playlist = Some(playlist);
        let entry = entry.clone();
        let options = self.request_options;
        let start = self.has_played;
        let track = self.track_mut(which);
        let idle = track.binding.state == RunState::Idle;
        track.assign(entry, options);
        if start && idle {
            track.load();
        }
    }

    fn on_media_change(&mut self, rendition: RenditionId, now: Instant) {
        self.selection.rendition = Some(rendition);
        self.request_options = self.compute_request_options(now);
        let Some(entry) = self.media().map(Rendition::entry) else {
            warn!(rendition = rendition.0, "media change to unknown rendition");
            return;
        };
        self.main.assign(entry, self.request_options);
        self.load_main();
        self.setup_media_groups();
        self.publish(PlaybackEvent::MediaChange { rendition });
    }

    /// A refresh changed nothing: if playback already caught up with the
    /// playlist end, the playlist is stalled.
    fn check_stalled(&mut self, rendition: RenditionId, now: Instant) {
        if self.selection.rendition != Some(rendition) {
            return;
        }
        let Some(active) = self.media() else {
            return;
        };
        let Some(playlist) = active.playlist.as_ref() else {
            return;
        };
        let Some(expired) = self.sync.expired_time(&active.entry(), self.sink_duration) else {
            return;
        };
        let absolute_end = playlist.playlist_end(expired, false);
        let t = self.clock.current_time();
        let eps = self.config.stall_epsilon;
        let stalled = match self.clock.buffered().last() {
            None => absolute_end - t <= eps,
            Some(range) => range.end - t <= eps && absolute_end - range.end <= eps,
        };
        if !stalled {
            return;
        }
        warn!(rendition = rendition.0, absolute_end, current_time = t, "playlist stalled");
        let fault = Fault::new(FaultKind::StalledPlaylist, STALLED_MESSAGE).with_target(rendition);
        self.isolate_fault(fault, None, now);
        self.publish(SelectionEvent::Stuck { rendition });
    }

    fn toggle_rendition(&mut self, rendition: RenditionId, exclusion: Option<Exclusion>, now: Instant) {
        let applied = match exclusion {
            Some(exclusion) => self.manifest.exclude(rendition, exclusion),
            None => self.manifest.clear_exclusion(rendition),
        };
        if let Err(err) = applied {
            warn!(%err, "rendition toggle ignored");
            return;
        }
        debug!(rendition = rendition.0, enabled = exclusion.is_none(), "rendition toggled");
        if exclusion.is_some() {
            self.publish(SelectionEvent::Disabled { rendition });
        } else {
            self.publish(SelectionEvent::Enabled { rendition });
        }
        if self.metadata_loaded
            && let Err(err) = self.fast_quality_change(now)
        {
            warn!(%err, "reselection after rendition toggle failed");
        }
    }

    // -- loaders ------------------------------------------------------------------

    pub(crate) fn on_loader_event(&mut self, track: TrackKind, event: LoaderEvent, now: Instant) {
        match (track, event) {
            (TrackKind::Main, LoaderEvent::BandwidthUpdate { bandwidth_bps }) => {
                self.on_bandwidth_update(bandwidth_bps, now);
            }
            (TrackKind::Main, LoaderEvent::Progress) => {
                let goal = self.goal_buffer_length();
                self.main.loader.set_goal_buffer_length(goal);
                self.publish(PlaybackEvent::Progress { track });
            }
            (_, LoaderEvent::Progress) => self.publish(PlaybackEvent::Progress { track }),
            (TrackKind::Main, LoaderEvent::Error(fault)) => {
                self.isolate_fault(fault, None, now);
            }
            (TrackKind::Audio, LoaderEvent::Error(fault)) => self.on_audio_error(fault, now),
            (TrackKind::Subtitle, LoaderEvent::Error(fault)) => {
                warn!(%fault, "subtitle track failed, disabling it");
                self.subtitle.unbind();
                self.selection.subtitles = None;
            }
            (TrackKind::Main | TrackKind::Audio, LoaderEvent::SyncInfoUpdate) => {
                self.on_sync_info_update();
            }
            (_, LoaderEvent::TimestampOffset { offset }) => {
                self.publish(PlaybackEvent::TimestampOffset { track, offset });
            }
            (TrackKind::Main | TrackKind::Audio, LoaderEvent::Ended) => self.on_track_ended(track),
            (TrackKind::Main, LoaderEvent::EarlyAbort) => {
                let fault = Fault::new(FaultKind::EarlyAbort, EARLY_ABORT_MESSAGE);
                let span = ExclusionSpan::For(self.config.early_abort_exclusion);
                self.isolate_fault(fault, Some(span), now);
            }
            (track, event) => trace!(?track, ?event, "loader event ignored"),
        }
    }

    fn on_audio_error(&mut self, fault: Fault, now: Instant) {
        warn!(%fault, "alternate audio failed");
        self.audio.abort();
        self.audio.pause();
        let Some(failed) = self.selection.audio.clone() else {
            return;
        };
        match self.media_groups.fallback_audio(&self.manifest, &failed) {
            Some(next) => {
                debug!(from = %failed.name, to = %next.name, "falling back to default audio");
                self.publish(PlaybackEvent::AudioFallback {
                    group: next.group.clone(),
                    from: Some(failed.name),
                    to: next.name.clone(),
                });
                self.bind_alternate(TrackKind::Audio, Some(next));
            }
            None => {
                let fault = Fault::new(fault.kind, DEFAULT_AUDIO_MESSAGE)
                    .with_exclusion(ExclusionSpan::Permanent);
                self.isolate_fault(fault, None, now);
            }
        }
    }

    fn on_sync_info_update(&mut self) {
        let Some(main) = self.media() else {
            return;
        };
        let Some(playlist) = main.playlist.as_ref() else {
            return;
        };
        let Some(expired) = self.sync.expired_time(&main.entry(), self.sink_duration) else {
            trace!("main expired time unknown");
            return;
        };
        let Some(main_range) = playlist.seekable(expired) else {
            return;
        };

        let audio_range = match self.selection.audio.as_ref().and_then(|c| c.entry.as_ref()) {
            Some(entry) => {
                let Some(playlist) = entry.playlist.as_ref() else {
                    return;
                };
                let Some(expired) = self.sync.expired_time(entry, self.sink_duration) else {
                    trace!("audio expired time unknown");
                    return;
                };
                let Some(range) = playlist.seekable(expired) else {
                    return;
                };
                Some(range)
            }
            None => None,
        };

        let range = reconcile(main_range, audio_range);
        debug!(start = range.start, end = range.end, "seekable updated");
        self.seekable = Some(range);
        self.publish(PlaybackEvent::SeekableChanged { range });
        self.first_play();
    }

    fn on_track_ended(&mut self, track: TrackKind) {
        match track {
            TrackKind::Main => self.main.ended(),
            TrackKind::Audio => self.audio.ended(),
            TrackKind::Subtitle => return,
        }
        let main_ended = track == TrackKind::Main || self.main.loader.ended();
        let alternate_audio_ended = self
            .audio
            .is_bound()
            .then(|| track == TrackKind::Audio || self.audio.loader.ended());
        let main_media = self.main.loader.starting_media();
        if self.end_of_stream_signaled
            || !is_end_of_stream(main_ended, alternate_audio_ended, main_media)
        {
            return;
        }
        self.end_of_stream_signaled = true;
        match self.sink.end_of_stream(None) {
            Ok(()) => {
                debug!("end of stream signalled");
                self.publish(PlaybackEvent::EndOfStream);
            }
            Err(err) => {
                warn!(%err, "sink rejected end of stream");
                self.publish(PlaybackEvent::Error {
                    message: err.to_string(),
                    fatal: false,
                });
            }
        }
    }

    // -- host ---------------------------------------------------------------------

    pub(crate) fn on_host_event(&mut self, event: HostEvent, _now: Instant) {
        match event {
            HostEvent::DurationChange => {
                if self.seekable_registration_armed {
                    self.register_seekable_when_finite();
                }
            }
            HostEvent::SinkOpen => {
                self.sink_open = true;
                self.try_commit_layout();
                if self.clock.autoplay() {
                    self.clock.play();
                }
            }
        }
    }

    // -- helpers ------------------------------------------------------------------

    /// Register the seekable window with the sink once the host reports a
    /// finite duration; until then stay armed for the next duration change.
    fn register_seekable_when_finite(&mut self) {
        match self.seekable {
            Some(range) if self.clock.duration().is_finite() => {
                debug!(start = range.start, end = range.end, "registering seekable range");
                self.sink.add_seekable_range(range);
                self.seekable_registration_armed = false;
            }
            _ => self.seekable_registration_armed = true,
        }
    }

    /// `max(playlist duration, buffered end)`, pushed to the sink on change.
    pub(crate) fn update_duration(&mut self) {
        let Some(playlist) = self.media().and_then(|r| r.playlist.as_ref()) else {
            return;
        };
        let mut duration = playlist.duration();
        if let Some(range) = self.clock.buffered().last() {
            duration = duration.max(range.end);
        }
        if self.sink_duration == Some(duration) {
            return;
        }
        debug!(duration, "duration updated");
        self.sink.set_duration(duration);
        self.sink_duration = Some(duration);
        self.publish(PlaybackEvent::DurationChanged { duration });
    }

    /// Bind alternate audio and subtitles for the active rendition.
    fn setup_media_groups(&mut self) {
        let Some(rendition) = self.media() else {
            return;
        };
        let audio = self.media_groups.audio(&self.manifest, rendition);
        let subtitles = self.media_groups.subtitles(&self.manifest, rendition);
        self.bind_alternate(TrackKind::Audio, audio);
        self.bind_alternate(TrackKind::Subtitle, subtitles);
    }

    fn bind_alternate(&mut self, kind: TrackKind, choice: Option<AlternateChoice>) {
        let current = match kind {
            TrackKind::Audio => &self.selection.audio,
            TrackKind::Subtitle => &self.selection.subtitles,
            TrackKind::Main => return,
        };
        if *current == choice {
            return;
        }
        let options = self.request_options;
        let start = self.has_played;
        let track = self.track_mut(kind);
        track.unbind();
        if let Some(entry) = choice.as_ref().and_then(|c| c.entry.clone()) {
            track.assign(entry, options);
            if start {
                track.load();
            }
        }
        debug!(
            ?kind,
            name = choice.as_ref().map(|c| c.name.as_str()),
            demuxed = choice.as_ref().is_some_and(AlternateChoice::is_demuxed),
            "alternate bound"
        );
        match kind {
            TrackKind::Audio => self.selection.audio = choice,
            TrackKind::Subtitle => self.selection.subtitles = choice,
            TrackKind::Main => {}
        }
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut Track {
        match kind {
            TrackKind::Main => &mut self.main,
            TrackKind::Audio => &mut self.audio,
            TrackKind::Subtitle => &mut self.subtitle,
        }
    }
}
