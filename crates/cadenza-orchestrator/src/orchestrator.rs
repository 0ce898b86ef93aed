use cadenza_abr::{BandwidthSelector, SelectionStrategy};
use cadenza_events::{Event, EventBus, PlaybackEvent, SelectionEvent, SwitchCause, TrackKind};
use cadenza_manifest::{CodecSet, Manifest, Rendition, RenditionId, TimeRange};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};
use web_time::Instant;

use crate::{
    CodecSupport, HostClock, Inbound, InboxSender, LoaderStats, ManifestDirectory,
    MediaGroupCoordinator, OrchestratorConfig, OrchestratorError, OrchestratorResult,
    RequestOptions, SinkBufferManager, SourceLayout, SyncResolver, TrackLoader,
    groups::{AlternateChoice, DefaultMediaGroups},
    inbox::Inbox,
    track::{LoaderBinding, RunState, Track},
};

/// Everything the orchestrator talks to.
pub struct Collaborators {
    pub directory: Box<dyn ManifestDirectory>,
    pub main_loader: Box<dyn TrackLoader>,
    pub audio_loader: Box<dyn TrackLoader>,
    pub subtitle_loader: Box<dyn TrackLoader>,
    pub sync: Box<dyn SyncResolver>,
    pub sink: Box<dyn SinkBufferManager>,
    pub clock: Box<dyn HostClock>,
    pub codecs: Box<dyn CodecSupport>,
}

/// Currently chosen rendition and alternates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveSelection {
    pub rendition: Option<RenditionId>,
    pub audio: Option<AlternateChoice>,
    pub subtitles: Option<AlternateChoice>,
}

/// Event-driven coordinator between the manifest directory, the track
/// loaders and the host media pipeline.
///
/// All state changes happen inside [`dispatch`](Self::dispatch) /
/// [`pump`](Self::pump) or the host API methods; collaborators only report
/// back through the [`InboxSender`] from [`inbox`](Self::inbox).
pub struct Orchestrator {
    pub(crate) config: OrchestratorConfig,
    pub(crate) bus: EventBus,
    inbox: Inbox,

    pub(crate) directory: Box<dyn ManifestDirectory>,
    pub(crate) main: Track,
    pub(crate) audio: Track,
    pub(crate) subtitle: Track,
    pub(crate) sync: Box<dyn SyncResolver>,
    pub(crate) sink: Box<dyn SinkBufferManager>,
    pub(crate) clock: Box<dyn HostClock>,
    pub(crate) codecs: Box<dyn CodecSupport>,
    pub(crate) media_groups: Box<dyn MediaGroupCoordinator>,
    pub(crate) strategy: Box<dyn SelectionStrategy>,

    pub(crate) manifest: Manifest,
    pub(crate) selection: ActiveSelection,
    pub(crate) bandwidth_bps: Option<u64>,
    pub(crate) request_options: RequestOptions,
    pub(crate) seekable: Option<TimeRange>,
    pub(crate) sink_duration: Option<f64>,
    pub(crate) layout: Option<SourceLayout>,
    /// Codec layout of the rendition the sink layout was committed for.
    pub(crate) committed_codecs: Option<CodecSet>,

    pub(crate) metadata_loaded: bool,
    pub(crate) unsupported_filtered: bool,
    pub(crate) sink_open: bool,
    pub(crate) seekable_registration_armed: bool,
    pub(crate) has_played: bool,
    pub(crate) end_of_stream_signaled: bool,
    directory_started: bool,
    disposed: bool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: OrchestratorConfig, collaborators: Collaborators) -> Self {
        let bus = config
            .bus
            .clone()
            .unwrap_or_else(|| EventBus::new(config.events_channel_capacity));
        let strategy = BandwidthSelector {
            variance: config.bandwidth_variance,
            ..BandwidthSelector::default()
        };
        Self {
            bus,
            inbox: Inbox::new(),
            directory: collaborators.directory,
            main: Track::new(TrackKind::Main, collaborators.main_loader),
            audio: Track::new(TrackKind::Audio, collaborators.audio_loader),
            subtitle: Track::new(TrackKind::Subtitle, collaborators.subtitle_loader),
            sync: collaborators.sync,
            sink: collaborators.sink,
            clock: collaborators.clock,
            codecs: collaborators.codecs,
            media_groups: Box::new(DefaultMediaGroups),
            strategy: Box::new(strategy),
            config,
            manifest: Manifest::default(),
            selection: ActiveSelection::default(),
            bandwidth_bps: None,
            request_options: RequestOptions::default(),
            seekable: None,
            sink_duration: None,
            layout: None,
            committed_codecs: None,
            metadata_loaded: false,
            unsupported_filtered: false,
            sink_open: false,
            seekable_registration_armed: false,
            has_played: false,
            end_of_stream_signaled: false,
            directory_started: false,
            disposed: false,
        }
    }

    /// Replace the default [`BandwidthSelector`].
    #[must_use]
    pub fn with_strategy<S: SelectionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Replace the default [`DefaultMediaGroups`] coordinator.
    #[must_use]
    pub fn with_media_groups<M: MediaGroupCoordinator + 'static>(mut self, groups: M) -> Self {
        self.media_groups = Box::new(groups);
        self
    }

    // -- events -------------------------------------------------------------------

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub(crate) fn publish<E: Into<Event>>(&self, event: E) {
        self.bus.publish(event);
    }

    /// Handle collaborators post their events through.
    #[must_use]
    pub fn inbox(&self) -> InboxSender {
        self.inbox.sender()
    }

    /// Handle one event, then drain whatever it caused.
    ///
    /// Returns the number of events handled.
    pub fn dispatch<E: Into<Inbound>>(&mut self, event: E, now: Instant) -> usize {
        if self.disposed {
            return 0;
        }
        self.handle(event.into(), now);
        1 + self.pump(now)
    }

    /// Drain queued events, at most `max_events_per_drain` of them.
    ///
    /// Anything left over stays queued for the next call, which keeps a
    /// collaborator that fails on every command from spinning forever.
    pub fn pump(&mut self, now: Instant) -> usize {
        let budget = self.config.max_events_per_drain;
        let mut handled = 0;
        while !self.disposed && handled < budget {
            let Some(event) = self.inbox.try_next() else {
                break;
            };
            self.handle(event, now);
            handled += 1;
        }
        if handled == budget && !self.inbox.is_empty() {
            warn!(budget, "event budget exhausted, deferring the rest");
        }
        handled
    }

    fn handle(&mut self, event: Inbound, now: Instant) {
        trace!(?event, "dispatch");
        match event {
            Inbound::Directory(event) => self.on_directory_event(event, now),
            Inbound::Loader { track, event } => self.on_loader_event(track, event, now),
            Inbound::Host(event) => self.on_host_event(event, now),
        }
    }

    // -- host API -----------------------------------------------------------------

    fn ensure_live(&self) -> OrchestratorResult<()> {
        if self.disposed {
            Err(OrchestratorError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Start the directory on first call, then (re)start every bound loader.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn load(&mut self) -> OrchestratorResult<()> {
        self.ensure_live()?;
        if !self.directory_started {
            self.directory_started = true;
            debug!("starting manifest directory");
            self.directory.load();
        }
        self.load_tracks();
        Ok(())
    }

    /// # Errors
    ///
    /// [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn play(&mut self) -> OrchestratorResult<()> {
        self.ensure_live()?;
        if self.first_play() {
            return Ok(());
        }
        if self.has_played {
            self.load_tracks();
        }
        if !self.clock.duration().is_infinite() || self.clock.seeking() {
            return Ok(());
        }
        // Fell out of the live window: jump back to the live edge.
        if let Some(range) = self.clock.seekable()
            && self.clock.current_time() < range.start
        {
            debug!(live_edge = range.end, "snapping to live edge");
            self.clock.set_current_time(range.end);
        }
        Ok(())
    }

    /// Run first-play setup if it is due. Returns whether it ran.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn setup_first_play(&mut self) -> OrchestratorResult<bool> {
        self.ensure_live()?;
        Ok(self.first_play())
    }

    pub(crate) fn first_play(&mut self) -> bool {
        if self.has_played || self.clock.paused() {
            return false;
        }
        let Some(is_live) = self.media().and_then(Rendition::is_live) else {
            return false;
        };
        let seek_to = if is_live {
            let Some(range) = self.seekable else {
                return false;
            };
            self.clock.set_current_time(range.end);
            Some(range.end)
        } else {
            None
        };
        info!(?seek_to, "first play");
        self.publish(PlaybackEvent::FirstPlay { seek_to });
        self.has_played = true;
        self.load_tracks();
        true
    }

    /// # Errors
    ///
    /// [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn pause_loading(&mut self) -> OrchestratorResult<()> {
        self.ensure_live()?;
        for track in [&mut self.main, &mut self.audio, &mut self.subtitle] {
            if track.is_bound() {
                track.pause();
            }
        }
        Ok(())
    }

    /// React to a host seek to `time`.
    ///
    /// Seeks inside buffered content need nothing; anything else flushes
    /// every bound loader and restarts loading.
    ///
    /// # Errors
    ///
    /// [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose).
    pub fn set_current_time(&mut self, time: f64) -> OrchestratorResult<()> {
        self.ensure_live()?;
        if self.media().and_then(|r| r.playlist.as_ref()).is_none() {
            return Ok(());
        }
        if self.clock.buffered().iter().any(|r| r.contains(time)) {
            trace!(time, "seek inside buffered range");
            return Ok(());
        }
        debug!(time, "seek outside buffered range, resetting loaders");
        for track in [&mut self.main, &mut self.audio, &mut self.subtitle] {
            if track.is_bound() {
                track.loader.reset_everything();
                track.abort();
            }
        }
        self.end_of_stream_signaled = false;
        self.load_tracks();
        Ok(())
    }

    /// Reselect and, when that changes the rendition, reset the main loader
    /// so buffered-ahead content of the old rendition gets replaced.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Disposed`] after [`dispose`](Self::dispose);
    /// - [`OrchestratorError::EmptyManifest`] before a manifest has loaded;
    /// - [`OrchestratorError::NoRenditionContext`] when nothing is selectable.
    pub fn fast_quality_change(&mut self, now: Instant) -> OrchestratorResult<Option<RenditionId>> {
        self.ensure_live()?;
        if self.manifest.is_empty() {
            return Err(OrchestratorError::EmptyManifest);
        }
        let next = self
            .select_now(now)
            .ok_or(OrchestratorError::NoRenditionContext)?;
        if self.selection.rendition == Some(next) {
            return Ok(None);
        }
        self.switch_to(next, SwitchCause::QualityChange);
        self.main.loader.reset_loader();
        Ok(Some(next))
    }

    /// Tear everything down. Later events are ignored and host calls fail
    /// with [`OrchestratorError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.directory.dispose();
        for track in [&mut self.main, &mut self.audio, &mut self.subtitle] {
            track.dispose();
        }
        self.selection = ActiveSelection::default();
        self.seekable_registration_armed = false;
        self.disposed = true;
        info!("orchestrator disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // -- accessors ----------------------------------------------------------------

    /// Sink duration once set, else the active playlist's duration, else 0.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.sink_duration
            .or_else(|| {
                self.media()
                    .and_then(|r| r.playlist.as_ref())
                    .map(|p| p.duration())
            })
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn seekable(&self) -> Option<TimeRange> {
        self.seekable
    }

    /// The active rendition.
    #[must_use]
    pub fn media(&self) -> Option<&Rendition> {
        self.selection
            .rendition
            .and_then(|id| self.manifest.rendition(id))
    }

    #[must_use]
    pub fn master(&self) -> &Manifest {
        &self.manifest
    }

    #[must_use]
    pub fn selection(&self) -> &ActiveSelection {
        &self.selection
    }

    #[must_use]
    pub fn binding(&self, track: TrackKind) -> &LoaderBinding {
        match track {
            TrackKind::Main => &self.main.binding,
            TrackKind::Audio => &self.audio.binding,
            TrackKind::Subtitle => &self.subtitle.binding,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Option<&SourceLayout> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn request_options(&self) -> RequestOptions {
        self.request_options
    }

    /// Latest bandwidth sample from the main loader.
    #[must_use]
    pub fn bandwidth_bps(&self) -> Option<u64> {
        self.bandwidth_bps
    }

    /// `goal(t)` at the host's current time.
    #[must_use]
    pub fn goal_buffer_length(&self) -> f64 {
        self.config.buffer.goal(self.clock.current_time())
    }

    /// `low_water(t)` at the host's current time.
    #[must_use]
    pub fn buffer_low_water_line(&self) -> f64 {
        self.config.buffer.low_water(self.clock.current_time())
    }

    /// Transfer statistics summed over the main and alternate-audio loaders.
    #[must_use]
    pub fn stats(&self) -> LoaderStats {
        self.main.loader.stats() + self.audio.loader.stats()
    }

    #[must_use]
    pub fn media_seconds_loaded(&self) -> f64 {
        self.main.loader.seconds_loaded() + self.audio.loader.seconds_loaded()
    }

    // -- shared helpers -----------------------------------------------------------

    /// Start the main loader and push the current goal buffer to it.
    pub(crate) fn load_main(&mut self) {
        let goal = self.goal_buffer_length();
        self.main.loader.set_goal_buffer_length(goal);
        self.main.load();
    }

    pub(crate) fn load_tracks(&mut self) {
        if self.main.is_bound() {
            self.load_main();
        }
        if self.audio.is_bound() {
            self.audio.load();
        }
        if self.subtitle.is_bound() {
            self.subtitle.load();
        }
    }

    pub(crate) fn main_is_idle(&self) -> bool {
        self.main.binding.state == RunState::Idle
    }

    /// Ask the directory for `to` and record it as the active selection.
    pub(crate) fn switch_to(&mut self, to: RenditionId, cause: SwitchCause) {
        let Some(rendition) = self.manifest.rendition(to) else {
            warn!(rendition = to.0, "switch to unknown rendition ignored");
            return;
        };
        let from = self.selection.rendition.replace(to);
        debug!(
            from = ?from.map(|id| id.0),
            to = to.0,
            bandwidth_bps = ?rendition.bandwidth,
            ?cause,
            "switching rendition"
        );
        self.directory.select_media(rendition);
        self.publish(SelectionEvent::Switched { from, to, cause });
    }
}
