//! In-memory collaborators for scenario tests.
//!
//! Every fake is a cheap clone over shared state, so a test keeps one handle
//! for inspection and hands the other to the [`Orchestrator`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use cadenza_events::Event;
use cadenza_manifest::{EntryKey, MediaEntry, MediaPlaylist, Rendition, Segment, TimeRange};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use web_time::Instant;

use crate::{
    CodecSupport, Collaborators, EndOfStreamError, HostClock, Inbound, LoaderStats,
    ManifestDirectory, Orchestrator, OrchestratorConfig, Preload, RequestOptions,
    SinkBufferManager, SinkError, SourceLayout, StartingMedia, SupportAll, SyncResolver,
    TrackLoader,
};

/// Playlist of `count` segments of `segment_secs` each, named `seg{i}.ts`.
#[must_use]
pub fn playlist(count: usize, segment_secs: u64, end_list: bool) -> MediaPlaylist {
    let segments = (0..count)
        .map(|i| Segment::new(format!("seg{i}.ts"), Duration::from_secs(segment_secs)))
        .collect();
    MediaPlaylist::new(segments, Duration::from_secs(segment_secs), end_list)
}

// -- directory --------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryCommand {
    Load,
    SelectMedia(String),
    Dispose,
}

#[derive(Clone, Debug, Default)]
pub struct FakeDirectory {
    commands: Arc<Mutex<Vec<DirectoryCommand>>>,
}

impl FakeDirectory {
    #[must_use]
    pub fn commands(&self) -> Vec<DirectoryCommand> {
        self.commands.lock().clone()
    }

    /// Commands recorded since the last call.
    pub fn take_commands(&self) -> Vec<DirectoryCommand> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl ManifestDirectory for FakeDirectory {
    fn load(&mut self) {
        self.commands.lock().push(DirectoryCommand::Load);
    }

    fn select_media(&mut self, rendition: &Rendition) {
        self.commands
            .lock()
            .push(DirectoryCommand::SelectMedia(rendition.uri.clone()));
    }

    fn dispose(&mut self) {
        self.commands.lock().push(DirectoryCommand::Dispose);
    }
}

// -- loaders ----------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum LoaderCommand {
    Assign { key: EntryKey, timeout_ms: u64 },
    Load,
    Pause,
    Abort,
    ResetLoader,
    ResetEverything,
    Goal(f64),
    Dispose,
}

#[derive(Debug, Default)]
struct LoaderState {
    commands: Vec<LoaderCommand>,
    ended: bool,
    starting_media: Option<StartingMedia>,
    stats: LoaderStats,
    seconds_loaded: f64,
}

#[derive(Clone, Debug, Default)]
pub struct FakeLoader {
    state: Arc<Mutex<LoaderState>>,
}

impl FakeLoader {
    #[must_use]
    pub fn commands(&self) -> Vec<LoaderCommand> {
        self.state.lock().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<LoaderCommand> {
        std::mem::take(&mut self.state.lock().commands)
    }

    pub fn set_ended(&self, ended: bool) {
        self.state.lock().ended = ended;
    }

    pub fn set_starting_media(&self, media: StartingMedia) {
        self.state.lock().starting_media = Some(media);
    }

    pub fn set_stats(&self, stats: LoaderStats) {
        self.state.lock().stats = stats;
    }

    pub fn set_seconds_loaded(&self, seconds: f64) {
        self.state.lock().seconds_loaded = seconds;
    }

    fn record(&self, command: LoaderCommand) {
        self.state.lock().commands.push(command);
    }
}

impl TrackLoader for FakeLoader {
    fn assign(&mut self, entry: MediaEntry, options: RequestOptions) {
        self.record(LoaderCommand::Assign {
            key: entry.key,
            timeout_ms: options.timeout_ms(),
        });
    }

    fn load(&mut self) {
        self.record(LoaderCommand::Load);
    }

    fn pause(&mut self) {
        self.record(LoaderCommand::Pause);
    }

    fn abort(&mut self) {
        self.record(LoaderCommand::Abort);
    }

    fn reset_loader(&mut self) {
        self.record(LoaderCommand::ResetLoader);
    }

    fn reset_everything(&mut self) {
        self.record(LoaderCommand::ResetEverything);
    }

    fn set_goal_buffer_length(&mut self, seconds: f64) {
        self.record(LoaderCommand::Goal(seconds));
    }

    fn seconds_loaded(&self) -> f64 {
        self.state.lock().seconds_loaded
    }

    fn ended(&self) -> bool {
        self.state.lock().ended
    }

    fn starting_media(&self) -> Option<StartingMedia> {
        self.state.lock().starting_media
    }

    fn stats(&self) -> LoaderStats {
        self.state.lock().stats
    }

    fn dispose(&mut self) {
        self.record(LoaderCommand::Dispose);
    }
}

// -- sync -------------------------------------------------------------------------

/// Expired time per entry URI; unknown URIs resolve to `None`.
#[derive(Clone, Debug, Default)]
pub struct FakeSync {
    expired: Arc<Mutex<HashMap<String, f64>>>,
}

impl FakeSync {
    pub fn set_expired(&self, uri: impl Into<String>, seconds: f64) {
        self.expired.lock().insert(uri.into(), seconds);
    }

    pub fn forget(&self, uri: &str) {
        self.expired.lock().remove(uri);
    }
}

impl SyncResolver for FakeSync {
    fn expired_time(&self, entry: &MediaEntry, _sink_duration: Option<f64>) -> Option<f64> {
        self.expired.lock().get(&entry.uri).copied()
    }
}

// -- sink -------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SinkState {
    layouts: Vec<SourceLayout>,
    end_of_stream: Vec<Option<EndOfStreamError>>,
    durations: Vec<f64>,
    seekable_ranges: Vec<TimeRange>,
    create_error: Option<SinkError>,
    end_of_stream_error: Option<SinkError>,
}

#[derive(Clone, Debug, Default)]
pub struct FakeSink {
    state: Arc<Mutex<SinkState>>,
}

impl FakeSink {
    #[must_use]
    pub fn layouts(&self) -> Vec<SourceLayout> {
        self.state.lock().layouts.clone()
    }

    /// Every end-of-stream signal, accepted or not.
    #[must_use]
    pub fn end_of_stream_calls(&self) -> Vec<Option<EndOfStreamError>> {
        self.state.lock().end_of_stream.clone()
    }

    #[must_use]
    pub fn durations(&self) -> Vec<f64> {
        self.state.lock().durations.clone()
    }

    #[must_use]
    pub fn seekable_ranges(&self) -> Vec<TimeRange> {
        self.state.lock().seekable_ranges.clone()
    }

    pub fn fail_create_buffers(&self, error: SinkError) {
        self.state.lock().create_error = Some(error);
    }

    pub fn fail_end_of_stream(&self, error: SinkError) {
        self.state.lock().end_of_stream_error = Some(error);
    }
}

impl SinkBufferManager for FakeSink {
    fn create_buffers(&mut self, layout: &SourceLayout) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        state.layouts.push(layout.clone());
        Ok(())
    }

    fn end_of_stream(&mut self, error: Option<EndOfStreamError>) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        state.end_of_stream.push(error);
        state.end_of_stream_error.clone().map_or(Ok(()), Err)
    }

    fn set_duration(&mut self, duration: f64) {
        self.state.lock().durations.push(duration);
    }

    fn add_seekable_range(&mut self, range: TimeRange) {
        self.state.lock().seekable_ranges.push(range);
    }
}

// -- clock ------------------------------------------------------------------------

#[derive(Debug)]
struct ClockState {
    current_time: f64,
    duration: f64,
    seeking: bool,
    paused: bool,
    buffered: Vec<TimeRange>,
    seekable: Option<TimeRange>,
    autoplay: bool,
    preload: Preload,
    plays: usize,
    seeks: Vec<f64>,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: f64::NAN,
            seeking: false,
            paused: false,
            buffered: Vec::new(),
            seekable: None,
            autoplay: false,
            preload: Preload::Auto,
            plays: 0,
            seeks: Vec::new(),
        }
    }
}

/// Playing (not paused) at `t = 0` with an unknown duration.
#[derive(Clone, Debug, Default)]
pub struct FakeClock {
    state: Arc<Mutex<ClockState>>,
}

impl FakeClock {
    pub fn set_current_time(&self, time: f64) {
        self.state.lock().current_time = time;
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.state.lock().seeking = seeking;
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
    }

    pub fn set_buffered(&self, buffered: Vec<TimeRange>) {
        self.state.lock().buffered = buffered;
    }

    pub fn set_seekable(&self, seekable: Option<TimeRange>) {
        self.state.lock().seekable = seekable;
    }

    pub fn set_autoplay(&self, autoplay: bool) {
        self.state.lock().autoplay = autoplay;
    }

    pub fn set_preload(&self, preload: Preload) {
        self.state.lock().preload = preload;
    }

    #[must_use]
    pub fn plays(&self) -> usize {
        self.state.lock().plays
    }

    /// Seeks the orchestrator issued.
    #[must_use]
    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }
}

impl HostClock for FakeClock {
    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn seeking(&self) -> bool {
        self.state.lock().seeking
    }

    fn paused(&self) -> bool {
        self.state.lock().paused
    }

    fn buffered(&self) -> Vec<TimeRange> {
        self.state.lock().buffered.clone()
    }

    fn seekable(&self) -> Option<TimeRange> {
        self.state.lock().seekable
    }

    fn autoplay(&self) -> bool {
        self.state.lock().autoplay
    }

    fn play(&mut self) {
        self.state.lock().plays += 1;
    }

    fn set_current_time(&mut self, time: f64) {
        let mut state = self.state.lock();
        state.current_time = time;
        state.seeks.push(time);
    }

    fn preload(&self) -> Preload {
        self.state.lock().preload
    }
}

// -- harness ----------------------------------------------------------------------

/// Inspection handles for every fake wired into a [`Harness`].
#[derive(Clone, Debug, Default)]
pub struct Fakes {
    pub directory: FakeDirectory,
    pub main: FakeLoader,
    pub audio: FakeLoader,
    pub subtitle: FakeLoader,
    pub sync: FakeSync,
    pub sink: FakeSink,
    pub clock: FakeClock,
}

impl Fakes {
    #[must_use]
    pub fn collaborators(&self, codecs: Box<dyn CodecSupport>) -> Collaborators {
        Collaborators {
            directory: Box::new(self.directory.clone()),
            main_loader: Box::new(self.main.clone()),
            audio_loader: Box::new(self.audio.clone()),
            subtitle_loader: Box::new(self.subtitle.clone()),
            sync: Box::new(self.sync.clone()),
            sink: Box::new(self.sink.clone()),
            clock: Box::new(self.clock.clone()),
            codecs,
        }
    }
}

/// An orchestrator wired to fresh fakes, with an event subscription taken
/// before anything was published.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub fakes: Fakes,
    events: broadcast::Receiver<Event>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self::with_codecs(config, Box::new(SupportAll))
    }

    #[must_use]
    pub fn with_codecs(config: OrchestratorConfig, codecs: Box<dyn CodecSupport>) -> Self {
        let fakes = Fakes::default();
        let orchestrator = Orchestrator::new(config, fakes.collaborators(codecs));
        let events = orchestrator.subscribe();
        Self {
            orchestrator,
            fakes,
            events,
        }
    }

    /// Dispatch one event at `now` and drain whatever it caused.
    pub fn dispatch<E: Into<Inbound>>(&mut self, event: E, now: Instant) -> usize {
        self.orchestrator.dispatch(event, now)
    }

    /// Everything published since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
