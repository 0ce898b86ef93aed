use cadenza_events::TrackKind;
use cadenza_manifest::{EntryKey, MediaEntry};

use crate::{RequestOptions, TrackLoader};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Loading,
    Paused,
}

/// Which entry a loader is bound to and whether it is running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoaderBinding {
    pub entry: Option<EntryKey>,
    pub state: RunState,
}

/// A loader together with the orchestrator's view of it.
pub(crate) struct Track {
    kind: TrackKind,
    pub(crate) loader: Box<dyn TrackLoader>,
    pub(crate) binding: LoaderBinding,
}

impl Track {
    pub(crate) fn new(kind: TrackKind, loader: Box<dyn TrackLoader>) -> Self {
        Self {
            kind,
            loader,
            binding: LoaderBinding::default(),
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.binding.entry.is_some()
    }

    pub(crate) fn assign(&mut self, entry: MediaEntry, options: RequestOptions) {
        tracing::trace!(track = ?self.kind, uri = %entry.uri, timeout_ms = options.timeout_ms(), "assign");
        self.binding.entry = Some(entry.key.clone());
        self.loader.assign(entry, options);
    }

    pub(crate) fn load(&mut self) {
        self.binding.state = RunState::Loading;
        self.loader.load();
    }

    pub(crate) fn pause(&mut self) {
        self.binding.state = RunState::Paused;
        self.loader.pause();
    }

    pub(crate) fn abort(&mut self) {
        self.loader.abort();
    }

    pub(crate) fn ended(&mut self) {
        self.binding.state = RunState::Idle;
    }

    /// Stop the loader and forget its entry.
    pub(crate) fn unbind(&mut self) {
        if !self.is_bound() {
            return;
        }
        tracing::debug!(track = ?self.kind, "unbind");
        self.loader.abort();
        self.loader.pause();
        self.binding = LoaderBinding::default();
    }

    pub(crate) fn dispose(&mut self) {
        self.loader.dispose();
        self.binding = LoaderBinding::default();
    }
}
