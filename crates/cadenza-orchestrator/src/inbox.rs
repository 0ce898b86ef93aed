//! Typed inbound events and the queue they wait in.

use cadenza_events::{Fault, TrackKind};
use cadenza_manifest::{GroupKind, Manifest, MediaPlaylist, RenditionId};

/// What a directory delivered on `loadedplaylist`.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaylistUpdate {
    /// Master manifest, first load or refresh.
    Master(Manifest),
    /// Refreshed media playlist of one rendition.
    Media {
        rendition: RenditionId,
        playlist: MediaPlaylist,
    },
    /// First load or refresh of a demuxed alternate's own playlist.
    Alternate {
        kind: GroupKind,
        group: String,
        name: String,
        playlist: MediaPlaylist,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DirectoryEvent {
    LoadedPlaylist(PlaylistUpdate),
    /// First media playlist of a selection.
    LoadedMetadata {
        rendition: RenditionId,
        playlist: MediaPlaylist,
    },
    MediaChanging {
        rendition: RenditionId,
    },
    MediaChange {
        rendition: RenditionId,
    },
    /// A refresh returned the same media playlist.
    PlaylistUnchanged {
        rendition: RenditionId,
    },
    Error(Fault),
    RenditionDisabled(RenditionId),
    RenditionEnabled(RenditionId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoaderEvent {
    BandwidthUpdate { bandwidth_bps: u64 },
    Progress,
    Error(Fault),
    SyncInfoUpdate,
    TimestampOffset { offset: f64 },
    Ended,
    /// A download was abandoned because bandwidth could not sustain it.
    EarlyAbort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    DurationChange,
    /// The sink is ready to create buffers.
    SinkOpen,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Directory(DirectoryEvent),
    Loader { track: TrackKind, event: LoaderEvent },
    Host(HostEvent),
}

impl From<DirectoryEvent> for Inbound {
    fn from(e: DirectoryEvent) -> Self {
        Self::Directory(e)
    }
}

impl From<(TrackKind, LoaderEvent)> for Inbound {
    fn from((track, event): (TrackKind, LoaderEvent)) -> Self {
        Self::Loader { track, event }
    }
}

impl From<HostEvent> for Inbound {
    fn from(e: HostEvent) -> Self {
        Self::Host(e)
    }
}

/// Cloneable handle collaborators post events through.
#[derive(Clone)]
pub struct InboxSender {
    tx: kanal::Sender<Inbound>,
}

impl InboxSender {
    /// Queue an event. Returns `false` once the orchestrator is gone.
    pub fn post<E: Into<Inbound>>(&self, event: E) -> bool {
        self.tx.send(event.into()).is_ok()
    }
}

impl std::fmt::Debug for InboxSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxSender").finish_non_exhaustive()
    }
}

pub(crate) struct Inbox {
    tx: kanal::Sender<Inbound>,
    rx: kanal::Receiver<Inbound>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        let (tx, rx) = kanal::unbounded();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> InboxSender {
        InboxSender {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn try_next(&self) -> Option<Inbound> {
        self.rx.try_recv().ok().flatten()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_arrive_in_order() {
        let inbox = Inbox::new();
        let tx = inbox.sender();
        assert!(tx.post(HostEvent::SinkOpen));
        assert!(tx.post((TrackKind::Main, LoaderEvent::Ended)));

        assert_eq!(inbox.try_next(), Some(Inbound::Host(HostEvent::SinkOpen)));
        assert_eq!(
            inbox.try_next(),
            Some(Inbound::Loader {
                track: TrackKind::Main,
                event: LoaderEvent::Ended
            })
        );
        assert_eq!(inbox.try_next(), None);
        assert!(inbox.is_empty());
    }
}
