#![forbid(unsafe_code)]

//! # Cadenza
//!
//! Facade crate for the adaptive-bitrate orchestration core.
//!
//! ## Quick start
//!
//! ```ignore
//! use cadenza::prelude::*;
//!
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), collaborators);
//! let inbox = orchestrator.inbox(); // hand clones to the directory and loaders
//! let mut events = orchestrator.subscribe();
//!
//! orchestrator.load()?;
//! loop {
//!     orchestrator.pump(Instant::now());
//!     while let Ok(event) = events.try_recv() {
//!         // react to SelectionEvent / PlaybackEvent
//!     }
//! }
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod abr {
    pub use cadenza_abr::*;
}

pub mod events {
    pub use cadenza_events::*;
}

pub mod manifest {
    pub use cadenza_manifest::*;
}

pub mod orchestrator {
    pub use cadenza_orchestrator::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use cadenza_abr::{BandwidthSelector, BufferOptions, SelectionContext, SelectionStrategy};
    pub use cadenza_events::{
        Event, EventBus, Fault, FaultKind, PlaybackEvent, SelectionEvent, SwitchCause, TrackKind,
    };
    pub use cadenza_manifest::{
        GroupKind, Manifest, MediaAlternative, MediaGroups, MediaPlaylist, Rendition, RenditionId,
        Segment, TimeRange,
    };
    pub use cadenza_orchestrator::{
        CodecSupport, Collaborators, DirectoryEvent, HostClock, HostEvent, InboxSender,
        LoaderEvent, ManifestDirectory, Orchestrator, OrchestratorConfig, OrchestratorError,
        OrchestratorResult, PlaylistUpdate, SinkBufferManager, SyncResolver, TrackLoader,
    };
}
