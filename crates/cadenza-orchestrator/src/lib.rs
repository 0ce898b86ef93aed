//! Adaptive-bitrate orchestration core.
//!
//! The [`Orchestrator`] sits between a manifest directory, up to three
//! track loaders (main, alternate audio, subtitles) and the host media
//! pipeline. It owns the manifest arena and the active selection, isolates
//! faulty renditions, arbitrates end of stream and keeps the seekable window
//! reconciled across tracks.
//!
//! Collaborators are plain trait objects ([`Collaborators`]). They receive
//! commands synchronously and report back by posting [`Inbound`] events
//! through an [`InboxSender`]; the host drains them with
//! [`Orchestrator::pump`]. Everything the host may care about is published on
//! an [`EventBus`](cadenza_events::EventBus).
//!
//! ## Features
//!
//! - **test-utils**: in-memory collaborator fakes in [`testing`] and unimock
//!   mocks for the simple collaborator traits.

#![forbid(unsafe_code)]

mod collab;
mod config;
mod end_of_stream;
mod error;
mod groups;
mod inbox;
mod layout;
mod lifecycle;
mod orchestrator;
mod seekable;
mod selection;
mod stats;
mod track;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use cadenza_events::{Fault, FaultKind, TrackKind};
#[cfg(any(test, feature = "test-utils"))]
pub use collab::{CodecSupportMock, SinkBufferManagerMock, SyncResolverMock};
pub use collab::{
    CodecSupport, HostClock, ManifestDirectory, Preload, RequestOptions, SinkBufferManager,
    StartingMedia, SupportAll, SyncResolver, TrackLoader,
};
pub use config::OrchestratorConfig;
pub use end_of_stream::is_end_of_stream;
pub use error::{EndOfStreamError, FaultOutcome, OrchestratorError, OrchestratorResult, SinkError};
pub use groups::{AlternateChoice, DefaultMediaGroups, MediaGroupCoordinator};
pub use inbox::{DirectoryEvent, HostEvent, Inbound, InboxSender, LoaderEvent, PlaylistUpdate};
pub use layout::{
    BufferConfig, BufferMedia, DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC, SourceLayout,
    buffer_configs, incompatible_renditions,
};
pub use orchestrator::{ActiveSelection, Collaborators, Orchestrator};
pub use seekable::reconcile;
pub use stats::LoaderStats;
pub use track::{LoaderBinding, RunState};
