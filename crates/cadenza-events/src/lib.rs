#![forbid(unsafe_code)]

//! Host-facing notifications for the cadenza orchestration core.
//!
//! Components publish through a shared [`EventBus`]; hosts subscribe and
//! react to [`SelectionEvent`]s and [`PlaybackEvent`]s.

mod bus;
mod event;
mod fault;
mod playback;
mod selection;

pub use bus::EventBus;
pub use event::Event;
pub use fault::{Fault, FaultKind, TrackKind};
pub use playback::PlaybackEvent;
pub use selection::{SelectionEvent, SwitchCause};
