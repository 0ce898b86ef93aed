#![forbid(unsafe_code)]

//! Manifest model for the cadenza orchestration core.
//!
//! A [`Manifest`] is an arena of [`Rendition`] records addressed by stable
//! [`RenditionId`] indices, plus named [`MediaGroups`] for alternate audio and
//! subtitles. Text parsing lives outside this crate: directories build these
//! values from whatever manifest syntax they speak.
//!
//! After construction only two things change on a rendition: its exclusion
//! marker ([`Exclusion`]) and its loaded media playlist. Everything else is
//! replaced wholesale on refresh (see [`Manifest::merge_refresh`]).

mod codecs;
mod error;
mod groups;
mod manifest;
mod playlist;
mod range;
mod rendition;

pub use codecs::{CodecSet, translate_legacy_avc};
pub use error::{ManifestError, ManifestResult};
pub use groups::{GroupKind, MediaAlternative, MediaGroups};
pub use manifest::{EntryKey, Manifest, MediaEntry};
pub use playlist::{ContainerFormat, MediaPlaylist, Segment};
pub use range::TimeRange;
pub use rendition::{Exclusion, ExclusionSpan, Rendition, RenditionId};
