//! Rendition selection policy for adaptive streaming.
//!
//! - [`BufferOptions`] computes the goal buffer and the low-water line from
//!   elapsed playback time.
//! - [`SelectionStrategy`] picks a rendition from an immutable snapshot of
//!   the eligible ones. [`BandwidthSelector`] is the default.
//! - [`guard_switch`] decides whether a bandwidth-driven proposal replaces
//!   the active rendition.
//!
//! ```rust
//! use cadenza_abr::{BandwidthSelector, SelectionContext, SelectionStrategy};
//! use cadenza_manifest::{Manifest, Rendition, RenditionId};
//! use web_time::Instant;
//!
//! let manifest = Manifest::new(vec![
//!     Rendition::new(RenditionId(0), "low.m3u8").with_bandwidth(500_000),
//!     Rendition::new(RenditionId(1), "high.m3u8").with_bandwidth(2_000_000),
//! ]);
//! let ctx = SelectionContext::from_manifest(&manifest, Instant::now(), Some(1_000_000), None);
//! assert_eq!(BandwidthSelector::default().select(&ctx), Some(RenditionId(0)));
//! ```

#![forbid(unsafe_code)]

mod buffer;
mod selector;
mod switch;

pub use buffer::BufferOptions;
pub use selector::{
    BANDWIDTH_VARIANCE, BandwidthSelector, Candidate, INITIAL_BANDWIDTH_BPS, SelectionContext,
    SelectionStrategy,
};
pub use switch::{SwitchContext, SwitchDecision, SwitchReason, guard_switch};
