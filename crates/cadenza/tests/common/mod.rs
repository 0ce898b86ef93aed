// Common fixtures and helpers for integration tests

#![allow(dead_code)]

use cadenza::prelude::*;
use cadenza_orchestrator::testing::Harness;
use web_time::Instant;

/// Muxed H.264 + AAC.
pub const AV: &str = "avc1.4d401f,mp4a.40.2";

pub fn rendition(uri: &str, bandwidth: u64, codecs: &str) -> Rendition {
    Rendition::new(RenditionId(0), uri)
        .with_bandwidth(bandwidth)
        .with_codecs(codecs.to_string())
}

/// 500 kbps / 1 Mbps / 3 Mbps; the initial estimate picks `high.m3u8`.
pub fn ladder() -> Manifest {
    Manifest::new(vec![
        rendition("low.m3u8", 500_000, AV),
        rendition("mid.m3u8", 1_000_000, AV),
        rendition("high.m3u8", 3_000_000, AV),
    ])
}

/// Deliver `manifest`, then metadata for whatever got selected.
pub fn start(h: &mut Harness, manifest: Manifest, media: MediaPlaylist, now: Instant) -> RenditionId {
    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(manifest)),
        now,
    );
    let rendition = h
        .orchestrator
        .selection()
        .rendition
        .expect("initial selection");
    h.dispatch(
        DirectoryEvent::LoadedMetadata {
            rendition,
            playlist: media,
        },
        now,
    );
    rendition
}

pub fn bandwidth(bandwidth_bps: u64) -> (TrackKind, LoaderEvent) {
    (TrackKind::Main, LoaderEvent::BandwidthUpdate { bandwidth_bps })
}

pub fn selection_events(events: &[Event]) -> Vec<SelectionEvent> {
    events
        .iter()
        .filter_map(|e| e.as_selection().cloned())
        .collect()
}

pub fn playback_events(events: &[Event]) -> Vec<PlaybackEvent> {
    events
        .iter()
        .filter_map(|e| e.as_playback().cloned())
        .collect()
}
