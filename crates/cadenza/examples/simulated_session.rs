//! Example: drive an orchestrator through a scripted session.
//!
//! Uses the in-memory collaborators from `cadenza_orchestrator::testing` to
//! walk through a VOD session:
//! - master manifest and initial selection
//! - metadata, sink open and first play
//! - a bandwidth drop, a failing segment, end of stream
//!
//! Run with:
//! ```
//! RUST_LOG=cadenza_orchestrator=trace cargo run -p cadenza --example simulated_session
//! ```

use std::error::Error;

use cadenza::prelude::*;
use cadenza_orchestrator::testing::{Harness, playlist};
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;
use web_time::Instant;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?
                .add_directive("cadenza_orchestrator=debug".parse()?),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let codecs = "avc1.4d401f,mp4a.40.2".to_string();
    let manifest = Manifest::new(vec![
        Rendition::new(RenditionId(0), "360p.m3u8")
            .with_bandwidth(800_000)
            .with_codecs(codecs.clone()),
        Rendition::new(RenditionId(0), "720p.m3u8")
            .with_bandwidth(2_500_000)
            .with_codecs(codecs.clone()),
        Rendition::new(RenditionId(0), "1080p.m3u8")
            .with_bandwidth(5_000_000)
            .with_codecs(codecs),
    ]);

    let mut h = Harness::new();
    h.fakes.clock.set_autoplay(true);
    let now = Instant::now();

    h.orchestrator.load()?;
    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(manifest)),
        now,
    );
    let initial = h
        .orchestrator
        .selection()
        .rendition
        .ok_or("no initial selection")?;
    h.dispatch(
        DirectoryEvent::LoadedMetadata {
            rendition: initial,
            playlist: playlist(30, 6, true),
        },
        now,
    );
    h.dispatch(HostEvent::SinkOpen, now);

    // The network degrades: the selector drops a rung.
    h.dispatch(
        (
            TrackKind::Main,
            LoaderEvent::BandwidthUpdate {
                bandwidth_bps: 2_000_000,
            },
        ),
        now,
    );

    // A segment of the new rendition keeps failing.
    let fault = Fault::new(FaultKind::SegmentLoad, "HTTP 503 for seg12.ts");
    h.dispatch((TrackKind::Main, LoaderEvent::Error(fault)), now);

    h.fakes.main.set_ended(true);
    h.dispatch((TrackKind::Main, LoaderEvent::Ended), now);

    for event in h.drain_events() {
        info!(?event);
    }
    info!(
        active = ?h.orchestrator.selection().rendition,
        duration = h.orchestrator.duration(),
        eligible = h.orchestrator.master().eligible_count(now),
        "session finished"
    );

    h.orchestrator.dispose();
    Ok(())
}
