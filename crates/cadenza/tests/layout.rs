#![forbid(unsafe_code)]

mod common;

use std::sync::{Arc, Mutex};

use cadenza::{
    manifest::{ContainerFormat, Exclusion},
    orchestrator::{
        BufferConfig, BufferMedia, EndOfStreamError, SinkError, SourceLayout,
        testing::{Harness, playlist},
    },
    prelude::*,
};
use common::{AV, playback_events, rendition, start};
use web_time::Instant;

/// Records every queried MIME type and rejects HEVC.
#[derive(Clone, Default)]
struct NoHevc {
    queried: Arc<Mutex<Vec<String>>>,
}

impl CodecSupport for NoHevc {
    fn is_type_supported(&self, mime: &str) -> bool {
        self.queried.lock().unwrap().push(mime.to_string());
        !mime.contains("hvc1")
    }
}

fn mixed_ladder() -> Manifest {
    Manifest::new(vec![
        rendition("low.m3u8", 500_000, AV),
        rendition("audio.m3u8", 100_000, "mp4a.40.2"),
        rendition("hevc.m3u8", 2_000_000, "hvc1.1.6.L93.B0,mp4a.40.2"),
        rendition("high.m3u8", 3_000_000, AV),
    ])
}

fn exclusion(h: &Harness, id: usize) -> Option<Exclusion> {
    h.orchestrator
        .master()
        .rendition(RenditionId(id))
        .and_then(|r| r.exclude_until)
}

#[test]
fn committed_layout_excludes_incompatible_renditions() {
    let now = Instant::now();
    let mut h = Harness::new();
    let active = start(&mut h, mixed_ladder(), playlist(6, 10, true), now);
    assert_eq!(active, RenditionId(3));
    assert!(h.fakes.sink.layouts().is_empty());

    h.dispatch(HostEvent::SinkOpen, now);

    assert_eq!(
        h.fakes.sink.layouts(),
        vec![SourceLayout::DeferredUntilContainerSniff {
            configs: vec![BufferConfig {
                media: BufferMedia::Video,
                container: ContainerFormat::Ts,
                codecs: vec!["avc1.4d401f".to_string(), "mp4a.40.2".to_string()],
            }],
        }]
    );
    assert_eq!(exclusion(&h, 0), None);
    assert_eq!(exclusion(&h, 1), Some(Exclusion::Permanent));
    assert_eq!(exclusion(&h, 2), Some(Exclusion::Permanent));
    assert_eq!(exclusion(&h, 3), None);
}

#[test]
fn layout_is_committed_once() {
    let now = Instant::now();
    let mut h = Harness::new();
    h.dispatch(HostEvent::SinkOpen, now);
    assert!(h.fakes.sink.layouts().is_empty());

    start(&mut h, mixed_ladder(), playlist(6, 10, true), now);
    h.dispatch(HostEvent::SinkOpen, now);
    h.dispatch(common::bandwidth(1_000_000), now);

    assert_eq!(h.fakes.sink.layouts().len(), 1);
    assert!(h.orchestrator.layout().is_some());
}

#[test]
fn demuxed_audio_group_gets_eager_buffers() {
    let now = Instant::now();
    let manifest = Manifest::new(vec![
        rendition("main.m3u8", 2_000_000, AV).with_audio_group("aac".to_string()),
    ])
    .with_media_groups(
        MediaGroups::default()
            .insert(
                GroupKind::Audio,
                "aac",
                MediaAlternative::new("en").with_default(true).with_uri("en.m3u8"),
            )
            .insert(
                GroupKind::Audio,
                "aac",
                MediaAlternative::new("fr").with_uri("fr.m3u8"),
            ),
    );
    let mut h = Harness::new();
    h.dispatch(HostEvent::SinkOpen, now);
    start(&mut h, manifest, playlist(6, 10, true), now);

    let ts = |codec: &str, media| BufferConfig {
        media,
        container: ContainerFormat::Ts,
        codecs: vec![codec.to_string()],
    };
    assert_eq!(
        h.orchestrator.layout(),
        Some(&SourceLayout::EagerDemuxed {
            audio: ts("mp4a.40.2", BufferMedia::Audio),
            video: ts("avc1.4d401f", BufferMedia::Video),
        })
    );
}

#[test]
fn unrecognised_codecs_fail_decode() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(
        &mut h,
        Manifest::new(vec![rendition("ttml.m3u8", 100_000, "stpp.ttml.im1t")]),
        playlist(6, 10, true),
        now,
    );
    h.drain_events();

    h.dispatch(HostEvent::SinkOpen, now);

    assert!(h.orchestrator.layout().is_none());
    assert_eq!(
        h.fakes.sink.end_of_stream_calls(),
        vec![Some(EndOfStreamError::Decode)]
    );
    assert!(playback_events(&h.drain_events()).iter().any(|e| matches!(
        e,
        PlaybackEvent::Error { message, fatal: true }
            if message.contains("no compatible buffer configuration")
    )));
}

#[test]
fn sink_rejecting_buffers_fails_decode() {
    let now = Instant::now();
    let mut h = Harness::new();
    h.fakes
        .sink
        .fail_create_buffers(SinkError::Unsupported("video/mp2t".to_string()));
    start(&mut h, common::ladder(), playlist(6, 10, true), now);

    h.dispatch(HostEvent::SinkOpen, now);

    assert!(h.orchestrator.layout().is_none());
    assert_eq!(
        h.fakes.sink.end_of_stream_calls(),
        vec![Some(EndOfStreamError::Decode)]
    );
}

#[test]
fn undecodable_renditions_are_excluded_before_selection() {
    let now = Instant::now();
    let codecs = NoHevc::default();
    let queried = codecs.queried.clone();
    let manifest = Manifest::new(vec![
        rendition("legacy.m3u8", 1_000_000, "avc1.100.42,mp4a.40.2"),
        rendition("hevc.m3u8", 3_000_000, "hvc1.1.6.L93.B0,mp4a.40.2"),
    ]);
    let mut h = Harness::with_codecs(OrchestratorConfig::default(), Box::new(codecs));

    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(manifest)),
        now,
    );

    assert_eq!(exclusion(&h, 1), Some(Exclusion::Permanent));
    assert_eq!(h.orchestrator.selection().rendition, Some(RenditionId(0)));
    assert!(
        queried
            .lock()
            .unwrap()
            .contains(&"video/mp4; codecs=\"avc1.64002a,mp4a.40.2\"".to_string())
    );
}

#[test]
fn refreshed_manifest_runs_codec_support_gate_on_new_renditions() {
    let now = Instant::now();
    let mut h = Harness::with_codecs(OrchestratorConfig::default(), Box::new(NoHevc::default()));
    start(
        &mut h,
        Manifest::new(vec![rendition("avc.m3u8", 1_000_000, AV)]),
        playlist(6, 10, false),
        now,
    );

    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(Manifest::new(vec![
            rendition("avc.m3u8", 1_000_000, AV),
            rendition("hevc.m3u8", 3_000_000, "hvc1.1.6.L93.B0,mp4a.40.2"),
        ]))),
        now,
    );

    assert_eq!(exclusion(&h, 0), None);
    assert_eq!(exclusion(&h, 1), Some(Exclusion::Permanent));
    assert_eq!(h.orchestrator.selection().rendition, Some(RenditionId(0)));
}

#[test]
fn refreshed_manifest_runs_layout_gate_once_committed() {
    let now = Instant::now();
    let mut h = Harness::new();
    h.dispatch(HostEvent::SinkOpen, now);
    start(&mut h, common::ladder(), playlist(6, 10, false), now);
    assert!(h.orchestrator.layout().is_some());

    let mut refreshed = common::ladder().renditions().to_vec();
    refreshed.push(rendition("audio.m3u8", 100_000, "mp4a.40.2"));
    refreshed.push(rendition("hevc.m3u8", 2_000_000, "hvc1.1.6.L93.B0,mp4a.40.2"));
    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(Manifest::new(refreshed))),
        now,
    );

    assert_eq!(exclusion(&h, 2), None);
    assert_eq!(exclusion(&h, 3), Some(Exclusion::Permanent));
    assert_eq!(exclusion(&h, 4), Some(Exclusion::Permanent));
    assert_eq!(h.orchestrator.selection().rendition, Some(RenditionId(2)));
}
