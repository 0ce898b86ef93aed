#![forbid(unsafe_code)]

mod common;

use cadenza::{
    manifest::EntryKey,
    orchestrator::{
        StartingMedia,
        testing::{Harness, LoaderCommand, playlist},
    },
    prelude::*,
};
use common::{AV, playback_events, selection_events, start};
use rstest::rstest;
use web_time::Instant;

fn english() -> MediaAlternative {
    MediaAlternative::new("en")
        .with_default(true)
        .with_uri("audio/en.m3u8")
}

/// `main.m3u8` with `en` as the only alternative of audio group `aac`.
fn with_english(en: MediaAlternative) -> Manifest {
    Manifest::new(vec![
        Rendition::new(RenditionId(0), "main.m3u8")
            .with_bandwidth(2_000_000)
            .with_codecs(AV.to_string())
            .with_audio_group("aac".to_string()),
    ])
    .with_media_groups(MediaGroups::default().insert(GroupKind::Audio, "aac", en))
}

/// Demuxed default English track whose playlist came with the manifest.
fn with_alternate_audio(audio: MediaPlaylist) -> Manifest {
    with_english(english().with_playlist(audio))
}

fn english_loaded(playlist: MediaPlaylist) -> DirectoryEvent {
    DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Alternate {
        kind: GroupKind::Audio,
        group: "aac".to_string(),
        name: "en".to_string(),
        playlist,
    })
}

#[rstest]
#[case::overlapping(7, 10.0, 5, 20.0, TimeRange::new(20.0, 40.0))]
#[case::disjoint(4, 10.0, 5, 100.0, TimeRange::new(10.0, 20.0))]
fn seekable_reconciles_main_and_audio(
    #[case] main_segments: usize,
    #[case] main_expired: f64,
    #[case] audio_segments: usize,
    #[case] audio_expired: f64,
    #[case] expected: TimeRange,
) {
    let now = Instant::now();
    let mut h = Harness::new();
    let manifest = with_alternate_audio(playlist(audio_segments, 10, false));
    start(&mut h, manifest, playlist(main_segments, 10, false), now);
    h.fakes.sync.set_expired("main.m3u8", main_expired);
    h.fakes.sync.set_expired("audio/en.m3u8", audio_expired);
    h.drain_events();

    h.dispatch((TrackKind::Audio, LoaderEvent::SyncInfoUpdate), now);

    assert_eq!(h.orchestrator.seekable(), Some(expected));
    assert!(
        playback_events(&h.drain_events())
            .contains(&PlaybackEvent::SeekableChanged { range: expected })
    );
}

#[test]
fn seekable_waits_for_alternate_audio_playlist() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(&mut h, with_english(english()), playlist(7, 10, false), now);
    h.fakes.sync.set_expired("main.m3u8", 10.0);
    h.fakes.sync.set_expired("audio/en.m3u8", 10.0);
    h.dispatch((TrackKind::Main, LoaderEvent::SyncInfoUpdate), now);
    assert_eq!(h.orchestrator.seekable(), None);
    assert!(h.fakes.clock.seeks().is_empty());
    h.fakes.audio.take_commands();

    h.dispatch(english_loaded(playlist(6, 10, false)), now);
    h.dispatch((TrackKind::Audio, LoaderEvent::SyncInfoUpdate), now);

    assert_eq!(h.orchestrator.seekable(), Some(TimeRange::new(10.0, 40.0)));
    assert_eq!(h.fakes.clock.seeks(), vec![40.0]);
    assert!(h.fakes.audio.commands().contains(&LoaderCommand::Assign {
        key: EntryKey::Alternate {
            kind: GroupKind::Audio,
            group: "aac".to_string(),
            name: "en".to_string(),
        },
        timeout_ms: 0,
    }));
}

#[test]
fn seekable_advances_as_main_and_audio_refresh() {
    let now = Instant::now();
    let mut h = Harness::new();
    let active = start(&mut h, with_english(english()), playlist(7, 10, false), now);
    h.dispatch(english_loaded(playlist(7, 10, false)), now);
    h.fakes.sync.set_expired("main.m3u8", 0.0);
    h.fakes.sync.set_expired("audio/en.m3u8", 0.0);
    h.dispatch((TrackKind::Main, LoaderEvent::SyncInfoUpdate), now);
    assert_eq!(h.orchestrator.seekable(), Some(TimeRange::new(0.0, 40.0)));
    h.drain_events();

    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Media {
            rendition: active,
            playlist: playlist(10, 10, false),
        }),
        now,
    );
    h.dispatch(english_loaded(playlist(10, 10, false)), now);
    h.dispatch((TrackKind::Audio, LoaderEvent::SyncInfoUpdate), now);

    let grown = TimeRange::new(0.0, 70.0);
    assert_eq!(h.orchestrator.seekable(), Some(grown));
    assert!(
        playback_events(&h.drain_events()).contains(&PlaybackEvent::SeekableChanged { range: grown })
    );
    let bound = h.orchestrator.selection().audio.as_ref().and_then(|c| c.entry.as_ref());
    assert_eq!(
        bound.and_then(|e| e.playlist.as_ref()).map(|p| p.segments.len()),
        Some(10)
    );
}

#[test]
fn alternate_playlist_survives_master_refresh() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(&mut h, with_english(english()), playlist(7, 10, false), now);
    h.dispatch(english_loaded(playlist(7, 10, false)), now);

    h.dispatch(
        DirectoryEvent::LoadedPlaylist(PlaylistUpdate::Master(with_english(english()))),
        now,
    );

    let en = h
        .orchestrator
        .master()
        .media_groups
        .alternative(GroupKind::Audio, "aac", "en")
        .and_then(|alt| alt.playlist.as_ref());
    assert_eq!(en.map(|p| p.segments.len()), Some(7));
}

#[test]
fn seekable_without_alternate_audio_is_main() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(&mut h, common::ladder(), playlist(7, 10, false), now);
    h.fakes.sync.set_expired("high.m3u8", 10.0);

    h.dispatch((TrackKind::Main, LoaderEvent::SyncInfoUpdate), now);

    assert_eq!(h.orchestrator.seekable(), Some(TimeRange::new(10.0, 50.0)));
}

#[test]
fn unknown_expired_time_keeps_previous_window() {
    let now = Instant::now();
    let mut h = Harness::new();
    let manifest = with_alternate_audio(playlist(5, 10, false));
    start(&mut h, manifest, playlist(7, 10, false), now);
    h.fakes.sync.set_expired("main.m3u8", 10.0);
    h.fakes.sync.set_expired("audio/en.m3u8", 20.0);
    h.dispatch((TrackKind::Main, LoaderEvent::SyncInfoUpdate), now);
    let before = h.orchestrator.seekable();
    h.drain_events();

    h.fakes.sync.forget("audio/en.m3u8");
    h.fakes.sync.set_expired("main.m3u8", 30.0);
    h.dispatch((TrackKind::Main, LoaderEvent::SyncInfoUpdate), now);

    assert_eq!(h.orchestrator.seekable(), before);
    assert!(playback_events(&h.drain_events()).is_empty());
}

#[test]
fn end_of_stream_follows_main_without_alternate_audio() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(&mut h, common::ladder(), playlist(6, 10, true), now);

    h.fakes.main.set_ended(true);
    h.dispatch((TrackKind::Main, LoaderEvent::Ended), now);

    assert_eq!(h.fakes.sink.end_of_stream_calls(), vec![None]);
}

#[rstest]
#[case::audio_only_main_defers_to_audio(false, false, true)]
#[case::video_main_waits_for_both(true, false, false)]
#[case::video_main_with_both_ended(true, true, true)]
fn end_of_stream_with_alternate_audio(
    #[case] main_has_video: bool,
    #[case] main_ended: bool,
    #[case] signalled: bool,
) {
    let now = Instant::now();
    let mut h = Harness::new();
    start(
        &mut h,
        with_alternate_audio(playlist(6, 10, true)),
        playlist(6, 10, true),
        now,
    );
    assert!(h.orchestrator.binding(TrackKind::Audio).entry.is_some());
    h.fakes.main.set_starting_media(StartingMedia {
        contains_audio: !main_has_video,
        contains_video: main_has_video,
    });
    h.fakes.main.set_ended(main_ended);
    h.drain_events();

    h.fakes.audio.set_ended(true);
    h.dispatch((TrackKind::Audio, LoaderEvent::Ended), now);

    assert_eq!(h.fakes.sink.end_of_stream_calls().len(), usize::from(signalled));
    assert_eq!(
        playback_events(&h.drain_events()).contains(&PlaybackEvent::EndOfStream),
        signalled
    );
}

#[test]
fn duration_covers_buffered_content() {
    let now = Instant::now();
    let mut h = Harness::new();
    h.fakes.clock.set_buffered(vec![TimeRange::new(0.0, 61.5)]);
    start(&mut h, common::ladder(), playlist(6, 10, true), now);

    assert_eq!(h.orchestrator.duration(), 61.5);
    assert_eq!(h.fakes.sink.durations(), vec![61.5]);
    assert!(
        playback_events(&h.drain_events())
            .contains(&PlaybackEvent::DurationChanged { duration: 61.5 })
    );
}

#[test]
fn live_playlist_reports_unbounded_duration() {
    let now = Instant::now();
    let mut h = Harness::new();
    start(&mut h, common::ladder(), playlist(6, 10, false), now);

    assert!(h.orchestrator.duration().is_infinite());
}

#[test]
fn stalled_live_playlist_is_excluded_with_message() {
    let now = Instant::now();
    let mut h = Harness::new();
    let active = start(&mut h, common::ladder(), playlist(6, 10, false), now);
    h.fakes.sync.set_expired("high.m3u8", 40.0);
    h.fakes.clock.set_current_time(99.95);
    h.fakes.clock.set_buffered(vec![TimeRange::new(40.0, 100.0)]);
    h.drain_events();

    h.dispatch(DirectoryEvent::PlaylistUnchanged { rendition: active }, now);

    let selection = selection_events(&h.drain_events());
    assert!(selection.iter().any(|e| matches!(
        e,
        SelectionEvent::Excluded { rendition, message, .. }
            if *rendition == active && message.contains("no longer updating")
    )));
    assert!(selection.contains(&SelectionEvent::Stuck { rendition: active }));
}

#[test]
fn stalled_check_without_buffer_uses_current_time() {
    let now = Instant::now();
    let mut h = Harness::new();
    let active = start(&mut h, common::ladder(), playlist(6, 10, false), now);
    h.fakes.sync.set_expired("high.m3u8", 0.0);
    h.fakes.clock.set_current_time(60.0);

    h.dispatch(DirectoryEvent::PlaylistUnchanged { rendition: active }, now);

    assert!(h.orchestrator.master().rendition(active).unwrap().exclude_until.is_some());
}
