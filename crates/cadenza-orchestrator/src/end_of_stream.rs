use crate::StartingMedia;

/// Whether the sink should be told that the stream ended.
///
/// `alternate_audio_ended` is `None` when no alternate-audio loader is
/// active. With one active, an audio-only main stream defers entirely to the
/// audio loader; otherwise (video, or not yet probed) both must have ended.
#[must_use]
pub fn is_end_of_stream(
    main_ended: bool,
    alternate_audio_ended: Option<bool>,
    main_media: Option<StartingMedia>,
) -> bool {
    let Some(audio_ended) = alternate_audio_ended else {
        return main_ended;
    };
    match main_media {
        Some(media) if !media.contains_video => audio_ended,
        _ => main_ended && audio_ended,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const AV: Option<StartingMedia> = Some(StartingMedia {
        contains_audio: true,
        contains_video: true,
    });
    const AUDIO_ONLY: Option<StartingMedia> = Some(StartingMedia {
        contains_audio: true,
        contains_video: false,
    });

    #[rstest]
    #[case(true, None, AV, true)]
    #[case(false, None, AV, false)]
    #[case(true, None, None, true)]
    #[case(true, Some(false), AV, false)]
    #[case(true, Some(true), AV, true)]
    #[case(true, Some(false), None, false)]
    #[case(false, Some(true), None, false)]
    #[case(false, Some(true), AUDIO_ONLY, true)]
    #[case(true, Some(false), AUDIO_ONLY, false)]
    fn arbitration(
        #[case] main: bool,
        #[case] audio: Option<bool>,
        #[case] media: Option<StartingMedia>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_end_of_stream(main, audio, media), expected);
    }
}
