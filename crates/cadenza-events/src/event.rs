use crate::{PlaybackEvent, SelectionEvent};

/// Every notification the orchestrator publishes.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Selection(SelectionEvent),
    Playback(PlaybackEvent),
}

impl From<SelectionEvent> for Event {
    fn from(e: SelectionEvent) -> Self {
        Self::Selection(e)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}

impl Event {
    #[must_use]
    pub fn as_selection(&self) -> Option<&SelectionEvent> {
        match self {
            Self::Selection(e) => Some(e),
            Self::Playback(_) => None,
        }
    }

    #[must_use]
    pub fn as_playback(&self) -> Option<&PlaybackEvent> {
        match self {
            Self::Playback(e) => Some(e),
            Self::Selection(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use cadenza_manifest::RenditionId;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(SelectionEvent::Disabled { rendition: RenditionId(1) }.into(), true)]
    #[case(PlaybackEvent::EndOfStream.into(), false)]
    fn sub_enum_accessors(#[case] event: Event, #[case] is_selection: bool) {
        assert_eq!(event.as_selection().is_some(), is_selection);
        assert_eq!(event.as_playback().is_some(), !is_selection);
    }
}
