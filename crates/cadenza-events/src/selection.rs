use cadenza_abr::SwitchReason;
use cadenza_manifest::{Exclusion, RenditionId};

use crate::FaultKind;

/// Why the active rendition changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchCause {
    /// First selection for a freshly loaded manifest.
    Initial,
    Bandwidth(SwitchReason),
    /// Reselection after the previous rendition was excluded.
    FaultIsolation,
    /// Host-requested destructive re-tune.
    QualityChange,
}

/// Rendition selection and fault isolation outcomes.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    /// First rendition chosen and its metadata loaded.
    InitialSelected {
        rendition: RenditionId,
        timeout_ms: u64,
    },
    /// The directory was asked to switch renditions.
    Switched {
        from: Option<RenditionId>,
        to: RenditionId,
        cause: SwitchCause,
    },
    /// A rendition was excluded from selection.
    Excluded {
        rendition: RenditionId,
        kind: FaultKind,
        message: String,
        until: Exclusion,
    },
    /// The last viable rendition failed; it is reloaded instead of excluded.
    RetryingFinal {
        rendition: RenditionId,
        message: String,
    },
    /// A live playlist stopped updating.
    Stuck { rendition: RenditionId },
    /// Relayed from the directory.
    Disabled { rendition: RenditionId },
    /// Relayed from the directory.
    Enabled { rendition: RenditionId },
}
