use thiserror::Error;

use crate::{GroupKind, RenditionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("rendition not found: {0:?}")]
    UnknownRendition(RenditionId),

    #[error("{kind:?} alternative not found: {group}/{name}")]
    UnknownAlternative {
        kind: GroupKind,
        group: String,
        name: String,
    },
}

pub type ManifestResult<T> = Result<T, ManifestError>;
