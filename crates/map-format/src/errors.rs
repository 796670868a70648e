use brush_kernel::FaceId;

use crate::format::MapFormat;

/// Errors while selecting a dialect or writing map text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unknown map format name: {0}")]
    UnknownFormat(String),

    #[error("no face writer for map format {0:?}")]
    UnsupportedFormat(MapFormat),

    #[error("face {0:?} has no three corners spanning a plane")]
    DegenerateFace(FaceId),

    #[error("failed to write map text")]
    Write(#[from] std::fmt::Error),
}
