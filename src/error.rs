use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: any of these aborts the run.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MosaicError {
    #[error("failed to load image {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MosaicError>;

/// Non-fatal geometry problems. The affected entity is left out of the
/// downstream sets and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    #[error("discarded {discarded} guideline chains shorter than one tile")]
    ShortChains { discarded: usize },

    #[error("no usable edges found, primary placement produced zero tiles")]
    NoEdges,

    #[error("gap analysis found no guidelines to fill")]
    NoGapGuidelines,

    #[error("tile {index} could not be repaired and was dropped")]
    TileUnrepairable { index: usize },

    #[error("{dropped} tiles lay entirely outside the canvas and were dropped")]
    TilesOutsideFrame { dropped: usize },
}

impl GeometryWarning {
    /// Log the warning and hand it back so callers can collect it.
    pub fn emit(self) -> Self {
        log::warn!("{}", self);
        self
    }
}
