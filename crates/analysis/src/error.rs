//! Error type for fiber descriptor analysis.

use fst_core::GeometryError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Failure inside the geometry kernel (principal-axis extraction).
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("invalid fiber layout: {0}")]
    InvalidLayout(String),

    #[error("invalid ramp schedule: {0}")]
    InvalidRamp(String),

    /// Frame holds fewer atoms than the fiber layout addresses.
    #[error("frame has {n_atoms} atoms but the fiber layout needs at least {required}")]
    FrameTooSmall { n_atoms: usize, required: usize },

    #[error("frame {frame} out of range (trajectory has {n_frames} frames)")]
    FrameOutOfRange { frame: usize, n_frames: usize },

    /// Wraps a failure with the trajectory frame it occurred in.
    #[error("frame {frame}: {source}")]
    AtFrame {
        frame: usize,
        #[source]
        source: Box<AnalysisError>,
    },
}
