//! Error types for the geometry kernel.

use thiserror::Error;

/// Failures surfaced by the geometry kernel.
///
/// Degenerate but well-formed inputs (zero-length bonds, coincident points)
/// are not errors: they propagate as NaN through the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Principal-axis extraction was given no points.
    #[error("cannot extract a principal axis from an empty point set")]
    EmptyPointSet,

    /// The singular value decomposition did not converge.
    #[error("SVD did not converge for {n_points} points; axis undefined for this input")]
    SvdNotConverged {
        /// Number of points in the decomposed set
        n_points: usize,
    },

    /// The decomposition converged but produced no right-singular vectors.
    #[error("SVD decomposition failed: no V^T matrix")]
    MissingSingularVectors,
}
