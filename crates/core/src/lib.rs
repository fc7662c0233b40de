//! Core library for fiber-simulation-tools.
//!
//! Pure Rust geometry kernel with no Python dependencies.
//! Provides torsion angles, principal-axis extraction and axial/lateral
//! projections on 3D coordinate arrays.

pub mod error;
pub mod geometry;
pub mod util;

pub use error::GeometryError;
pub use geometry::{dihedral, first_principal_axis, wrap_angle};
