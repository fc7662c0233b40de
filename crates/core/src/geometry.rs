//! Geometry kernel: torsion angles, principal axes and axial projections.
//!
//! All functions are pure and operate on borrowed `[f64; 3]` coordinates in
//! whatever length unit the caller supplies (nm throughout this workspace).
//! Degenerate geometry is not guarded: a zero-length central bond yields a
//! NaN dihedral, and a point cloud without spread yields an arbitrary axis.

use crate::error::GeometryError;
use crate::util::{cross, dot, norm, normalize, scale, sub};

/// Iteration cap handed to the SVD. Exceeding it is reported as
/// [`GeometryError::SvdNotConverged`].
pub const MAX_SVD_ITERATIONS: usize = 10_000;

/// Compute centroid of a set of 3D points.
#[inline]
pub fn centroid(points: &[[f64; 3]]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let n = points.len() as f64;
    let mut sum = [0.0; 3];
    for p in points {
        sum[0] += p[0];
        sum[1] += p[1];
        sum[2] += p[2];
    }
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Fold an angle in degrees into (-180, 180] with a single 360° step.
///
/// Inputs further than one period out of range are not fully normalized, and
/// -180 is returned unchanged.
#[inline]
pub fn wrap_angle(angle_deg: f64) -> f64 {
    if angle_deg > 180.0 {
        angle_deg - 360.0
    } else if angle_deg < -180.0 {
        angle_deg + 360.0
    } else {
        angle_deg
    }
}

/// Signed torsion angle in degrees about the p1–p2 bond.
///
/// Uses the projection method: the outer bonds are projected onto the plane
/// orthogonal to the central bond and the angle between the projections is
/// measured with `atan2`. The result is invariant under reversal of the chain
/// and changes sign under reflection.
pub fn dihedral(p0: &[f64; 3], p1: &[f64; 3], p2: &[f64; 3], p3: &[f64; 3]) -> f64 {
    let b0 = sub(p0, p1);
    let b1 = normalize(&sub(p2, p1));
    let b2 = sub(p3, p2);

    let v = sub(&b0, &scale(&b1, dot(&b0, &b1)));
    let w = sub(&b2, &scale(&b1, dot(&b2, &b1)));

    let x = dot(&v, &w);
    let y = dot(&cross(&b1, &v), &w);
    wrap_angle(y.atan2(x).to_degrees())
}

/// Direction of greatest variance of a point cloud.
///
/// Centers the points, decomposes the N×3 matrix by SVD and returns the
/// right-singular vector of the largest singular value, scaled to unit length.
/// The sign of the axis is arbitrary.
pub fn first_principal_axis(points: &[[f64; 3]]) -> Result<[f64; 3], GeometryError> {
    first_principal_axis_bounded(points, MAX_SVD_ITERATIONS)
}

/// [`first_principal_axis`] with an explicit SVD iteration cap.
///
/// A cap of 0 lets the decomposition iterate until it converges.
pub fn first_principal_axis_bounded(
    points: &[[f64; 3]],
    max_iterations: usize,
) -> Result<[f64; 3], GeometryError> {
    let n_points = points.len();
    if n_points == 0 {
        return Err(GeometryError::EmptyPointSet);
    }

    let center = centroid(points);
    let centered = nalgebra::DMatrix::<f64>::from_fn(n_points, 3, |i, j| points[i][j] - center[j]);

    let svd = nalgebra::SVD::try_new(centered, false, true, f64::EPSILON, max_iterations)
        .ok_or(GeometryError::SvdNotConverged { n_points })?;
    let v_t = svd.v_t.ok_or(GeometryError::MissingSingularVectors)?;

    // nalgebra does not order singular values
    let mut best = 0;
    for (i, &s) in svd.singular_values.iter().enumerate() {
        if s > svd.singular_values[best] {
            best = i;
        }
    }

    let axis = [v_t[(best, 0)], v_t[(best, 1)], v_t[(best, 2)]];
    Ok(normalize(&axis))
}

/// Signed length of `delta` along `axis` (assumed unit length).
#[inline]
pub fn axial_component(delta: &[f64; 3], axis: &[f64; 3]) -> f64 {
    dot(delta, axis)
}

/// Component of `delta` orthogonal to `axis` (assumed unit length).
#[inline]
pub fn lateral_component(delta: &[f64; 3], axis: &[f64; 3]) -> [f64; 3] {
    sub(delta, &scale(axis, dot(delta, axis)))
}

/// Scalar coordinate of every point along `axis`.
pub fn project_onto_axis(points: &[[f64; 3]], axis: &[f64; 3]) -> Vec<f64> {
    points.iter().map(|p| dot(p, axis)).collect()
}

/// Distance from each point to its rank-1 reconstruction
/// `centroid + ((p - centroid)·axis)·axis`.
///
/// Every residual is non-negative and all vanish only for collinear input.
pub fn reconstruction_residuals(points: &[[f64; 3]], axis: &[f64; 3]) -> Vec<f64> {
    let center = centroid(points);
    points
        .iter()
        .map(|p| norm(&lateral_component(&sub(p, &center), axis)))
        .collect()
}
