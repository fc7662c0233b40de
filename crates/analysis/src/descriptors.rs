//! Per-frame fiber descriptors.
//!
//! Each function takes a single frame of coordinates (nm) plus the fiber
//! layout, checks the frame is large enough, then applies the geometry kernel:
//!
//! - torsion across each monomer-to-monomer interface,
//! - stacking distance: separation of consecutive anchor atoms along the
//!   fiber's principal axis,
//! - lateral shift: separation of consecutive anchor atoms orthogonal to it.

use crate::error::AnalysisError;
use crate::layout::{extract_coords, FiberLayout};
use fst_core::geometry::{axial_component, dihedral, first_principal_axis, lateral_component};
use fst_core::util::{norm, sub};

/// Stacking distances and lateral shifts measured against one shared axis.
#[derive(Debug, Clone, PartialEq)]
pub struct StackingGeometry {
    /// First principal axis of the anchor atoms (sign arbitrary).
    pub axis: [f64; 3],
    /// `|(anchor[i+1] - anchor[i])·axis|`, one per interface.
    pub stacking_distances: Vec<f64>,
    /// Norm of the component of `anchor[i+1] - anchor[i]` orthogonal to the axis.
    pub lateral_shifts: Vec<f64>,
}

/// Torsion (degrees) over the layout's fixed segment atoms.
pub fn segment_torsion(frame: &[[f64; 3]], layout: &FiberLayout) -> Result<f64, AnalysisError> {
    layout.check_frame(frame.len())?;
    let [a, b, c, d] = layout.segment_torsion;
    let angle = dihedral(&frame[a], &frame[b], &frame[c], &frame[d]);
    if angle.is_nan() {
        log::warn!(
            "Segment torsion over atoms {:?} is undefined (coincident atoms)",
            layout.segment_torsion
        );
    }
    Ok(angle)
}

/// Torsion (degrees) across every interface, in fiber order.
pub fn interface_torsions(
    frame: &[[f64; 3]],
    layout: &FiberLayout,
) -> Result<Vec<f64>, AnalysisError> {
    layout.check_frame(frame.len())?;
    let torsions: Vec<f64> = (0..layout.interface_count())
        .map(|i| {
            let [a, b, c, d] = layout.interface_quadruple(i);
            dihedral(&frame[a], &frame[b], &frame[c], &frame[d])
        })
        .collect();

    let undefined = torsions.iter().filter(|t| t.is_nan()).count();
    if undefined > 0 {
        log::warn!(
            "{} of {} interface torsions are undefined (coincident atoms)",
            undefined,
            torsions.len()
        );
    }
    Ok(torsions)
}

/// Anchor atom of every monomer.
pub fn anchor_positions(
    frame: &[[f64; 3]],
    layout: &FiberLayout,
) -> Result<Vec<[f64; 3]>, AnalysisError> {
    layout.check_frame(frame.len())?;
    Ok(extract_coords(frame, &layout.anchor_indices()))
}

/// Dominant direction of the fiber, from its anchor atoms.
pub fn fiber_axis(frame: &[[f64; 3]], layout: &FiberLayout) -> Result<[f64; 3], AnalysisError> {
    let anchors = anchor_positions(frame, layout)?;
    Ok(first_principal_axis(&anchors)?)
}

pub fn stacking_distances(
    frame: &[[f64; 3]],
    layout: &FiberLayout,
) -> Result<Vec<f64>, AnalysisError> {
    Ok(stacking_geometry(frame, layout)?.stacking_distances)
}

pub fn lateral_shifts(frame: &[[f64; 3]], layout: &FiberLayout) -> Result<Vec<f64>, AnalysisError> {
    Ok(stacking_geometry(frame, layout)?.lateral_shifts)
}

/// Stacking distances and lateral shifts sharing a single axis extraction.
pub fn stacking_geometry(
    frame: &[[f64; 3]],
    layout: &FiberLayout,
) -> Result<StackingGeometry, AnalysisError> {
    let anchors = anchor_positions(frame, layout)?;
    let axis = first_principal_axis(&anchors)?;

    let mut stacking = Vec::with_capacity(layout.interface_count());
    let mut lateral = Vec::with_capacity(layout.interface_count());
    for pair in anchors.windows(2) {
        let delta = sub(&pair[1], &pair[0]);
        stacking.push(axial_component(&delta, &axis).abs());
        lateral.push(norm(&lateral_component(&delta, &axis)));
    }

    Ok(StackingGeometry {
        axis,
        stacking_distances: stacking,
        lateral_shifts: lateral,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{synthetic_frame, FiberShape};

    #[test]
    fn test_interface_torsions_follow_twist() {
        let layout = FiberLayout::default();
        let shape = FiberShape {
            twist_deg: 30.0,
            ..FiberShape::default()
        };
        let frame = synthetic_frame(&layout, &shape);

        let torsions = interface_torsions(&frame, &layout).unwrap();
        assert_eq!(torsions.len(), 20);
        for t in &torsions {
            assert!((t - 30.0).abs() < 1e-8, "torsion = {}", t);
        }

        let segment = segment_torsion(&frame, &layout).unwrap();
        assert!((segment - torsions[0]).abs() < 1e-12);
    }

    #[test]
    fn test_negative_twist() {
        let layout = FiberLayout::default();
        let shape = FiberShape {
            twist_deg: -75.0,
            ..FiberShape::default()
        };
        let frame = synthetic_frame(&layout, &shape);
        let torsions = interface_torsions(&frame, &layout).unwrap();
        assert!(torsions.iter().all(|t| (t + 75.0).abs() < 1e-8));
    }

    #[test]
    fn test_stacking_geometry_zigzag() {
        let layout = FiberLayout::default();
        let shape = FiberShape {
            rise: 0.35,
            zigzag: 0.05,
            ..FiberShape::default()
        };
        let frame = synthetic_frame(&layout, &shape);

        let geom = stacking_geometry(&frame, &layout).unwrap();
        assert!((geom.axis[2].abs() - 1.0).abs() < 1e-8, "axis = {:?}", geom.axis);
        assert_eq!(geom.stacking_distances.len(), 20);
        assert_eq!(geom.lateral_shifts.len(), 20);
        for d in &geom.stacking_distances {
            assert!((d - 0.35).abs() < 1e-8, "stacking = {}", d);
        }
        for s in &geom.lateral_shifts {
            assert!((s - 0.10).abs() < 1e-8, "lateral = {}", s);
        }

        assert_eq!(stacking_distances(&frame, &layout).unwrap(), geom.stacking_distances);
        assert_eq!(lateral_shifts(&frame, &layout).unwrap(), geom.lateral_shifts);
    }

    #[test]
    fn test_straight_fiber_has_no_lateral_shift() {
        let layout = FiberLayout::default();
        let frame = synthetic_frame(&layout, &FiberShape::default());
        let shifts = lateral_shifts(&frame, &layout).unwrap();
        assert!(shifts.iter().all(|&s| s < 1e-8));

        let axis = fiber_axis(&frame, &layout).unwrap();
        assert!((axis[2].abs() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_solvated_frame_is_accepted() {
        let layout = FiberLayout::default();
        let mut frame = synthetic_frame(&layout, &FiberShape::default());
        frame.extend((0..300).map(|i| [i as f64, -(i as f64), 5.0]));
        assert_eq!(interface_torsions(&frame, &layout).unwrap().len(), 20);
        assert_eq!(anchor_positions(&frame, &layout).unwrap().len(), 21);
    }

    #[test]
    fn test_frame_too_small() {
        let layout = FiberLayout::default();
        let frame = vec![[0.0; 3]; 60];
        assert!(matches!(
            interface_torsions(&frame, &layout),
            Err(AnalysisError::FrameTooSmall { n_atoms: 60, .. })
        ));
        assert!(stacking_geometry(&frame, &layout).is_err());
        assert!(segment_torsion(&frame, &layout).is_err());
    }

    #[test]
    fn test_out_of_monomer_indices_are_rejected() {
        let frame = synthetic_frame(&FiberLayout::default(), &FiberShape::default());

        let layout = FiberLayout {
            anchor_atom: 60,
            ..FiberLayout::default()
        };
        assert!(matches!(
            stacking_geometry(&frame, &layout),
            Err(AnalysisError::InvalidLayout(_))
        ));
        assert!(anchor_positions(&frame, &layout).is_err());

        let layout = FiberLayout {
            torsion_atoms: [20, 19, 19, 70],
            ..FiberLayout::default()
        };
        assert!(matches!(
            interface_torsions(&frame, &layout),
            Err(AnalysisError::InvalidLayout(_))
        ));
        assert!(segment_torsion(&frame, &layout).is_err());
    }

    #[test]
    fn test_collapsed_interface_is_nan() {
        let layout = FiberLayout::default();
        let mut frame = synthetic_frame(&layout, &FiberShape::default());
        // Put atom 19 of monomer 1 on top of atom 19 of monomer 0.
        frame[layout.atom_index(1, 19)] = frame[layout.atom_index(0, 19)];
        let torsions = interface_torsions(&frame, &layout).unwrap();
        assert!(torsions[0].is_nan());
        assert!(torsions[1..].iter().all(|t| t.is_finite()));
    }
}
