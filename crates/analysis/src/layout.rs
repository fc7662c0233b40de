//! Fiber layout: how monomers and their atoms map onto trajectory indices.
//!
//! A fiber is `monomer_count` consecutive monomers of `monomer_atom_count`
//! atoms each, stored first in every frame. Anything after the fiber
//! (solvent, counter-ions) is ignored by the descriptors.

use crate::error::AnalysisError;

/// Atom bookkeeping for a stacked fiber.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberLayout {
    /// Atoms per monomer.
    pub monomer_atom_count: usize,
    /// Monomers in the fiber.
    pub monomer_count: usize,
    /// Relative atom indices (a, b) in monomer N and (c, d) in monomer N+1
    /// defining the torsion across each interface.
    pub torsion_atoms: [usize; 4],
    /// Relative index of the atom tracked for stacking and lateral analysis.
    pub anchor_atom: usize,
    /// Absolute atom indices of the single-segment torsion.
    pub segment_torsion: [usize; 4],
}

impl Default for FiberLayout {
    fn default() -> Self {
        Self {
            monomer_atom_count: 52,
            monomer_count: 21,
            torsion_atoms: [20, 19, 19, 20],
            anchor_atom: 3,
            segment_torsion: [20, 19, 71, 72],
        }
    }
}

impl FiberLayout {
    /// Reject layouts that cannot address a fiber.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.monomer_atom_count == 0 {
            return Err(AnalysisError::InvalidLayout(
                "monomer_atom_count must be positive".to_string(),
            ));
        }
        if self.monomer_count < 2 {
            return Err(AnalysisError::InvalidLayout(format!(
                "at least 2 monomers are needed to form an interface, got {}",
                self.monomer_count
            )));
        }
        for &rel in self.torsion_atoms.iter().chain(std::iter::once(&self.anchor_atom)) {
            if rel >= self.monomer_atom_count {
                return Err(AnalysisError::InvalidLayout(format!(
                    "relative atom index {} exceeds monomer size {}",
                    rel, self.monomer_atom_count
                )));
            }
        }
        Ok(())
    }

    /// Absolute index of atom `relative` in monomer `monomer`.
    #[inline]
    pub fn atom_index(&self, monomer: usize, relative: usize) -> usize {
        monomer * self.monomer_atom_count + relative
    }

    pub fn fiber_atom_count(&self) -> usize {
        self.monomer_count * self.monomer_atom_count
    }

    pub fn fiber_atom_indices(&self) -> Vec<usize> {
        (0..self.fiber_atom_count()).collect()
    }

    /// Number of monomer-to-monomer interfaces.
    pub fn interface_count(&self) -> usize {
        self.monomer_count.saturating_sub(1)
    }

    /// Absolute indices of the torsion atoms across interface `i`
    /// (monomer `i` to monomer `i + 1`).
    pub fn interface_quadruple(&self, i: usize) -> [usize; 4] {
        let [a, b, c, d] = self.torsion_atoms;
        [
            self.atom_index(i, a),
            self.atom_index(i, b),
            self.atom_index(i + 1, c),
            self.atom_index(i + 1, d),
        ]
    }

    /// Absolute index of the anchor atom of every monomer, in fiber order.
    pub fn anchor_indices(&self) -> Vec<usize> {
        (0..self.monomer_count)
            .map(|m| self.atom_index(m, self.anchor_atom))
            .collect()
    }

    /// Smallest frame size every descriptor can be evaluated on.
    pub fn required_atoms(&self) -> usize {
        let segment_max = self.segment_torsion.iter().copied().max().unwrap_or(0);
        self.fiber_atom_count().max(segment_max + 1)
    }

    /// Check the layout itself, then that a frame of `n_atoms` atoms covers it.
    pub fn check_frame(&self, n_atoms: usize) -> Result<(), AnalysisError> {
        self.validate()?;
        let required = self.required_atoms();
        if n_atoms < required {
            return Err(AnalysisError::FrameTooSmall { n_atoms, required });
        }
        Ok(())
    }

    /// Keep only the fiber atoms of a frame.
    pub fn slice_fiber(&self, frame: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, AnalysisError> {
        let required = self.fiber_atom_count();
        if frame.len() < required {
            return Err(AnalysisError::FrameTooSmall {
                n_atoms: frame.len(),
                required,
            });
        }
        Ok(frame[..required].to_vec())
    }
}

/// Extract the coordinates of the given atoms.
pub fn extract_coords(coords: &[[f64; 3]], atom_indices: &[usize]) -> Vec<[f64; 3]> {
    atom_indices.iter().map(|&i| coords[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = FiberLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.fiber_atom_count(), 1092);
        assert_eq!(layout.interface_count(), 20);
        assert_eq!(layout.required_atoms(), 1092);

        let indices = layout.fiber_atom_indices();
        assert_eq!(indices.len(), 1092);
        assert_eq!(indices[1091], 1091);
        assert_eq!(layout.atom_index(20, 51), 1091);
    }

    #[test]
    fn test_interface_quadruple_matches_segment() {
        // Interface 0 addresses the same atoms as the single-segment torsion.
        let layout = FiberLayout::default();
        assert_eq!(layout.interface_quadruple(0), layout.segment_torsion);
        assert_eq!(layout.interface_quadruple(19), [1008, 1007, 1059, 1060]);
    }

    #[test]
    fn test_anchor_indices() {
        let layout = FiberLayout::default();
        let anchors = layout.anchor_indices();
        assert_eq!(anchors.len(), 21);
        assert_eq!(anchors[0], 3);
        assert_eq!(anchors[1], 55);
        assert_eq!(anchors[20], 1043);
    }

    #[test]
    fn test_validate_rejects_bad_layouts() {
        let mut layout = FiberLayout::default();
        layout.monomer_count = 1;
        assert!(matches!(
            layout.validate(),
            Err(AnalysisError::InvalidLayout(_))
        ));

        let mut layout = FiberLayout::default();
        layout.anchor_atom = 52;
        assert!(layout.validate().is_err());

        let mut layout = FiberLayout::default();
        layout.monomer_atom_count = 0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_check_frame() {
        let layout = FiberLayout::default();
        assert!(layout.check_frame(5000).is_ok());
        assert_eq!(
            layout.check_frame(100),
            Err(AnalysisError::FrameTooSmall {
                n_atoms: 100,
                required: 1092
            })
        );

        let mut layout = FiberLayout::default();
        layout.anchor_atom = 60;
        assert!(matches!(
            layout.check_frame(5000),
            Err(AnalysisError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_slice_fiber_drops_solvent() {
        let layout = FiberLayout {
            monomer_atom_count: 3,
            monomer_count: 2,
            torsion_atoms: [0, 1, 1, 0],
            anchor_atom: 2,
            segment_torsion: [0, 1, 4, 3],
        };
        let frame: Vec<[f64; 3]> = (0..10).map(|i| [i as f64, 0.0, 0.0]).collect();
        let fiber = layout.slice_fiber(&frame).unwrap();
        assert_eq!(fiber.len(), 6);
        assert_eq!(fiber[5], [5.0, 0.0, 0.0]);
        assert!(layout.slice_fiber(&frame[..4]).is_err());
    }

    #[test]
    fn test_extract_coords() {
        let coords = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        let picked = extract_coords(&coords, &[2, 0]);
        assert_eq!(picked, vec![[2.0, 2.0, 2.0], [0.0, 0.0, 0.0]]);
    }
}
