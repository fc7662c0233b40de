//! Descriptor sweeps over the sampled frames of a cooling trajectory.
//!
//! The trajectory is held in memory as `[n_frames][n_atoms]` positions in nm.
//! Frames listed in a [`FrameTemperatureMap`] are evaluated in parallel and
//! results are returned in map order.

use crate::descriptors::{interface_torsions, segment_torsion, stacking_geometry};
use crate::error::AnalysisError;
use crate::layout::FiberLayout;
use crate::ramp::FrameTemperatureMap;
use rayon::prelude::*;

/// Descriptor values (one per interface) for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSeries {
    pub frame: usize,
    pub temperature_c: f64,
    pub values: Vec<f64>,
}

/// A single descriptor value for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameValue {
    pub frame: usize,
    pub temperature_c: f64,
    pub value: f64,
}

/// Interface torsions laid out as temperature rows (hottest first) by
/// interface columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionHeatmap {
    pub frames: Vec<usize>,
    pub temperatures_c: Vec<f64>,
    /// `rows[t][i]`: torsion across interface `i` at temperature `t`.
    pub rows: Vec<Vec<f64>>,
}

impl TorsionHeatmap {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_interfaces(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    /// Row-major copy of the grid.
    pub fn flatten(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }
}

/// Evaluate `descriptor` on every mapped frame.
fn sweep_frames<T, F>(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
    label: &str,
    descriptor: F,
) -> Result<Vec<T>, AnalysisError>
where
    T: Send,
    F: Fn(&[[f64; 3]], &FiberLayout) -> Result<T, AnalysisError> + Sync,
{
    layout.validate()?;
    frames.validate(trajectory.len())?;

    log::info!(
        "{}: evaluating {} of {} frames ({} monomers x {} atoms)",
        label,
        frames.len(),
        trajectory.len(),
        layout.monomer_count,
        layout.monomer_atom_count,
    );

    frames
        .entries()
        .par_iter()
        .map(|&(frame, temperature_c)| {
            let value = descriptor(trajectory[frame].as_slice(), layout).map_err(|e| {
                AnalysisError::AtFrame {
                    frame,
                    source: Box::new(e),
                }
            })?;
            log::debug!("{}: frame {} ({:.1} °C) done", label, frame, temperature_c);
            Ok(value)
        })
        .collect()
}

fn into_series(frames: &FrameTemperatureMap, values: Vec<Vec<f64>>) -> Vec<FrameSeries> {
    frames
        .iter()
        .zip(values)
        .map(|(&(frame, temperature_c), values)| FrameSeries {
            frame,
            temperature_c,
            values,
        })
        .collect()
}

/// Interface torsions at every mapped frame.
pub fn torsion_sweep(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
) -> Result<Vec<FrameSeries>, AnalysisError> {
    let values = sweep_frames(trajectory, frames, layout, "torsion sweep", interface_torsions)?;
    Ok(into_series(frames, values))
}

/// Single-segment torsion at every mapped frame.
pub fn segment_torsion_sweep(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
) -> Result<Vec<FrameValue>, AnalysisError> {
    let values = sweep_frames(
        trajectory,
        frames,
        layout,
        "segment torsion sweep",
        segment_torsion,
    )?;
    Ok(frames
        .iter()
        .zip(values)
        .map(|(&(frame, temperature_c), value)| FrameValue {
            frame,
            temperature_c,
            value,
        })
        .collect())
}

/// Stacking distances at every mapped frame.
pub fn stacking_sweep(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
) -> Result<Vec<FrameSeries>, AnalysisError> {
    let values = sweep_frames(trajectory, frames, layout, "stacking sweep", |frame, layout| {
        stacking_geometry(frame, layout).map(|g| g.stacking_distances)
    })?;
    Ok(into_series(frames, values))
}

/// Lateral shifts at every mapped frame.
pub fn lateral_shift_sweep(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
) -> Result<Vec<FrameSeries>, AnalysisError> {
    let values = sweep_frames(trajectory, frames, layout, "lateral shift sweep", |frame, layout| {
        stacking_geometry(frame, layout).map(|g| g.lateral_shifts)
    })?;
    Ok(into_series(frames, values))
}

/// Interface torsions for every mapped frame, rows ordered hottest first.
pub fn torsion_heatmap(
    trajectory: &[Vec<[f64; 3]>],
    frames: &FrameTemperatureMap,
    layout: &FiberLayout,
) -> Result<TorsionHeatmap, AnalysisError> {
    let ordered = frames.sorted_descending();
    let series = torsion_sweep(trajectory, &ordered, layout)?;

    let mut heatmap = TorsionHeatmap {
        frames: Vec::with_capacity(series.len()),
        temperatures_c: Vec::with_capacity(series.len()),
        rows: Vec::with_capacity(series.len()),
    };
    for s in series {
        heatmap.frames.push(s.frame);
        heatmap.temperatures_c.push(s.temperature_c);
        heatmap.rows.push(s.values);
    }
    Ok(heatmap)
}
