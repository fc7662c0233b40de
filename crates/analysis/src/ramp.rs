//! Temperature bookkeeping for the cooling ramp.
//!
//! The simulation cools linearly in fixed-size blocks of integrator steps and
//! writes a trajectory frame every `report_interval` steps. [`RampSchedule`]
//! recovers the temperature in effect when each frame was written;
//! [`FrameTemperatureMap`] is the sampled subset of frames the descriptor
//! sweeps are evaluated on.

use crate::error::AnalysisError;

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

#[inline]
pub fn kelvin_to_celsius(t_k: f64) -> f64 {
    t_k - KELVIN_OFFSET
}

#[inline]
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    t_c + KELVIN_OFFSET
}

/// Linear cooling protocol applied after equilibration.
#[derive(Debug, Clone, PartialEq)]
pub struct RampSchedule {
    /// Temperature of the first block (K).
    pub start_temperature_k: f64,
    /// Temperature of the last block (K).
    pub end_temperature_k: f64,
    /// Integrator steps in the ramp.
    pub n_steps: usize,
    /// Steps run at each temperature.
    pub block_size: usize,
    /// Steps between trajectory frames.
    pub report_interval: usize,
}

impl Default for RampSchedule {
    fn default() -> Self {
        Self {
            start_temperature_k: 323.15,
            end_temperature_k: 283.15,
            n_steps: 250_000,
            block_size: 250,
            report_interval: 500,
        }
    }
}

impl RampSchedule {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.block_size == 0 || self.report_interval == 0 {
            return Err(AnalysisError::InvalidRamp(
                "block_size and report_interval must be positive".to_string(),
            ));
        }
        if self.n_steps == 0 || self.n_steps % self.block_size != 0 {
            return Err(AnalysisError::InvalidRamp(format!(
                "n_steps ({}) must be a positive multiple of block_size ({})",
                self.n_steps, self.block_size
            )));
        }
        Ok(())
    }

    pub fn n_blocks(&self) -> usize {
        self.n_steps / self.block_size.max(1)
    }

    /// Number of frames written during the ramp.
    pub fn n_frames(&self) -> usize {
        self.n_steps / self.report_interval.max(1)
    }

    /// Temperature (K) of block `block`; a single-block ramp runs at the end
    /// temperature.
    pub fn block_temperature_k(&self, block: usize) -> f64 {
        let n_blocks = self.n_blocks();
        let frac = if n_blocks > 1 {
            block.min(n_blocks - 1) as f64 / (n_blocks - 1) as f64
        } else {
            1.0
        };
        self.start_temperature_k + frac * (self.end_temperature_k - self.start_temperature_k)
    }

    /// Temperature (K) in effect when frame `frame` was written.
    ///
    /// Frame `f` is reported after step `(f + 1) * report_interval`, which
    /// belongs to block `(step - 1) / block_size`. Frames past the end of the
    /// ramp read the end temperature.
    pub fn temperature_at_frame_k(&self, frame: usize) -> f64 {
        let step = frame.saturating_add(1).saturating_mul(self.report_interval);
        let block = step.saturating_sub(1) / self.block_size.max(1);
        self.block_temperature_k(block)
    }

    pub fn temperature_at_frame_c(&self, frame: usize) -> f64 {
        kelvin_to_celsius(self.temperature_at_frame_k(frame))
    }

    /// Frame whose temperature is closest to `t_c` (°C). Ties go to the
    /// earlier frame. Returns `None` for a ramp without frames.
    pub fn frame_for_temperature_c(&self, t_c: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for frame in 0..self.n_frames() {
            let err = (self.temperature_at_frame_c(frame) - t_c).abs();
            if best.map_or(true, |(_, best_err)| err < best_err) {
                best = Some((frame, err));
            }
        }
        best.map(|(frame, _)| frame)
    }
}

/// Ordered `(frame index, temperature °C)` pairs selecting which trajectory
/// frames to analyse.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTemperatureMap {
    entries: Vec<(usize, f64)>,
}

impl Default for FrameTemperatureMap {
    fn default() -> Self {
        Self::new(vec![
            (0, 50.0),
            (125, 40.0),
            (249, 30.0),
            (374, 20.0),
            (399, 18.0),
            (412, 17.0),
            (424, 16.0),
            (437, 15.0),
            (449, 14.0),
            (474, 12.0),
            (499, 10.0),
        ])
    }
}

impl FrameTemperatureMap {
    pub fn new(entries: Vec<(usize, f64)>) -> Self {
        Self { entries }
    }

    /// Map the given frames to their temperatures under `schedule`.
    pub fn from_schedule(schedule: &RampSchedule, frames: &[usize]) -> Self {
        Self::new(
            frames
                .iter()
                .map(|&f| (f, schedule.temperature_at_frame_c(f)))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, f64)> {
        self.entries.iter()
    }

    pub fn frames(&self) -> Vec<usize> {
        self.entries.iter().map(|&(f, _)| f).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hottest first; equal temperatures keep their insertion order.
    pub fn sorted_descending(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self::new(entries)
    }

    /// Check that every frame exists in a trajectory of `n_frames` frames.
    pub fn validate(&self, n_frames: usize) -> Result<(), AnalysisError> {
        match self.entries.iter().find(|&&(f, _)| f >= n_frames) {
            Some(&(frame, _)) => Err(AnalysisError::FrameOutOfRange { frame, n_frames }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ramp() {
        let ramp = RampSchedule::default();
        assert!(ramp.validate().is_ok());
        assert_eq!(ramp.n_blocks(), 1000);
        assert_eq!(ramp.n_frames(), 500);
        assert!((ramp.block_temperature_k(0) - 323.15).abs() < 1e-9);
        assert!((ramp.block_temperature_k(999) - 283.15).abs() < 1e-9);
    }

    #[test]
    fn test_frame_temperatures_follow_ramp() {
        let ramp = RampSchedule::default();
        assert!((ramp.temperature_at_frame_c(499) - 10.0).abs() < 1e-9);
        assert!((ramp.temperature_at_frame_c(0) - 50.0).abs() < 0.05);

        // The sampled frames were chosen to land on round temperatures.
        for &(frame, t_c) in FrameTemperatureMap::default().iter() {
            let got = ramp.temperature_at_frame_c(frame);
            assert!(
                (got - t_c).abs() < 0.1,
                "frame {}: ramp gives {:.3} °C, map says {} °C",
                frame,
                got,
                t_c
            );
        }
    }

    #[test]
    fn test_frame_for_temperature() {
        let ramp = RampSchedule::default();
        assert_eq!(ramp.frame_for_temperature_c(10.0), Some(499));
        assert_eq!(ramp.frame_for_temperature_c(30.0), Some(249));
        assert_eq!(ramp.frame_for_temperature_c(100.0), Some(0));
    }

    #[test]
    fn test_single_block_ramp() {
        let ramp = RampSchedule {
            n_steps: 500,
            block_size: 500,
            report_interval: 100,
            ..RampSchedule::default()
        };
        assert!(ramp.validate().is_ok());
        assert_eq!(ramp.n_frames(), 5);
        assert!((ramp.temperature_at_frame_k(2) - 283.15).abs() < 1e-9);
    }

    #[test]
    fn test_frames_past_ramp_end() {
        let ramp = RampSchedule::default();
        assert!((ramp.temperature_at_frame_k(500) - 283.15).abs() < 1e-9);
        assert!((ramp.temperature_at_frame_k(usize::MAX) - 283.15).abs() < 1e-9);
        assert!((ramp.temperature_at_frame_c(usize::MAX / 2) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ramp() {
        let ramp = RampSchedule {
            n_steps: 1000,
            block_size: 300,
            ..RampSchedule::default()
        };
        assert!(matches!(ramp.validate(), Err(AnalysisError::InvalidRamp(_))));

        let ramp = RampSchedule {
            report_interval: 0,
            ..RampSchedule::default()
        };
        assert!(ramp.validate().is_err());
    }

    #[test]
    fn test_sorted_descending() {
        let map = FrameTemperatureMap::new(vec![(0, 20.0), (1, 50.0), (2, 30.0), (3, 50.0)]);
        let sorted = map.sorted_descending();
        assert_eq!(sorted.frames(), vec![1, 3, 2, 0]);
        // Source order is untouched
        assert_eq!(map.frames(), vec![0, 1, 2, 3]);

        let default_sorted = FrameTemperatureMap::default().sorted_descending();
        assert_eq!(default_sorted.frames(), FrameTemperatureMap::default().frames());
    }

    #[test]
    fn test_validate_frames() {
        let map = FrameTemperatureMap::default();
        assert!(map.validate(500).is_ok());
        assert_eq!(
            map.validate(400),
            Err(AnalysisError::FrameOutOfRange {
                frame: 412,
                n_frames: 400
            })
        );
    }

    #[test]
    fn test_from_schedule() {
        let ramp = RampSchedule::default();
        let map = FrameTemperatureMap::from_schedule(&ramp, &[0, 249, 499]);
        assert_eq!(map.len(), 3);
        assert!((map.entries()[2].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_conversion() {
        assert!((kelvin_to_celsius(323.15) - 50.0).abs() < 1e-9);
        assert!((celsius_to_kelvin(10.0) - 283.15).abs() < 1e-9);
    }
}
