//! Fiber descriptor analysis.
//!
//! Torsion, stacking and lateral-shift descriptors of a stacked molecular
//! fiber, evaluated on the sampled frames of a temperature-ramp trajectory.

pub mod descriptors;
pub mod error;
pub mod layout;
pub mod ramp;
pub mod sweep;

pub use error::AnalysisError;
pub use layout::FiberLayout;
pub use ramp::{FrameTemperatureMap, RampSchedule};
