// src/motion/mod.rs - Trajectory model, constraints and the feasibility planner
pub mod constraints;
pub mod least_squares;
pub mod planner;
pub mod trajectory;

pub use constraints::{ActiveSet, ConstraintEvaluation, ConstraintId, ConstraintReport};
pub use planner::{FeasibilityStep, FixupStep, GradientStep, PathSolver};
pub use trajectory::{FreeVars, MotionState, SegmentIndex, Trajectory};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MotionError {
    #[error("Invalid constraint index {0} (expected 0..4)")]
    InvalidConstraintIndex(usize),
    #[error("Segment {segment} has non-positive duration {duration}")]
    NonPositiveDuration { segment: usize, duration: f64 },
    #[error("Sample count must be at least 1")]
    InvalidSampleCount,
}
