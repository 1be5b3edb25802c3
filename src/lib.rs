//! Feasibility repair for a two-segment, one-dimensional Hermite trajectory.
//!
//! A [`Trajectory`] runs through three nodes; each of its four segment
//! endpoint accelerations must stay within a fixed bound. The
//! [`PathSolver`] steps the free variables (both durations and the middle
//! velocity) toward feasibility, along a time-shrinking direction that keeps
//! active constraints from rising, or one constraint at a time.

pub mod config;
pub mod diagnostics;
pub mod motion;
pub mod session;

pub use config::{Config, ConfigError, load_config};
pub use motion::{
    ConstraintId, ConstraintReport, FeasibilityStep, FixupStep, GradientStep, MotionError,
    MotionState, PathSolver, Trajectory,
};
pub use session::{Command, Outcome, Session, SessionError};
