// src/motion/planner/mod.rs - Constraint-repair steps for the two-segment trajectory
//! Three single-step algorithms that move the free variables of a
//! [`Trajectory`]:
//!
//! - [`PathSolver::move_toward_feasibility`] projects toward the manifold of
//!   violated constraints with a Lagrange-multiplier solve.
//! - [`PathSolver::move_in_constrained_gradient_dir`] shrinks the total time
//!   along the objective direction with its component along the active
//!   constraint gradients removed.
//! - [`PathSolver::fixup_constraint`] repairs one constraint in isolation.
//!
//! None of them loop; the caller repeats steps as needed.

mod feasibility;
mod fixup;
mod gradient;


use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use nalgebra::{DVector, Vector3};

use crate::diagnostics::{format_multipliers, format_vector};
use crate::motion::constraints::{
    self, ActiveSet, ConstraintEvaluation, ConstraintId, ConstraintReport, NUM_CONSTRAINTS,
};
use crate::motion::trajectory::{FreeVars, NUM_FREE_VARS, SegmentIndex, Trajectory};

pub const DEFAULT_ACCELERATION_LIMIT: f64 = 100.0;

/// Constraints with `error > -ACTIVE_TOLERANCE` take part in the gradient projection.
pub const ACTIVE_TOLERANCE: f64 = 1.0e-4;

/// Lower bound on the norm the projected direction is divided by.
pub const NORMALIZATION_FLOOR: f64 = 1.0 / 1024.0;

/// Unit direction that shortens both segments equally.
pub fn objective_direction() -> FreeVars {
    Vector3::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSolver {
    acceleration_limit: f64,
}

impl PathSolver {
    pub fn new(acceleration_limit: f64) -> Self {
        Self { acceleration_limit }
    }

    pub fn acceleration_limit(&self) -> f64 {
        self.acceleration_limit
    }

    pub fn evaluate(&self, id: ConstraintId, traj: &Trajectory) -> ConstraintEvaluation {
        constraints::evaluate(id, traj, self.acceleration_limit)
    }

    pub fn evaluate_all(&self, traj: &Trajectory) -> ConstraintReport {
        constraints::evaluate_all(traj, self.acceleration_limit)
    }
}

impl Default for PathSolver {
    fn default() -> Self {
        Self::new(DEFAULT_ACCELERATION_LIMIT)
    }
}

fn to_free_vars(v: &DVector<f64>) -> FreeVars {
    assert_eq!(v.len(), NUM_FREE_VARS, "step must have one entry per free variable");
    Vector3::new(v[0], v[1], v[2])
}

fn apply(traj: &mut Trajectory, step: &FreeVars) {
    traj.apply_step(step);
    for segment in SegmentIndex::ALL {
        let duration = traj.duration(segment);
        if duration <= 0.0 {
            tracing::warn!("Segment {} duration is now {:.6}", segment.index(), duration);
        }
    }
}

/// Outcome of [`PathSolver::move_toward_feasibility`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityStep {
    /// Constraint state before the step.
    pub report: ConstraintReport,
    /// Violated constraints the step corrected for.
    pub selected: ActiveSet,
    /// Lagrange multiplier per constraint, 0 for unselected ones.
    pub multipliers: [f64; NUM_CONSTRAINTS],
    /// Change applied to the free variables.
    pub step: FreeVars,
    /// Numeric rank of the multiplier system.
    pub rank: usize,
}

impl FeasibilityStep {
    pub fn is_noop(&self) -> bool {
        self.selected.is_empty()
    }
}

impl fmt::Display for FeasibilityStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Constraints:")?;
        write!(f, "{}", format_multipliers(&self.report, &self.multipliers))?;
        writeln!(f, "   {}", format_vector(&self.step))
    }
}

/// Outcome of [`PathSolver::move_in_constrained_gradient_dir`].
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStep {
    /// Constraint state before the step.
    pub report: ConstraintReport,
    /// Gradient of each constraint dotted with the unconstrained objective.
    pub directional_derivatives: [f64; NUM_CONSTRAINTS],
    /// Constraints kept from increasing.
    pub active: ActiveSet,
    pub multipliers: [f64; NUM_CONSTRAINTS],
    /// Norm of the projected direction before rescaling.
    pub scale: f64,
    /// Direction actually added to the free variables.
    pub direction: FreeVars,
    pub rank: usize,
}

impl fmt::Display for GradientStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for eval in self.report.iter() {
            writeln!(
                f,
                "Constraint {}: dot={:.4}, err={:.4}",
                eval.id.index(),
                self.directional_derivatives[eval.id.index()],
                eval.error
            )?;
        }
        let multipliers: String = self.multipliers.iter().map(|m| format!(" {:.6e}", m)).collect();
        writeln!(f, "Constraint multipliers:{}", multipliers)?;
        writeln!(f, "Constraint scale: {:.6}", self.scale)?;
        writeln!(f, "Constrained objective dir:{}", format_vector(&self.direction))
    }
}

/// Outcome of [`PathSolver::fixup_constraint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixupStep {
    /// The constraint before the step.
    pub evaluation: ConstraintEvaluation,
    pub step: FreeVars,
}

impl FixupStep {
    pub fn is_noop(&self) -> bool {
        self.step == FreeVars::zeros()
    }
}

impl fmt::Display for FixupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Fixup {}: err={:.4} step:{}",
            self.evaluation.id,
            self.evaluation.error,
            format_vector(&self.step)
        )
    }
}
