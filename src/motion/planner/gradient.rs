// src/motion/planner/gradient.rs - Objective step projected off the active constraints
use nalgebra::DVector;

use super::{
    ACTIVE_TOLERANCE, GradientStep, NORMALIZATION_FLOOR, PathSolver, apply, objective_direction,
    to_free_vars,
};
use crate::diagnostics::format_vector;
use crate::motion::constraints::{ActiveSet, ConstraintId, NUM_CONSTRAINTS};
use crate::motion::least_squares::solve_symmetric;
use crate::motion::trajectory::Trajectory;

impl PathSolver {
    /// Step along the time-shrinking objective without increasing, to first
    /// order, any constraint whose error is above `-ACTIVE_TOLERANCE`.
    ///
    /// The component of the objective along the active gradients `g` is
    /// removed by solving `(g gᵗ) x = -g·obj` and adding `gᵗ x`. The result is
    /// divided by `max(NORMALIZATION_FLOOR, norm)` before being applied.
    pub fn move_in_constrained_gradient_dir(&self, traj: &mut Trajectory) -> GradientStep {
        let objective = objective_direction();
        let report = self.evaluate_all(traj);

        let directional_derivatives =
            ConstraintId::ALL.map(|id| report.get(id).gradient.dot(&objective));
        for eval in report.iter() {
            tracing::debug!(
                "Constraint {}: dot={}, err={}",
                eval.id.index(),
                directional_derivatives[eval.id.index()],
                eval.error
            );
        }

        let active = ActiveSet::near_active(&report, ACTIVE_TOLERANCE);
        let mut direction = objective;
        let mut multipliers = [0.0; NUM_CONSTRAINTS];
        let mut rank = 0;

        if !active.is_empty() {
            let g = active.jacobian(&report);
            let normal = &g * g.transpose();
            let rhs = -(&g * DVector::from_column_slice(objective.as_slice()));

            let solution = solve_symmetric(&normal, &rhs);
            assert_eq!(
                solution.x.len(),
                active.len(),
                "multiplier count must match the number of active constraints"
            );

            direction += to_free_vars(&(g.transpose() * &solution.x));
            multipliers = active.scatter(&solution.x);
            rank = solution.rank;

            tracing::debug!("Constraint multipliers: {:?}", multipliers);
        }

        let scale = direction.norm();
        direction /= scale.max(NORMALIZATION_FLOOR);
        tracing::debug!("Constraint scale: {}", scale);
        tracing::debug!("Constrained objective dir:{}", format_vector(&direction));

        apply(traj, &direction);

        GradientStep {
            report,
            directional_derivatives,
            active,
            multipliers,
            scale,
            direction,
            rank,
        }
    }
}
