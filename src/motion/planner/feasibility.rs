// src/motion/planner/feasibility.rs - Gauss-Newton style step onto the violated constraints
use super::{FeasibilityStep, PathSolver, apply, to_free_vars};
use crate::diagnostics::{format_multipliers, format_vector};
use crate::motion::constraints::{ActiveSet, NUM_CONSTRAINTS};
use crate::motion::least_squares::solve_symmetric;
use crate::motion::trajectory::{FreeVars, Trajectory};

impl PathSolver {
    /// Take one step that cancels the first-order error of every violated
    /// constraint at once.
    ///
    /// With `g` the Jacobian of the violated constraints and `e` their errors,
    /// solves `(g gᵗ) m = e` for the multipliers and applies `dX = -gᵗ m`.
    /// Does nothing when no constraint is violated.
    pub fn move_toward_feasibility(&self, traj: &mut Trajectory) -> FeasibilityStep {
        let report = self.evaluate_all(traj);
        let selected = ActiveSet::violated(&report);

        if selected.is_empty() {
            tracing::debug!("No violated constraints, feasibility step skipped");
            return FeasibilityStep {
                report,
                selected,
                multipliers: [0.0; NUM_CONSTRAINTS],
                step: FreeVars::zeros(),
                rank: 0,
            };
        }

        let g = selected.jacobian(&report);
        let err = selected.errors(&report);
        let normal = &g * g.transpose();

        let solution = solve_symmetric(&normal, &err);
        assert_eq!(
            solution.x.len(),
            selected.len(),
            "multiplier count must match the number of violated constraints"
        );

        let step = to_free_vars(&-(g.transpose() * &solution.x));
        let multipliers = selected.scatter(&solution.x);

        tracing::debug!("Constraints:\n{}", format_multipliers(&report, &multipliers));
        tracing::debug!("   {}", format_vector(&step));

        apply(traj, &step);

        FeasibilityStep {
            report,
            selected,
            multipliers,
            step,
            rank: solution.rank,
        }
    }
}
