// src/motion/planner/fixup.rs - Single-constraint normalized gradient correction
use super::{FixupStep, PathSolver, apply};
use crate::motion::constraints::ConstraintId;
use crate::motion::trajectory::{FreeVars, Trajectory};

impl PathSolver {
    /// Drive one constraint's first-order error to zero, ignoring the others.
    ///
    /// Applies `-gradient * error / |gradient|²` when the constraint is
    /// violated. Other constraints may end up violated afterwards.
    pub fn fixup_constraint(&self, traj: &mut Trajectory, id: ConstraintId) -> FixupStep {
        let evaluation = self.evaluate(id, traj);

        if evaluation.error <= 0.0 {
            return FixupStep {
                evaluation,
                step: FreeVars::zeros(),
            };
        }

        let norm_sq = evaluation.gradient.norm_squared();
        if norm_sq == 0.0 {
            tracing::warn!("Constraint {} is violated with a zero gradient", id);
            return FixupStep {
                evaluation,
                step: FreeVars::zeros(),
            };
        }

        let u = evaluation.error / norm_sq;
        let step = evaluation.gradient * -u;
        tracing::debug!("Fixup {}: err={} u={}", id, evaluation.error, u);

        apply(traj, &step);

        FixupStep { evaluation, step }
    }
}
