// src/motion/constraints.rs - Endpoint acceleration constraints and active-set selection
//! The four acceleration-bound constraints.
//!
//! Each constraint is `a² - limit²` for one segment endpoint acceleration `a`,
//! so the feasible region is `error <= 0`. Gradients are taken with respect to
//! the free variables only (`duration0`, `duration1`, `vel1`).

use std::fmt;

use nalgebra::{DMatrix, DVector, Vector3};

use super::MotionError;
use super::trajectory::{Endpoint, FreeVars, NUM_FREE_VARS, SegmentIndex, Trajectory, VEL1};

/// Number of constraints.
pub const NUM_CONSTRAINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintId {
    /// Acceleration at node 0, leaving along segment 0.
    Segment0Start,
    /// Acceleration at node 1, arriving along segment 0.
    Segment0End,
    /// Acceleration at node 1, leaving along segment 1.
    Segment1Start,
    /// Acceleration at node 2, arriving along segment 1.
    Segment1End,
}

impl ConstraintId {
    pub const ALL: [ConstraintId; NUM_CONSTRAINTS] = [
        ConstraintId::Segment0Start,
        ConstraintId::Segment0End,
        ConstraintId::Segment1Start,
        ConstraintId::Segment1End,
    ];

    pub fn index(self) -> usize {
        match self {
            ConstraintId::Segment0Start => 0,
            ConstraintId::Segment0End => 1,
            ConstraintId::Segment1Start => 2,
            ConstraintId::Segment1End => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConstraintId::Segment0Start => "segment 0 start acceleration",
            ConstraintId::Segment0End => "segment 0 end acceleration",
            ConstraintId::Segment1Start => "segment 1 start acceleration",
            ConstraintId::Segment1End => "segment 1 end acceleration",
        }
    }

    pub fn segment(self) -> SegmentIndex {
        match self {
            ConstraintId::Segment0Start | ConstraintId::Segment0End => SegmentIndex::First,
            ConstraintId::Segment1Start | ConstraintId::Segment1End => SegmentIndex::Second,
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            ConstraintId::Segment0Start | ConstraintId::Segment1Start => Endpoint::Start,
            ConstraintId::Segment0End | ConstraintId::Segment1End => Endpoint::End,
        }
    }
}

impl TryFrom<usize> for ConstraintId {
    type Error = MotionError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        ConstraintId::ALL
            .get(index)
            .copied()
            .ok_or(MotionError::InvalidConstraintIndex(index))
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.label())
    }
}

/// Error and gradient of one constraint at one trajectory state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintEvaluation {
    pub id: ConstraintId,
    /// `a² - limit²`; feasible when `<= 0`.
    pub error: f64,
    /// d(error)/d[duration0, duration1, vel1]
    pub gradient: FreeVars,
}

impl ConstraintEvaluation {
    pub fn is_violated(&self) -> bool {
        self.error > 0.0
    }
}

/// Evaluate a single constraint.
pub fn evaluate(id: ConstraintId, traj: &Trajectory, acceleration_limit: f64) -> ConstraintEvaluation {
    let segment = id.segment();
    let endpoint = id.endpoint();
    let curve = traj.segment(segment);

    let a = curve.acceleration_at_endpoint(endpoint);
    let da_dh = curve.acceleration_dh(endpoint);
    let (da_dv_start, da_dv_end) = curve.acceleration_dv(endpoint);

    // vel1 ends segment 0 and starts segment 1
    let da_dvel1 = match segment {
        SegmentIndex::First => da_dv_end,
        SegmentIndex::Second => da_dv_start,
    };

    let mut gradient = Vector3::zeros();
    gradient[segment.duration_slot()] = 2.0 * a * da_dh;
    gradient[VEL1] = 2.0 * a * da_dvel1;

    ConstraintEvaluation {
        id,
        error: a * a - acceleration_limit * acceleration_limit,
        gradient,
    }
}

/// Evaluate all four constraints.
pub fn evaluate_all(traj: &Trajectory, acceleration_limit: f64) -> ConstraintReport {
    ConstraintReport {
        evaluations: ConstraintId::ALL.map(|id| evaluate(id, traj, acceleration_limit)),
    }
}

/// The errors and gradients of all constraints at one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintReport {
    evaluations: [ConstraintEvaluation; NUM_CONSTRAINTS],
}

impl ConstraintReport {
    pub fn get(&self, id: ConstraintId) -> &ConstraintEvaluation {
        &self.evaluations[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintEvaluation> {
        self.evaluations.iter()
    }

    pub fn errors(&self) -> [f64; NUM_CONSTRAINTS] {
        self.evaluations.map(|e| e.error)
    }

    pub fn gradients(&self) -> [[f64; NUM_FREE_VARS]; NUM_CONSTRAINTS] {
        self.evaluations.map(|e| [e.gradient[0], e.gradient[1], e.gradient[2]])
    }

    pub fn is_feasible(&self) -> bool {
        self.evaluations.iter().all(|e| !e.is_violated())
    }

    /// Largest constraint error; positive means infeasible.
    pub fn worst_error(&self) -> f64 {
        self.evaluations.iter().map(|e| e.error).fold(f64::NEG_INFINITY, f64::max)
    }
}

/// A subset of the constraints selected for one solver step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSet {
    ids: Vec<ConstraintId>,
}

impl ActiveSet {
    /// Constraints with `error > 0`.
    pub fn violated(report: &ConstraintReport) -> Self {
        Self::select(report, |e| e.error > 0.0)
    }

    /// Constraints with `error > -tolerance`: violated or about to be.
    pub fn near_active(report: &ConstraintReport, tolerance: f64) -> Self {
        Self::select(report, |e| e.error > -tolerance)
    }

    fn select(report: &ConstraintReport, keep: impl Fn(&ConstraintEvaluation) -> bool) -> Self {
        Self {
            ids: report.iter().filter(|&e| keep(e)).map(|e| e.id).collect(),
        }
    }

    pub fn ids(&self) -> &[ConstraintId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// |S|×3 matrix whose rows are the selected gradients.
    pub fn jacobian(&self, report: &ConstraintReport) -> DMatrix<f64> {
        DMatrix::from_fn(self.ids.len(), NUM_FREE_VARS, |row, col| {
            report.get(self.ids[row]).gradient[col]
        })
    }

    /// The selected errors, in selection order.
    pub fn errors(&self, report: &ConstraintReport) -> DVector<f64> {
        DVector::from_iterator(self.ids.len(), self.ids.iter().map(|&id| report.get(id).error))
    }

    /// Scatter per-selection values back into constraint order, 0 elsewhere.
    pub fn scatter(&self, values: &DVector<f64>) -> [f64; NUM_CONSTRAINTS] {
        let mut out = [0.0; NUM_CONSTRAINTS];
        for (j, id) in self.ids.iter().enumerate() {
            out[id.index()] = values[j];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LIMIT: f64 = 100.0;

    fn skewed() -> Trajectory {
        Trajectory {
            vel0: 12.0,
            vel1: -7.5,
            vel2: 4.0,
            pos1: 170.0,
            duration0: 2.9,
            duration1: 3.7,
            ..Trajectory::init()
        }
    }

    #[test]
    fn test_baseline_sits_on_the_limit() {
        let report = evaluate_all(&Trajectory::init(), LIMIT);
        let accel = Trajectory::init().boundary_accelerations();
        assert_relative_eq!(accel[0], 100.0, epsilon = 1e-3);
        for error in report.errors() {
            assert!(error.abs() < 0.05, "baseline error {} not near zero", error);
        }
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let traj = skewed();
        let step = 1e-6;
        for id in ConstraintId::ALL {
            let analytic = evaluate(id, &traj, LIMIT).gradient;
            for k in 0..NUM_FREE_VARS {
                let mut delta = Vector3::zeros();
                delta[k] = step;
                let mut plus = traj;
                plus.apply_step(&delta);
                let mut minus = traj;
                minus.apply_step(&-delta);
                let numeric = (evaluate(id, &plus, LIMIT).error - evaluate(id, &minus, LIMIT).error)
                    / (2.0 * step);
                assert_relative_eq!(analytic[k], numeric, epsilon = 1e-3, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_gradient_has_structural_zero_in_other_duration() {
        let report = evaluate_all(&skewed(), LIMIT);
        for eval in report.iter() {
            let other = match eval.id.segment() {
                SegmentIndex::First => SegmentIndex::Second,
                SegmentIndex::Second => SegmentIndex::First,
            };
            assert_eq!(eval.gradient[other.duration_slot()], 0.0);
        }
    }

    #[test]
    fn test_try_from_index() {
        assert_eq!(ConstraintId::try_from(2), Ok(ConstraintId::Segment1Start));
        assert_eq!(ConstraintId::try_from(4), Err(MotionError::InvalidConstraintIndex(4)));
    }

    #[test]
    fn test_active_set_selection() {
        // vel0 = -3, vel1 = 2 pushes only the segment 0 start acceleration over the limit
        let traj = Trajectory { vel0: -3.0, vel1: 2.0, ..Trajectory::init() };
        let report = evaluate_all(&traj, LIMIT);
        let violated = ActiveSet::violated(&report);
        assert_eq!(violated.ids(), &[ConstraintId::Segment0Start]);

        let everything = ActiveSet::near_active(&report, 1e6);
        assert_eq!(everything.len(), NUM_CONSTRAINTS);
        let jac = everything.jacobian(&report);
        assert_eq!(jac.shape(), (4, 3));
        assert_eq!(jac[(2, 2)], report.get(ConstraintId::Segment1Start).gradient[VEL1]);

        let scattered = violated.scatter(&DVector::from_element(1, 5.0));
        assert_eq!(scattered, [5.0, 0.0, 0.0, 0.0]);
    }
}
