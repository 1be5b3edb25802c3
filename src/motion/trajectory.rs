// src/motion/trajectory.rs - Two-segment cubic Hermite trajectory
//! Trajectory state for a three-node, two-segment, one-dimensional path.
//!
//! Each segment is a cubic Hermite interpolation between the position and
//! velocity of its two boundary nodes over a duration `h`. The optimization
//! moves three free variables (`duration0`, `duration1`, `vel1`); the other
//! five quantities are fixed boundary parameters. `pos1` is adjustable by the
//! user but is never moved by the solver.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::MotionError;

/// Flat view of the free variables, ordered `[duration0, duration1, vel1]`.
pub type FreeVars = Vector3<f64>;

/// Slot of `duration0` in [`FreeVars`].
pub const DURATION0: usize = 0;
/// Slot of `duration1` in [`FreeVars`].
pub const DURATION1: usize = 1;
/// Slot of `vel1` in [`FreeVars`].
pub const VEL1: usize = 2;

/// Number of free variables.
pub const NUM_FREE_VARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Time span of segment 0 (s). Expected > 0, not enforced.
    pub duration0: f64,

    /// Time span of segment 1 (s). Expected > 0, not enforced.
    pub duration1: f64,

    /// Velocity at node 1.
    pub vel1: f64,

    /// Position at node 0.
    pub pos0: f64,

    /// Velocity at node 0.
    pub vel0: f64,

    /// Position at node 1. User-adjustable, not a decision variable.
    pub pos1: f64,

    /// Position at node 2.
    pub pos2: f64,

    /// Velocity at node 2.
    pub vel2: f64,
}

/// Identifies one of the two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentIndex {
    /// Node 0 to node 1, spanning `duration0`.
    First,
    /// Node 1 to node 2, spanning `duration1`.
    Second,
}

impl SegmentIndex {
    pub const ALL: [SegmentIndex; 2] = [SegmentIndex::First, SegmentIndex::Second];

    pub fn index(self) -> usize {
        match self {
            SegmentIndex::First => 0,
            SegmentIndex::Second => 1,
        }
    }

    /// Slot of this segment's duration in [`FreeVars`].
    pub fn duration_slot(self) -> usize {
        match self {
            SegmentIndex::First => DURATION0,
            SegmentIndex::Second => DURATION1,
        }
    }
}

/// Which end of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// Cubic Hermite segment between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermiteSegment {
    pub start_pos: f64,
    pub start_vel: f64,
    pub end_pos: f64,
    pub end_vel: f64,
    pub duration: f64,
}

/// Motion state at a specific time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Time since the start of the trajectory (s)
    pub time: f64,

    /// Position at this time
    pub position: f64,

    /// Velocity at this time
    pub velocity: f64,

    /// Acceleration at this time
    pub acceleration: f64,

    /// Segment the sample belongs to (0 or 1)
    pub segment: usize,
}

impl HermiteSegment {
    fn delta_pos(&self) -> f64 {
        self.end_pos - self.start_pos
    }

    /// Acceleration at `t = 0`.
    pub fn start_acceleration(&self) -> f64 {
        let h = self.duration;
        (self.delta_pos() * 6.0 / h - 4.0 * self.start_vel - 2.0 * self.end_vel) / h
    }

    /// Acceleration at `t = h`.
    pub fn end_acceleration(&self) -> f64 {
        let h = self.duration;
        (-self.delta_pos() * 6.0 / h + 2.0 * self.start_vel + 4.0 * self.end_vel) / h
    }

    pub fn acceleration_at_endpoint(&self, endpoint: Endpoint) -> f64 {
        match endpoint {
            Endpoint::Start => self.start_acceleration(),
            Endpoint::End => self.end_acceleration(),
        }
    }

    /// d(start_acceleration)/dh
    pub fn start_acceleration_dh(&self) -> f64 {
        let h = self.duration;
        (self.delta_pos() * -12.0 / h + 4.0 * self.start_vel + 2.0 * self.end_vel) / (h * h)
    }

    /// d(end_acceleration)/dh
    pub fn end_acceleration_dh(&self) -> f64 {
        let h = self.duration;
        (self.delta_pos() * 12.0 / h - 2.0 * self.start_vel - 4.0 * self.end_vel) / (h * h)
    }

    pub fn acceleration_dh(&self, endpoint: Endpoint) -> f64 {
        match endpoint {
            Endpoint::Start => self.start_acceleration_dh(),
            Endpoint::End => self.end_acceleration_dh(),
        }
    }

    /// Partial of the endpoint acceleration with respect to the start and end
    /// velocities, as `(d/d start_vel, d/d end_vel)`.
    pub fn acceleration_dv(&self, endpoint: Endpoint) -> (f64, f64) {
        let h = self.duration;
        match endpoint {
            Endpoint::Start => (-4.0 / h, -2.0 / h),
            Endpoint::End => (2.0 / h, 4.0 / h),
        }
    }

    /// Constant third derivative of the cubic.
    pub fn jerk(&self) -> f64 {
        let h = self.duration;
        (self.end_vel - self.start_vel) * (2.0 / (h * h)) - self.start_acceleration() * (2.0 / h)
    }

    pub fn position_at(&self, t: f64) -> f64 {
        let a0 = self.start_acceleration();
        let j = self.jerk();
        self.start_pos + (self.start_vel + (a0 + j * (t / 3.0)) * (t / 2.0)) * t
    }

    pub fn velocity_at(&self, t: f64) -> f64 {
        self.start_vel + (self.start_acceleration() + self.jerk() * (t / 2.0)) * t
    }

    pub fn acceleration_at(&self, t: f64) -> f64 {
        self.start_acceleration() + self.jerk() * t
    }
}

impl Trajectory {
    /// Baseline trajectory: nodes at 0/200/400 at rest, both segments
    /// ~sqrt(12) s long, which puts every endpoint acceleration at the 100
    /// unit limit.
    pub fn init() -> Self {
        Self {
            duration0: 3.4641,
            duration1: 3.4641,
            vel1: 0.0,
            pos0: 0.0,
            vel0: 0.0,
            pos1: 200.0,
            pos2: 400.0,
            vel2: 0.0,
        }
    }

    pub fn free_vars(&self) -> FreeVars {
        Vector3::new(self.duration0, self.duration1, self.vel1)
    }

    pub fn set_free_vars(&mut self, vars: &FreeVars) {
        self.duration0 = vars[DURATION0];
        self.duration1 = vars[DURATION1];
        self.vel1 = vars[VEL1];
    }

    /// Adds `step` to the free variables.
    pub fn apply_step(&mut self, step: &FreeVars) {
        let vars = self.free_vars() + step;
        self.set_free_vars(&vars);
    }

    pub fn duration(&self, segment: SegmentIndex) -> f64 {
        match segment {
            SegmentIndex::First => self.duration0,
            SegmentIndex::Second => self.duration1,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.duration0 + self.duration1
    }

    pub fn segment(&self, segment: SegmentIndex) -> HermiteSegment {
        match segment {
            SegmentIndex::First => HermiteSegment {
                start_pos: self.pos0,
                start_vel: self.vel0,
                end_pos: self.pos1,
                end_vel: self.vel1,
                duration: self.duration0,
            },
            SegmentIndex::Second => HermiteSegment {
                start_pos: self.pos1,
                start_vel: self.vel1,
                end_pos: self.pos2,
                end_vel: self.vel2,
                duration: self.duration1,
            },
        }
    }

    /// The four endpoint accelerations, in constraint order.
    pub fn boundary_accelerations(&self) -> [f64; 4] {
        let first = self.segment(SegmentIndex::First);
        let second = self.segment(SegmentIndex::Second);
        [
            first.start_acceleration(),
            first.end_acceleration(),
            second.start_acceleration(),
            second.end_acceleration(),
        ]
    }

    /// Sample position, velocity and acceleration along both segments.
    ///
    /// Each segment contributes `samples_per_segment` evenly spaced samples
    /// starting at its own `t = 0`; a final sample at the end of the second
    /// segment closes the profile.
    pub fn sample(&self, samples_per_segment: usize) -> Result<Vec<MotionState>, MotionError> {
        if samples_per_segment == 0 {
            return Err(MotionError::InvalidSampleCount);
        }
        for segment in SegmentIndex::ALL {
            let duration = self.duration(segment);
            if duration <= 0.0 {
                return Err(MotionError::NonPositiveDuration {
                    segment: segment.index(),
                    duration,
                });
            }
        }

        let mut states = Vec::with_capacity(2 * samples_per_segment + 1);
        let mut offset = 0.0;
        for segment in SegmentIndex::ALL {
            let curve = self.segment(segment);
            for j in 0..samples_per_segment {
                let t = curve.duration * j as f64 / samples_per_segment as f64;
                states.push(MotionState {
                    time: offset + t,
                    position: curve.position_at(t),
                    velocity: curve.velocity_at(t),
                    acceleration: curve.acceleration_at(t),
                    segment: segment.index(),
                });
            }
            offset += curve.duration;
        }

        let last = self.segment(SegmentIndex::Second);
        states.push(MotionState {
            time: offset,
            position: last.end_pos,
            velocity: last.end_vel,
            acceleration: last.end_acceleration(),
            segment: SegmentIndex::Second.index(),
        });

        tracing::debug!("Sampled {} motion states over {:.4}s", states.len(), offset);
        Ok(states)
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::init()
    }
}
