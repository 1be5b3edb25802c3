// src/diagnostics.rs - Human-readable constraint and state reports
use crate::motion::constraints::{ConstraintReport, NUM_CONSTRAINTS};
use crate::motion::trajectory::{FreeVars, Trajectory};

/// Space-prefixed list of the components of a free-variable vector.
pub fn format_vector(v: &FreeVars) -> String {
    v.iter().map(|x| format!(" {:.4}", x)).collect()
}

/// One line per constraint: `*` marks violated ones, then the gradient
/// components and the error.
///
/// ```text
/// *0: -11950.1123 0.0000 -118.1369 | 467.2328
///  1: 1938.4210 0.0000 -265.8123 | -115.1182
/// ```
pub fn format_constraints(report: &ConstraintReport) -> String {
    let mut out = String::new();
    for eval in report.iter() {
        let flag = if eval.is_violated() { '*' } else { ' ' };
        out.push_str(&format!(
            "{}{}:{} | {:.4}\n",
            flag,
            eval.id.index(),
            format_vector(&eval.gradient),
            eval.error
        ));
    }
    out
}

/// Like [`format_constraints`] with each error followed by the multiplier the
/// solver assigned to that constraint.
pub fn format_multipliers(report: &ConstraintReport, multipliers: &[f64; NUM_CONSTRAINTS]) -> String {
    let mut out = String::new();
    for eval in report.iter() {
        let flag = if eval.is_violated() { '*' } else { ' ' };
        out.push_str(&format!(
            "{}{}:{} | {:.4} x {:.6e}\n",
            flag,
            eval.id.index(),
            format_vector(&eval.gradient),
            eval.error,
            multipliers[eval.id.index()]
        ));
    }
    out
}

/// Node states, durations and the constraint table.
pub fn format_state(traj: &Trajectory, report: &ConstraintReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Node 0: pos={:.4} vel={:.4}\n", traj.pos0, traj.vel0));
    out.push_str(&format!("Node 1: pos={:.4} vel={:.4}\n", traj.pos1, traj.vel1));
    out.push_str(&format!("Node 2: pos={:.4} vel={:.4}\n", traj.pos2, traj.vel2));
    out.push_str(&format!("Duration 0: {:.4}\n", traj.duration0));
    out.push_str(&format!("Duration 1: {:.4}\n", traj.duration1));
    out.push_str("Constraints:\n");
    out.push_str(&format_constraints(report));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::constraints::evaluate_all;

    #[test]
    fn test_violated_constraints_are_flagged() {
        let traj = Trajectory { vel0: -3.0, vel1: 2.0, ..Trajectory::init() };
        let text = format_constraints(&evaluate_all(&traj, 100.0));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("*0:"));
        assert!(lines[1].starts_with(" 1:"));
        assert!(lines[2].starts_with(" 2:"));
        assert!(lines[3].starts_with(" 3:"));
        // each line carries three gradient components and the error
        assert_eq!(lines[0].split('|').next().unwrap().split_whitespace().count(), 4);
    }

    #[test]
    fn test_state_report_lists_nodes_and_durations() {
        let traj = Trajectory::init();
        let text = format_state(&traj, &evaluate_all(&traj, 100.0));
        assert!(text.contains("Node 1: pos=200.0000 vel=0.0000"));
        assert!(text.contains("Duration 1: 3.4641"));
        assert!(text.contains("Constraints:"));
    }
}
