// Integration tests for the editing session and command layer

#[cfg(test)]
mod tests {
    use hermite_path::session::{Direction, Parameter};
    use hermite_path::{Command, Config, ConstraintId, Outcome, Session, Trajectory};

    fn session() -> Session {
        Session::new(Config::default()).unwrap()
    }

    #[test]
    fn test_session_starts_at_baseline() {
        let session = session();
        assert_eq!(*session.trajectory(), Trajectory::init());
        assert_eq!(session.solver().acceleration_limit(), 100.0);
    }

    #[test]
    fn test_shortening_a_segment_then_repairing_it() {
        let mut session = session();
        for _ in 0..3 {
            session.apply(Command::Adjust(Parameter::Duration0, Direction::Decrease)).unwrap();
        }
        let report = session.solver().evaluate_all(session.trajectory());
        assert!(report.get(ConstraintId::Segment0Start).error > 1000.0);

        for _ in 0..6 {
            session.apply(Command::MoveTowardFeasibility).unwrap();
        }
        let report = session.solver().evaluate_all(session.trajectory());
        assert!(report.worst_error() < 1e-3);
    }

    #[test]
    fn test_fixup_command_only_touches_free_variables() {
        let mut session = session();
        session.apply_line("pos1 +").unwrap();
        session.apply_line("pos1 +").unwrap();
        let before = *session.trajectory();
        let outcome = session.apply_line("fixup 0").unwrap();
        let Outcome::Fixup(step) = outcome else {
            panic!("expected a fixup outcome");
        };
        assert!(!step.is_noop());
        let after = session.trajectory();
        assert_eq!(after.pos1, before.pos1);
        assert_ne!(after.duration0, before.duration0);
        assert_eq!(after.duration1, before.duration1);
    }

    #[test]
    fn test_optimize_reaches_minimum_time() {
        let mut session = session();
        {
            let traj = session.trajectory_mut();
            traj.duration0 = 5.0;
            traj.duration1 = 5.0;
        }
        let summary = session.optimize(10);
        assert_eq!(summary.iterations, 10);
        assert_eq!(summary.gradient_steps, 10);
        assert_eq!(summary.initial_duration, 10.0);
        // both segments end up at sqrt(12) with every acceleration on the limit
        assert!((summary.final_duration - 4.0 * 3.0_f64.sqrt()).abs() < 1e-3);
        assert!(summary.worst_error < 1e-3);
    }

    #[test]
    fn test_state_report_flags_violations() {
        let mut session = session();
        session.apply_line("duration0 -").unwrap();
        let Outcome::State(text) = session.apply_line("state").unwrap() else {
            panic!("expected a state outcome");
        };
        assert!(text.contains("Duration 0: 3.3641"));
        assert!(text.contains("*0:"));
        assert!(text.contains("*1:"));
    }

    #[test]
    fn test_sample_uses_configured_resolution() {
        let mut config = Config::default();
        config.output.samples_per_segment = 4;
        let session = Session::new(config).unwrap();
        let states = session.sample().unwrap();
        assert_eq!(states.len(), 9);
        assert_eq!(states[4].segment, 1);
        assert_eq!(states[4].position, 200.0);
    }
}
