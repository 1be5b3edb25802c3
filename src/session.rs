// src/session.rs - Owns the trajectory and applies user commands to it
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::{Config, EditConfig};
use crate::diagnostics::format_state;
use crate::motion::{
    ConstraintId, FeasibilityStep, FixupStep, GradientStep, MotionError, MotionState, PathSolver,
    Trajectory,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),
    #[error("Invalid argument for '{command}': {reason}")]
    InvalidArgument { command: String, reason: String },
}

/// Quantity targeted by an edit command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Duration0,
    Duration1,
    Vel1,
    /// Middle node position; edited by the user only, never by the solver.
    Pos1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveTowardFeasibility,
    ConstrainedGradientStep,
    Fixup(ConstraintId),
    Adjust(Parameter, Direction),
    Reset,
    ReportState,
}

impl Parameter {
    fn name(self) -> &'static str {
        match self {
            Parameter::Duration0 => "duration0",
            Parameter::Duration1 => "duration1",
            Parameter::Vel1 => "vel1",
            Parameter::Pos1 => "pos1",
        }
    }
}

impl FromStr for Command {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(name) = words.next() else {
            return Err(SessionError::UnknownCommand(s.to_string()));
        };
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(SessionError::InvalidArgument {
                command: name.to_string(),
                reason: format!("unexpected '{}'", extra),
            });
        }

        let parameter = match name {
            "duration0" => Some(Parameter::Duration0),
            "duration1" => Some(Parameter::Duration1),
            "vel1" => Some(Parameter::Vel1),
            "pos1" => Some(Parameter::Pos1),
            _ => None,
        };
        if let Some(parameter) = parameter {
            let direction = match argument {
                Some("+") => Direction::Increase,
                Some("-") => Direction::Decrease,
                other => {
                    return Err(SessionError::InvalidArgument {
                        command: name.to_string(),
                        reason: format!("expected '+' or '-', got {:?}", other),
                    });
                }
            };
            return Ok(Command::Adjust(parameter, direction));
        }

        let command = match name {
            "feasible" => Command::MoveTowardFeasibility,
            "gradient" => Command::ConstrainedGradientStep,
            "reset" => Command::Reset,
            "state" => Command::ReportState,
            "fixup" => {
                let index = argument
                    .ok_or_else(|| SessionError::InvalidArgument {
                        command: name.to_string(),
                        reason: "missing constraint index".to_string(),
                    })?
                    .parse::<usize>()
                    .map_err(|e| SessionError::InvalidArgument {
                        command: name.to_string(),
                        reason: e.to_string(),
                    })?;
                return Ok(Command::Fixup(ConstraintId::try_from(index)?));
            }
            _ => return Err(SessionError::UnknownCommand(name.to_string())),
        };
        if let Some(argument) = argument {
            return Err(SessionError::InvalidArgument {
                command: name.to_string(),
                reason: format!("unexpected '{}'", argument),
            });
        }
        Ok(command)
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Feasibility(FeasibilityStep),
    Gradient(GradientStep),
    Fixup(FixupStep),
    Adjusted { parameter: Parameter, value: f64 },
    Reset,
    State(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Feasibility(step) => write!(f, "{}", step),
            Outcome::Gradient(step) => write!(f, "{}", step),
            Outcome::Fixup(step) => write!(f, "{}", step),
            Outcome::Adjusted { parameter, value } => writeln!(f, "{} = {:.4}", parameter.name(), value),
            Outcome::Reset => writeln!(f, "Trajectory reset to baseline"),
            Outcome::State(text) => write!(f, "{}", text),
        }
    }
}

/// Summary of [`Session::optimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeSummary {
    pub iterations: usize,
    pub feasibility_steps: usize,
    pub gradient_steps: usize,
    pub initial_duration: f64,
    pub final_duration: f64,
    pub worst_error: f64,
}

impl fmt::Display for OptimizeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} iterations ({} feasibility, {} gradient steps): total duration {:.4} -> {:.4}, worst error {:.4}",
            self.iterations,
            self.feasibility_steps,
            self.gradient_steps,
            self.initial_duration,
            self.final_duration,
            self.worst_error
        )
    }
}

/// An interactive editing session over a single trajectory.
pub struct Session {
    config: Config,
    trajectory: Trajectory,
    solver: PathSolver,
}

impl Session {
    pub fn new(config: Config) -> Result<Self, SessionError> {
        config.validate()?;
        let trajectory = config.baseline.trajectory();
        let solver = PathSolver::new(config.solver.acceleration_limit);
        tracing::info!(
            "Session started with acceleration limit {}",
            config.solver.acceleration_limit
        );
        Ok(Self {
            config,
            trajectory,
            solver,
        })
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn trajectory_mut(&mut self) -> &mut Trajectory {
        &mut self.trajectory
    }

    pub fn solver(&self) -> &PathSolver {
        &self.solver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state_report(&self) -> String {
        format_state(&self.trajectory, &self.solver.evaluate_all(&self.trajectory))
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome, SessionError> {
        tracing::debug!("Applying {:?}", command);
        let outcome = match command {
            Command::MoveTowardFeasibility => {
                Outcome::Feasibility(self.solver.move_toward_feasibility(&mut self.trajectory))
            }
            Command::ConstrainedGradientStep => {
                Outcome::Gradient(self.solver.move_in_constrained_gradient_dir(&mut self.trajectory))
            }
            Command::Fixup(id) => Outcome::Fixup(self.solver.fixup_constraint(&mut self.trajectory, id)),
            Command::Adjust(parameter, direction) => {
                let value = adjust(&mut self.trajectory, &self.config.edit, parameter, direction);
                Outcome::Adjusted { parameter, value }
            }
            Command::Reset => {
                self.trajectory = self.config.baseline.trajectory();
                tracing::info!("Trajectory reset to baseline");
                Outcome::Reset
            }
            Command::ReportState => Outcome::State(self.state_report()),
        };
        Ok(outcome)
    }

    /// Parse and apply one line of text.
    pub fn apply_line(&mut self, line: &str) -> Result<Outcome, SessionError> {
        let command: Command = line.parse()?;
        self.apply(command)
    }

    /// Alternate feasibility repair and time-shrinking steps.
    ///
    /// Each iteration runs feasibility steps until no constraint is violated
    /// or `solver.max_feasibility_steps` is reached, then one constrained
    /// gradient step.
    pub fn optimize(&mut self, iterations: usize) -> OptimizeSummary {
        let max_feasibility_steps = self.config.solver.max_feasibility_steps;
        let initial_duration = self.trajectory.total_duration();
        let mut feasibility_steps = 0;
        let mut gradient_steps = 0;

        for iteration in 0..iterations {
            for _ in 0..max_feasibility_steps {
                let step = self.solver.move_toward_feasibility(&mut self.trajectory);
                if step.is_noop() {
                    break;
                }
                feasibility_steps += 1;
            }
            self.solver.move_in_constrained_gradient_dir(&mut self.trajectory);
            gradient_steps += 1;
            tracing::debug!(
                "Iteration {}: total duration {:.6}",
                iteration,
                self.trajectory.total_duration()
            );
        }

        let summary = OptimizeSummary {
            iterations,
            feasibility_steps,
            gradient_steps,
            initial_duration,
            final_duration: self.trajectory.total_duration(),
            worst_error: self.solver.evaluate_all(&self.trajectory).worst_error(),
        };
        tracing::info!("Optimization finished: {}", summary.to_string().trim_end());
        summary
    }

    /// Position/velocity/acceleration samples using the configured resolution.
    pub fn sample(&self) -> Result<Vec<MotionState>, SessionError> {
        Ok(self.trajectory.sample(self.config.output.samples_per_segment)?)
    }
}

fn adjust(traj: &mut Trajectory, edit: &EditConfig, parameter: Parameter, direction: Direction) -> f64 {
    let sign = match direction {
        Direction::Increase => 1.0,
        Direction::Decrease => -1.0,
    };
    let field = match parameter {
        Parameter::Duration0 => &mut traj.duration0,
        Parameter::Duration1 => &mut traj.duration1,
        Parameter::Vel1 => &mut traj.vel1,
        Parameter::Pos1 => &mut traj.pos1,
    };
    let step = match parameter {
        Parameter::Duration0 | Parameter::Duration1 => edit.duration_step,
        Parameter::Vel1 => edit.velocity_step,
        Parameter::Pos1 => edit.position_step,
    };
    *field += sign * step;
    *field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("feasible".parse::<Command>().unwrap(), Command::MoveTowardFeasibility);
        assert_eq!("  gradient ".parse::<Command>().unwrap(), Command::ConstrainedGradientStep);
        assert_eq!(
            "fixup 3".parse::<Command>().unwrap(),
            Command::Fixup(ConstraintId::Segment1End)
        );
        assert_eq!(
            "pos1 -".parse::<Command>().unwrap(),
            Command::Adjust(Parameter::Pos1, Direction::Decrease)
        );
        assert_eq!("reset".parse::<Command>().unwrap(), Command::Reset);
        assert_eq!("state".parse::<Command>().unwrap(), Command::ReportState);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("jump".parse::<Command>(), Err(SessionError::UnknownCommand(_))));
        assert!(matches!("".parse::<Command>(), Err(SessionError::UnknownCommand(_))));
        assert!(matches!(
            "fixup 7".parse::<Command>(),
            Err(SessionError::Motion(MotionError::InvalidConstraintIndex(7)))
        ));
        assert!(matches!("fixup".parse::<Command>(), Err(SessionError::InvalidArgument { .. })));
        assert!(matches!("fixup x".parse::<Command>(), Err(SessionError::InvalidArgument { .. })));
        assert!(matches!("vel1".parse::<Command>(), Err(SessionError::InvalidArgument { .. })));
        assert!(matches!("reset now".parse::<Command>(), Err(SessionError::InvalidArgument { .. })));
    }

    #[test]
    fn test_adjust_uses_configured_steps() {
        let mut session = Session::new(Config::default()).unwrap();
        session.apply_line("duration0 -").unwrap();
        session.apply_line("vel1 +").unwrap();
        let outcome = session.apply_line("pos1 +").unwrap();
        assert_eq!(
            outcome,
            Outcome::Adjusted { parameter: Parameter::Pos1, value: 210.0 }
        );
        let traj = session.trajectory();
        assert!((traj.duration0 - 3.3641).abs() < 1e-12);
        assert_eq!(traj.vel1, 1.0);
        assert_eq!(traj.pos1, 210.0);
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut session = Session::new(Config::default()).unwrap();
        session.apply_line("duration1 +").unwrap();
        session.apply_line("gradient").unwrap();
        assert_ne!(*session.trajectory(), Trajectory::init());
        assert_eq!(session.apply_line("reset").unwrap(), Outcome::Reset);
        assert_eq!(*session.trajectory(), Trajectory::init());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.solver.acceleration_limit = -5.0;
        assert!(matches!(Session::new(config), Err(SessionError::Config(_))));
    }
}
