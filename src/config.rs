//! # Path Repair Configuration
//!
//! Solver limits, the baseline trajectory restored by `reset`, the step sizes
//! used by interactive edits, and output options.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [solver]
//! acceleration_limit = 100.0
//! max_feasibility_steps = 8
//!
//! [baseline]
//! pos1 = 250.0
//! duration0 = 4.0
//!
//! [edit]
//! duration_step = 0.05
//! ```
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::motion::Trajectory;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the solver, baseline trajectory, edits and output.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub edit: EditConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SolverConfig {
    /// Bound on the magnitude of every segment endpoint acceleration.
    #[serde(default = "default_acceleration_limit")]
    pub acceleration_limit: f64,
    /// Feasibility steps per `optimize` iteration before giving up on that iteration.
    #[serde(default = "default_max_feasibility_steps")]
    pub max_feasibility_steps: usize,
}

/// Initial trajectory, restored by `reset`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BaselineConfig {
    #[serde(default)]
    pub pos0: f64,
    #[serde(default)]
    pub vel0: f64,
    #[serde(default = "default_pos1")]
    pub pos1: f64,
    #[serde(default)]
    pub vel1: f64,
    #[serde(default = "default_pos2")]
    pub pos2: f64,
    #[serde(default)]
    pub vel2: f64,
    #[serde(default = "default_duration")]
    pub duration0: f64,
    #[serde(default = "default_duration")]
    pub duration1: f64,
}

/// Increments applied by the `+`/`-` edit commands.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EditConfig {
    #[serde(default = "default_duration_step")]
    pub duration_step: f64,
    #[serde(default = "default_velocity_step")]
    pub velocity_step: f64,
    #[serde(default = "default_position_step")]
    pub position_step: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_samples_per_segment")]
    pub samples_per_segment: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            acceleration_limit: default_acceleration_limit(),
            max_feasibility_steps: default_max_feasibility_steps(),
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self::from(&Trajectory::init())
    }
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            duration_step: default_duration_step(),
            velocity_step: default_velocity_step(),
            position_step: default_position_step(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            samples_per_segment: default_samples_per_segment(),
        }
    }
}

impl From<&Trajectory> for BaselineConfig {
    fn from(traj: &Trajectory) -> Self {
        Self {
            pos0: traj.pos0,
            vel0: traj.vel0,
            pos1: traj.pos1,
            vel1: traj.vel1,
            pos2: traj.pos2,
            vel2: traj.vel2,
            duration0: traj.duration0,
            duration1: traj.duration1,
        }
    }
}

impl BaselineConfig {
    pub fn trajectory(&self) -> Trajectory {
        Trajectory {
            duration0: self.duration0,
            duration1: self.duration1,
            vel1: self.vel1,
            pos0: self.pos0,
            vel0: self.vel0,
            pos1: self.pos1,
            pos2: self.pos2,
            vel2: self.vel2,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.solver.acceleration_limit > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "solver.acceleration_limit must be > 0, got {}",
                self.solver.acceleration_limit
            )));
        }
        if self.solver.max_feasibility_steps == 0 {
            return Err(ConfigError::Invalid("solver.max_feasibility_steps must be >= 1".to_string()));
        }
        for (name, duration) in [
            ("baseline.duration0", self.baseline.duration0),
            ("baseline.duration1", self.baseline.duration1),
        ] {
            if !(duration > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be > 0, got {}", name, duration)));
            }
        }
        for (name, step) in [
            ("edit.duration_step", self.edit.duration_step),
            ("edit.velocity_step", self.edit.velocity_step),
            ("edit.position_step", self.edit.position_step),
        ] {
            if !(step > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be > 0, got {}", name, step)));
            }
        }
        if self.output.samples_per_segment == 0 {
            return Err(ConfigError::Invalid("output.samples_per_segment must be >= 1".to_string()));
        }
        Ok(())
    }
}

fn default_acceleration_limit() -> f64 { 100.0 }
fn default_max_feasibility_steps() -> usize { 8 }
fn default_pos1() -> f64 { 200.0 }
fn default_pos2() -> f64 { 400.0 }
fn default_duration() -> f64 { 3.4641 }
fn default_duration_step() -> f64 { 0.1 }
fn default_velocity_step() -> f64 { 1.0 }
fn default_position_step() -> f64 { 10.0 }
fn default_samples_per_segment() -> usize { 32 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.solver.acceleration_limit, 100.0);
        assert_eq!(config.solver.max_feasibility_steps, 8);
        assert_eq!(config.baseline.trajectory(), Trajectory::init());
        assert_eq!(config.edit.duration_step, 0.1);
        assert_eq!(config.edit.velocity_step, 1.0);
        assert_eq!(config.edit.position_step, 10.0);
        assert_eq!(config.output.samples_per_segment, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[solver]\nacceleration_limit = 80.0\n[baseline]\npos1 = 250.0").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.solver.acceleration_limit, 80.0);
        assert_eq!(config.baseline.pos1, 250.0);
        // Defaults for missing fields
        assert_eq!(config.baseline.pos2, 400.0);
        assert_eq!(config.baseline.duration0, 3.4641);
        assert_eq!(config.edit, EditConfig::default());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.solver.acceleration_limit = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.baseline.duration1 = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.output.samples_per_segment = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
