//! Model configuration, read from YAML.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```yaml
//! solver:
//!   max_iterations: 50
//!   abs_tol: 1.0e-10
//! rbf_shape: 1.0
//! probe_tolerance: 1.0e-6
//! streamlines:
//!   initial_step: 0.5
//! ```

use std::path::Path;

use rf_rom::{NativeEngineConfig, NewtonConfig};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// Online Newton solve settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineSolverConfig {
    pub max_iterations: usize,
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub line_search_beta: f64,
    pub max_line_search_iters: usize,
    /// Relative perturbation of the finite-difference Jacobian.
    pub fd_epsilon: f64,
}

impl Default for OnlineSolverConfig {
    fn default() -> Self {
        let newton = NewtonConfig::default();
        Self {
            max_iterations: newton.max_iterations,
            abs_tol: newton.abs_tol,
            rel_tol: newton.rel_tol,
            line_search_beta: newton.line_search_beta,
            max_line_search_iters: newton.max_line_search_iters,
            fd_epsilon: NativeEngineConfig::default().fd_epsilon,
        }
    }
}

/// Streamline integration settings. Steps are in units of the local cell
/// length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamlineConfig {
    pub initial_step: f64,
    pub min_step: f64,
    pub max_steps: usize,
}

impl Default for StreamlineConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.5,
            min_step: 0.1,
            max_steps: 2000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub solver: OnlineSolverConfig,
    /// Gaussian RBF shape parameter for the eddy-viscosity closure.
    pub rbf_shape: f64,
    /// Distance (mesh units) within which a probe still counts as inside.
    pub probe_tolerance: f64,
    pub streamlines: StreamlineConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            solver: OnlineSolverConfig::default(),
            rbf_shape: NativeEngineConfig::default().rbf_shape,
            probe_tolerance: 1e-6,
            streamlines: StreamlineConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_yaml_str(text: &str) -> ModelResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Settings for the bundled ROM engine.
    pub fn engine_config(&self) -> NativeEngineConfig {
        let s = &self.solver;
        NativeEngineConfig {
            newton: NewtonConfig {
                max_iterations: s.max_iterations,
                abs_tol: s.abs_tol,
                rel_tol: s.rel_tol,
                line_search_beta: s.line_search_beta,
                max_line_search_iters: s.max_line_search_iters,
            },
            fd_epsilon: s.fd_epsilon,
            rbf_shape: self.rbf_shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ModelConfig::from_yaml_str(
            "solver:\n  max_iterations: 7\nstreamlines:\n  max_steps: 10\n",
        )
        .unwrap();
        assert_eq!(config.solver.max_iterations, 7);
        assert_eq!(config.solver.abs_tol, OnlineSolverConfig::default().abs_tol);
        assert_eq!(config.streamlines.max_steps, 10);
        assert_eq!(config.streamlines.initial_step, 0.5);
        assert_eq!(config.probe_tolerance, 1e-6);
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(ModelConfig::from_yaml_str("{}").unwrap(), ModelConfig::default());
    }

    #[test]
    fn engine_config_carries_solver_settings() {
        let mut config = ModelConfig::default();
        config.solver.abs_tol = 1e-6;
        config.rbf_shape = 2.5;
        let engine = config.engine_config();
        assert_eq!(engine.newton.abs_tol, 1e-6);
        assert_eq!(engine.rbf_shape, 2.5);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        assert!(matches!(
            ModelConfig::from_yaml_str("solver: [1, 2"),
            Err(crate::ModelError::Config(_))
        ));
    }
}
