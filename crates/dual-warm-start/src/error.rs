use thiserror::Error;

use crate::backend::QpStatus;

/// Top-level error type for dual-warm-start.
#[derive(Debug, Error)]
pub enum WarmStartError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Dual warm start QP unsuccessful, status: {status}")]
    SolverFailed { status: QpStatus },

    #[error("Solver returned {got} primal values, expected {expected}")]
    SolutionLength { expected: usize, got: usize },
}

/// Solver tuning configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid relaxation: {0} (must be in (0, 2))")]
    InvalidRelaxation(f64),

    #[error("Invalid tolerance {field}: {value} (must be finite and >= 0)")]
    InvalidTolerance { field: &'static str, value: f64 },

    #[error("eps_abs and eps_rel cannot both be zero")]
    ZeroTolerances,

    #[error("max_iter must be > 0")]
    ZeroMaxIter,

    #[error("Invalid infinity surrogate: {0} (must be finite and > 0)")]
    InvalidInfinity(f64),
}

/// Problem input validation errors.
///
/// Copy + static messages so they can be compared directly in tests.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InputError {
    #[error("Edge count vector length {got} does not match obstacle count {expected}")]
    ObstacleCountMismatch { expected: usize, got: usize },

    #[error("Obstacle {obstacle} has zero edges")]
    EmptyObstacle { obstacle: usize },

    #[error("Obstacle A matrix must have 2 columns, got {0}")]
    HalfPlaneColumns(usize),

    #[error("Obstacle {matrix} has {got} rows, expected {expected} (sum of edge counts)")]
    HalfPlaneRows {
        matrix: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Trajectory has {got} poses, expected horizon + 1 = {expected}")]
    TrajectoryLength { expected: usize, got: usize },

    #[error("Invalid sampling interval: {0} (must be finite and > 0)")]
    InvalidSamplingInterval(f64),

    #[error("Invalid ego extent {index}: {value} (must be finite and >= 0)")]
    InvalidEgoExtent { index: usize, value: f64 },

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}
