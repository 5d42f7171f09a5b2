//! Dual variable warm start for open-space trajectory optimization.
//!
//! The distance-based collision avoidance formulation of an open-space
//! planner needs dual multipliers for every obstacle at every step of the
//! horizon:
//!
//! - **λ** (one per obstacle edge) for the obstacle polytope `A_j x <= b_j`
//! - **μ** (four per obstacle) for the rectangular vehicle footprint
//!
//! Given a coarse trajectory, this crate finds multipliers that satisfy the
//! dual feasibility conditions while keeping `||A_j^T λ_j||` small by solving
//! one convex QP per planning cycle.
//!
//! # Architecture
//!
//! 1. **Problem** validates the inputs and derives the variable layout
//! 2. **Objective / Constraints / Bounds** assemble `P`, `A`, `l`, `u` in CSC
//! 3. **Backend** solves the QP (Clarabel by default, any [`QpBackend`] works)
//! 4. **Solver** drives a cycle and splits the primal vector into λ and μ
//!
//! All assemblers share one [`VariableLayout`], so the objective, the
//! constraint rows and the extraction always agree on the ordering.

pub mod backend;
pub mod bounds;
pub mod config;
pub mod constraints;
pub mod error;
pub mod layout;
pub mod objective;
pub mod problem;
pub mod residuals;
pub mod solver;
pub mod sparse;
pub mod types;

pub use backend::{ClarabelBackend, QpBackend, QpOutcome, QpProblem, QpStatus};
pub use bounds::Bounds;
pub use config::{QpSettings, RotationConvention};
pub use error::{ConfigError, InputError, WarmStartError};
pub use layout::VariableLayout;
pub use problem::WarmStartProblem;
pub use residuals::ResidualReport;
pub use solver::{DualVariableWarmStart, SolveSummary, extract_duals};
pub use types::{DualWarmStart, EgoExtents, ObstacleSet, Pose2, WarmStartInputs};
