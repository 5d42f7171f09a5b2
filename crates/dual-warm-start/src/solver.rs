//! Dual warm start driver: assembles the QP, solves it and extracts λ / μ.
//!
//! # QP Formulation
//!
//! Decision variables: `x = [λ, μ]` (see [`crate::layout`] for the ordering).
//!
//! Cost: sum over steps and obstacles of `||A_j^T λ_j||^2`, i.e.
//! `1/2 x^T P x` with `q = 0`.
//!
//! Subject to:
//! - Rotated dual feasibility: `R(heading) A_j^T λ_j + G^T μ_j = 0` (equality)
//! - Offset balance: `(t^T A_j^T - b_j^T) λ_j - g^T μ_j >= 0`
//! - `λ >= 0`, `μ >= 0`

use std::time::Instant;

use nalgebra::DMatrix;
use tracing::{debug, error, warn};

use crate::backend::{ClarabelBackend, QpBackend, QpProblem, QpStatus};
use crate::bounds::Bounds;
use crate::config::QpSettings;
use crate::constraints::assemble_constraints;
use crate::error::WarmStartError;
use crate::layout::VariableLayout;
use crate::objective::assemble_p;
use crate::problem::WarmStartProblem;
use crate::residuals::ResidualReport;
use crate::types::{CORNERS, DualWarmStart, WarmStartInputs};

/// Residual check tolerance as a multiple of the larger solver tolerance.
const RESIDUAL_TOL_FACTOR: f64 = 10.0;

/// Bookkeeping for the last successful solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveSummary {
    pub status: QpStatus,
    pub iterations: u32,
    /// Optimal cost `1/2 x^T P x`.
    pub objective: f64,
    /// Wall time of assembly + solve + extraction in microseconds.
    pub solve_time_us: u64,
    /// Present when `check_solution` is enabled.
    pub residuals: Option<ResidualReport>,
}

/// Dual variable warm start for one planning cycle.
pub struct DualVariableWarmStart<B: QpBackend = ClarabelBackend> {
    problem: WarmStartProblem,
    settings: QpSettings,
    backend: B,
    duals: DualWarmStart,
    last_summary: Option<SolveSummary>,
}

impl DualVariableWarmStart<ClarabelBackend> {
    /// Validate inputs and settings and derive the problem dimensions.
    ///
    /// # Panics
    /// If the horizon or obstacle count is not below `i32::MAX`.
    pub fn new(inputs: WarmStartInputs, settings: QpSettings) -> Result<Self, WarmStartError> {
        Self::with_backend(inputs, settings, ClarabelBackend)
    }
}

impl<B: QpBackend> DualVariableWarmStart<B> {
    /// Same as [`DualVariableWarmStart::new`] with a custom solver backend.
    pub fn with_backend(
        inputs: WarmStartInputs,
        settings: QpSettings,
        backend: B,
    ) -> Result<Self, WarmStartError> {
        settings.validate()?;
        let problem = WarmStartProblem::new(inputs)?;
        let layout = problem.layout();
        let duals = DualWarmStart::zeros(layout.edges_sum(), layout.obstacles(), layout.steps());
        Ok(Self {
            problem,
            settings,
            backend,
            duals,
            last_summary: None,
        })
    }

    /// Validated problem this instance solves.
    pub const fn problem(&self) -> &WarmStartProblem {
        &self.problem
    }

    /// Solver settings in use.
    pub const fn settings(&self) -> &QpSettings {
        &self.settings
    }

    /// Assemble `(P, q, A, l, u)` for the current inputs.
    pub fn build_qp(&self) -> QpProblem {
        let layout = self.problem.layout();
        let p = assemble_p(&self.problem);
        let a = assemble_constraints(&self.problem, self.settings.rotation);
        let bounds = Bounds::new(layout, self.settings.infinity);
        debug!(
            p_nnz = p.nzval.len(),
            a_nnz = a.nzval.len(),
            rows = a.m,
            cols = a.n,
            "dual warm start QP assembled"
        );
        QpProblem {
            p,
            q: vec![0.0; layout.num_variables()],
            a,
            bounds,
            infinity: self.settings.infinity,
        }
    }

    /// Solve the warm start QP. Returns whether usable duals were produced.
    ///
    /// On failure the previous results are kept and the solver status is
    /// logged.
    pub fn optimize(&mut self) -> bool {
        self.try_optimize().is_ok()
    }

    /// Solve the warm start QP, reporting why it failed.
    pub fn try_optimize(&mut self) -> Result<SolveSummary, WarmStartError> {
        let start = Instant::now();
        let layout = self.problem.layout().clone();

        // Nothing to warm start without obstacles.
        if layout.num_variables() == 0 {
            let summary = SolveSummary {
                status: QpStatus::Solved,
                iterations: 0,
                objective: 0.0,
                solve_time_us: elapsed_us(start),
                residuals: None,
            };
            self.duals = DualWarmStart::zeros(0, 0, layout.steps());
            self.last_summary = Some(summary);
            return Ok(summary);
        }

        let qp = self.build_qp();
        let outcome = self.backend.solve(&qp, &self.settings);

        if !outcome.status.is_success() {
            error!(
                status = %outcome.status,
                "dual warm start QP unsuccessful, return status: {}",
                outcome.status
            );
            return Err(WarmStartError::SolverFailed {
                status: outcome.status,
            });
        }
        if outcome.x.len() != layout.num_variables() {
            error!(
                expected = layout.num_variables(),
                got = outcome.x.len(),
                "dual warm start solution has wrong length"
            );
            return Err(WarmStartError::SolutionLength {
                expected: layout.num_variables(),
                got: outcome.x.len(),
            });
        }

        let duals = extract_duals(&layout, &outcome.x);

        let residuals = self.settings.check_solution.then(|| {
            let report = ResidualReport::evaluate(&qp.a, &layout, &duals);
            let tol = residual_tolerance(&self.settings);
            if report.is_feasible(tol) {
                debug!(%report, "dual warm start residuals");
            } else {
                warn!(%report, tol, "dual warm start residuals exceed tolerance");
            }
            report
        });

        self.duals = duals;
        let summary = SolveSummary {
            status: outcome.status,
            iterations: outcome.iterations,
            objective: outcome.objective,
            solve_time_us: elapsed_us(start),
            residuals,
        };
        debug!(
            status = %summary.status,
            iterations = summary.iterations,
            objective = summary.objective,
            solve_time_us = summary.solve_time_us,
            "dual warm start solved"
        );
        self.last_summary = Some(summary);
        Ok(summary)
    }

    /// Copies of the λ and μ warm start matrices.
    ///
    /// Zero matrices until the first successful solve.
    pub fn optimization_results(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        (self.duals.lambda.clone(), self.duals.mu.clone())
    }

    /// λ, `sum(edges) x (horizon + 1)`.
    pub const fn lambda(&self) -> &DMatrix<f64> {
        &self.duals.lambda
    }

    /// μ, `4 * obstacles x (horizon + 1)`.
    pub const fn mu(&self) -> &DMatrix<f64> {
        &self.duals.mu
    }

    /// Both dual matrices.
    pub const fn duals(&self) -> &DualWarmStart {
        &self.duals
    }

    /// Summary of the last successful solve, if any.
    pub const fn last_summary(&self) -> Option<&SolveSummary> {
        self.last_summary.as_ref()
    }
}

/// Split the primal vector into λ and μ following the canonical ordering.
pub fn extract_duals(layout: &VariableLayout, x: &[f64]) -> DualWarmStart {
    assert_eq!(x.len(), layout.num_variables(), "primal vector length");
    let mut duals = DualWarmStart::zeros(layout.edges_sum(), layout.obstacles(), layout.steps());
    for step in 0..layout.steps() {
        for j in 0..layout.obstacles() {
            let first_edge = layout.edge_offset(j);
            for k in 0..layout.edges(j) {
                duals.lambda[(first_edge + k, step)] = x[layout.lambda_index(step, j, k)];
            }
            for c in 0..CORNERS {
                duals.mu[(CORNERS * j + c, step)] = x[layout.mu_index(step, j, c)];
            }
        }
    }
    duals
}

fn residual_tolerance(settings: &QpSettings) -> f64 {
    RESIDUAL_TOL_FACTOR * settings.eps_abs.max(settings.eps_rel)
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
