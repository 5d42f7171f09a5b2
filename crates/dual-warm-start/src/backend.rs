//! QP solver boundary.
//!
//! The warm start hands a convex QP in box form
//!
//! ```text
//! minimize    1/2 x^T P x + q^T x
//! subject to  l <= A x <= u
//! ```
//!
//! to a [`QpBackend`]. [`ClarabelBackend`] rewrites the box constraints into
//! Clarabel's conic form `A' x + s = b`, `s in K`: rows with `l == u` go to a
//! zero cone, finite upper bounds become `a x <= u` and finite lower bounds
//! `-a x <= -l`, all in one nonnegative cone. Everything the solver allocates
//! is owned by values local to [`ClarabelBackend::solve`] and dropped on
//! return.

use std::fmt;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT::{self, NonnegativeConeT, ZeroConeT},
};

use crate::bounds::Bounds;
use crate::config::QpSettings;
use crate::sparse::{remap_rows, upper_triangle};

/// Fraction of the maximum step Clarabel takes at relaxation 1.0.
const BASE_STEP_FRACTION: f64 = 0.99;

/// Clarabel step fraction for a relaxation setting; values above 1.0 clamp.
fn max_step_fraction(relaxation: f64) -> f64 {
    BASE_STEP_FRACTION * relaxation.min(1.0)
}

/// QP data in box-constrained form.
#[derive(Clone, Debug)]
pub struct QpProblem {
    /// Full symmetric quadratic cost (both triangles stored).
    pub p: CscMatrix<f64>,
    pub q: Vec<f64>,
    pub a: CscMatrix<f64>,
    pub bounds: Bounds,
    /// Upper bounds at or above this value are treated as +inf (and lower
    /// bounds at or below its negation as -inf).
    pub infinity: f64,
}

impl QpProblem {
    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.p.n
    }

    /// Number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.a.m
    }
}

/// Solver outcome classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QpStatus {
    Solved,
    SolvedInaccurate,
    PrimalInfeasible,
    /// Dual infeasible, i.e. the QP is unbounded.
    DualInfeasible,
    MaxIterations,
    MaxTime,
    NumericalError,
    InsufficientProgress,
    /// Terminated early from outside the solver loop.
    Interrupted,
    /// Problem or settings rejected before iterating.
    SetupFailed,
    Unsolved,
}

impl QpStatus {
    /// `Solved` and `SolvedInaccurate` are usable.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Solved | Self::SolvedInaccurate)
    }
}

impl fmt::Display for QpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Solved => "solved",
            Self::SolvedInaccurate => "solved inaccurate",
            Self::PrimalInfeasible => "primal infeasible",
            Self::DualInfeasible => "dual infeasible",
            Self::MaxIterations => "maximum iterations reached",
            Self::MaxTime => "time limit reached",
            Self::NumericalError => "numerical error",
            Self::InsufficientProgress => "insufficient progress",
            Self::Interrupted => "interrupted",
            Self::SetupFailed => "setup failed",
            Self::Unsolved => "unsolved",
        };
        f.write_str(s)
    }
}

impl From<SolverStatus> for QpStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => Self::Solved,
            SolverStatus::AlmostSolved => Self::SolvedInaccurate,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Self::PrimalInfeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Self::DualInfeasible
            }
            SolverStatus::MaxIterations => Self::MaxIterations,
            SolverStatus::MaxTime => Self::MaxTime,
            SolverStatus::NumericalError => Self::NumericalError,
            SolverStatus::InsufficientProgress => Self::InsufficientProgress,
            SolverStatus::Unsolved => Self::Unsolved,
            #[allow(unreachable_patterns)]
            _ => Self::Interrupted,
        }
    }
}

/// Result of one backend call.
#[derive(Clone, Debug)]
pub struct QpOutcome {
    pub status: QpStatus,
    /// Primal solution; meaningful only when `status.is_success()`.
    pub x: Vec<f64>,
    pub iterations: u32,
    pub objective: f64,
}

impl QpOutcome {
    /// Outcome with no solution attached.
    pub const fn failed(status: QpStatus) -> Self {
        Self {
            status,
            x: Vec::new(),
            iterations: 0,
            objective: f64::NAN,
        }
    }
}

/// Any CSC-capable convex QP solver.
pub trait QpBackend {
    fn solve(&self, problem: &QpProblem, settings: &QpSettings) -> QpOutcome;
}

/// Clarabel interior-point backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClarabelBackend;

/// Box constraints rewritten as `A' x + s = b`, `s in K`.
struct ConicForm {
    a: CscMatrix<f64>,
    b: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

fn to_conic(problem: &QpProblem) -> ConicForm {
    let Bounds { lower, upper } = &problem.bounds;
    let inf = problem.infinity;
    let m = problem.num_constraints();

    let n_eq = (0..m).filter(|&i| lower[i] == upper[i]).count();
    let mut targets: Vec<Vec<(usize, f64)>> = vec![Vec::new(); m];
    let mut b = vec![0.0; n_eq];

    let mut eq_row = 0;
    for i in (0..m).filter(|&i| lower[i] == upper[i]) {
        targets[i].push((eq_row, 1.0));
        b[eq_row] = upper[i];
        eq_row += 1;
    }
    let mut row = n_eq;
    for i in (0..m).filter(|&i| lower[i] != upper[i]) {
        if upper[i] < inf {
            targets[i].push((row, 1.0));
            b.push(upper[i]);
            row += 1;
        }
        if lower[i] > -inf {
            targets[i].push((row, -1.0));
            b.push(-lower[i]);
            row += 1;
        }
    }

    let mut cones = Vec::with_capacity(2);
    if n_eq > 0 {
        cones.push(ZeroConeT(n_eq));
    }
    if row > n_eq {
        cones.push(NonnegativeConeT(row - n_eq));
    }

    ConicForm {
        a: remap_rows(&problem.a, row, &targets),
        b,
        cones,
    }
}

impl QpBackend for ClarabelBackend {
    fn solve(&self, problem: &QpProblem, settings: &QpSettings) -> QpOutcome {
        let p_triu = upper_triangle(&problem.p);
        let conic = to_conic(problem);

        let Ok(solver_settings) = DefaultSettingsBuilder::default()
            .max_iter(settings.max_iter)
            .verbose(settings.verbose)
            .tol_gap_abs(settings.eps_abs)
            .tol_gap_rel(settings.eps_rel)
            .tol_feas(settings.eps_abs)
            .max_step_fraction(max_step_fraction(settings.relaxation))
            .iterative_refinement_enable(settings.polish)
            .build()
        else {
            return QpOutcome::failed(QpStatus::SetupFailed);
        };

        let solver_result = DefaultSolver::new(
            &p_triu,
            &problem.q,
            &conic.a,
            &conic.b,
            &conic.cones,
            solver_settings,
        );

        match solver_result {
            Ok(mut solver) => {
                solver.solve();
                let sol = &solver.solution;
                QpOutcome {
                    status: sol.status.into(),
                    x: sol.x.clone(),
                    iterations: sol.iterations,
                    objective: sol.obj_val,
                }
            }
            Err(_) => QpOutcome::failed(QpStatus::SetupFailed),
        }
    }
}
