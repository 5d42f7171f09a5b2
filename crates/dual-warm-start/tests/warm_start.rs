//! Integration test: full assemble → solve → extract cycles through Clarabel.
//!
//! Scenarios:
//! 1. Single step, square obstacle, 4 m x 2 m ego at the origin
//! 2. Three steps with one 4-edge obstacle (result shapes)
//! 3. Mixed polygons with both rotation conventions
//! 4. Failure through a backend reporting infeasibility
//! 5. Settings loaded from a TOML file

use approx::assert_relative_eq;
use dual_warm_start::{
    DualVariableWarmStart, EgoExtents, ObstacleSet, Pose2, QpBackend, QpOutcome, QpProblem,
    QpSettings, QpStatus, ResidualReport, RotationConvention, WarmStartError, WarmStartInputs,
};
use nalgebra::{DMatrix, DVector};

/// Duals may dip below zero by roughly the solver tolerance.
const NONNEG_TOL: f64 = 1e-6;
const RESIDUAL_TOL: f64 = 1e-4;

fn square_obstacle() -> ObstacleSet {
    let mut obstacles = ObstacleSet::empty();
    obstacles.push_box(6.0, 8.0, -1.0, 1.0);
    obstacles
}

fn single_step_inputs() -> WarmStartInputs {
    WarmStartInputs {
        horizon: 0,
        ts: 0.1,
        ego: EgoExtents::centered(4.0, 2.0),
        obstacles_num: 1,
        obstacles: square_obstacle(),
        trajectory: vec![Pose2::new(0.0, 0.0, 0.0)],
    }
}

fn assert_nonnegative(m: &DMatrix<f64>) {
    for &v in m.iter() {
        assert!(v >= -NONNEG_TOL, "negative dual entry {v}");
    }
}

fn residuals<B: QpBackend>(ws: &DualVariableWarmStart<B>) -> ResidualReport {
    let qp = ws.build_qp();
    ResidualReport::evaluate(&qp.a, ws.problem().layout(), ws.duals())
}

#[test]
fn single_step_square_obstacle() {
    let mut ws = DualVariableWarmStart::new(single_step_inputs(), QpSettings::default()).unwrap();
    assert!(ws.optimize());

    let (lambda, mu) = ws.optimization_results();
    assert_eq!(lambda.shape(), (4, 1));
    assert_eq!(mu.shape(), (4, 1));
    assert_nonnegative(&lambda);
    assert_nonnegative(&mu);

    let report = residuals(&ws);
    assert!(
        report.rotation_residual <= RESIDUAL_TOL,
        "rotation residual {}",
        report.rotation_residual
    );
    assert!(report.min_offset_balance >= -RESIDUAL_TOL, "{report}");

    let summary = ws.last_summary().unwrap();
    assert!(summary.status.is_success());
    assert!(summary.iterations > 0);
    assert!(summary.objective >= -RESIDUAL_TOL);
}

#[test]
fn three_step_result_shapes() {
    let inputs = WarmStartInputs {
        horizon: 2,
        ts: 0.5,
        ego: EgoExtents::new(3.5, 1.0, 1.0, 1.0),
        obstacles_num: 1,
        obstacles: square_obstacle(),
        trajectory: vec![
            Pose2::new(0.0, 0.0, 0.0),
            Pose2::new(0.5, 0.2, 0.1),
            Pose2::new(1.0, 0.5, 0.2),
        ],
    };
    let mut ws = DualVariableWarmStart::new(inputs, QpSettings::default()).unwrap();
    assert!(ws.optimize());

    let (lambda, mu) = ws.optimization_results();
    assert_eq!(lambda.shape(), (4, 3));
    assert_eq!(mu.shape(), (4, 3));
    assert_nonnegative(&lambda);
    assert_nonnegative(&mu);
    assert!(residuals(&ws).is_feasible(RESIDUAL_TOL));
}

#[test]
fn fetching_results_is_idempotent() {
    let mut ws = DualVariableWarmStart::new(single_step_inputs(), QpSettings::default()).unwrap();
    assert!(ws.optimize());
    let first = ws.optimization_results();
    let second = ws.optimization_results();
    assert_eq!(first, second);
    assert_eq!(&first.0, ws.lambda());
    assert_eq!(&first.1, ws.mu());
}

fn mixed_polygons() -> ObstacleSet {
    // triangle ahead-left
    let tri_a = DMatrix::from_row_slice(3, 2, &[0.0, -1.0, 1.0, 1.0, -1.0, 1.0]);
    let tri_b = DVector::from_column_slice(&[-4.0, 9.0, 1.0]);
    let mut obstacles = ObstacleSet::from_blocks(&[(tri_a, tri_b)]);
    obstacles.push_box(10.0, 12.0, -3.0, -1.5);
    obstacles
}

#[test]
fn mixed_obstacles_both_conventions() {
    for rotation in [RotationConvention::Symmetric, RotationConvention::BodyFrame] {
        let inputs = WarmStartInputs {
            horizon: 4,
            ts: 0.2,
            ego: EgoExtents::new(3.9, 1.0, 1.05, 1.05),
            obstacles_num: 2,
            obstacles: mixed_polygons(),
            trajectory: (0..5)
                .map(|i| Pose2::new(1.5 * f64::from(i), 0.0, 0.05 * f64::from(i)))
                .collect(),
        };
        let settings = QpSettings {
            rotation,
            check_solution: true,
            ..QpSettings::default()
        };
        let mut ws = DualVariableWarmStart::new(inputs, settings).unwrap();
        assert!(ws.optimize(), "{rotation:?} failed");

        assert_eq!(ws.lambda().shape(), (7, 5));
        assert_eq!(ws.mu().shape(), (8, 5));
        assert_nonnegative(ws.lambda());
        assert_nonnegative(ws.mu());

        let report = ws.last_summary().unwrap().residuals.unwrap();
        assert!(report.is_feasible(RESIDUAL_TOL), "{rotation:?}: {report}");
    }
}

/// Backend that always reports primal infeasibility.
struct InfeasibleBackend;

impl QpBackend for InfeasibleBackend {
    fn solve(&self, _problem: &QpProblem, _settings: &QpSettings) -> QpOutcome {
        QpOutcome::failed(QpStatus::PrimalInfeasible)
    }
}

#[test]
fn infeasible_solve_reports_failure() {
    let mut ws = DualVariableWarmStart::with_backend(
        single_step_inputs(),
        QpSettings::default(),
        InfeasibleBackend,
    )
    .unwrap();
    assert!(!ws.optimize());
    let err = ws.try_optimize().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dual warm start QP unsuccessful, status: primal infeasible"
    );
    assert!(ws.last_summary().is_none());
    assert!(ws.lambda().iter().chain(ws.mu().iter()).all(|&v| v == 0.0));
}

#[test]
fn settings_from_toml_file() {
    let path = std::env::temp_dir().join(format!(
        "dual-warm-start-settings-{}.toml",
        std::process::id()
    ));
    std::fs::write(
        &path,
        "eps_abs = 1e-7\neps_rel = 1e-7\nmax_iter = 200\nrotation = \"body_frame\"\n",
    )
    .unwrap();
    let settings = QpSettings::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_relative_eq!(settings.eps_abs, 1e-7);
    assert_eq!(settings.max_iter, 200);
    assert_eq!(settings.rotation, RotationConvention::BodyFrame);
    assert!(settings.polish);

    let mut ws = DualVariableWarmStart::new(single_step_inputs(), settings).unwrap();
    assert!(ws.optimize());
    assert!(residuals(&ws).is_feasible(RESIDUAL_TOL));
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut inputs = single_step_inputs();
    inputs.trajectory.push(Pose2::default());
    assert!(matches!(
        DualVariableWarmStart::new(inputs, QpSettings::default()),
        Err(WarmStartError::Input(_))
    ));
}
