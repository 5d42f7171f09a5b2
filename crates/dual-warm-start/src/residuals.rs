//! Feasibility check of extracted duals against the warm start constraints.

use std::fmt;

use clarabel::algebra::CscMatrix;

use crate::layout::VariableLayout;
use crate::sparse::mul_vec;
use crate::types::{CORNERS, DualWarmStart};

/// Constraint violation summary for one set of duals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResidualReport {
    /// `max |R A_j^T λ + G^T μ|` over all group-1 rows.
    pub rotation_residual: f64,
    /// Smallest group-2 value `(t^T A_j^T - b_j^T) λ - g^T μ`; must be `>= 0`.
    pub min_offset_balance: f64,
    /// Smallest λ entry.
    pub min_lambda: f64,
    /// Smallest μ entry.
    pub min_mu: f64,
}

impl ResidualReport {
    /// Evaluate `a` (as built by the constraint assembler) at `duals`.
    pub fn evaluate(a: &CscMatrix<f64>, layout: &VariableLayout, duals: &DualWarmStart) -> Self {
        let x = flatten(layout, duals);
        let ax = mul_vec(a, &x);
        let eq = layout.equality_rows();
        let balance_end = layout.lambda_identity_base();

        Self {
            rotation_residual: ax[..eq].iter().fold(0.0_f64, |acc, v| acc.max(v.abs())),
            min_offset_balance: ax[eq..balance_end]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min),
            min_lambda: duals.lambda.iter().copied().fold(f64::INFINITY, f64::min),
            min_mu: duals.mu.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// All equalities within `tol` and all inequalities violated by at most `tol`.
    pub fn is_feasible(&self, tol: f64) -> bool {
        self.rotation_residual <= tol
            && self.min_offset_balance >= -tol
            && self.min_lambda >= -tol
            && self.min_mu >= -tol
    }
}

impl fmt::Display for ResidualReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rotation residual {:.3e}, min offset balance {:.3e}, min lambda {:.3e}, min mu {:.3e}",
            self.rotation_residual, self.min_offset_balance, self.min_lambda, self.min_mu
        )
    }
}

/// Stack λ and μ matrices back into the solver's variable vector.
pub fn flatten(layout: &VariableLayout, duals: &DualWarmStart) -> Vec<f64> {
    let mut x = vec![0.0; layout.num_variables()];
    for step in 0..layout.steps() {
        for j in 0..layout.obstacles() {
            let first_edge = layout.edge_offset(j);
            for k in 0..layout.edges(j) {
                x[layout.lambda_index(step, j, k)] = duals.lambda[(first_edge + k, step)];
            }
            for c in 0..CORNERS {
                x[layout.mu_index(step, j, c)] = duals.mu[(CORNERS * j + c, step)];
            }
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationConvention;
    use crate::constraints::assemble_constraints;
    use crate::problem::WarmStartProblem;
    use crate::types::{EgoExtents, ObstacleSet, Pose2, WarmStartInputs};
    use approx::assert_relative_eq;

    fn problem() -> WarmStartProblem {
        let mut obstacles = ObstacleSet::empty();
        obstacles.push_box(5.0, 7.0, -1.0, 1.0);
        WarmStartProblem::new(WarmStartInputs {
            horizon: 0,
            ts: 0.1,
            ego: EgoExtents::centered(4.0, 2.0),
            obstacles_num: 1,
            obstacles,
            trajectory: vec![Pose2::default()],
        })
        .unwrap()
    }

    #[test]
    fn zero_duals_are_feasible() {
        let pb = problem();
        let a = assemble_constraints(&pb, RotationConvention::Symmetric);
        let duals = DualWarmStart::zeros(4, 1, 1);
        let report = ResidualReport::evaluate(&a, pb.layout(), &duals);
        assert_relative_eq!(report.rotation_residual, 0.0);
        assert!(report.is_feasible(1e-9));
    }

    #[test]
    fn separating_hyperplane_certificate() {
        // Obstacle edge 2 has normal (-1, 0) and faces the vehicle at the origin.
        // λ_2 = 1 balanced by μ_0 = 1 satisfies the rotation rows at heading 0.
        let pb = problem();
        let a = assemble_constraints(&pb, RotationConvention::Symmetric);
        let mut duals = DualWarmStart::zeros(4, 1, 1);
        duals.lambda[(2, 0)] = 1.0;
        duals.mu[(0, 0)] = 1.0;
        let report = ResidualReport::evaluate(&a, pb.layout(), &duals);
        assert_relative_eq!(report.rotation_residual, 0.0, epsilon = 1e-12);
        // (t^T a_2 - b_2) - g_0 = (0 - (-5)) - 2 = 3
        assert_relative_eq!(report.min_offset_balance, 3.0, epsilon = 1e-12);
        assert!(report.is_feasible(1e-9));
    }

    #[test]
    fn negative_dual_is_infeasible() {
        let pb = problem();
        let a = assemble_constraints(&pb, RotationConvention::Symmetric);
        let mut duals = DualWarmStart::zeros(4, 1, 1);
        duals.mu[(3, 0)] = -0.5;
        let report = ResidualReport::evaluate(&a, pb.layout(), &duals);
        assert_relative_eq!(report.min_mu, -0.5);
        assert_relative_eq!(report.rotation_residual, 0.5);
        assert!(!report.is_feasible(1e-3));
    }

    #[test]
    fn flatten_follows_layout() {
        let layout = VariableLayout::new(&[3, 4], 2);
        let mut duals = DualWarmStart::zeros(7, 2, 2);
        duals.lambda[(4, 1)] = 7.0; // obstacle 1, edge 1, step 1
        duals.mu[(6, 0)] = 9.0; // obstacle 1, corner 2, step 0
        let x = flatten(&layout, &duals);
        assert_relative_eq!(x[layout.lambda_index(1, 1, 1)], 7.0);
        assert_relative_eq!(x[layout.mu_index(0, 1, 2)], 9.0);
        assert_relative_eq!(x.iter().sum::<f64>(), 16.0);
    }
}
