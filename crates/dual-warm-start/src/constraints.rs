//! Constraint matrix `A` (m x n), built column by column:
//!
//! ```text
//! |R * A_j^T,           G^T|  2 * obstacles * steps rows
//! |t^T A_j^T - b_j^T,  -g^T|  obstacles * steps rows
//! |I,                   0  |  one row per λ
//! |0,                   I  |  one row per μ
//! ```
//!
//! with `G = [[1, 0, -1, 0], [0, 1, 0, -1]]`, `g` the footprint half extents
//! and `t` the geometric center of the vehicle at that step. Every λ column
//! holds exactly 4 entries and every μ column exactly 3; numerically zero
//! coefficients are stored so the pattern does not depend on the poses.

use clarabel::algebra::CscMatrix;

use crate::config::RotationConvention;
use crate::problem::WarmStartProblem;
use crate::sparse::CscBuilder;
use crate::types::CORNERS;

/// Stored entries per λ column.
pub const LAMBDA_COLUMN_NNZ: usize = 4;
/// Stored entries per μ column.
pub const MU_COLUMN_NNZ: usize = 3;

/// Coefficient of corner `k` in `G^T`: `+1` for the first two corners, `-1`
/// for the last two. The row is `k % 2`.
const fn corner_sign(k: usize) -> f64 {
    if k < 2 { 1.0 } else { -1.0 }
}

/// Build `A` for the given heading convention.
#[allow(clippy::similar_names)]
pub fn assemble_constraints(
    problem: &WarmStartProblem,
    rotation: RotationConvention,
) -> CscMatrix<f64> {
    let layout = problem.layout();
    let (m, n) = (layout.num_constraints(), layout.num_variables());
    let nnz = LAMBDA_COLUMN_NNZ * layout.lambda_count() + MU_COLUMN_NNZ * layout.mu_count();
    let mut a = CscBuilder::with_capacity(m, n, nnz);

    // --- λ columns ---
    for (step, pose) in problem.trajectory().iter().enumerate() {
        let r = rotation.matrix(pose.heading);
        let t = pose.translated(problem.offset());

        for (j, (a_j, b_j)) in problem.obstacles().blocks().enumerate() {
            let r1 = layout.rotation_row(step, j);
            let r2 = layout.offset_row(step, j);

            for k in 0..a_j.nrows() {
                let normal = [a_j[(k, 0)], a_j[(k, 1)]];
                // R * A_j^T, column k
                let rot0 = r[0][0] * normal[0] + r[0][1] * normal[1];
                let rot1 = r[1][0] * normal[0] + r[1][1] * normal[1];
                // t^T A_j^T - b_j^T, entry k
                let balance = t[0] * normal[0] + t[1] * normal[1] - b_j[k];

                let var = layout.lambda_index(step, j, k);
                debug_assert_eq!(a.current_column(), var);
                a.push(r1, rot0);
                a.push(r1 + 1, rot1);
                a.push(r2, balance);
                a.push(layout.identity_row(var), 1.0);
                a.end_column();
            }
        }
    }
    assert_eq!(
        a.nnz(),
        LAMBDA_COLUMN_NNZ * layout.lambda_count(),
        "λ column entry count mismatch"
    );

    // --- μ columns ---
    let g = problem.half_extents();
    for step in 0..layout.steps() {
        for j in 0..layout.obstacles() {
            let r1 = layout.rotation_row(step, j);
            let r2 = layout.offset_row(step, j);
            for k in 0..CORNERS {
                let var = layout.mu_index(step, j, k);
                debug_assert_eq!(a.current_column(), var);
                a.push(r1 + k % 2, corner_sign(k));
                a.push(r2, -g[k]);
                a.push(layout.identity_row(var), 1.0);
                a.end_column();
            }
        }
    }

    let a = a.build();
    assert_eq!(a.nzval.len(), nnz, "constraint entry count mismatch");
    a
}
