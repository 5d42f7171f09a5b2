//! Quadratic cost `P`: sum over steps and obstacles of `||A_j^T λ_j||^2`.
//!
//! `P` is block diagonal over the λ variables. The block for obstacle `j` is
//! the Gram matrix `A_j A_j^T` and repeats at every step since obstacles are
//! stationary over the horizon. μ columns are empty.

use clarabel::algebra::CscMatrix;
use nalgebra::DMatrix;

use crate::problem::WarmStartProblem;
use crate::sparse::CscBuilder;

/// Per-obstacle Gram matrices `A_j A_j^T`.
pub fn gram_blocks(problem: &WarmStartProblem) -> Vec<DMatrix<f64>> {
    problem
        .obstacles()
        .blocks()
        .map(|(a_j, _)| &a_j * a_j.transpose())
        .collect()
}

/// Build the full symmetric `P` (n x n).
pub fn assemble_p(problem: &WarmStartProblem) -> CscMatrix<f64> {
    let layout = problem.layout();
    let n = layout.num_variables();
    let grams = gram_blocks(problem);

    let nnz_per_step: usize = grams.iter().map(|g| g.len()).sum();
    let mut p = CscBuilder::with_capacity(n, n, nnz_per_step * layout.steps());

    for step in 0..layout.steps() {
        for (j, gram) in grams.iter().enumerate() {
            let e = layout.edges(j);
            assert_eq!(gram.shape(), (e, e), "Gram block shape mismatch");
            let base = layout.lambda_index(step, j, 0);
            for c in 0..e {
                debug_assert_eq!(p.current_column(), base + c);
                for r in 0..e {
                    p.push(base + r, gram[(r, c)]);
                }
                p.end_column();
            }
        }
    }
    assert_eq!(
        p.current_column(),
        layout.lambda_count(),
        "λ column count mismatch"
    );

    // μ columns carry no cost.
    p.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::to_dense;
    use crate::types::{EgoExtents, ObstacleSet, Pose2, WarmStartInputs};
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn problem(horizon: usize) -> WarmStartProblem {
        let triangle = (
            DMatrix::from_row_slice(3, 2, &[0.0, -1.0, 0.6, 0.8, -0.6, 0.8]),
            DVector::from_vec(vec![0.0, 4.0, 2.0]),
        );
        let mut square = ObstacleSet::empty();
        square.push_box(4.0, 6.0, -1.0, 1.0);
        let obstacles = ObstacleSet::from_blocks(&[triangle, (square.a, square.b)]);
        WarmStartProblem::new(WarmStartInputs {
            horizon,
            ts: 0.5,
            ego: EgoExtents::centered(4.0, 2.0),
            obstacles_num: 2,
            obstacles,
            trajectory: vec![Pose2::default(); horizon + 1],
        })
        .unwrap()
    }

    #[test]
    fn csc_structure() {
        let pb = problem(3);
        let p = assemble_p(&pb);
        let n = pb.num_variables();
        assert_eq!((p.m, p.n), (n, n));
        assert_eq!(p.colptr.len(), n + 1);
        assert_eq!(p.colptr[0], 0);
        assert!(p.colptr.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(p.rowval.len(), p.nzval.len());
        // (3*3 + 4*4) entries per step
        assert_eq!(p.nzval.len(), 25 * 4);
    }

    #[test]
    fn blocks_equal_gram_matrix_at_every_step() {
        let pb = problem(2);
        let dense = to_dense(&assemble_p(&pb));
        let layout = pb.layout();
        for (j, (a_j, _)) in pb.obstacles().blocks().enumerate() {
            let gram = &a_j * a_j.transpose();
            let e = layout.edges(j);
            for step in 0..pb.steps() {
                let base = layout.lambda_index(step, j, 0);
                let block = dense.view((base, base), (e, e));
                for r in 0..e {
                    for c in 0..e {
                        assert_relative_eq!(block[(r, c)], gram[(r, c)], epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn block_diagonal_and_symmetric() {
        let pb = problem(1);
        let dense = to_dense(&assemble_p(&pb));
        let layout = pb.layout();
        let block_of = |var: usize| -> Option<(usize, usize)> {
            (0..pb.steps()).find_map(|step| {
                (0..layout.obstacles()).find_map(|j| {
                    let base = layout.lambda_index(step, j, 0);
                    (var >= base && var < base + layout.edges(j)).then_some((step, j))
                })
            })
        };
        for r in 0..dense.nrows() {
            for c in 0..dense.ncols() {
                assert_relative_eq!(dense[(r, c)], dense[(c, r)], epsilon = 1e-12);
                if dense[(r, c)] != 0.0 {
                    let (br, bc) = (block_of(r), block_of(c));
                    assert!(br.is_some(), "non-zero outside λ block at ({r}, {c})");
                    assert_eq!(br, bc, "cross-block entry at ({r}, {c})");
                }
            }
        }
    }

    #[test]
    fn mu_columns_are_empty() {
        let pb = problem(2);
        let p = assemble_p(&pb);
        let layout = pb.layout();
        for col in layout.mu_start()..layout.num_variables() {
            assert_eq!(p.colptr[col], p.colptr[col + 1], "μ column {col} not empty");
        }
    }

    #[test]
    fn positive_semidefinite() {
        let pb = problem(0);
        let dense = to_dense(&assemble_p(&pb));
        let eig = dense.symmetric_eigenvalues();
        assert!(eig.iter().all(|&l| l > -1e-10), "P has negative eigenvalue");
    }
}
