//! Variable and row indexing shared by the objective, the constraints and the
//! solution extraction.
//!
//! Variables are ordered step-major, then obstacle, then edge (λ) or corner
//! (μ), with the whole λ block first:
//!
//! ```text
//! x = [λ(step 0, obs 0, edge 0..e_0), λ(step 0, obs 1, ..), ..., λ(step H, ..),
//!      μ(step 0, obs 0, corner 0..4), ...,                      μ(step H, ..)]
//! ```
//!
//! Constraint rows come in four groups:
//!
//! ```text
//! | R * A_j^T           G^T |  2 per (step, obstacle)
//! | t^T A_j^T - b_j^T  -g^T |  1 per (step, obstacle)
//! | I                   0   |  1 per λ
//! | 0                   I   |  1 per μ
//! ```

use crate::types::CORNERS;

/// Index arithmetic for one problem instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableLayout {
    steps: usize,
    obstacles: usize,
    edges_sum: usize,
    /// Prefix sums of the per-obstacle edge counts (`len = obstacles + 1`).
    edge_offsets: Vec<usize>,
}

impl VariableLayout {
    /// # Panics
    /// If any derived dimension overflows `usize`.
    pub fn new(edges_num: &[usize], steps: usize) -> Self {
        let mut edge_offsets = Vec::with_capacity(edges_num.len() + 1);
        let mut acc = 0usize;
        edge_offsets.push(acc);
        for &e in edges_num {
            acc = acc.checked_add(e).expect("edge count sum overflows usize");
            edge_offsets.push(acc);
        }
        let layout = Self {
            steps,
            obstacles: edges_num.len(),
            edges_sum: acc,
            edge_offsets,
        };
        // Force the overflow checks once so later accessors can use plain arithmetic.
        let _ = layout
            .checked_num_constraints()
            .expect("problem dimensions overflow usize");
        layout
    }

    fn checked_num_constraints(&self) -> Option<usize> {
        let lambda = self.edges_sum.checked_mul(self.steps)?;
        let mu = CORNERS.checked_mul(self.obstacles)?.checked_mul(self.steps)?;
        let n = lambda.checked_add(mu)?;
        3usize
            .checked_mul(self.obstacles)?
            .checked_mul(self.steps)?
            .checked_add(n)
    }

    /// Trajectory samples, `horizon + 1`.
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Number of obstacles.
    pub const fn obstacles(&self) -> usize {
        self.obstacles
    }

    /// Total edge count over all obstacles.
    pub const fn edges_sum(&self) -> usize {
        self.edges_sum
    }

    /// Edge count of `obstacle`.
    pub fn edges(&self, obstacle: usize) -> usize {
        self.edge_offsets[obstacle + 1] - self.edge_offsets[obstacle]
    }

    /// Row of the first edge of `obstacle` in the stacked `A`/`b`.
    pub fn edge_offset(&self, obstacle: usize) -> usize {
        self.edge_offsets[obstacle]
    }

    // --- Variables ---

    /// Number of λ variables, `sum(edges) * steps`.
    pub const fn lambda_count(&self) -> usize {
        self.edges_sum * self.steps
    }

    /// Number of μ variables, `4 * obstacles * steps`.
    pub const fn mu_count(&self) -> usize {
        CORNERS * self.obstacles * self.steps
    }

    /// Total variable count `n`.
    pub const fn num_variables(&self) -> usize {
        self.lambda_count() + self.mu_count()
    }

    /// Index of the first λ variable.
    pub const fn lambda_start(&self) -> usize {
        0
    }

    /// Index of the first μ variable.
    pub const fn mu_start(&self) -> usize {
        self.lambda_count()
    }

    /// Variable index of λ for one edge at one step.
    pub fn lambda_index(&self, step: usize, obstacle: usize, edge: usize) -> usize {
        debug_assert!(edge < self.edges(obstacle));
        self.lambda_start() + step * self.edges_sum + self.edge_offsets[obstacle] + edge
    }

    /// Variable index of μ for one corner at one step.
    pub fn mu_index(&self, step: usize, obstacle: usize, corner: usize) -> usize {
        debug_assert!(corner < CORNERS);
        self.mu_start() + (step * self.obstacles + obstacle) * CORNERS + corner
    }

    // --- Constraint rows ---

    /// Rows with `l = u = 0`.
    pub const fn equality_rows(&self) -> usize {
        2 * self.obstacles * self.steps
    }

    /// Total constraint row count `m`.
    pub const fn num_constraints(&self) -> usize {
        3 * self.obstacles * self.steps + self.num_variables()
    }

    /// First of the two group-1 rows for a (step, obstacle) pair.
    pub const fn rotation_row(&self, step: usize, obstacle: usize) -> usize {
        2 * (step * self.obstacles + obstacle)
    }

    /// Group-2 row for a (step, obstacle) pair.
    pub const fn offset_row(&self, step: usize, obstacle: usize) -> usize {
        self.equality_rows() + step * self.obstacles + obstacle
    }

    /// First row of the λ identity group.
    pub const fn lambda_identity_base(&self) -> usize {
        3 * self.obstacles * self.steps
    }

    /// First row of the μ identity group.
    pub const fn mu_identity_base(&self) -> usize {
        self.lambda_identity_base() + self.lambda_count()
    }

    /// Group-3/4 identity row isolating variable `var`.
    pub const fn identity_row(&self, var: usize) -> usize {
        self.lambda_identity_base() + var
    }
}
