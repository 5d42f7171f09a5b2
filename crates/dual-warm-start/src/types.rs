//! Core input and output types for the dual warm start.

use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView};

/// Number of footprint half-extent duals per obstacle per step.
pub const CORNERS: usize = 4;

/// Vehicle footprint extents measured from the reference point (meters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EgoExtents {
    /// Reference point to front bumper.
    pub front: f64,
    /// Reference point to rear bumper.
    pub rear: f64,
    /// Reference point to left side.
    pub left: f64,
    /// Reference point to right side.
    pub right: f64,
}

impl EgoExtents {
    /// Extents in the order front, rear, left, right.
    pub const fn new(front: f64, rear: f64, left: f64, right: f64) -> Self {
        Self {
            front,
            rear,
            left,
            right,
        }
    }

    /// Footprint symmetric about the reference point.
    pub const fn centered(length: f64, width: f64) -> Self {
        Self::new(length / 2.0, length / 2.0, width / 2.0, width / 2.0)
    }

    /// Total footprint length, `front + rear`.
    pub fn length(&self) -> f64 {
        self.front + self.rear
    }

    /// Total footprint width, `left + right`.
    pub fn width(&self) -> f64 {
        self.left + self.right
    }

    /// Half-extent vector `g = [l/2, w/2, l/2, w/2]`.
    pub fn half_extents(&self) -> [f64; CORNERS] {
        let (hl, hw) = (self.length() / 2.0, self.width() / 2.0);
        [hl, hw, hl, hw]
    }

    /// Longitudinal distance from the reference point to the geometric center.
    pub fn center_offset(&self) -> f64 {
        self.length() / 2.0 - self.rear
    }

    pub(crate) fn as_array(&self) -> [f64; 4] {
        [self.front, self.rear, self.left, self.right]
    }
}

/// Planar pose of the vehicle reference point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub heading: f64,
}

impl Pose2 {
    /// Pose at `(x, y)` with `heading` in radians.
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Geometric center of a footprint whose center lies `offset` meters ahead
    /// of this reference point.
    pub fn translated(&self, offset: f64) -> [f64; 2] {
        let (s, c) = self.heading.sin_cos();
        [self.x + c * offset, self.y + s * offset]
    }
}

/// Stacked half-plane representation `A_j x <= b_j` of every obstacle.
#[derive(Clone, Debug)]
pub struct ObstacleSet {
    /// Edge count of each obstacle.
    pub edges_num: Vec<usize>,
    /// Outward normals, one row per edge (`sum(edges) x 2`).
    pub a: DMatrix<f64>,
    /// Offsets, one per edge.
    pub b: DVector<f64>,
}

impl ObstacleSet {
    /// Wrap already stacked half-planes; shapes are checked at problem setup.
    pub const fn new(edges_num: Vec<usize>, a: DMatrix<f64>, b: DVector<f64>) -> Self {
        Self { edges_num, a, b }
    }

    /// No obstacles.
    pub fn empty() -> Self {
        Self::new(Vec::new(), DMatrix::zeros(0, 2), DVector::zeros(0))
    }

    /// Stack per-obstacle `(A_j, b_j)` blocks in order.
    pub fn from_blocks(blocks: &[(DMatrix<f64>, DVector<f64>)]) -> Self {
        let edges_num: Vec<usize> = blocks.iter().map(|(a, _)| a.nrows()).collect();
        let total: usize = edges_num.iter().sum();
        let mut a = DMatrix::zeros(total, 2);
        let mut b = DVector::zeros(total);
        let mut row = 0;
        for (a_j, b_j) in blocks {
            let e = a_j.nrows();
            a.view_mut((row, 0), (e, 2)).copy_from(a_j);
            b.rows_mut(row, e).copy_from(b_j);
            row += e;
        }
        Self { edges_num, a, b }
    }

    /// Axis-aligned rectangle `[x_min, x_max] x [y_min, y_max]` as four half-planes.
    pub fn push_box(&mut self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
        let old = self.a.nrows();
        let a = std::mem::replace(&mut self.a, DMatrix::zeros(0, 2));
        let b = std::mem::replace(&mut self.b, DVector::zeros(0));
        let mut a = a.resize_vertically(old + 4, 0.0);
        let mut b = b.resize_vertically(old + 4, 0.0);
        let rows = [
            ([1.0, 0.0], x_max),
            ([0.0, 1.0], y_max),
            ([-1.0, 0.0], -x_min),
            ([0.0, -1.0], -y_min),
        ];
        for (k, (normal, offset)) in rows.into_iter().enumerate() {
            a[(old + k, 0)] = normal[0];
            a[(old + k, 1)] = normal[1];
            b[old + k] = offset;
        }
        self.a = a;
        self.b = b;
        self.edges_num.push(4);
    }

    /// Number of obstacles.
    pub fn obstacle_count(&self) -> usize {
        self.edges_num.len()
    }

    /// Total edge count over all obstacles.
    pub fn edges_sum(&self) -> usize {
        self.edges_num.iter().sum()
    }

    /// Per-obstacle `(A_j, b_j)` views, in obstacle order.
    pub fn blocks(&self) -> impl Iterator<Item = (DMatrixView<'_, f64>, DVectorView<'_, f64>)> {
        let mut start = 0;
        self.edges_num.iter().map(move |&e| {
            let block = (self.a.rows(start, e), self.b.rows(start, e));
            start += e;
            block
        })
    }
}

/// Everything the warm start needs for one planning cycle.
#[derive(Clone, Debug)]
pub struct WarmStartInputs {
    /// Number of trajectory steps minus one.
    pub horizon: usize,
    /// Sampling interval in seconds.
    pub ts: f64,
    pub ego: EgoExtents,
    /// Declared obstacle count; must equal `obstacles.edges_num.len()`.
    pub obstacles_num: usize,
    pub obstacles: ObstacleSet,
    /// Reference-point poses, `horizon + 1` of them.
    pub trajectory: Vec<Pose2>,
}

/// Warm-start duals.
#[derive(Clone, Debug, PartialEq)]
pub struct DualWarmStart {
    /// `sum(edges) x (horizon + 1)`.
    pub lambda: DMatrix<f64>,
    /// `4 * obstacles x (horizon + 1)`.
    pub mu: DMatrix<f64>,
}

impl DualWarmStart {
    /// All-zero duals of the right shape.
    pub fn zeros(edges_sum: usize, obstacles_num: usize, steps: usize) -> Self {
        Self {
            lambda: DMatrix::zeros(edges_sum, steps),
            mu: DMatrix::zeros(CORNERS * obstacles_num, steps),
        }
    }
}
