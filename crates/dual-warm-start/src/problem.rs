//! Problem dimensions and geometric constants derived from the inputs.

use tracing::debug;

use crate::error::InputError;
use crate::layout::VariableLayout;
use crate::types::{CORNERS, ObstacleSet, Pose2, WarmStartInputs};

/// Validated inputs plus everything derived from them once per cycle.
#[derive(Clone, Debug)]
pub struct WarmStartProblem {
    horizon: usize,
    ts: f64,
    obstacles: ObstacleSet,
    trajectory: Vec<Pose2>,
    /// `[l/2, w/2, l/2, w/2]`.
    g: [f64; CORNERS],
    /// Reference point to geometric center, along the heading.
    offset: f64,
    /// `(length, width)` of the footprint.
    footprint: (f64, f64),
    layout: VariableLayout,
}

impl WarmStartProblem {
    /// Validate inputs and derive dimensions.
    ///
    /// # Panics
    /// If `horizon` or `obstacles_num` is not below `i32::MAX`, or the
    /// problem dimensions overflow `usize`.
    pub fn new(inputs: WarmStartInputs) -> Result<Self, InputError> {
        let WarmStartInputs {
            horizon,
            ts,
            ego,
            obstacles_num,
            obstacles,
            trajectory,
        } = inputs;

        assert!(
            i32::try_from(horizon).is_ok_and(|h| h < i32::MAX),
            "invalid cast on horizon in open space planner: {horizon}"
        );
        assert!(
            i32::try_from(obstacles_num).is_ok_and(|n| n < i32::MAX),
            "invalid cast on obstacles_num in open space planner: {obstacles_num}"
        );

        if !ts.is_finite() || ts <= 0.0 {
            return Err(InputError::InvalidSamplingInterval(ts));
        }
        for (index, value) in ego.as_array().into_iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(InputError::InvalidEgoExtent { index, value });
            }
        }
        validate_obstacles(&obstacles, obstacles_num)?;

        let steps = horizon + 1;
        if trajectory.len() != steps {
            return Err(InputError::TrajectoryLength {
                expected: steps,
                got: trajectory.len(),
            });
        }
        if trajectory
            .iter()
            .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.heading.is_finite()))
        {
            return Err(InputError::NonFinite("trajectory"));
        }

        let layout = VariableLayout::new(&obstacles.edges_num, steps);
        debug!(
            horizon,
            obstacles = obstacles_num,
            edges = layout.edges_sum(),
            variables = layout.num_variables(),
            constraints = layout.num_constraints(),
            "dual warm start problem initialized"
        );

        Ok(Self {
            horizon,
            ts,
            obstacles,
            trajectory,
            g: ego.half_extents(),
            offset: ego.center_offset(),
            footprint: (ego.length(), ego.width()),
            layout,
        })
    }

    /// Horizon `H`.
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of trajectory samples, `horizon + 1`.
    pub const fn steps(&self) -> usize {
        self.horizon + 1
    }

    /// Sampling interval in seconds.
    pub const fn ts(&self) -> f64 {
        self.ts
    }

    /// Validated obstacle half-planes.
    pub const fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    /// Warm start poses, one per step.
    pub fn trajectory(&self) -> &[Pose2] {
        &self.trajectory
    }

    /// Footprint half-extent vector `g`.
    pub const fn half_extents(&self) -> &[f64; CORNERS] {
        &self.g
    }

    /// Reference point to geometric center, along the heading.
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Footprint `(length, width)`.
    pub const fn footprint(&self) -> (f64, f64) {
        self.footprint
    }

    /// Shared variable and row indexing.
    pub const fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Total variable count `n`.
    pub const fn num_variables(&self) -> usize {
        self.layout.num_variables()
    }

    /// Total constraint row count `m`.
    pub const fn num_constraints(&self) -> usize {
        self.layout.num_constraints()
    }
}

fn validate_obstacles(obstacles: &ObstacleSet, obstacles_num: usize) -> Result<(), InputError> {
    if obstacles.edges_num.len() != obstacles_num {
        return Err(InputError::ObstacleCountMismatch {
            expected: obstacles_num,
            got: obstacles.edges_num.len(),
        });
    }
    if let Some(obstacle) = obstacles.edges_num.iter().position(|&e| e == 0) {
        return Err(InputError::EmptyObstacle { obstacle });
    }
    if obstacles.a.ncols() != 2 {
        return Err(InputError::HalfPlaneColumns(obstacles.a.ncols()));
    }
    let expected = obstacles.edges_sum();
    if obstacles.a.nrows() != expected {
        return Err(InputError::HalfPlaneRows {
            matrix: "A",
            expected,
            got: obstacles.a.nrows(),
        });
    }
    if obstacles.b.nrows() != expected {
        return Err(InputError::HalfPlaneRows {
            matrix: "b",
            expected,
            got: obstacles.b.nrows(),
        });
    }
    if obstacles.a.iter().any(|v| !v.is_finite()) {
        return Err(InputError::NonFinite("obstacle A"));
    }
    if obstacles.b.iter().any(|v| !v.is_finite()) {
        return Err(InputError::NonFinite("obstacle b"));
    }
    Ok(())
}
