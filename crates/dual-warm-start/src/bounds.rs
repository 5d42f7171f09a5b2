//! Constraint bounds `l <= A x <= u`.

use crate::layout::VariableLayout;

/// Lower and upper bound vectors, one entry per constraint row.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Group-1 rows are equalities at zero; every other row is `0 <= row <= infinity`.
    pub fn new(layout: &VariableLayout, infinity: f64) -> Self {
        let m = layout.num_constraints();
        let eq = layout.equality_rows();
        let lower = vec![0.0; m];
        let upper = (0..m)
            .map(|i| if i < eq { 0.0 } else { infinity })
            .collect();
        Self { lower, upper }
    }

    /// Number of constraint rows.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// True when there are no constraint rows.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}
