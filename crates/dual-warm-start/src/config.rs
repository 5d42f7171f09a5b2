use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_relaxation() -> f64 {
    1.0
}
const fn default_eps() -> f64 {
    1.0e-5
}
const fn default_max_iter() -> u32 {
    5000
}
const fn default_true() -> bool {
    true
}
const fn default_infinity() -> f64 {
    2.0e19
}

// ---------------------------------------------------------------------------
// RotationConvention
// ---------------------------------------------------------------------------

/// How the heading rotation is applied to the obstacle normals in the
/// group-1 dual feasibility rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationConvention {
    /// `[[cos, sin], [sin, cos]]`: both off-diagonals carry the same sign.
    /// This reproduces the planner's historical warm start bit-for-bit.
    #[default]
    Symmetric,
    /// `R(heading)^T = [[cos, sin], [-sin, cos]]`, mapping world-frame normals
    /// into the vehicle body frame.
    BodyFrame,
}

impl RotationConvention {
    /// 2x2 matrix for the given heading, row-major.
    pub fn matrix(self, heading: f64) -> [[f64; 2]; 2] {
        let (s, c) = heading.sin_cos();
        match self {
            Self::Symmetric => [[c, s], [s, c]],
            Self::BodyFrame => [[c, s], [-s, c]],
        }
    }
}

// ---------------------------------------------------------------------------
// QpSettings
// ---------------------------------------------------------------------------

/// QP solver tuning for the dual warm start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QpSettings {
    /// Step relaxation. Accepted in `(0, 2)` so ADMM-style values load, but
    /// the interior-point backend scales its step fraction by
    /// `min(relaxation, 1)`: values above 1.0 behave like 1.0.
    #[serde(default = "default_relaxation")]
    pub relaxation: f64,

    /// Absolute convergence tolerance.
    #[serde(default = "default_eps")]
    pub eps_abs: f64,

    /// Relative convergence tolerance.
    #[serde(default = "default_eps")]
    pub eps_rel: f64,

    /// Iteration cap. This is the only bound on solve time.
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,

    /// Iterative refinement of each KKT solve. Enabled by default in the
    /// interior-point backend, so `false` turns refinement off rather than
    /// skipping a separate polishing pass.
    #[serde(default = "default_true")]
    pub polish: bool,

    /// Print solver progress to stdout.
    #[serde(default)]
    pub verbose: bool,

    /// Finite surrogate for +inf used in the upper bound vector.
    #[serde(default = "default_infinity")]
    pub infinity: f64,

    #[serde(default)]
    pub rotation: RotationConvention,

    /// Compute constraint residuals of the extracted duals after each solve
    /// and warn when they exceed the tolerances.
    #[serde(default)]
    pub check_solution: bool,
}

impl Default for QpSettings {
    fn default() -> Self {
        Self {
            relaxation: default_relaxation(),
            eps_abs: default_eps(),
            eps_rel: default_eps(),
            max_iter: default_max_iter(),
            polish: true,
            verbose: false,
            infinity: default_infinity(),
            rotation: RotationConvention::default(),
            check_solution: false,
        }
    }
}

impl QpSettings {
    /// Validate settings. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.relaxation > 0.0 && self.relaxation < 2.0) {
            return Err(ConfigError::InvalidRelaxation(self.relaxation));
        }
        for (field, value) in [("eps_abs", self.eps_abs), ("eps_rel", self.eps_rel)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { field, value });
            }
        }
        if self.eps_abs == 0.0 && self.eps_rel == 0.0 {
            return Err(ConfigError::ZeroTolerances);
        }
        if self.max_iter == 0 {
            return Err(ConfigError::ZeroMaxIter);
        }
        if !self.infinity.is_finite() || self.infinity <= 0.0 {
            return Err(ConfigError::InvalidInfinity(self.infinity));
        }
        Ok(())
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
