use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_bone_count() -> usize {
    3
}
const fn default_segment_length() -> f32 {
    1.0
}
const fn default_root_position() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
const fn default_max_iterations() -> u32 {
    64
}
const fn default_tolerance() -> f32 {
    0.01
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// SolverSettings
// ---------------------------------------------------------------------------

/// Solver iteration budget and convergence tolerance.
///
/// The tolerance doubles as the reachability slack: a target is considered
/// reachable when it lies within `bone_count * segment_length + tolerance`
/// of the root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Maximum relaxation iterations per solve (default: 64).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Convergence tolerance in world units (default: 0.01).
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

// ---------------------------------------------------------------------------
// RigConfig
// ---------------------------------------------------------------------------

/// Main rig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    /// Number of bones in the chain (default: 3). The terminal effector
    /// node is extra and never counted here.
    #[serde(default = "default_bone_count")]
    pub bone_count: usize,

    /// Rest length of every bone segment (default: 1.0).
    #[serde(default = "default_segment_length")]
    pub segment_length: f32,

    /// World-space position of the pinned chain root (default: origin).
    #[serde(default = "default_root_position")]
    pub root_position: [f32; 3],

    /// Whether the host loop should run the solver each frame (default: true).
    /// Purely advisory to the host; the library never reads it.
    #[serde(default = "default_true")]
    pub run_solve: bool,

    /// Solver settings.
    #[serde(default)]
    pub solver: SolverSettings,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            bone_count: default_bone_count(),
            segment_length: default_segment_length(),
            root_position: default_root_position(),
            run_solve: true,
            solver: SolverSettings::default(),
        }
    }
}

impl RigConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bone_count == 0 {
            return Err(ConfigError::InvalidBoneCount(self.bone_count));
        }
        if !(self.segment_length > 0.0) || !self.segment_length.is_finite() {
            return Err(ConfigError::InvalidSegmentLength(self.segment_length));
        }
        if !(self.solver.tolerance > 0.0) || !self.solver.tolerance.is_finite() {
            return Err(ConfigError::InvalidTolerance(self.solver.tolerance));
        }
        if self.solver.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations);
        }
        Ok(())
    }

    /// Maximum root-to-effector distance the chain can span.
    pub fn reach(&self) -> f32 {
        self.bone_count as f32 * self.segment_length
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
