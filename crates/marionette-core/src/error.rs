use thiserror::Error;

/// Top-level error type for the Marionette workspace.
#[derive(Debug, Error)]
pub enum MarionetteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid bone_count: {0} (must be >= 1)")]
    InvalidBoneCount(usize),

    #[error("Invalid segment_length: {0} (must be > 0)")]
    InvalidSegmentLength(f32),

    #[error("Invalid tolerance: {0} (must be > 0 and finite)")]
    InvalidTolerance(f32),

    #[error("Invalid max_iterations: 0 (must be >= 1)")]
    ZeroMaxIterations,
}

/// Transform-graph errors.
///
/// Attach failures are advisory: callers log them and carry on with the
/// operation skipped. Copy + static payloads for cheap propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Invalid node id {index} (graph has {len} nodes)")]
    InvalidNode { index: usize, len: usize },

    #[error("Node {0} cannot be attached to itself")]
    SelfAttachment(usize),
}
