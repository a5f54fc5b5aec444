//! FABRIK chain solver: two-phase position relaxation followed by one
//! rotation extraction pass over the transform graph.
//!
//! The solver mutates only the chain's scratch points until convergence,
//! then commits a single rotation per joint and re-propagates world
//! transforms. Unreachable targets and exhausted iteration budgets are
//! reported in the [`SolveReport`], never as errors.

use log::warn;
use nalgebra::{Point3, Vector3};

use marionette_core::config::SolverSettings;

use crate::chain::Chain;
use crate::math;
use crate::node::TransformGraph;

/// Configuration for the FABRIK solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabrikConfig {
    /// Maximum relaxation iterations per solve.
    pub max_iterations: u32,
    /// Convergence tolerance in world units. Also the reachability slack.
    pub tolerance: f32,
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            tolerance: 0.01,
        }
    }
}

impl From<SolverSettings> for FabrikConfig {
    fn from(settings: SolverSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            tolerance: settings.tolerance,
        }
    }
}

/// How a solve call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Effector brought within tolerance of the target.
    Converged,
    /// Effector was already within tolerance; nothing was mutated.
    AlreadyAtTarget,
    /// Iteration budget exhausted before convergence; the best pose found
    /// was still applied.
    IterationBudget,
    /// Target farther than the chain can reach; nothing was mutated and
    /// the chain holds its last valid pose.
    Unreachable,
}

/// Result of an IK solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    /// Relaxation iterations used.
    pub iterations: u32,
    /// Final distance from the scratch effector to the target.
    pub position_error: f32,
}

impl SolveReport {
    /// True when the effector sits within tolerance of the target.
    pub const fn reached(&self) -> bool {
        matches!(
            self.outcome,
            SolveOutcome::Converged | SolveOutcome::AlreadyAtTarget
        )
    }
}

/// FABRIK solver over a single [`Chain`].
pub struct FabrikSolver {
    config: FabrikConfig,
}

impl FabrikSolver {
    /// Create a solver with the given configuration.
    pub const fn new(config: FabrikConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FabrikConfig::default())
    }

    pub const fn config(&self) -> &FabrikConfig {
        &self.config
    }

    /// Solve the chain toward `target` and apply the resulting rotations
    /// to the graph.
    ///
    /// Segment lengths are preserved exactly; an out-of-reach target is
    /// refused rather than stretched toward (the chain keeps its last
    /// valid pose and a warning is logged). The chain's scratch positions
    /// persist across calls, so the previous pose is the warm start.
    pub fn solve(
        &self,
        graph: &mut TransformGraph,
        chain: &mut Chain,
        target: &Point3<f32>,
    ) -> SolveReport {
        let tolerance = self.config.tolerance;

        // Reachability gate. Stretching toward an unreachable target is
        // rejected so segment lengths stay exact.
        let root_distance = (target - chain.root_position()).norm();
        if chain.reach() + tolerance < root_distance {
            warn!(
                "ik target ({:.3}, {:.3}, {:.3}) out of reach: {:.3} > {:.3}",
                target.x,
                target.y,
                target.z,
                root_distance,
                chain.reach() + tolerance,
            );
            return SolveReport {
                outcome: SolveOutcome::Unreachable,
                iterations: 0,
                position_error: (target - chain.end_effector()).norm(),
            };
        }

        // Already there: leave every transform untouched.
        let initial_error = (target - chain.end_effector()).norm();
        if initial_error <= tolerance {
            return SolveReport {
                outcome: SolveOutcome::AlreadyAtTarget,
                iterations: 0,
                position_error: initial_error,
            };
        }

        let mut iterations = 0;
        for _ in 0..self.config.max_iterations {
            iterations += 1;
            backward_pass(chain, target);
            forward_pass(chain);
            if (target - chain.end_effector()).norm() <= tolerance {
                break;
            }
        }

        apply_rotations(graph, chain);

        let position_error = (target - chain.end_effector()).norm();
        let outcome = if position_error <= tolerance {
            SolveOutcome::Converged
        } else {
            SolveOutcome::IterationBudget
        };
        SolveReport {
            outcome,
            iterations,
            position_error,
        }
    }
}

/// Backward pass: pin the effector to the target and re-project every
/// joint toward the root, each at exactly one segment length from its
/// higher-index neighbor.
///
/// The whole chain is processed every pass; a coincident point pair skips
/// only its own re-projection.
fn backward_pass(chain: &mut Chain, target: &Point3<f32>) {
    let last = chain.last_index();
    let segment = chain.segment_length();
    chain.scratch[last] = *target;
    for i in (0..last).rev() {
        let anchor = chain.scratch[i + 1];
        let toward = chain.scratch[i] - anchor;
        let distance = toward.norm();
        if distance <= f32::EPSILON {
            continue;
        }
        chain.scratch[i] = anchor + toward * (segment / distance);
    }
}

/// Forward pass: re-anchor the root (which the backward pass may have
/// dragged off its pin) and re-project every joint toward the effector.
fn forward_pass(chain: &mut Chain) {
    let last = chain.last_index();
    let segment = chain.segment_length();
    chain.scratch[0] = chain.root_position();
    for i in 1..=last {
        let anchor = chain.scratch[i - 1];
        let toward = chain.scratch[i] - anchor;
        let distance = toward.norm();
        if distance <= f32::EPSILON {
            continue;
        }
        chain.scratch[i] = anchor + toward * (segment / distance);
    }
}

/// Rotation extraction: for each joint, the angle/axis carrying the
/// currently rendered child direction onto the solved scratch direction,
/// committed as rebake + rotate + re-propagate.
///
/// Runs only after the scratch chain is fully solved; committing
/// rotations mid-relaxation would invalidate the unprocessed vectors.
fn apply_rotations(graph: &mut TransformGraph, chain: &Chain) {
    let last = chain.last_index();
    for i in 0..last {
        let origin = chain.scratch[i];
        let current = graph.position(chain.joints[i + 1]);
        let solved = chain.scratch[i + 1];
        let (angle, axis) = aim_rotation(&origin, &current, &solved);

        let joint = chain.joints[i];
        graph.bake_initial_transforms(joint);
        graph.update_rotation(joint, angle, axis);
        graph.propagate(joint);
    }
}

/// Angle and axis rotating the direction `origin -> current` onto
/// `origin -> solved`, with degenerate fallbacks: a NaN angle (zero-length
/// input) becomes 0, a NaN axis becomes world-up.
fn aim_rotation(
    origin: &Point3<f32>,
    current: &Point3<f32>,
    solved: &Point3<f32>,
) -> (f32, Vector3<f32>) {
    let mut angle = math::angle_between(origin, current, solved);
    let mut axis = math::rotation_axis(origin, current, solved);
    if angle.is_nan() {
        angle = 0.0;
    }
    if axis.iter().any(|component| component.is_nan()) {
        axis = Vector3::y();
    }
    (angle, axis)
}
