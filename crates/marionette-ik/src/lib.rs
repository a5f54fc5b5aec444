//! Skeletal inverse kinematics for Marionette rigs.
//!
//! Provides a hierarchical transform graph, a FABRIK position solver over
//! a single bone chain, and the [`IkRig`] facade a host render loop drives
//! once per frame.
//!
//! # Architecture
//!
//! ```text
//! RigConfig ──► IkRig ──► TransformGraph + Chain ──► FabrikSolver ──► joint rotations
//! ```
//!
//! The [`TransformGraph`] owns every node of the skeleton; the [`Chain`]
//! is an ordered view over the root-to-effector path plus the solver's
//! scratch positions. [`FabrikSolver::solve`] relaxes the scratch points
//! toward the target, then extracts one rotation per joint and
//! re-propagates world transforms down the graph. The previous pose is
//! the next frame's initial guess, which keeps iteration counts low.

pub mod chain;
pub mod math;
pub mod node;
pub mod rig;
pub mod solver;
pub mod target;

pub use chain::Chain;
pub use node::{NodeId, TransformGraph, TransformNode};
pub use rig::IkRig;
pub use solver::{FabrikConfig, FabrikSolver, SolveOutcome, SolveReport};
pub use target::TargetTrack;
