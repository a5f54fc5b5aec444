//! The IK rig facade a host loop drives once per frame.
//!
//! Owns the transform graph, the chain over it, and the solver
//! configuration. Handles the rebuild path: when the desired bone count
//! no longer matches the graph, the arena is truncated back to the root
//! and a fresh straight chain is grown from configuration.

use log::warn;
use nalgebra::{Matrix4, Point3, Vector3};

use marionette_core::config::RigConfig;
use marionette_core::error::{GraphError, MarionetteError};

use crate::chain::Chain;
use crate::node::TransformGraph;
use crate::solver::{FabrikConfig, FabrikSolver, SolveReport};

/// A single-chain IK rig: transform graph + chain + solver.
#[derive(Debug)]
pub struct IkRig {
    graph: TransformGraph,
    chain: Chain,
    solver_config: FabrikConfig,
    segment_length: f32,
    root_position: Point3<f32>,
    desired_bone_count: usize,
}

impl IkRig {
    /// Build a rig from a validated configuration: a straight vertical
    /// chain of `bone_count` bones plus the terminal effector, rooted at
    /// `root_position`.
    pub fn new(config: &RigConfig) -> Result<Self, MarionetteError> {
        config.validate()?;
        let root_position = Point3::from(Vector3::from(config.root_position));
        let mut graph = TransformGraph::new();
        let chain = build_chain(
            &mut graph,
            config.bone_count,
            config.segment_length,
            &root_position,
        )?;
        Ok(Self {
            graph,
            chain,
            solver_config: config.solver.into(),
            segment_length: config.segment_length,
            root_position,
            desired_bone_count: config.bone_count,
        })
    }

    /// Request a different chain length. Takes effect at the next
    /// [`rebuild_if_needed`](Self::rebuild_if_needed); a request for zero
    /// bones is clamped to one.
    pub fn set_bone_count(&mut self, bones: usize) {
        if bones == 0 {
            warn!("ik rig needs at least one bone; clamping request to 1");
        }
        self.desired_bone_count = bones.max(1);
    }

    /// Number of bones the graph currently holds (effector excluded).
    pub fn bone_count(&self) -> usize {
        self.graph.chain_node_count(self.graph.root()) - 1
    }

    /// True when the desired bone count differs from the graph.
    pub fn needs_rebuild(&self) -> bool {
        self.bone_count() != self.desired_bone_count
    }

    /// Rebuild the chain if the desired bone count changed. Frees every
    /// non-root node and re-grows the rest pose. Returns whether a
    /// rebuild ran.
    pub fn rebuild_if_needed(&mut self) -> Result<bool, GraphError> {
        if !self.needs_rebuild() {
            return Ok(false);
        }
        self.chain = build_chain(
            &mut self.graph,
            self.desired_bone_count,
            self.segment_length,
            &self.root_position,
        )?;
        Ok(true)
    }

    /// Run one solve toward `target`, mutating joint rotations and world
    /// transforms. See [`FabrikSolver::solve`].
    pub fn solve(&mut self, target: &Point3<f32>) -> SolveReport {
        FabrikSolver::new(self.solver_config).solve(&mut self.graph, &mut self.chain, target)
    }

    /// Return the chain to its rest pose and reset the solver scratch.
    pub fn reset_pose(&mut self) {
        let root = self.graph.root();
        self.graph.reset_transforms(root);
        self.graph.update_transform(root, &Matrix4::identity());
        for (slot, &joint) in self.chain.scratch.iter_mut().zip(self.chain.joints.iter()) {
            *slot = self.graph.position(joint);
        }
    }

    /// Per-frame solver settings, e.g. from a UI panel.
    pub fn set_solver_config(&mut self, config: FabrikConfig) {
        self.solver_config = config;
    }

    pub const fn solver_config(&self) -> &FabrikConfig {
        &self.solver_config
    }

    pub fn graph(&self) -> &TransformGraph {
        &self.graph
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// World matrices of the bone nodes in chain order, for draw-call
    /// uniform binding. The effector is solved but never rendered, so it
    /// is not included.
    pub fn bone_transforms(&self) -> impl Iterator<Item = &Matrix4<f32>> + '_ {
        let last = self.chain.last_index();
        self.chain.joints[..last]
            .iter()
            .map(move |&id| self.graph.accumulated(id))
    }

    /// World positions of the bone nodes, for debug overlays.
    pub fn bone_positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        let last = self.chain.last_index();
        self.chain.joints[..last]
            .iter()
            .map(move |&id| self.graph.position(id))
    }

    /// Rendered world position of the effector node.
    pub fn effector_position(&self) -> Point3<f32> {
        self.graph.position(self.chain.joints[self.chain.last_index()])
    }
}

/// Truncate the graph to its root and grow a straight vertical rest
/// chain: `bone_count` bone nodes plus one terminal effector, each at
/// local translation `(0, segment_length, 0)` from its parent.
fn build_chain(
    graph: &mut TransformGraph,
    bone_count: usize,
    segment_length: f32,
    root_position: &Point3<f32>,
) -> Result<Chain, GraphError> {
    graph.truncate_to_root();
    let root = graph.root();
    graph.set_local_transforms(
        root,
        root_position.coords,
        Vector3::zeros(),
        Vector3::repeat(1.0),
    );

    let mut joints = vec![root];
    let mut prev = root;
    for _ in 0..bone_count {
        let id = graph.add_node();
        graph.set_local_transforms(
            id,
            Vector3::new(0.0, segment_length, 0.0),
            Vector3::zeros(),
            Vector3::repeat(1.0),
        );
        graph.attach_parent(id, prev)?;
        graph.attach_child(prev, id)?;
        joints.push(id);
        prev = id;
    }

    graph.bake_initial_transforms(root);
    graph.update_transform(root, &Matrix4::identity());

    let scratch = joints.iter().map(|&id| graph.position(id)).collect();
    Ok(Chain::new(joints, scratch, segment_length))
}
