//! Hierarchical transform graph for skeleton nodes.
//!
//! Nodes live in an arena owned by [`TransformGraph`] and are addressed by
//! [`NodeId`] indices: the child list owns (the arena frees every non-root
//! node when it is truncated for a rebuild) and the parent link is a plain
//! back-reference used only for lookup. Each node stores its local TRS,
//! the `initial_transform` matrix baked from it at the last rebuild, and
//! the `accumulated` world matrix produced by root-to-leaf propagation.

use log::error;
use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};

use marionette_core::error::GraphError;

/// Index of a node inside a [`TransformGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single node: local TRS plus cached matrices and tree links.
#[derive(Debug, Clone)]
pub struct TransformNode {
    /// Translation relative to the parent.
    local_position: Vector3<f32>,
    /// Euler rotation relative to the parent, in degrees.
    local_rotation: Vector3<f32>,
    /// Scale relative to the parent.
    local_scale: Vector3<f32>,
    /// Local TRS baked to a matrix at the last rebuild.
    initial_transform: Matrix4<f32>,
    /// `parent.accumulated * local delta`; what renderer and solver read.
    accumulated: Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TransformNode {
    fn new() -> Self {
        Self {
            local_position: Vector3::zeros(),
            local_rotation: Vector3::zeros(),
            local_scale: Vector3::repeat(1.0),
            initial_transform: Matrix4::identity(),
            accumulated: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Bake the local TRS: translate, rotate by quaternion, scale.
    ///
    /// The Euler degrees are converted to radians and then to a quaternion
    /// so later rotation composition is free of gimbal trouble.
    fn local_matrix(&self) -> Matrix4<f32> {
        let translation = Matrix4::new_translation(&self.local_position);
        let rotation = UnitQuaternion::from_euler_angles(
            self.local_rotation.x.to_radians(),
            self.local_rotation.y.to_radians(),
            self.local_rotation.z.to_radians(),
        );
        let scale = Matrix4::new_nonuniform_scaling(&self.local_scale);
        translation * rotation.to_homogeneous() * scale
    }

    /// World matrix as of the most recent propagation.
    pub fn accumulated(&self) -> &Matrix4<f32> {
        &self.accumulated
    }

    /// Local matrix baked at the last rebuild.
    pub fn initial_transform(&self) -> &Matrix4<f32> {
        &self.initial_transform
    }

    /// Translation column of the accumulated matrix.
    pub fn position(&self) -> Point3<f32> {
        let t = self.accumulated.column(3);
        Point3::new(t[0], t[1], t[2])
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena of [`TransformNode`]s with a fixed root at index 0.
#[derive(Debug, Clone)]
pub struct TransformGraph {
    nodes: Vec<TransformNode>,
}

impl Default for TransformGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformGraph {
    /// Graph containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![TransformNode::new()],
        }
    }

    /// The fixed root.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is never removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a detached node and return its id.
    pub fn add_node(&mut self) -> NodeId {
        self.nodes.push(TransformNode::new());
        NodeId(self.nodes.len() - 1)
    }

    /// Drop every node except the root and clear the root's child list.
    ///
    /// This is the rebuild path: all non-root nodes are freed in one step
    /// and any previously handed-out `NodeId` (other than the root's)
    /// becomes out of range.
    pub fn truncate_to_root(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.nodes[0].parent = None;
    }

    pub fn node(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(id.0)
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::InvalidNode {
                index: id.0,
                len: self.nodes.len(),
            })
        }
    }

    /// Store the node's local TRS. `rotation` is Euler degrees.
    pub fn set_local_transforms(
        &mut self,
        id: NodeId,
        translate: Vector3<f32>,
        rotation: Vector3<f32>,
        scale: Vector3<f32>,
    ) {
        let node = &mut self.nodes[id.0];
        node.local_position = translate;
        node.local_rotation = rotation;
        node.local_scale = scale;
    }

    /// Record `child` in the parent's child list.
    ///
    /// An invalid id is logged as an advisory error and the graph is left
    /// untouched; this never panics.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        if let Err(err) = self.check_attach(parent, child) {
            error!("attach_child refused: {err}");
            return Err(err);
        }
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Record `parent` as the child's back-reference.
    ///
    /// Same advisory failure semantics as [`attach_child`](Self::attach_child).
    pub fn attach_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        if let Err(err) = self.check_attach(child, parent) {
            error!("attach_parent refused: {err}");
            return Err(err);
        }
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn check_attach(&self, a: NodeId, b: NodeId) -> Result<(), GraphError> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Err(GraphError::SelfAttachment(a.0));
        }
        Ok(())
    }

    /// Rebake `initial_transform` from the local TRS, reset `accumulated`
    /// to it, and recurse into children.
    ///
    /// Run whenever the rest pose changes (rebuild or explicit reset) and
    /// by the solver before composing a fresh rotation into a joint.
    pub fn bake_initial_transforms(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        let local = node.local_matrix();
        node.initial_transform = local;
        node.accumulated = local;
        let children = node.children.clone();
        for child in children {
            self.bake_initial_transforms(child);
        }
    }

    /// Compose a rotation of `angle` radians about `axis` into the node's
    /// accumulated matrix.
    ///
    /// Right-multiplied, so the node rotates about its own current
    /// position and orientation rather than the world origin. A
    /// degenerate axis (zero length) composes nothing.
    pub fn update_rotation(&mut self, id: NodeId, angle: f32, axis: Vector3<f32>) {
        let rotation = match Unit::try_new(axis, 1.0e-6) {
            Some(unit) => UnitQuaternion::from_axis_angle(&unit, angle),
            None => UnitQuaternion::identity(),
        };
        self.nodes[id.0].accumulated *= rotation.to_homogeneous();
    }

    /// Compose a translation delta into the accumulated matrix.
    pub fn update_translation(&mut self, id: NodeId, offset: Vector3<f32>) {
        self.nodes[id.0].accumulated *= Matrix4::new_translation(&offset);
    }

    /// Compose a scale delta into the accumulated matrix.
    pub fn update_scale(&mut self, id: NodeId, scale: Vector3<f32>) {
        self.nodes[id.0].accumulated *= Matrix4::new_nonuniform_scaling(&scale);
    }

    /// Forward-kinematics propagation: `accumulated = parent_transform *
    /// accumulated`, then recurse into children with the NEW accumulated.
    ///
    /// Must run root-to-leaf; a leaf-to-root walk would compose stale
    /// parent matrices.
    pub fn update_transform(&mut self, id: NodeId, parent_transform: &Matrix4<f32>) {
        let node = &mut self.nodes[id.0];
        node.accumulated = parent_transform * node.accumulated;
        let accumulated = node.accumulated;
        let children = node.children.clone();
        for child in children {
            self.update_transform(child, &accumulated);
        }
    }

    /// Propagate from `id` using its parent's accumulated matrix (identity
    /// at the root). The only place the parent back-reference is read.
    pub fn propagate(&mut self, id: NodeId) {
        let parent_transform = match self.nodes[id.0].parent {
            Some(parent) => self.nodes[parent.0].accumulated,
            None => Matrix4::identity(),
        };
        self.update_transform(id, &parent_transform);
    }

    /// Reset `accumulated` to `initial_transform`, recursing into children.
    pub fn reset_transforms(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.accumulated = node.initial_transform;
        let children = node.children.clone();
        for child in children {
            self.reset_transforms(child);
        }
    }

    /// Node count of the subtree rooted at `id` (1 + recursive children).
    pub fn chain_node_count(&self, id: NodeId) -> usize {
        1 + self.nodes[id.0]
            .children
            .iter()
            .map(|&child| self.chain_node_count(child))
            .sum::<usize>()
    }

    /// World position of a node (translation column of `accumulated`).
    pub fn position(&self, id: NodeId) -> Point3<f32> {
        self.nodes[id.0].position()
    }

    /// World matrix of a node, for renderer uniform binding.
    pub fn accumulated(&self, id: NodeId) -> &Matrix4<f32> {
        &self.nodes[id.0].accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    /// Root with `count` descendants chained below it, each offset by
    /// `(0, 1, 0)` from its parent. Transforms baked and propagated.
    fn straight_chain(count: usize) -> (TransformGraph, Vec<NodeId>) {
        let mut graph = TransformGraph::new();
        let mut ids = vec![graph.root()];
        let mut prev = graph.root();
        for _ in 0..count {
            let id = graph.add_node();
            graph.set_local_transforms(
                id,
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::zeros(),
                Vector3::repeat(1.0),
            );
            graph.attach_parent(id, prev).unwrap();
            graph.attach_child(prev, id).unwrap();
            ids.push(id);
            prev = id;
        }
        graph.bake_initial_transforms(graph.root());
        graph.update_transform(graph.root(), &Matrix4::identity());
        (graph, ids)
    }

    #[test]
    fn propagation_stacks_local_translations() {
        let (graph, ids) = straight_chain(3);
        for (i, &id) in ids.iter().enumerate() {
            let p = graph.position(id);
            assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
            assert_relative_eq!(p.y, i as f32, epsilon = 1e-6);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn rotation_spins_children_about_the_node() {
        let (mut graph, ids) = straight_chain(1);
        graph.bake_initial_transforms(graph.root());
        graph.update_rotation(graph.root(), FRAC_PI_2, Vector3::z());
        graph.update_transform(graph.root(), &Matrix4::identity());

        // Root stays put, the child swings from +y to -x.
        assert_relative_eq!(graph.position(ids[0]).y, 0.0, epsilon = 1e-6);
        let child = graph.position(ids[1]);
        assert_relative_eq!(child.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(child.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn rotation_about_interior_node_pins_that_node() {
        let (mut graph, ids) = straight_chain(2);
        graph.bake_initial_transforms(ids[1]);
        graph.update_rotation(ids[1], FRAC_PI_2, Vector3::z());
        graph.propagate(ids[1]);

        // The rotated node keeps its position; only its subtree moves.
        let mid = graph.position(ids[1]);
        assert_relative_eq!(mid.y, 1.0, epsilon = 1e-6);
        let tip = graph.position(ids[2]);
        assert_relative_eq!(tip.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(tip.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_axis_composes_nothing() {
        let (mut graph, ids) = straight_chain(1);
        let before = *graph.accumulated(ids[1]);
        graph.update_rotation(ids[1], 1.0, Vector3::zeros());
        assert_eq!(*graph.accumulated(ids[1]), before);
    }

    #[test]
    fn update_translation_offsets_subtree() {
        let (mut graph, ids) = straight_chain(1);
        graph.update_translation(graph.root(), Vector3::new(2.0, 0.0, 0.0));
        graph.propagate(graph.root());
        assert_relative_eq!(graph.position(ids[1]).x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn update_scale_stretches_child_offsets() {
        let (mut graph, ids) = straight_chain(1);
        graph.bake_initial_transforms(graph.root());
        graph.update_scale(graph.root(), Vector3::repeat(2.0));
        graph.update_transform(graph.root(), &Matrix4::identity());
        assert_relative_eq!(graph.position(ids[1]).y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn reset_restores_rest_pose() {
        let (mut graph, ids) = straight_chain(2);
        graph.bake_initial_transforms(graph.root());
        graph.update_rotation(graph.root(), FRAC_PI_2, Vector3::z());
        graph.update_transform(graph.root(), &Matrix4::identity());

        graph.reset_transforms(graph.root());
        graph.update_transform(graph.root(), &Matrix4::identity());
        let tip = graph.position(ids[2]);
        assert_relative_eq!(tip.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(tip.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn chain_node_count_counts_subtree() {
        let (graph, ids) = straight_chain(4);
        assert_eq!(graph.chain_node_count(graph.root()), 5);
        assert_eq!(graph.chain_node_count(ids[2]), 3);
    }

    #[test]
    fn attach_rejects_out_of_range_ids() {
        let mut graph = TransformGraph::new();
        let ghost = NodeId(17);
        let err = graph.attach_child(graph.root(), ghost).unwrap_err();
        assert_eq!(err, GraphError::InvalidNode { index: 17, len: 1 });
        // no-op: the root's child list is untouched
        assert!(graph.node(graph.root()).unwrap().children().is_empty());

        let err = graph.attach_parent(ghost, graph.root()).unwrap_err();
        assert!(matches!(err, GraphError::InvalidNode { .. }));
    }

    #[test]
    fn attach_rejects_self() {
        let mut graph = TransformGraph::new();
        let id = graph.add_node();
        assert_eq!(
            graph.attach_child(id, id).unwrap_err(),
            GraphError::SelfAttachment(1)
        );
    }

    #[test]
    fn truncate_frees_everything_but_the_root() {
        let (mut graph, _) = straight_chain(5);
        assert_eq!(graph.len(), 6);
        graph.truncate_to_root();
        assert_eq!(graph.len(), 1);
        assert!(graph.node(graph.root()).unwrap().children().is_empty());
        assert!(graph.node(NodeId(1)).is_none());
    }
}
