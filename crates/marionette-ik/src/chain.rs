//! Bone chain: an ordered view over a root-to-effector path of graph
//! nodes, plus the solver's scratch geometry.
//!
//! The chain owns no nodes — only [`NodeId`]s into the rig's
//! [`TransformGraph`](crate::TransformGraph) — and keeps one world-space
//! scratch point per joint. Scratch is deliberately decoupled from the
//! nodes' accumulated matrices so the relaxation loop can move candidate
//! positions freely and commit rotations in a single pass at the end.

use nalgebra::Point3;

use crate::node::NodeId;

/// Ordered root-to-effector chain with solver scratch positions.
///
/// `joints[0]` is the pinned root, `joints[last]` the terminal effector
/// (solved but never rendered). Length is `bone_count + 1`.
#[derive(Debug, Clone)]
pub struct Chain {
    pub(crate) joints: Vec<NodeId>,
    pub(crate) scratch: Vec<Point3<f32>>,
    segment_length: f32,
    root_position: Point3<f32>,
}

impl Chain {
    /// Build a chain over `joints` with matching rest-pose `scratch`
    /// positions. The root is pinned at `scratch[0]`.
    ///
    /// # Panics
    ///
    /// Panics if the lists differ in length or describe fewer than one
    /// bone (two joints).
    pub fn new(joints: Vec<NodeId>, scratch: Vec<Point3<f32>>, segment_length: f32) -> Self {
        assert_eq!(joints.len(), scratch.len(), "one scratch point per joint");
        assert!(joints.len() >= 2, "a chain needs at least root + effector");
        let root_position = scratch[0];
        Self {
            joints,
            scratch,
            segment_length,
            root_position,
        }
    }

    /// Number of bone segments (joints minus the effector).
    pub fn bone_count(&self) -> usize {
        self.joints.len() - 1
    }

    /// Index of the effector slot.
    pub fn last_index(&self) -> usize {
        self.joints.len() - 1
    }

    /// Joint ids, root first, effector last.
    pub fn joints(&self) -> &[NodeId] {
        &self.joints
    }

    /// Current scratch positions, one per joint.
    pub fn scratch(&self) -> &[Point3<f32>] {
        &self.scratch
    }

    /// Rest length of every segment.
    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    /// Pinned world position of the root joint.
    pub fn root_position(&self) -> Point3<f32> {
        self.root_position
    }

    /// Maximum root-to-effector distance the chain can span.
    pub fn reach(&self) -> f32 {
        self.bone_count() as f32 * self.segment_length
    }

    /// Scratch position of the effector.
    pub fn end_effector(&self) -> Point3<f32> {
        self.scratch[self.last_index()]
    }

    /// Largest deviation of any scratch segment from the rest length.
    ///
    /// Zero (within floating tolerance) after every completed
    /// backward+forward pass pair on a reachable target.
    pub fn max_segment_error(&self) -> f32 {
        self.scratch
            .windows(2)
            .map(|pair| ((pair[1] - pair[0]).norm() - self.segment_length).abs())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertical_chain(bones: usize, segment_length: f32) -> Chain {
        let joints = (0..=bones).map(NodeId).collect();
        let scratch = (0..=bones)
            .map(|i| Point3::new(0.0, i as f32 * segment_length, 0.0))
            .collect();
        Chain::new(joints, scratch, segment_length)
    }

    #[test]
    fn counts_and_reach() {
        let chain = vertical_chain(3, 0.5);
        assert_eq!(chain.bone_count(), 3);
        assert_eq!(chain.last_index(), 3);
        assert_relative_eq!(chain.reach(), 1.5);
    }

    #[test]
    fn root_is_pinned_at_first_scratch_point() {
        let chain = vertical_chain(2, 1.0);
        assert_relative_eq!(chain.root_position(), Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(chain.end_effector(), Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn rest_pose_has_no_segment_error() {
        let chain = vertical_chain(4, 0.25);
        assert!(chain.max_segment_error() < 1e-6);
    }

    #[test]
    fn segment_error_reports_worst_link() {
        let mut chain = vertical_chain(2, 1.0);
        chain.scratch[2].y = 2.4;
        assert_relative_eq!(chain.max_segment_error(), 0.4, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "at least root + effector")]
    fn rejects_single_joint() {
        let _ = Chain::new(vec![NodeId(0)], vec![Point3::origin()], 1.0);
    }
}
