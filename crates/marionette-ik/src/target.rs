//! Target animation between two stored endpoints.
//!
//! The host owns the clock; a [`TargetTrack`] only maps a phase in
//! `[0, 1]` to a world-space target point with an ease-in-out time remap.

use nalgebra::Point3;

use crate::math;

/// Animated target path between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetTrack {
    /// Straight line from `from` to `to`.
    Line {
        from: Point3<f32>,
        to: Point3<f32>,
    },
    /// Cubic Bezier through four control points (`points[0]` to
    /// `points[3]`, interior points shape the path).
    Curve { points: [Point3<f32>; 4] },
}

impl TargetTrack {
    pub fn line(from: Point3<f32>, to: Point3<f32>) -> Self {
        Self::Line { from, to }
    }

    pub fn curve(
        p0: Point3<f32>,
        p1: Point3<f32>,
        p2: Point3<f32>,
        p3: Point3<f32>,
    ) -> Self {
        Self::Curve {
            points: [p0, p1, p2, p3],
        }
    }

    /// Target position at `phase` in `[0, 1]` (clamped), eased in and out.
    pub fn position_at(&self, phase: f32) -> Point3<f32> {
        let t = math::ease_in_out(phase);
        match self {
            Self::Line { from, to } => math::lerp(from, to, t),
            Self::Curve { points } => {
                math::cubic_bezier(&points[0], &points[1], &points[2], &points[3], t)
            }
        }
    }

    /// Fold an unbounded time value into a ping-pong phase: `0 -> 1` on
    /// even cycles, `1 -> 0` on odd ones.
    pub fn ping_pong(time: f32) -> f32 {
        let cycle = time.rem_euclid(2.0);
        if cycle <= 1.0 {
            cycle
        } else {
            2.0 - cycle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_hits_endpoints() {
        let track = TargetTrack::line(Point3::new(0.0, 1.0, 0.0), Point3::new(2.0, 1.0, 0.0));
        assert_relative_eq!(track.position_at(0.0), Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(track.position_at(1.0), Point3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn line_midpoint_unaffected_by_easing() {
        let track = TargetTrack::line(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(track.position_at(0.5).x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn easing_lags_early_phase() {
        let track = TargetTrack::line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert!(track.position_at(0.25).x < 0.25);
    }

    #[test]
    fn curve_hits_endpoints() {
        let track = TargetTrack::curve(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert_relative_eq!(track.position_at(0.0), Point3::new(0.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(track.position_at(1.0), Point3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn ping_pong_triangle_wave() {
        assert_relative_eq!(TargetTrack::ping_pong(0.0), 0.0);
        assert_relative_eq!(TargetTrack::ping_pong(0.5), 0.5);
        assert_relative_eq!(TargetTrack::ping_pong(1.0), 1.0);
        assert_relative_eq!(TargetTrack::ping_pong(1.5), 0.5);
        assert_relative_eq!(TargetTrack::ping_pong(2.0), 0.0);
        assert_relative_eq!(TargetTrack::ping_pong(3.25), 0.75);
    }
}
