//! Pure geometry helpers shared by the solver and target animation.
//!
//! Stateless functions only. Zero-length inputs produce NaN from
//! normalization; the solver guards for that (see
//! [`crate::solver`]), nothing here does.

use nalgebra::{Point3, Vector3};

/// Angle in radians between the directions from `origin` to `a` and from
/// `origin` to `b`.
///
/// The dot product is clamped to `[-1, 1]` before `acos`, so rounding can
/// never push it out of the inverse-cosine domain. Returns NaN only when
/// one of the offsets has zero length.
pub fn angle_between(origin: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>) -> f32 {
    let u = (a - origin).normalize();
    let v = (b - origin).normalize();
    u.dot(&v).clamp(-1.0, 1.0).acos()
}

/// Rotation axis carrying the direction `origin -> a` onto `origin -> b`:
/// the cross product of the two normalized offsets.
///
/// Zero when the directions are parallel; NaN components when one offset
/// has zero length.
pub fn rotation_axis(origin: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>) -> Vector3<f32> {
    let u = (a - origin).normalize();
    let v = (b - origin).normalize();
    u.cross(&v)
}

/// Linear interpolation between two points at `t` (not clamped).
pub fn lerp(a: &Point3<f32>, b: &Point3<f32>, t: f32) -> Point3<f32> {
    a + (b - a) * t
}

/// Cubic Bezier point for control points `p0..p3` at `t` (not clamped).
pub fn cubic_bezier(
    p0: &Point3<f32>,
    p1: &Point3<f32>,
    p2: &Point3<f32>,
    p3: &Point3<f32>,
    t: f32,
) -> Point3<f32> {
    let s = 1.0 - t;
    let coords = p0.coords * (s * s * s)
        + p1.coords * (3.0 * s * s * t)
        + p2.coords * (3.0 * s * t * t)
        + p3.coords * (t * t * t);
    Point3::from(coords)
}

/// Ease-in-out time remap on `[0, 1]`: the scalar cubic Bezier with
/// control values (0, 0, 1, 1). Input is clamped.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Component-wise approximate equality of two float triples.
pub fn approx_eq(a: &[f32; 3], b: &[f32; 3], epsilon: f32) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= epsilon)
}
