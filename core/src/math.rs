//! Vector and rotation helpers layered over `glam`.

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::random::RandomSource;

const PARALLEL_EPSILON: f32 = 1.0e-5;

/// Spherically interpolates between two directions.
///
/// The inputs do not need to be normalised. The result is a unit vector, or
/// the zero vector when both inputs are zero. When only one input is zero the
/// interpolation degrades to a normalised lerp.
#[must_use]
pub fn slerp_directions(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let start = from.normalize_or_zero();
    let end = to.normalize_or_zero();
    if start == Vec3::ZERO || end == Vec3::ZERO {
        return start.lerp(end, t).normalize_or_zero();
    }

    let cosine = start.dot(end).clamp(-1.0, 1.0);
    let angle = cosine.acos();
    let sine = angle.sin();
    if sine.abs() < PARALLEL_EPSILON {
        if cosine > 0.0 {
            return start;
        }
        // Opposite directions have no unique great circle; pick one.
        let axis = start.any_orthonormal_vector();
        return Quat::from_axis_angle(axis, PI * t) * start;
    }

    let start_weight = ((1.0 - t) * angle).sin() / sine;
    let end_weight = (t * angle).sin() / sine;
    (start * start_weight + end * end_weight).normalize_or_zero()
}

/// Draws a random unit direction lying in the XY plane.
///
/// Returns the zero vector in the rare case both components are drawn as zero.
pub fn random_xy_direction(rng: &mut dyn RandomSource) -> Vec3 {
    let x = rng.range(-1.0, 1.0);
    let y = rng.range(-1.0, 1.0);
    Vec3::new(x, y, 0.0).normalize_or_zero()
}

/// Composes `orientation` with a rotation of `degrees` about the local `axis`.
///
/// A zero axis leaves the orientation unchanged.
#[must_use]
pub fn rotate_about(orientation: Quat, axis: Vec3, degrees: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return orientation;
    }
    (orientation * Quat::from_axis_angle(axis, degrees.to_radians())).normalize()
}
