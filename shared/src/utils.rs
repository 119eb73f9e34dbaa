use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector2, Vector3};
use num_traits::Float;
use std::f32::consts::TAU;

/// Minimum planar magnitude required to derive a yaw.
const YAW_EPS: f32 = 1.0e-6;

/// Yaw (radians about +Y) that faces the planar direction `xz`.
///
/// Convention: yaw 0 faces -Z, matching `forward_from_yaw`.
pub fn yaw_from_xz(xz: Vector2<f32>) -> Option<f32> {
    if xz.norm_squared() > YAW_EPS {
        return Some((-xz[0]).atan2(-xz[1]));
    }

    None
}

/// Unit forward vector (-Z rotated by `yaw`) on the XZ plane.
pub fn forward_from_yaw(yaw: f32) -> Vector3<f32> {
    Vector3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Unit right vector (+X rotated by `yaw`) on the XZ plane.
pub fn right_from_yaw(yaw: f32) -> Vector3<f32> {
    Vector3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Rotation about +Y by `yaw` radians.
pub fn yaw_rotation(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

/// Pose at `translation` facing `yaw`.
pub fn pose_from_yaw(translation: Vector3<f32>, yaw: f32) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(translation), yaw_rotation(yaw))
}

/// Extracts the yaw of a rotation by measuring where it sends -Z.
pub fn yaw_of(rotation: &UnitQuaternion<f32>) -> f32 {
    let forward = rotation * -Vector3::z();
    yaw_from_xz(Vector2::new(forward.x, forward.z)).unwrap_or(0.0)
}

/// Drops the vertical component.
pub fn planar(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, 0.0, v.z)
}

/// Planar (XZ) distance squared between two world positions (meters^2).
pub fn planar_distance_sq(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    let x = b.x - a.x;
    let z = b.y - a.y;
    x * x + z * z
}

/// Frame-rate independent blend weight `1 - e^(-rate * dt)`.
pub fn smoothing_factor<T: Float>(rate: T, dt: T) -> T {
    T::one() - (-rate * dt).exp()
}

/// Linear interpolation between two scalars.
pub fn lerp<T: Float>(from: T, to: T, weight: T) -> T {
    from + (to - from) * weight
}

/// Interpolates between two angles along the shortest arc.
pub fn lerp_angle(from: f32, to: f32, weight: f32) -> f32 {
    let diff = (to - from) % TAU;
    let distance = (2.0 * diff) % TAU - diff;
    from + distance * weight
}

/// Clamps a frame delta into `[0, max]`, mapping non-finite input to zero.
pub fn clamp_dt(dt: f32, max: f32) -> f32 {
    if !dt.is_finite() {
        return 0.0;
    }
    dt.clamp(0.0, max)
}
