use nalgebra::{Vector2, Vector3};

use super::StateContext;
use crate::utils::{
    forward_from_yaw, lerp_angle, planar, right_from_yaw, smoothing_factor, yaw_from_xz,
};

/// Unit planar wish direction, relative to the camera when one is present and
/// to the body's own facing otherwise. Zero when there is no wish.
pub(super) fn wish_direction(ctx: &StateContext<'_>) -> Vector3<f32> {
    let yaw = ctx.intent.view_yaw.unwrap_or_else(|| ctx.body.yaw());
    let wish = ctx.intent.movement;
    let dir = right_from_yaw(yaw) * wish.x + forward_from_yaw(yaw) * wish.y;
    if dir.norm_squared() > ctx.tuning.float_math_epsilon {
        dir.normalize()
    } else {
        Vector3::zeros()
    }
}

/// Walk or run speed depending on the sprint button.
pub(super) fn target_speed(ctx: &StateContext<'_>) -> f32 {
    if ctx.intent.sprint {
        ctx.tuning.run_speed
    } else {
        ctx.tuning.walk_speed
    }
}

/// Moves the horizontal velocity toward `target` at `rate` (1/s), leaving Y alone.
pub(super) fn approach_horizontal(
    ctx: &mut StateContext<'_>,
    target: Vector3<f32>,
    rate: f32,
    dt: f32,
) {
    let velocity = ctx.body.velocity();
    let horizontal = planar(velocity).lerp(&planar(target), smoothing_factor(rate, dt));
    ctx.body.set_velocity(Vector3::new(horizontal.x, velocity.y, horizontal.z));
}

pub(super) fn apply_gravity(ctx: &mut StateContext<'_>, dt: f32) {
    let mut velocity = ctx.body.velocity();
    velocity.y -= ctx.tuning.gravity * dt;
    ctx.body.set_velocity(velocity);
}

/// Turns the body toward `dir` along the shortest arc.
pub(super) fn face_direction(ctx: &mut StateContext<'_>, dir: Vector3<f32>, dt: f32) {
    let Some(target) = yaw_from_xz(Vector2::new(dir.x, dir.z)) else {
        return;
    };
    let weight = smoothing_factor(ctx.tuning.rotation_speed, dt);
    let yaw = lerp_angle(ctx.body.yaw(), target, weight);
    ctx.body.set_yaw(yaw);
}

pub(super) fn horizontal_speed_sq(ctx: &StateContext<'_>) -> f32 {
    planar(ctx.body.velocity()).norm_squared()
}
