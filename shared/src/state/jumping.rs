use nalgebra::Vector3;

use super::locomotion::{
    apply_gravity, approach_horizontal, face_direction, target_speed, wish_direction,
};
use super::{State, StateContext, StateId, StatePayload};
use crate::constants::anim;

/// Payload key overriding the launch speed.
pub const JUMP_SPEED_KEY: &str = "jump_speed";
/// Payload key for a velocity added on launch.
pub const VELOCITY_BIAS_KEY: &str = "velocity_bias";

/// Airborne after a jump, with reduced air control. Lands into Walking or Idle.
#[derive(Debug, Default)]
pub struct Jumping {
    jump_speed: Option<f32>,
    velocity_bias: Vector3<f32>,
}

impl State for Jumping {
    fn id(&self) -> StateId {
        StateId::JUMPING
    }

    fn configure(&mut self, payload: &StatePayload) {
        self.jump_speed = payload.float(JUMP_SPEED_KEY);
        self.velocity_bias = payload.vector(VELOCITY_BIAS_KEY).unwrap_or_else(Vector3::zeros);
    }

    fn on_enter(&mut self, ctx: &mut StateContext<'_>) {
        let mut velocity = ctx.body.velocity();
        velocity.y = self.jump_speed.unwrap_or(ctx.tuning.jump_speed);
        ctx.body.set_velocity(velocity + self.velocity_bias);
        ctx.anim_travel(anim::IDLE);
    }

    fn physics_update(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if !ctx.is_owner() {
            return;
        }

        let dir = wish_direction(ctx);
        let target = dir * target_speed(ctx);
        let tuning = ctx.tuning;

        approach_horizontal(ctx, target, tuning.acceleration * tuning.air_control_factor, dt);
        apply_gravity(ctx, dt);
        ctx.body.move_and_slide(dt);
        ctx.push_rigid_bodies();

        if ctx.body.is_on_floor() {
            if ctx.intent.has_movement(tuning.float_math_epsilon) {
                ctx.anim_travel(anim::WALK);
                ctx.request_state(StateId::WALKING);
            } else {
                ctx.anim_travel(anim::IDLE);
                ctx.request_state(StateId::IDLE);
            }
            return;
        }

        face_direction(ctx, dir, dt);
    }
}
