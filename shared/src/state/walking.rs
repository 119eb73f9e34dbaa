use super::locomotion::{
    apply_gravity, approach_horizontal, face_direction, horizontal_speed_sq, target_speed,
    wish_direction,
};
use super::{State, StateContext, StateId};
use crate::constants::anim;

/// Ground locomotion with camera-relative steering.
#[derive(Debug, Default)]
pub struct Walking {
    sprinting: bool,
}

impl State for Walking {
    fn id(&self) -> StateId {
        StateId::WALKING
    }

    fn on_enter(&mut self, ctx: &mut StateContext<'_>) {
        self.sprinting = false;
        ctx.anim_travel(anim::WALK);
    }

    fn physics_update(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if !ctx.is_owner() {
            return;
        }

        if ctx.intent.jump && ctx.body.is_on_floor() {
            ctx.request_state(StateId::JUMPING);
            return;
        }

        let dir = wish_direction(ctx);
        let target = dir * target_speed(ctx);
        let tuning = ctx.tuning;
        let rate = if ctx.body.is_on_floor() {
            tuning.acceleration
        } else {
            tuning.acceleration * tuning.air_control_factor
        };

        approach_horizontal(ctx, target, rate, dt);
        apply_gravity(ctx, dt);
        ctx.body.move_and_slide(dt);
        ctx.push_rigid_bodies();
        face_direction(ctx, dir, dt);

        if ctx.intent.sprint != self.sprinting {
            self.sprinting = ctx.intent.sprint;
            ctx.anim_travel(if self.sprinting { anim::SPRINT } else { anim::WALK });
        }

        let has_input = ctx.intent.has_movement(tuning.float_math_epsilon);
        if !has_input && horizontal_speed_sq(ctx) < tuning.float_math_epsilon {
            ctx.request_state(StateId::IDLE);
        }
    }
}
