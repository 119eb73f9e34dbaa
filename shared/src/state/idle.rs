use nalgebra::Vector3;

use super::locomotion::{apply_gravity, approach_horizontal};
use super::{State, StateContext, StateId};
use crate::constants::anim;

/// Standing still. Bleeds off leftover horizontal speed and keeps falling if airborne.
#[derive(Debug, Default)]
pub struct Idle;

impl State for Idle {
    fn id(&self) -> StateId {
        StateId::IDLE
    }

    fn on_enter(&mut self, ctx: &mut StateContext<'_>) {
        let velocity = ctx.body.velocity();
        ctx.body.set_velocity(Vector3::new(0.0, velocity.y, 0.0));
        ctx.anim_travel(anim::STATIC);
    }

    fn handle_input(&mut self, ctx: &mut StateContext<'_>, _dt: f32) {
        if !ctx.is_owner() {
            return;
        }

        if ctx.intent.jump && ctx.body.is_on_floor() {
            ctx.request_state(StateId::JUMPING);
        } else if ctx.intent.has_movement(ctx.tuning.float_math_epsilon) {
            ctx.request_state(StateId::WALKING);
        }
    }

    fn physics_update(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if !ctx.is_owner() {
            return;
        }

        let bleed = ctx.tuning.inertia_bleed_factor;
        approach_horizontal(ctx, Vector3::zeros(), bleed, dt);
        apply_gravity(ctx, dt);
        ctx.body.move_and_slide(dt);
    }
}
