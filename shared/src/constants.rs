use crate::owner::ControllerId;

/// Controller id of the authority peer. The authority always owns id 1.
pub const AUTHORITY_ID: ControllerId = 1;

/// Squared-magnitude threshold below which a vector counts as zero.
///
/// Compared against `norm_squared()`, never against a length.
pub const FLOAT_MATH_EPSILON: f32 = 1.0e-4;

/// Exponential bleed rate applied to horizontal velocity while idle (1/s).
pub const INERTIA_BLEED_FACTOR: f32 = 16.0;

/// Planar target speed while walking (m/s).
pub const WALK_SPEED: f32 = 5.0;

/// Planar target speed while sprinting (m/s).
pub const RUN_SPEED: f32 = 8.5;

/// Exponential approach rate toward the target planar velocity (1/s).
pub const ACCELERATION: f32 = 18.0;

/// Air-control multiplier for planar (XZ) acceleration while airborne.
///
/// Convention:
/// - 1.0 = full ground control in air
/// - 0.0 = no air control
pub const AIR_CONTROL_FACTOR: f32 = 0.35;

/// Exponential approach rate used when turning to face the movement direction (1/s).
pub const ROTATION_SPEED: f32 = 12.0;

/// Initial upward velocity applied when a jump starts (m/s).
pub const JUMP_SPEED: f32 = 6.5;

/// Downward acceleration applied by every locomotion state (m/s^2).
pub const GRAVITY: f32 = 9.8;

/// Impulse magnitude applied to a prop touched by a moving character.
pub const CHARACTER_PUSH_FORCE: f32 = 0.6;

/// Muzzle speed of a blaster dart (m/s).
pub const DART_SHOOT_VELOCITY: f32 = 50.0;

/// Seconds a dart lives before the authority despawns it.
pub const DART_TIME_TO_LIVE: f32 = 3.0;

/// Interaction detection cylinder radius (meters).
pub const INTERACTION_RADIUS: f32 = 2.0;

/// Interaction detection cylinder height (meters).
pub const INTERACTION_HEIGHT: f32 = 1.6;

/// Largest frame delta accepted by a tick driver (seconds).
pub const MAX_FRAME_DT: f32 = 0.25;

/// Animation names a state or overlay may travel to.
pub mod anim {
    pub const IDLE: &str = "idle";
    pub const WALK: &str = "walk";
    pub const SPRINT: &str = "sprint";
    pub const STATIC: &str = "static";
}
