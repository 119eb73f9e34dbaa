use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Per-tick intent produced by the input collaborator.
///
/// Button fields are edges for this tick ("just pressed"), except `sprint`,
/// which is held.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputIntent {
    /// Planar wish vector: `x` strafes right, `y` moves forward.
    pub movement: Vector2<f32>,
    /// Camera yaw. When absent, movement is relative to the body's own facing.
    pub view_yaw: Option<f32>,
    pub jump: bool,
    pub sprint: bool,
    pub primary_use: bool,
    pub secondary_use: bool,
    pub interact: bool,
    pub cycle_left: bool,
    pub cycle_right: bool,
    pub drop: bool,
}

impl InputIntent {
    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            movement: Vector2::new(x, y),
            ..Default::default()
        }
    }

    pub fn with_view_yaw(mut self, yaw: f32) -> Self {
        self.view_yaw = Some(yaw);
        self
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn with_sprint(mut self) -> Self {
        self.sprint = true;
        self
    }

    /// Squared wish magnitude above `epsilon`.
    pub fn has_movement(&self, epsilon: f32) -> bool {
        self.movement.norm_squared() > epsilon
    }

    /// -1, 0 or 1 depending on which cycle button was pressed.
    pub fn cycle_direction(&self) -> i32 {
        match (self.cycle_left, self.cycle_right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    /// Clears the one-shot edges after a frame has consumed them.
    pub fn consume_edges(&mut self) {
        self.jump = false;
        self.primary_use = false;
        self.secondary_use = false;
        self.interact = false;
        self.cycle_left = false;
        self.cycle_right = false;
        self.drop = false;
    }
}
