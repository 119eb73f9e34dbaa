//! Kinematic character body.
//!
//! Locomotion states talk to the body only through [`CharacterBody`]; the
//! physics backend behind it is free to be anything that can move a capsule
//! and report what it slid against.

use nalgebra::{Isometry3, Vector3};

use crate::item::ItemName;
use crate::utils::{pose_from_yaw, yaw_of};

/// A contact produced by the last `move_and_slide`.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideCollision {
    /// Set when the contact is a rigid-body prop, by item name.
    pub item: Option<ItemName>,
    /// Contact normal, pointing from the prop toward the character.
    pub normal: Vector3<f32>,
}

pub trait CharacterBody {
    fn velocity(&self) -> Vector3<f32>;

    fn set_velocity(&mut self, velocity: Vector3<f32>);

    /// Facing around +Y; yaw 0 faces -Z.
    fn yaw(&self) -> f32;

    fn set_yaw(&mut self, yaw: f32);

    fn transform(&self) -> Isometry3<f32>;

    fn set_transform(&mut self, transform: Isometry3<f32>);

    fn is_on_floor(&self) -> bool;

    /// Integrates the current velocity over `dt`, sliding along contacts.
    fn move_and_slide(&mut self, dt: f32);

    /// Contacts from the last `move_and_slide`.
    fn slide_collisions(&self) -> &[SlideCollision];
}

/// Body over an infinite horizontal floor at `ground_height`.
///
/// `contacts` are reported after every move; game glue or tests fill them in.
#[derive(Clone, Debug)]
pub struct FlatGroundBody {
    position: Vector3<f32>,
    yaw: f32,
    velocity: Vector3<f32>,
    ground_height: f32,
    on_floor: bool,
    pub contacts: Vec<SlideCollision>,
}

impl FlatGroundBody {
    pub fn new(spawn: &Isometry3<f32>, ground_height: f32) -> Self {
        let position = spawn.translation.vector;
        Self {
            position,
            yaw: yaw_of(&spawn.rotation),
            velocity: Vector3::zeros(),
            ground_height,
            on_floor: position.y <= ground_height + f32::EPSILON,
            contacts: Vec::new(),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }
}

impl CharacterBody for FlatGroundBody {
    fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vector3<f32>) {
        self.velocity = velocity;
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }

    fn transform(&self) -> Isometry3<f32> {
        pose_from_yaw(self.position, self.yaw)
    }

    fn set_transform(&mut self, transform: Isometry3<f32>) {
        self.position = transform.translation.vector;
        self.yaw = yaw_of(&transform.rotation);
        self.on_floor = self.position.y <= self.ground_height + f32::EPSILON;
    }

    fn is_on_floor(&self) -> bool {
        self.on_floor
    }

    fn move_and_slide(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        if self.position.y <= self.ground_height {
            self.position.y = self.ground_height;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            self.on_floor = true;
        } else {
            self.on_floor = false;
        }
    }

    fn slide_collisions(&self) -> &[SlideCollision] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lands_and_zeroes_downward_velocity() {
        let spawn = pose_from_yaw(Vector3::new(0.0, 1.0, 0.0), 0.0);
        let mut body = FlatGroundBody::new(&spawn, 0.0);
        assert!(!body.is_on_floor());

        body.set_velocity(Vector3::new(1.0, -20.0, 0.0));
        body.move_and_slide(0.1);
        assert!(body.is_on_floor());
        assert_eq!(body.velocity().y, 0.0);
        assert_eq!(body.position().y, 0.0);
        assert!((body.position().x - 0.1).abs() < 1.0e-6);
    }

    #[test]
    fn upward_velocity_leaves_the_floor() {
        let mut body = FlatGroundBody::new(&Isometry3::identity(), 0.0);
        assert!(body.is_on_floor());
        body.set_velocity(Vector3::new(0.0, 6.5, 0.0));
        body.move_and_slide(1.0 / 60.0);
        assert!(!body.is_on_floor());
    }
}
