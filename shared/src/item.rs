//! World items: physical props that can be pushed, picked up, equipped and used.

use std::collections::BTreeMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::bitmask_flags::{CollisionLayer, LayerMask};
use crate::config::PropTuning;
use crate::constants::AUTHORITY_ID;
use crate::equipment::Slot;
use crate::error::UseError;
use crate::owner::ControllerId;
use crate::replication::{ItemSnapshot, Replicated};

/// Stable, session-unique item name. Items are looked up by name everywhere.
pub type ItemName = String;

/// What a usable item sees when it fires.
pub struct UseContext<'a> {
    pub user: ControllerId,
    pub transform: &'a Isometry3<f32>,
    pub tuning: &'a PropTuning,
}

/// World change requested by a usable item; applied by the world afterwards.
#[derive(Clone, Debug, PartialEq)]
pub enum UseEffect {
    SpawnProjectile {
        transform: Isometry3<f32>,
        linear_velocity: Vector3<f32>,
    },
}

/// Capability of items with a primary and secondary action.
pub trait Usable {
    fn primary_use(&mut self, ctx: &UseContext<'_>) -> Result<Vec<UseEffect>, UseError>;

    fn secondary_use(&mut self, _ctx: &UseContext<'_>) -> Result<Vec<UseEffect>, UseError> {
        Ok(Vec::new())
    }
}

/// Fires a dart out of the muzzle along the muzzle's -Z.
#[derive(Clone, Debug)]
pub struct Blaster {
    /// Muzzle pose relative to the item origin.
    pub muzzle: Isometry3<f32>,
}

impl Default for Blaster {
    fn default() -> Self {
        Self {
            muzzle: Isometry3::from_parts(
                Translation3::new(0.0, 0.05, -0.35),
                UnitQuaternion::identity(),
            ),
        }
    }
}

impl Usable for Blaster {
    fn primary_use(&mut self, ctx: &UseContext<'_>) -> Result<Vec<UseEffect>, UseError> {
        let muzzle = ctx.transform * self.muzzle;
        let forward = muzzle.rotation * -Vector3::z();
        Ok(vec![UseEffect::SpawnProjectile {
            transform: muzzle,
            linear_velocity: forward * ctx.tuning.dart_shoot_velocity,
        }])
    }
}

/// A physical prop.
pub struct Item {
    pub name: ItemName,
    pub transform: Replicated<Isometry3<f32>>,
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
    /// Frozen items are not simulated; equipped items are always frozen.
    pub frozen: bool,
    pub sleeping: bool,
    pub mass: f32,
    pub layer: LayerMask,
    pub mask: LayerMask,
    /// Extra pose applied after the attachment point when equipped.
    pub alignment_offset: Isometry3<f32>,
    /// Grip pose in item space; aligned with the attachment point when equipped.
    pub grip_local: Option<Isometry3<f32>>,
    /// Peer that simulates this item while it is free.
    pub authority: ControllerId,
    /// Actor whose equipment currently holds this item.
    pub holder: Option<ControllerId>,
    /// Slot a pickup interaction equips this item into.
    pub pickup_slot: Option<Slot>,
    usable: Option<Box<dyn Usable>>,
}

impl Item {
    pub fn new(name: impl Into<ItemName>, transform: Isometry3<f32>) -> Self {
        Self {
            name: name.into(),
            transform: Replicated::new(transform),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            frozen: false,
            sleeping: false,
            mass: 1.0,
            layer: LayerMask::of(&[CollisionLayer::Dynamic]),
            mask: LayerMask::of(&[
                CollisionLayer::World,
                CollisionLayer::Props,
                CollisionLayer::Dynamic,
                CollisionLayer::Characters,
            ]),
            alignment_offset: Isometry3::identity(),
            grip_local: None,
            authority: AUTHORITY_ID,
            holder: None,
            pickup_slot: None,
            usable: None,
        }
    }

    /// Blaster prop, picked up into the right hand.
    pub fn blaster(name: impl Into<ItemName>, transform: Isometry3<f32>) -> Self {
        Self::new(name, transform)
            .with_grip(Isometry3::from_parts(
                Translation3::new(0.0, -0.05, 0.08),
                UnitQuaternion::identity(),
            ))
            .with_pickup_slot(Slot::RightHand)
            .with_usable(Box::new(Blaster::default()))
    }

    /// Rebuilds a mirror of an item another peer described.
    pub fn from_snapshot(snapshot: &ItemSnapshot) -> Self {
        let mut item = Self::new(snapshot.name.clone(), snapshot.transform)
            .with_alignment_offset(snapshot.alignment_offset);
        item.grip_local = snapshot.grip_local;
        item.pickup_slot = snapshot.pickup_slot;
        item
    }

    pub fn with_grip(mut self, grip: Isometry3<f32>) -> Self {
        self.grip_local = Some(grip);
        self
    }

    pub fn with_alignment_offset(mut self, offset: Isometry3<f32>) -> Self {
        self.alignment_offset = offset;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_pickup_slot(mut self, slot: Slot) -> Self {
        self.pickup_slot = Some(slot);
        self
    }

    pub fn with_usable(mut self, usable: Box<dyn Usable>) -> Self {
        self.usable = Some(usable);
        self
    }

    pub fn is_usable(&self) -> bool {
        self.usable.is_some()
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.get().translation.vector
    }

    /// Takes the item out of simulation at rest.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.linear_velocity = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Applies a central impulse and wakes the item. Frozen items ignore it.
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>) -> bool {
        if self.frozen || self.mass <= 0.0 {
            return false;
        }
        self.linear_velocity += impulse / self.mass;
        self.sleeping = false;
        true
    }

    pub fn primary_use(
        &mut self,
        user: ControllerId,
        tuning: &PropTuning,
    ) -> Option<Result<Vec<UseEffect>, UseError>> {
        let transform = *self.transform.get();
        let usable = self.usable.as_mut()?;
        Some(usable.primary_use(&UseContext {
            user,
            transform: &transform,
            tuning,
        }))
    }

    pub fn secondary_use(
        &mut self,
        user: ControllerId,
        tuning: &PropTuning,
    ) -> Option<Result<Vec<UseEffect>, UseError>> {
        let transform = *self.transform.get();
        let usable = self.usable.as_mut()?;
        Some(usable.secondary_use(&UseContext {
            user,
            transform: &transform,
            tuning,
        }))
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            name: self.name.clone(),
            transform: *self.transform.get(),
            alignment_offset: self.alignment_offset,
            grip_local: self.grip_local,
            pickup_slot: self.pickup_slot,
        }
    }
}

/// Every item in the session, keyed by name.
#[derive(Default)]
pub struct ItemRegistry {
    items: BTreeMap<ItemName, Item>,
}

impl ItemRegistry {
    /// Inserts an item, replacing (and returning) any item with the same name.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.name.clone(), item)
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Item> {
        self.items.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.values_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pose_from_yaw;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn blaster_fires_along_muzzle_forward() {
        let tuning = PropTuning::default();
        // Item turned to face +X.
        let mut item = Item::blaster("blaster", pose_from_yaw(Vector3::new(1.0, 1.0, 1.0), -FRAC_PI_2));
        let effects = item.primary_use(2, &tuning).unwrap().unwrap();
        let [UseEffect::SpawnProjectile {
            transform,
            linear_velocity,
        }] = effects.as_slice()
        else {
            panic!("expected one projectile, got {effects:?}");
        };
        assert!((linear_velocity - Vector3::new(50.0, 0.0, 0.0)).norm() < 1.0e-3);
        // Muzzle sits 0.35 ahead of the item along its forward.
        assert!((transform.translation.vector.x - 1.35).abs() < 1.0e-4);
    }

    #[test]
    fn blaster_secondary_does_nothing() {
        let mut item = Item::blaster("blaster", Isometry3::identity());
        let effects = item.secondary_use(2, &PropTuning::default()).unwrap().unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn plain_items_are_not_usable() {
        let mut crate_item = Item::new("crate", Isometry3::identity());
        assert!(!crate_item.is_usable());
        assert!(crate_item.primary_use(2, &PropTuning::default()).is_none());
    }

    #[test]
    fn frozen_items_ignore_impulses() {
        let mut item = Item::new("crate", Isometry3::identity()).with_mass(2.0);
        item.sleeping = true;
        assert!(item.apply_impulse(Vector3::new(2.0, 0.0, 0.0)));
        assert_eq!(item.linear_velocity, Vector3::new(1.0, 0.0, 0.0));
        assert!(!item.sleeping);

        item.freeze();
        assert_eq!(item.linear_velocity, Vector3::zeros());
        assert!(!item.apply_impulse(Vector3::new(2.0, 0.0, 0.0)));
        assert_eq!(item.linear_velocity, Vector3::zeros());
    }

    #[test]
    fn snapshot_round_trips_the_mirror_fields() {
        let item = Item::blaster("blaster", pose_from_yaw(Vector3::new(0.0, 2.0, 0.0), 0.5));
        let mirror = Item::from_snapshot(&item.snapshot());
        assert_eq!(mirror.grip_local, item.grip_local);
        assert_eq!(mirror.pickup_slot, Some(Slot::RightHand));
        assert_eq!(mirror.transform.get(), item.transform.get());
        // Behavior stays on the authority.
        assert!(!mirror.is_usable());
    }
}
