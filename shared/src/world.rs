//! Session-wide objects that are not actors.

use nalgebra::{Isometry3, Vector3};

use crate::equipment::Slot;
use crate::interaction::{InteractableRegistry, PickupInteractable};
use crate::item::{Item, ItemRegistry, UseEffect};
use crate::probe::{NoSurface, SurfaceProbe};
use crate::replication::ItemSnapshot;

/// A fired dart.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub transform: Isometry3<f32>,
    pub linear_velocity: Vector3<f32>,
    /// Seconds since spawn.
    pub age: f32,
}

/// Projectile lifecycle changes since the last drain.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectileEvent {
    Spawned(Projectile),
    Despawned(u64),
}

pub struct World {
    pub items: ItemRegistry,
    pub interactables: InteractableRegistry,
    projectiles: Vec<Projectile>,
    next_projectile: u64,
    projectile_events: Vec<ProjectileEvent>,
    /// Level geometry used for placement probes.
    pub probe: Box<dyn SurfaceProbe>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Box::new(NoSurface))
    }
}

impl World {
    pub fn new(probe: Box<dyn SurfaceProbe>) -> Self {
        Self {
            items: ItemRegistry::default(),
            interactables: InteractableRegistry::default(),
            projectiles: Vec::new(),
            next_projectile: 1,
            projectile_events: Vec::new(),
            probe,
        }
    }

    /// Adds an item, and a pickup interactable for it when it has a pickup slot.
    pub fn spawn_item(&mut self, item: Item) {
        if let Some(slot) = item.pickup_slot {
            let pickup = PickupInteractable::new(item.name.clone(), slot);
            self.interactables.insert(Box::new(pickup));
        }
        log::info!("spawned item {}", item.name);
        if let Some(previous) = self.items.insert(item) {
            log::warn!("item {} replaced an existing item", previous.name);
        }
    }

    /// Mirrors an item described by the authority.
    pub fn mirror_item(&mut self, snapshot: &ItemSnapshot) {
        if self.items.contains(&snapshot.name) {
            return;
        }
        self.spawn_item(Item::from_snapshot(snapshot));
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Applies effects requested by a usable item.
    pub fn apply_use_effects(&mut self, effects: Vec<UseEffect>) {
        for effect in effects {
            match effect {
                UseEffect::SpawnProjectile {
                    transform,
                    linear_velocity,
                } => {
                    let id = self.next_projectile;
                    self.next_projectile += 1;
                    self.insert_projectile(Projectile {
                        id,
                        transform,
                        linear_velocity,
                        age: 0.0,
                    });
                }
            }
        }
    }

    /// Adds a projectile (authority spawn or mirrored from an update).
    pub fn insert_projectile(&mut self, projectile: Projectile) {
        log::debug!("projectile {} spawned", projectile.id);
        self.projectile_events.push(ProjectileEvent::Spawned(projectile.clone()));
        self.projectiles.push(projectile);
    }

    pub fn remove_projectile(&mut self, id: u64) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id != id);
        before != self.projectiles.len()
    }

    /// Integrates projectiles under gravity and despawns those older than `ttl`.
    pub fn step_projectiles(&mut self, dt: f32, gravity: f32, ttl: f32) {
        for projectile in &mut self.projectiles {
            projectile.age += dt;
            projectile.linear_velocity.y -= gravity * dt;
            let step = projectile.linear_velocity * dt;
            projectile.transform.translation.vector += step;
        }

        let (expired, alive): (Vec<_>, Vec<_>) = std::mem::take(&mut self.projectiles)
            .into_iter()
            .partition(|p| p.age >= ttl);
        self.projectiles = alive;
        for projectile in expired {
            log::debug!("projectile {} expired", projectile.id);
            self.projectile_events.push(ProjectileEvent::Despawned(projectile.id));
        }
    }

    pub fn drain_projectile_events(&mut self) -> Vec<ProjectileEvent> {
        std::mem::take(&mut self.projectile_events)
    }

    /// Applies a push impulse to a free item. Unknown or frozen items are ignored.
    pub fn push_item(&mut self, name: &str, impulse: Vector3<f32>) -> bool {
        let Some(item) = self.items.get_mut(name) else {
            log::debug!("push ignored, no item {name}");
            return false;
        };
        item.apply_impulse(impulse)
    }

    /// Removes an item and its pickup.
    pub fn despawn_item(&mut self, name: &str) -> Option<Item> {
        self.interactables.remove(name);
        self.items.remove(name)
    }

    /// Slot the item is picked up into, if it is a pickup.
    pub fn pickup_slot(&self, name: &str) -> Option<Slot> {
        self.items.get(name)?.pickup_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropTuning;

    #[test]
    fn spawning_a_pickup_registers_an_interactable() {
        let mut world = World::default();
        world.spawn_item(Item::blaster("blaster", Isometry3::identity()));
        world.spawn_item(Item::new("crate", Isometry3::identity()));

        assert!(world.interactables.contains("blaster"));
        assert!(!world.interactables.contains("crate"));
        assert_eq!(world.pickup_slot("blaster"), Some(Slot::RightHand));

        world.despawn_item("blaster");
        assert!(!world.interactables.contains("blaster"));
    }

    #[test]
    fn projectiles_fly_then_expire() {
        let mut world = World::default();
        let mut blaster = Item::blaster("blaster", Isometry3::identity());
        let effects = blaster.primary_use(1, &PropTuning::default()).unwrap().unwrap();
        world.apply_use_effects(effects);
        assert_eq!(world.projectiles().len(), 1);
        let id = world.projectiles()[0].id;

        world.step_projectiles(0.5, 9.8, 3.0);
        let z = world.projectiles()[0].transform.translation.vector.z;
        assert!(z < -20.0, "dart should travel forward, z = {z}");

        world.step_projectiles(2.5, 9.8, 3.0);
        assert!(world.projectiles().is_empty());
        assert_eq!(
            world.drain_projectile_events().last(),
            Some(&ProjectileEvent::Despawned(id))
        );
        assert!(world.drain_projectile_events().is_empty());
    }

    #[test]
    fn pushes_skip_frozen_and_unknown_items() {
        let mut world = World::default();
        world.spawn_item(Item::new("crate", Isometry3::identity()));
        assert!(world.push_item("crate", Vector3::new(0.0, 0.0, -1.0)));
        assert!(!world.push_item("ghost", Vector3::x()));

        world.items.get_mut("crate").unwrap().freeze();
        assert!(!world.push_item("crate", Vector3::x()));
    }
}
