//! Applying authority broadcasts.
//!
//! Every update is checked against the version this peer already holds; stale
//! and duplicate updates change nothing. Items driven by the local actor keep
//! their locally predicted pose.

use shared::actor::{Actor, ActorParts};
use shared::body::FlatGroundBody;
use shared::equipment::Slot;
use shared::hooks::AnimationOverlay;
use shared::model::AssetResolver;
use shared::replication::{ActorSnapshot, FieldUpdate, FieldValue, Replication};
use shared::transport::Transport;
use shared::world::Projectile;

use crate::session::ClientSession;

impl<T: Transport, R: AssetResolver> ClientSession<T, R> {
    /// Applies one broadcast. Returns true when anything changed.
    pub fn apply_update(&mut self, update: Replication) -> bool {
        match update {
            Replication::ActorSpawned(snapshot) => self.mirror_actor(&snapshot),
            Replication::ActorDespawned { actor } => {
                let Some(mut removed) = self.actors.remove(&actor) else {
                    return false;
                };
                removed.release_equipment(&mut self.world);
                self.overlays.remove(&actor);
                log::info!("actor {actor} left");
                true
            }
            Replication::Field(update) => self.apply_field(update),
            Replication::ItemSpawned(snapshot) => {
                if self.world.items.contains(&snapshot.name) {
                    return false;
                }
                self.world.mirror_item(&snapshot);
                true
            }
            Replication::ItemTransform {
                item,
                version,
                transform,
            } => {
                let driven = self
                    .local_actor()
                    .is_some_and(|actor| Slot::ALL.iter().any(|slot| actor.item_in(*slot) == Some(item.as_str())));
                let Some(mirrored) = self.world.items.get_mut(&item) else {
                    log::debug!("transform for unknown item {item}");
                    return false;
                };
                let Some(previous) = mirrored.transform.apply_remote(version, transform) else {
                    return false;
                };
                if driven {
                    mirrored.transform.predict(previous);
                }
                true
            }
            Replication::ProjectileSpawned {
                id,
                transform,
                linear_velocity,
            } => {
                self.world.insert_projectile(Projectile {
                    id,
                    transform,
                    linear_velocity,
                    age: 0.0,
                });
                true
            }
            Replication::ProjectileDespawned { id } => self.world.remove_projectile(id),
        }
    }

    fn mirror_actor(&mut self, snapshot: &ActorSnapshot) -> bool {
        if self.actors.contains_key(&snapshot.actor) {
            return false;
        }
        let model = match self.models.resolve(snapshot.model()) {
            Ok(model) => model,
            Err(err) => {
                log::warn!("cannot mirror actor {}: {err}", snapshot.actor);
                return false;
            }
        };

        let overlay = AnimationOverlay::default();
        let parts = ActorParts {
            model,
            body: Box::new(FlatGroundBody::new(&snapshot.transform(), 0.0)),
            hooks: Box::new(overlay.clone()),
        };
        let actor = Actor::from_snapshot(
            self.local,
            snapshot,
            parts,
            &self.config,
            &mut self.world.items,
        );
        log::info!("mirrored actor {} ({})", snapshot.actor, actor.display_name());
        self.overlays.insert(snapshot.actor, overlay);
        self.actors.insert(snapshot.actor, actor);
        true
    }

    fn apply_field(&mut self, update: FieldUpdate) -> bool {
        let Some(actor) = self.actors.get_mut(&update.actor) else {
            log::debug!("update for unknown actor {}", update.actor);
            return false;
        };
        let model = match update.value {
            FieldValue::ModelId(model) => Some(model),
            _ => None,
        };
        if !actor.apply_field(update.version, update.value, &mut self.world.items) {
            return false;
        }

        if let Some(model) = model {
            match self.models.resolve(model) {
                Ok(handle) => actor.bind_model(&handle),
                Err(err) => log::warn!("actor {} keeps its old sockets: {err}", update.actor),
            }
        }
        true
    }
}
