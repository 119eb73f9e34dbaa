//! The authority host.
//!
//! A [`ServerSession`] owns the world, one [`Actor`] per connected peer, and the
//! inbound request queue. Each physics tick:
//!
//! 1. Queued requests are applied in arrival order, each to the actor it names.
//! 2. Every actor runs its physics step.
//! 3. Projectiles age and expire.
//! 4. Changed fields, item poses and projectile events are broadcast.
//!
//! Dropped requests are logged and otherwise invisible to their sender.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use shared::actor::{Actor, ActorParts};
use shared::authority::{DropReason, RequestOutcome};
use shared::body::FlatGroundBody;
use shared::constants::AUTHORITY_ID;
use shared::hooks::NoopHooks;
use shared::input::InputIntent;
use shared::item::Item;
use shared::messages::{Envelope, Inbox};
use shared::model::{AssetResolver, ModelCache, ModelId};
use shared::owner::ControllerId;
use shared::probe::SurfaceProbe;
use shared::replication::Replication;
use shared::transport::Transport;
use shared::utils::{clamp_dt, pose_from_yaw};
use shared::world::{ProjectileEvent, World};

use crate::config::ServerConfig;
use crate::error::SessionError;

pub struct ServerSession<T: Transport, R: AssetResolver> {
    pub(crate) config: ServerConfig,
    pub(crate) world: World,
    pub(crate) actors: BTreeMap<ControllerId, Actor>,
    pub(crate) inbox: Inbox,
    pub(crate) transport: T,
    pub(crate) models: ModelCache<R>,
    pub(crate) local_intent: InputIntent,
}

impl<T: Transport, R: AssetResolver> ServerSession<T, R> {
    pub fn new(config: ServerConfig, transport: T, resolver: R, probe: Box<dyn SurfaceProbe>) -> Self {
        Self {
            config,
            world: World::new(probe),
            actors: BTreeMap::new(),
            inbox: Inbox::default(),
            transport,
            models: ModelCache::new(resolver),
            local_intent: InputIntent::default(),
        }
    }

    /// Spawns the host's own actor.
    pub fn start(&mut self) -> Result<(), SessionError> {
        log::info!(
            "{} hosting on {} for up to {} players",
            self.config.server_name,
            self.config.endpoint(),
            self.config.max_players
        );
        let name = self.config.host_name.clone();
        self.spawn_actor(AUTHORITY_ID, name)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn actor(&self, controller: ControllerId) -> Option<&Actor> {
        self.actors.get(&controller)
    }

    pub fn actor_mut(&mut self, controller: ControllerId) -> Option<&mut Actor> {
        self.actors.get_mut(&controller)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn spawn_actor(
        &mut self,
        controller: ControllerId,
        display_name: String,
    ) -> Result<(), SessionError> {
        if self.actors.contains_key(&controller) {
            return Err(SessionError::AlreadyJoined(controller));
        }
        if self.actors.len() >= self.config.max_players {
            return Err(SessionError::Full {
                max: self.config.max_players,
            });
        }

        let model = self.models.resolve(ModelId::default())?;
        let offset = Vector3::x() * (self.actors.len() as f32 * self.config.spawn_spacing);
        let spawn = pose_from_yaw(self.config.spawn_point + offset, 0.0);
        let parts = ActorParts {
            model,
            body: Box::new(FlatGroundBody::new(&spawn, self.config.ground_height)),
            hooks: Box::new(NoopHooks),
        };
        let actor = Actor::spawn(
            AUTHORITY_ID,
            controller,
            display_name,
            parts,
            &self.config.gameplay,
        );

        log::info!("spawned actor {controller} ({})", actor.display_name());
        self.transport
            .broadcast(Replication::ActorSpawned(actor.snapshot()));
        self.actors.insert(controller, actor);
        Ok(())
    }

    /// Adds an item to the world and announces it.
    pub fn spawn_item(&mut self, item: Item) {
        let snapshot = item.snapshot();
        self.world.spawn_item(item);
        self.transport.broadcast(Replication::ItemSpawned(snapshot));
    }

    /// Swaps an actor's model.
    pub fn set_model(&mut self, controller: ControllerId, model: ModelId) -> Result<(), SessionError> {
        let handle = self.models.resolve(model)?;
        let actor = self
            .actors
            .get_mut(&controller)
            .ok_or(SessionError::UnknownPeer(controller))?;
        actor.set_model(&handle);
        Ok(())
    }

    /// Everything a newly connected peer needs, items before actors.
    pub fn snapshot(&self) -> Vec<Replication> {
        let items = self
            .world
            .items
            .iter()
            .map(|item| Replication::ItemSpawned(item.snapshot()));
        let actors = self
            .actors
            .values()
            .map(|actor| Replication::ActorSpawned(actor.snapshot()));
        let projectiles = self.world.projectiles().iter().map(|projectile| {
            Replication::ProjectileSpawned {
                id: projectile.id,
                transform: projectile.transform,
                linear_velocity: projectile.linear_velocity,
            }
        });
        items.chain(actors).chain(projectiles).collect()
    }

    /// Queues a request for the next physics tick.
    pub fn enqueue(&mut self, envelope: Envelope) {
        log::trace!(
            "queued {} from {} for actor {}",
            envelope.request.label(),
            envelope.sender,
            envelope.actor
        );
        self.inbox.push(envelope);
    }

    pub fn pending_requests(&self) -> usize {
        self.inbox.len()
    }

    /// Input of the host's own actor for the next frame.
    pub fn set_local_intent(&mut self, intent: InputIntent) {
        self.local_intent = intent;
    }

    /// Frame step: the host reads its own input.
    pub fn frame_tick(&mut self, dt: f32) {
        let dt = clamp_dt(dt, self.config.max_frame_dt);
        let intent = std::mem::take(&mut self.local_intent);
        if let Some(host) = self.actors.get_mut(&AUTHORITY_ID) {
            host.handle_input(dt, &intent, &mut self.world);
        }
    }

    /// Fixed step. Returns the outcome of every request applied, in arrival order.
    pub fn physics_tick(&mut self, dt: f32) -> Vec<RequestOutcome> {
        let dt = clamp_dt(dt, self.config.max_frame_dt);
        let outcomes = self.drain_requests();

        for actor in self.actors.values_mut() {
            actor.physics_update(dt, &mut self.world);
        }

        let props = &self.config.gameplay.props;
        let gravity = self.config.gameplay.character.gravity;
        self.world
            .step_projectiles(dt, gravity, props.dart_time_to_live);

        self.broadcast_changes();
        outcomes
    }

    fn drain_requests(&mut self) -> Vec<RequestOutcome> {
        let envelopes: Vec<Envelope> = self.inbox.drain().collect();
        envelopes
            .into_iter()
            .map(|envelope| {
                let label = envelope.request.label();
                let outcome = match self.actors.get_mut(&envelope.actor) {
                    Some(actor) => actor.handle_request(envelope.sender, envelope.request, &mut self.world),
                    None => RequestOutcome::Dropped(DropReason::UnknownActor(envelope.actor)),
                };
                if let RequestOutcome::Dropped(reason) = &outcome {
                    log::debug!("dropped {label} from {}: {reason}", envelope.sender);
                }
                outcome
            })
            .collect()
    }

    pub(crate) fn broadcast_changes(&mut self) {
        for actor in self.actors.values_mut() {
            for update in actor.take_changes() {
                self.transport.broadcast(Replication::Field(update));
            }
        }

        for item in self.world.items.iter_mut() {
            if let Some((version, transform)) = item.transform.take_dirty() {
                self.transport.broadcast(Replication::ItemTransform {
                    item: item.name.clone(),
                    version,
                    transform,
                });
            }
        }

        for event in self.world.drain_projectile_events() {
            let update = match event {
                ProjectileEvent::Spawned(projectile) => Replication::ProjectileSpawned {
                    id: projectile.id,
                    transform: projectile.transform,
                    linear_velocity: projectile.linear_velocity,
                },
                ProjectileEvent::Despawned(id) => Replication::ProjectileDespawned { id },
            };
            self.transport.broadcast(update);
        }
    }
}
