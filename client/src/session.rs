//! A connected, non-authority peer.
//!
//! The client mirrors what the authority broadcasts and simulates only its own
//! actor: it reads local input, predicts its own state transitions, drives its
//! own attachments and forwards every request to the authority.

use std::collections::BTreeMap;

use shared::actor::Actor;
use shared::config::GameplayConfig;
use shared::constants::MAX_FRAME_DT;
use shared::hooks::AnimationOverlay;
use shared::input::InputIntent;
use shared::messages::Envelope;
use shared::model::{AssetResolver, ModelCache};
use shared::owner::ControllerId;
use shared::probe::SurfaceProbe;
use shared::transport::Transport;
use shared::utils::clamp_dt;
use shared::world::World;

pub struct ClientSession<T: Transport, R: AssetResolver> {
    pub(crate) local: ControllerId,
    pub(crate) config: GameplayConfig,
    pub(crate) world: World,
    pub(crate) actors: BTreeMap<ControllerId, Actor>,
    pub(crate) overlays: BTreeMap<ControllerId, AnimationOverlay>,
    pub(crate) transport: T,
    pub(crate) models: ModelCache<R>,
    intent: InputIntent,
}

impl<T: Transport, R: AssetResolver> ClientSession<T, R> {
    pub fn new(
        local: ControllerId,
        config: GameplayConfig,
        transport: T,
        resolver: R,
        probe: Box<dyn SurfaceProbe>,
    ) -> Self {
        Self {
            local,
            config,
            world: World::new(probe),
            actors: BTreeMap::new(),
            overlays: BTreeMap::new(),
            transport,
            models: ModelCache::new(resolver),
            intent: InputIntent::default(),
        }
    }

    pub fn local(&self) -> ControllerId {
        self.local
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn actor(&self, controller: ControllerId) -> Option<&Actor> {
        self.actors.get(&controller)
    }

    /// This peer's own actor, once the authority has announced it.
    pub fn local_actor(&self) -> Option<&Actor> {
        self.actors.get(&self.local)
    }

    /// Animation overlay of an actor, for the renderer.
    pub fn overlay(&self, controller: ControllerId) -> Option<&AnimationOverlay> {
        self.overlays.get(&controller)
    }

    /// HUD prompt for whatever the local actor is targeting.
    pub fn interaction_prompt(&self) -> Option<String> {
        self.local_actor()?.current_prompt(&self.world)
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Input for the next frame.
    pub fn local_input(&mut self, intent: InputIntent) {
        self.intent = intent;
    }

    pub fn frame_tick(&mut self, dt: f32) {
        let dt = clamp_dt(dt, MAX_FRAME_DT);
        let intent = std::mem::take(&mut self.intent);
        if let Some(actor) = self.actors.get_mut(&self.local) {
            actor.handle_input(dt, &intent, &mut self.world);
        }
        self.flush();
    }

    pub fn physics_tick(&mut self, dt: f32) {
        let dt = clamp_dt(dt, MAX_FRAME_DT);
        if let Some(actor) = self.actors.get_mut(&self.local) {
            actor.physics_update(dt, &mut self.world);
        }

        // The authority decides when darts expire.
        let gravity = self.config.character.gravity;
        self.world.step_projectiles(dt, gravity, f32::INFINITY);
        self.world.drain_projectile_events();
        self.flush();
    }

    fn flush(&mut self) {
        let Some(actor) = self.actors.get_mut(&self.local) else {
            return;
        };
        for request in actor.take_outbound() {
            log::trace!("sending {}", request.label());
            self.transport.send_to_authority(Envelope {
                sender: self.local,
                actor: self.local,
                request,
            });
        }
    }
}
