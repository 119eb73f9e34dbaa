/*!
A networked character.

An [`Actor`] composes the locomotion [`StateMachine`], its [`Equipment`], and
interaction targeting, and exposes every mutation through the authority gate:

- State transitions run locally on the authority. A remote owner predicts them
  and forwards a [`Request::SetState`].
- Equipment, use, drop and interaction are authority-exclusive. A remote owner
  only forwards the request; observers do nothing.
- Requests arriving at the authority are checked against the actor's
  controller before anything is touched.

Replicated fields (state id and payload, model, display name, transform and
slots) are written on the authority and collected with [`Actor::take_changes`].
Peers apply them with [`Actor::apply_field`].

Notes
- Only the owning peer simulates the body. The authority mirrors remote-owned
  bodies from reported transforms.
- The owner never lets an authority transform update move its own body.
*/

use std::panic::{self, AssertUnwindSafe};

use nalgebra::{Isometry3, Point3};

use crate::authority::{authorize, route, DropReason, OpClass, RequestOutcome};
use crate::body::CharacterBody;
use crate::config::GameplayConfig;
use crate::equipment::{Equipment, Slot};
use crate::hooks::ActorHooks;
use crate::input::InputIntent;
use crate::interaction::{InteractionTargeting, TargetingView};
use crate::item::{ItemName, ItemRegistry};
use crate::messages::Request;
use crate::model::{ModelHandle, ModelId};
use crate::owner::{ControllerId, PeerContext};
use crate::proximity::ProximityTracker;
use crate::replication::{ActorSnapshot, FieldUpdate, FieldValue, Replicated};
use crate::state::{StateContext, StateEffects, StateId, StateMachine, StatePayload};
use crate::utils::forward_from_yaw;
use crate::world::World;

/// Transitions requested while applying transitions are followed this many times.
const MAX_TRANSITION_PASSES: usize = 4;

/// Collaborators an actor is built from.
pub struct ActorParts {
    pub model: ModelHandle,
    pub body: Box<dyn CharacterBody>,
    pub hooks: Box<dyn ActorHooks>,
}

struct Fields {
    state_id: Replicated<StateId>,
    state_payload: Replicated<StatePayload>,
    model_id: Replicated<ModelId>,
    display_name: Replicated<String>,
    transform: Replicated<Isometry3<f32>>,
}

pub struct Actor {
    peer: PeerContext,
    state_id: Replicated<StateId>,
    state_payload: Replicated<StatePayload>,
    model_id: Replicated<ModelId>,
    display_name: Replicated<String>,
    transform: Replicated<Isometry3<f32>>,
    states: StateMachine,
    effects: StateEffects,
    intent: InputIntent,
    equipment: Equipment,
    targeting: InteractionTargeting,
    proximity: ProximityTracker,
    body: Box<dyn CharacterBody>,
    hooks: Box<dyn ActorHooks>,
    config: GameplayConfig,
    outbox: Vec<Request>,
}

impl Actor {
    /// A fresh actor in Idle, as created by the authority.
    pub fn spawn(
        local: ControllerId,
        controller: ControllerId,
        display_name: impl Into<String>,
        parts: ActorParts,
        config: &GameplayConfig,
    ) -> Self {
        let fields = Fields {
            state_id: Replicated::new(StateId::IDLE),
            state_payload: Replicated::new(StatePayload::new()),
            model_id: Replicated::new(parts.model.id),
            display_name: Replicated::new(display_name.into()),
            transform: Replicated::new(parts.body.transform()),
        };
        Self::assemble(local, controller, fields, parts, config)
    }

    /// An actor mirrored from the authority's snapshot.
    ///
    /// Slots are bound against `items`, which should already hold the mirrored items.
    pub fn from_snapshot(
        local: ControllerId,
        snapshot: &ActorSnapshot,
        mut parts: ActorParts,
        config: &GameplayConfig,
        items: &mut ItemRegistry,
    ) -> Self {
        let mut fields = Fields {
            state_id: Replicated::new(StateId::IDLE),
            state_payload: Replicated::new(StatePayload::new()),
            model_id: Replicated::new(parts.model.id),
            display_name: Replicated::new(String::new()),
            transform: Replicated::new(parts.body.transform()),
        };
        let mut slots = Vec::new();
        for update in &snapshot.fields {
            let version = update.version;
            match &update.value {
                FieldValue::StatePayload(payload) => {
                    fields.state_payload = Replicated::at_version(payload.clone(), version)
                }
                FieldValue::StateId(id) => fields.state_id = Replicated::at_version(*id, version),
                FieldValue::ModelId(model) => {
                    fields.model_id = Replicated::at_version(*model, version)
                }
                FieldValue::DisplayName(name) => {
                    fields.display_name = Replicated::at_version(name.clone(), version)
                }
                FieldValue::Transform(transform) => {
                    parts.body.set_transform(*transform);
                    fields.transform = Replicated::at_version(*transform, version);
                }
                FieldValue::Slot { slot, item } => slots.push((*slot, version, item.clone())),
            }
        }

        let mut actor = Self::assemble(local, snapshot.actor, fields, parts, config);
        for (slot, version, item) in slots {
            actor
                .equipment
                .apply_remote(slot, version, item, items, actor.hooks.as_mut());
        }
        actor
    }

    fn assemble(
        local: ControllerId,
        controller: ControllerId,
        fields: Fields,
        parts: ActorParts,
        config: &GameplayConfig,
    ) -> Self {
        let mut equipment = Equipment::new(controller);
        equipment.bind_sockets(parts.model.sockets.clone());

        let mut actor = Self {
            peer: PeerContext::new(local, controller),
            state_id: fields.state_id,
            state_payload: fields.state_payload,
            model_id: fields.model_id,
            display_name: fields.display_name,
            transform: fields.transform,
            states: StateMachine::locomotion(),
            effects: StateEffects::default(),
            intent: InputIntent::default(),
            equipment,
            targeting: InteractionTargeting::default(),
            proximity: ProximityTracker::new(&config.interaction),
            body: parts.body,
            hooks: parts.hooks,
            config: config.clone(),
            outbox: Vec::new(),
        };

        let initial = *actor.state_id.get();
        let payload = actor.state_payload.get().clone();
        if !actor.with_states(|states, ctx| states.change_state(initial, &payload, ctx)) {
            log::warn!("actor {controller} spawned in unregistered state {initial:?}");
        }
        actor.effects.clear();
        actor
    }

    pub fn controller(&self) -> ControllerId {
        self.peer.controller
    }

    pub fn peer(&self) -> PeerContext {
        self.peer
    }

    pub fn state(&self) -> StateId {
        *self.state_id.get()
    }

    pub fn state_payload(&self) -> &StatePayload {
        self.state_payload.get()
    }

    pub fn state_version(&self) -> u32 {
        self.state_id.version()
    }

    pub fn model(&self) -> ModelId {
        *self.model_id.get()
    }

    pub fn display_name(&self) -> &str {
        self.display_name.get()
    }

    /// Current pose of the body.
    pub fn transform(&self) -> Isometry3<f32> {
        self.body.transform()
    }

    pub fn transform_version(&self) -> u32 {
        self.transform.version()
    }

    pub fn body(&self) -> &dyn CharacterBody {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn CharacterBody {
        self.body.as_mut()
    }

    pub fn item_in(&self, slot: Slot) -> Option<&str> {
        self.equipment.item_in(slot)
    }

    pub fn slot_version(&self, slot: Slot) -> u32 {
        self.equipment.slot_version(slot)
    }

    pub fn current_target(&self) -> Option<&str> {
        self.targeting.current()
    }

    /// Interaction candidates in targeting order.
    pub fn candidates(&self) -> &[String] {
        self.targeting.ordered()
    }

    /// Prompt of the current target, for the UI.
    pub fn current_prompt(&self, world: &World) -> Option<String> {
        world.interactables.get(self.targeting.current()?)?.prompt()
    }

    /// Requests waiting to go to the authority.
    pub fn take_outbound(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    fn with_states<R>(
        &mut self,
        f: impl FnOnce(&mut StateMachine, &mut StateContext<'_>) -> R,
    ) -> R {
        let mut ctx = StateContext::new(
            self.peer,
            self.body.as_mut(),
            &self.intent,
            &self.config.character,
            self.hooks.as_mut(),
            &mut self.effects,
        );
        f(&mut self.states, &mut ctx)
    }

    fn unauthorized(&self) -> RequestOutcome {
        RequestOutcome::Dropped(DropReason::Unauthorized {
            sender: self.peer.local,
            controller: self.peer.controller,
        })
    }

    /// Asks for a state change, routed by the peer's role.
    pub fn request_state(&mut self, state: StateId, payload: Option<StatePayload>) -> RequestOutcome {
        let route = route(&self.peer, OpClass::StateTransition);
        if route.is_dropped() {
            return self.unauthorized();
        }
        if !self.states.contains(state) {
            log::debug!("actor {} has no state {state:?}", self.peer.controller);
            return RequestOutcome::Dropped(DropReason::UnknownState(state.0));
        }

        if route.apply_locally {
            self.set_state(state, payload.clone());
        }
        if route.send_to_authority {
            self.outbox.push(Request::SetState { state, payload });
            return RequestOutcome::Sent;
        }
        RequestOutcome::Applied
    }

    /// Writes the state fields and runs the transition. Requesting the current
    /// state re-enters it.
    fn set_state(&mut self, state: StateId, payload: Option<StatePayload>) {
        let payload = payload.unwrap_or_default();
        if self.peer.is_authority() {
            self.state_payload.set(payload.clone());
            self.state_id.set(state);
        } else {
            self.state_payload.predict(payload.clone());
            self.state_id.predict(state);
        }
        self.with_states(|states, ctx| states.change_state(state, &payload, ctx));
    }

    fn apply_transitions(&mut self) {
        for _ in 0..MAX_TRANSITION_PASSES {
            if self.effects.transitions.is_empty() {
                return;
            }
            let pending = std::mem::take(&mut self.effects.transitions);
            for (state, payload) in pending {
                self.request_state(state, payload);
            }
        }
        if !self.effects.transitions.is_empty() {
            log::warn!(
                "actor {} dropped {} chained transitions",
                self.peer.controller,
                self.effects.transitions.len()
            );
            self.effects.transitions.clear();
        }
    }

    /// Per-frame input step. Only the owning peer reads input.
    pub fn handle_input(&mut self, dt: f32, intent: &InputIntent, world: &mut World) {
        self.intent = intent.clone();
        if !self.peer.is_owner() {
            return;
        }

        self.with_states(|states, ctx| states.handle_input(ctx, dt));
        self.apply_transitions();

        let direction = intent.cycle_direction();
        if direction != 0 {
            self.targeting.cycle(direction);
        }
        if intent.interact {
            self.try_interact(world);
        }
        if intent.primary_use {
            self.primary_use(world);
        }
        if intent.secondary_use {
            self.secondary_use(world);
        }
        if intent.drop {
            self.drop_item(world);
        }
    }

    /// Fixed-rate simulation step.
    pub fn physics_update(&mut self, dt: f32, world: &mut World) {
        if self.peer.is_owner() {
            self.with_states(|states, ctx| states.physics_update(ctx, dt));
            if std::mem::take(&mut self.effects.push_rigid_bodies) {
                self.push_rigid_bodies(world);
            }
            self.apply_transitions();
            self.sync_transform();
            self.intent.consume_edges();
        }

        if self.peer.drives_attachments() {
            let pose = self.body.transform();
            self.equipment
                .drive(&pose, &mut world.items, self.peer.is_authority());
        }

        if self.peer.is_authority() || self.peer.is_owner() {
            self.update_targeting(world);
        }
    }

    fn sync_transform(&mut self) {
        let pose = self.body.transform();
        if self.peer.is_authority() {
            self.transform.set(pose);
        } else if self.transform.predict(pose) {
            self.outbox.push(Request::ReportTransform { transform: pose });
        }
    }

    fn push_rigid_bodies(&mut self, world: &mut World) {
        let force = self.config.props.push_force;
        let pushes: Vec<(ItemName, _)> = self
            .body
            .slide_collisions()
            .iter()
            .filter_map(|contact| Some((contact.item.clone()?, -contact.normal * force)))
            .collect();

        for (item, impulse) in pushes {
            if self.peer.is_authority() {
                world.push_item(&item, impulse);
            } else if !world.items.get(&item).is_some_and(|known| known.frozen) {
                self.outbox.push(Request::PushProp { item, impulse });
            }
        }
    }

    fn update_targeting(&mut self, world: &World) {
        let positions = world.interactables.positions(&world.items);
        let pose = self.body.transform();
        let origin = Point3::from(pose.translation.vector);
        let events = self
            .proximity
            .update(&origin, positions.iter().map(|(id, point)| (id.as_str(), *point)));

        let view = TargetingView {
            origin,
            forward: forward_from_yaw(self.body.yaw()),
            positions: &positions,
        };
        for id in &events.exited {
            self.targeting.on_proximity_exit(id, &view);
        }
        for id in &events.entered {
            self.targeting.on_proximity_enter(id, &view);
        }
        self.targeting.refresh(&view);
    }

    pub fn cycle_target(&mut self, direction: i32) {
        self.targeting.cycle(direction);
    }

    fn gate(&mut self, request: Request, world: &mut World) -> RequestOutcome {
        let route = route(&self.peer, OpClass::AuthorityExclusive);
        if route.apply_locally {
            self.perform(request, world)
        } else if route.send_to_authority {
            log::debug!("actor {} forwarding {}", self.peer.controller, request.label());
            self.outbox.push(request);
            RequestOutcome::Sent
        } else {
            self.unauthorized()
        }
    }

    pub fn equip(&mut self, item: &str, slot: &str, world: &mut World) -> RequestOutcome {
        let request = Request::Equip {
            item: item.to_owned(),
            slot: slot.to_owned(),
        };
        self.gate(request, world)
    }

    pub fn unequip(&mut self, slot: &str, world: &mut World) -> RequestOutcome {
        self.gate(
            Request::Unequip {
                slot: slot.to_owned(),
            },
            world,
        )
    }

    pub fn primary_use(&mut self, world: &mut World) -> RequestOutcome {
        let outcome = self.gate(Request::PrimaryUse, world);
        if matches!(outcome, RequestOutcome::Sent) {
            self.hooks.on_primary_use();
        }
        outcome
    }

    pub fn secondary_use(&mut self, world: &mut World) -> RequestOutcome {
        self.gate(Request::SecondaryUse, world)
    }

    /// Drops whatever is in the right hand, else the left hand.
    pub fn drop_item(&mut self, world: &mut World) -> RequestOutcome {
        self.gate(Request::Drop, world)
    }

    /// Interacts with the current target.
    pub fn try_interact(&mut self, world: &mut World) -> RequestOutcome {
        let Some(target) = self.targeting.current().map(str::to_owned) else {
            return RequestOutcome::Dropped(DropReason::NoTarget);
        };
        self.gate(Request::Interact { target }, world)
    }

    /// Authority-only: changes the character model and rebinds the sockets.
    pub fn set_model(&mut self, model: &ModelHandle) -> RequestOutcome {
        if !self.peer.is_authority() {
            return RequestOutcome::Dropped(DropReason::NotAuthority);
        }
        self.model_id.set(model.id);
        self.bind_model(model);
        RequestOutcome::Applied
    }

    /// Rebinds sockets after the model id changed, on any peer.
    pub fn bind_model(&mut self, model: &ModelHandle) {
        self.equipment.bind_sockets(model.sockets.clone());
    }

    /// Authority-only.
    pub fn set_display_name(&mut self, name: impl Into<String>) -> RequestOutcome {
        if !self.peer.is_authority() {
            return RequestOutcome::Dropped(DropReason::NotAuthority);
        }
        self.display_name.set(name.into());
        RequestOutcome::Applied
    }

    /// Authority entry point for a request sent by `sender`.
    pub fn handle_request(
        &mut self,
        sender: ControllerId,
        request: Request,
        world: &mut World,
    ) -> RequestOutcome {
        if let Err(reason) = authorize(&self.peer, sender) {
            log::debug!("dropped {} for actor {}: {reason}", request.label(), self.peer.controller);
            return RequestOutcome::Dropped(reason);
        }
        self.perform(request, world)
    }

    fn perform(&mut self, request: Request, world: &mut World) -> RequestOutcome {
        match request {
            Request::SetState { state, payload } => {
                if !self.states.contains(state) {
                    return RequestOutcome::Dropped(DropReason::UnknownState(state.0));
                }
                self.set_state(state, payload);
                self.apply_transitions();
                RequestOutcome::Applied
            }
            Request::Equip { item, slot } => self.perform_equip(item, &slot, world),
            Request::Unequip { slot } => {
                let slot = match slot.parse::<Slot>() {
                    Ok(slot) => slot,
                    Err(unknown) => {
                        log::warn!("unknown slot {}", unknown.0);
                        return RequestOutcome::Dropped(DropReason::UnknownSlot(unknown.0));
                    }
                };
                self.equipment
                    .set_slot(slot, None, &mut world.items, self.hooks.as_mut());
                RequestOutcome::Applied
            }
            Request::PrimaryUse => self.perform_use(true, world),
            Request::SecondaryUse => self.perform_use(false, world),
            Request::Drop => self.perform_drop(world),
            Request::Interact { target } => self.perform_interact(&target, world),
            Request::PushProp { item, impulse } => {
                if !world.items.contains(&item) {
                    return RequestOutcome::Dropped(DropReason::UnknownItem(item));
                }
                world.push_item(&item, impulse);
                RequestOutcome::Applied
            }
            Request::ReportTransform { transform } => {
                self.body.set_transform(transform);
                self.transform.set(transform);
                RequestOutcome::Applied
            }
        }
    }

    fn perform_equip(&mut self, item: ItemName, slot: &str, world: &mut World) -> RequestOutcome {
        let slot = match slot.parse::<Slot>() {
            Ok(slot) => slot,
            Err(unknown) => {
                log::warn!("unknown slot {}", unknown.0);
                return RequestOutcome::Dropped(DropReason::UnknownSlot(unknown.0));
            }
        };
        let Some(found) = world.items.get(&item) else {
            return RequestOutcome::Dropped(DropReason::UnknownItem(item));
        };
        if found.holder.is_some_and(|holder| holder != self.peer.controller) {
            return RequestOutcome::Dropped(DropReason::ItemHeld(item));
        }

        // An item lives in one slot per actor; equipping elsewhere moves it.
        let others: Vec<Slot> = self
            .equipment
            .slots_holding(&item)
            .filter(|other| *other != slot)
            .collect();
        for other in others {
            self.equipment
                .set_slot(other, None, &mut world.items, self.hooks.as_mut());
        }

        if self
            .equipment
            .set_slot(slot, Some(item.clone()), &mut world.items, self.hooks.as_mut())
        {
            log::info!("actor {} equipped {item} in {slot}", self.peer.controller);
        }
        RequestOutcome::Applied
    }

    fn perform_use(&mut self, primary: bool, world: &mut World) -> RequestOutcome {
        let Some((_, name)) = self.equipment.primary_slot() else {
            return RequestOutcome::Dropped(DropReason::NothingEquipped);
        };
        let name = name.to_owned();
        let Some(item) = world.items.get_mut(&name) else {
            return RequestOutcome::Dropped(DropReason::UnknownItem(name));
        };

        let user = self.peer.controller;
        let props = &self.config.props;
        let used = panic::catch_unwind(AssertUnwindSafe(|| {
            if primary {
                item.primary_use(user, props)
            } else {
                item.secondary_use(user, props)
            }
        }));
        let Ok(used) = used else {
            log::warn!("use of {name} panicked");
            return RequestOutcome::Dropped(DropReason::EffectFailed(format!("{name} panicked")));
        };
        match used {
            None => RequestOutcome::Dropped(DropReason::NotUsable(name)),
            Some(Ok(effects)) => {
                world.apply_use_effects(effects);
                if primary {
                    self.hooks.on_primary_use();
                }
                RequestOutcome::Applied
            }
            Some(Err(err)) => {
                log::warn!("use of {name} failed: {err}");
                RequestOutcome::Dropped(DropReason::EffectFailed(err.to_string()))
            }
        }
    }

    fn perform_drop(&mut self, world: &mut World) -> RequestOutcome {
        let pose = self.body.transform();
        let dropped = self.equipment.drop_primary(
            &pose,
            world.probe.as_ref(),
            &self.config.drop,
            &mut world.items,
            self.hooks.as_mut(),
        );
        match dropped {
            Some(name) => {
                log::info!("actor {} dropped {name}", self.peer.controller);
                RequestOutcome::Applied
            }
            None => RequestOutcome::Dropped(DropReason::NothingEquipped),
        }
    }

    fn perform_interact(&mut self, target: &str, world: &mut World) -> RequestOutcome {
        if !self.targeting.contains(target) {
            return RequestOutcome::Dropped(DropReason::UnknownTarget(target.to_owned()));
        }
        let Some(interactable) = world.interactables.get_mut(target) else {
            return RequestOutcome::Dropped(DropReason::UnknownTarget(target.to_owned()));
        };

        let interactor = self.peer.controller;
        let items = &world.items;
        let result = panic::catch_unwind(AssertUnwindSafe(|| interactable.interact(interactor, items)));
        let follow_ups = match result {
            Ok(Ok(requests)) => requests,
            Ok(Err(err)) => {
                log::warn!("interaction with {target} failed: {err}");
                return RequestOutcome::Dropped(DropReason::EffectFailed(err.to_string()));
            }
            Err(_) => {
                log::warn!("interaction with {target} panicked");
                return RequestOutcome::Dropped(DropReason::EffectFailed(format!(
                    "{target} panicked"
                )));
            }
        };

        for request in follow_ups {
            let label = request.label();
            let outcome = self.perform(request, world);
            if !outcome.is_applied() {
                log::debug!("follow-up {label} from {target}: {outcome:?}");
            }
        }
        RequestOutcome::Applied
    }

    /// Unequips everything, e.g. when the controlling peer leaves.
    pub fn release_equipment(&mut self, world: &mut World) {
        self.equipment
            .release_all(&mut world.items, self.hooks.as_mut());
    }

    /// Applies one authority update on a non-authority peer.
    ///
    /// Returns true when the stored value changed. A model change is reported
    /// through the return value; the caller resolves it and calls
    /// [`Actor::bind_model`].
    pub fn apply_field(&mut self, version: u32, value: FieldValue, items: &mut ItemRegistry) -> bool {
        match value {
            FieldValue::StatePayload(payload) => {
                self.state_payload.apply_remote(version, payload).is_some()
            }
            FieldValue::StateId(state) => {
                if self.state_id.apply_remote(version, state).is_none() {
                    return false;
                }
                let payload = self.state_payload.get().clone();
                self.with_states(|states, ctx| states.change_state(state, &payload, ctx));
                self.effects.clear();
                true
            }
            FieldValue::ModelId(model) => self.model_id.apply_remote(version, model).is_some(),
            FieldValue::DisplayName(name) => {
                self.display_name.apply_remote(version, name).is_some()
            }
            FieldValue::Transform(transform) => {
                if self.transform.apply_remote(version, transform).is_none() {
                    return false;
                }
                if !self.peer.is_owner() {
                    self.body.set_transform(transform);
                }
                true
            }
            FieldValue::Slot { slot, item } => {
                self.equipment
                    .apply_remote(slot, version, item, items, self.hooks.as_mut())
            }
        }
    }

    /// Authority: replicated fields changed since the last call, payload
    /// before state id.
    pub fn take_changes(&mut self) -> Vec<FieldUpdate> {
        let actor = self.peer.controller;
        let mut changes = Vec::new();
        let mut push = |version: u32, value: FieldValue| {
            changes.push(FieldUpdate {
                actor,
                version,
                value,
            })
        };

        if let Some((version, payload)) = self.state_payload.take_dirty() {
            push(version, FieldValue::StatePayload(payload));
        }
        if let Some((version, state)) = self.state_id.take_dirty() {
            push(version, FieldValue::StateId(state));
        }
        if let Some((version, model)) = self.model_id.take_dirty() {
            push(version, FieldValue::ModelId(model));
        }
        if let Some((version, name)) = self.display_name.take_dirty() {
            push(version, FieldValue::DisplayName(name));
        }
        if let Some((version, transform)) = self.transform.take_dirty() {
            push(version, FieldValue::Transform(transform));
        }
        for (slot, version, item) in self.equipment.take_dirty() {
            push(version, FieldValue::Slot { slot, item });
        }
        changes
    }

    /// Every replicated field at its current version, for late joiners.
    pub fn snapshot(&self) -> ActorSnapshot {
        let actor = self.peer.controller;
        let field = |version: u32, value: FieldValue| FieldUpdate {
            actor,
            version,
            value,
        };

        let mut fields = vec![
            field(
                self.state_payload.version(),
                FieldValue::StatePayload(self.state_payload.get().clone()),
            ),
            field(self.state_id.version(), FieldValue::StateId(*self.state_id.get())),
            field(self.model_id.version(), FieldValue::ModelId(*self.model_id.get())),
            field(
                self.display_name.version(),
                FieldValue::DisplayName(self.display_name.get().clone()),
            ),
            field(self.transform.version(), FieldValue::Transform(*self.transform.get())),
        ];
        fields.extend(
            self.equipment
                .snapshot()
                .into_iter()
                .map(|(slot, version, item)| field(version, FieldValue::Slot { slot, item })),
        );
        ActorSnapshot { actor, fields }
    }
}
