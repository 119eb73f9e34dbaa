/*!
Locomotion state machine.

A [`StateMachine`] owns one instance of every registered [`State`], keyed by
[`StateId`], and tracks which one is current. States never hold references to
the actor; each hook receives a [`StateContext`] carrying the body, the input
intent, tuning and cosmetic hooks for the duration of the call.

Notes
- Transitions requested from inside a hook are queued on the context and
  applied by the owning actor after the hook returns, in request order. The
  actor routes them through the authority gate like any other transition.
- `on_enter`/`on_exit` are paired: exiting a state that was never entered, or
  entering one that is already entered, does nothing.
- Changing to an unknown tag is a no-op that leaves the current state running.
*/

mod idle;
mod jumping;
mod locomotion;
mod walking;

pub use idle::Idle;
pub use jumping::Jumping;
pub use walking::Walking;

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::body::CharacterBody;
use crate::config::CharacterTuning;
use crate::hooks::ActorHooks;
use crate::input::InputIntent;
use crate::owner::PeerContext;

/// Stable numeric tag of a state; this is what goes on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u8);

impl StateId {
    pub const IDLE: StateId = StateId(0);
    pub const WALKING: StateId = StateId(1);
    pub const JUMPING: StateId = StateId(2);
}

/// One value in a [`StatePayload`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PayloadValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Text(String),
    Vector(Vector3<f32>),
}

/// Ordered, named parameters handed to a state's `configure` on entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePayload(BTreeMap<String, PayloadValue>);

impl StatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: PayloadValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    /// Reads a number, accepting integers as well.
    pub fn float(&self, key: &str) -> Option<f32> {
        match self.0.get(key)? {
            PayloadValue::Float(v) => Some(*v),
            PayloadValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn vector(&self, key: &str) -> Option<Vector3<f32>> {
        match self.0.get(key)? {
            PayloadValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Side effects a state asked for during a hook.
#[derive(Debug, Default)]
pub struct StateEffects {
    pub transitions: Vec<(StateId, Option<StatePayload>)>,
    pub push_rigid_bodies: bool,
}

impl StateEffects {
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.push_rigid_bodies = false;
    }
}

/// Everything a state hook may touch.
pub struct StateContext<'a> {
    pub peer: PeerContext,
    pub body: &'a mut dyn CharacterBody,
    pub intent: &'a InputIntent,
    pub tuning: &'a CharacterTuning,
    pub hooks: &'a mut dyn ActorHooks,
    effects: &'a mut StateEffects,
}

impl<'a> StateContext<'a> {
    pub fn new(
        peer: PeerContext,
        body: &'a mut dyn CharacterBody,
        intent: &'a InputIntent,
        tuning: &'a CharacterTuning,
        hooks: &'a mut dyn ActorHooks,
        effects: &'a mut StateEffects,
    ) -> Self {
        Self {
            peer,
            body,
            intent,
            tuning,
            hooks,
            effects,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.peer.is_owner()
    }

    /// Queues a transition to `id` with no payload.
    pub fn request_state(&mut self, id: StateId) {
        self.effects.transitions.push((id, None));
    }

    pub fn request_state_with(&mut self, id: StateId, payload: StatePayload) {
        self.effects.transitions.push((id, Some(payload)));
    }

    /// Asks the actor to push any rigid bodies the last move slid against.
    pub fn push_rigid_bodies(&mut self) {
        self.effects.push_rigid_bodies = true;
    }

    pub fn anim_travel(&mut self, name: &str) {
        self.hooks.anim_travel(name);
    }
}

/// A locomotion state.
///
/// Every hook has an empty default so states only implement what they use.
pub trait State {
    fn id(&self) -> StateId;

    /// Called with the entry payload right before `on_enter`.
    fn configure(&mut self, _payload: &StatePayload) {}

    fn on_enter(&mut self, _ctx: &mut StateContext<'_>) {}

    fn on_exit(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Frame-rate hook.
    fn handle_input(&mut self, _ctx: &mut StateContext<'_>, _dt: f32) {}

    /// Fixed-rate hook.
    fn physics_update(&mut self, _ctx: &mut StateContext<'_>, _dt: f32) {}
}

/// Builds a fresh state instance.
pub type StateFactory = fn() -> Box<dyn State>;

/// The states every actor registers.
pub const LOCOMOTION_STATES: [(StateId, StateFactory); 3] = [
    (StateId::IDLE, idle_state),
    (StateId::WALKING, walking_state),
    (StateId::JUMPING, jumping_state),
];

fn idle_state() -> Box<dyn State> {
    Box::new(Idle::default())
}

fn walking_state() -> Box<dyn State> {
    Box::new(Walking::default())
}

fn jumping_state() -> Box<dyn State> {
    Box::new(Jumping::default())
}

struct Registered {
    state: Box<dyn State>,
    entered: bool,
}

pub struct StateMachine {
    states: BTreeMap<StateId, Registered>,
    current: Option<StateId>,
}

impl StateMachine {
    pub fn from_factories(table: &[(StateId, StateFactory)]) -> Self {
        let mut states = BTreeMap::new();
        for (id, factory) in table {
            let state = factory();
            if state.id() != *id {
                log::warn!("state factory for {id:?} built {:?}; registering under {id:?}", state.id());
            }
            if states
                .insert(
                    *id,
                    Registered {
                        state,
                        entered: false,
                    },
                )
                .is_some()
            {
                log::warn!("duplicate state registration for {id:?}; last one wins");
            }
        }
        Self {
            states,
            current: None,
        }
    }

    pub fn locomotion() -> Self {
        Self::from_factories(&LOCOMOTION_STATES)
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    /// Exits the current state, then configures and enters `next`.
    ///
    /// Changing to the current tag re-enters it. Returns false (and changes
    /// nothing) when `next` is not registered.
    pub fn change_state(
        &mut self,
        next: StateId,
        payload: &StatePayload,
        ctx: &mut StateContext<'_>,
    ) -> bool {
        if !self.states.contains_key(&next) {
            log::debug!("ignoring change to unregistered state {next:?}");
            return false;
        }

        if let Some(current) = self.current.and_then(|id| self.states.get_mut(&id)) {
            if current.entered {
                current.entered = false;
                current.state.on_exit(ctx);
            }
        }

        let Some(entry) = self.states.get_mut(&next) else {
            return false;
        };
        entry.state.configure(payload);
        self.current = Some(next);
        if !entry.entered {
            entry.entered = true;
            entry.state.on_enter(ctx);
        }
        true
    }

    pub fn handle_input(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if let Some(entry) = self.current_mut() {
            entry.state.handle_input(ctx, dt);
        }
    }

    pub fn physics_update(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if let Some(entry) = self.current_mut() {
            entry.state.physics_update(ctx, dt);
        }
    }

    fn current_mut(&mut self) -> Option<&mut Registered> {
        let id = self.current?;
        self.states.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FlatGroundBody;
    use crate::hooks::AnimationOverlay;
    use nalgebra::Isometry3;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    thread_local! {
        static LOG: Log = Rc::new(RefCell::new(Vec::new()));
    }

    fn log(line: String) {
        LOG.with(|l| l.borrow_mut().push(line));
    }

    fn take_log() -> Vec<String> {
        LOG.with(|l| std::mem::take(&mut *l.borrow_mut()))
    }

    /// Records its hooks into the thread-local log.
    struct Probe(StateId);

    impl State for Probe {
        fn id(&self) -> StateId {
            self.0
        }
        fn configure(&mut self, payload: &StatePayload) {
            log(format!("configure {} {}", self.0.0, payload.float("x").unwrap_or(0.0)));
        }
        fn on_enter(&mut self, _ctx: &mut StateContext<'_>) {
            log(format!("enter {}", self.0.0));
        }
        fn on_exit(&mut self, _ctx: &mut StateContext<'_>) {
            log(format!("exit {}", self.0.0));
        }
    }

    fn probe_a() -> Box<dyn State> {
        Box::new(Probe(StateId(10)))
    }

    fn probe_b() -> Box<dyn State> {
        Box::new(Probe(StateId(11)))
    }

    const PROBES: [(StateId, StateFactory); 2] = [(StateId(10), probe_a), (StateId(11), probe_b)];

    fn run(f: impl FnOnce(&mut StateContext<'_>)) {
        let mut body = FlatGroundBody::new(&Isometry3::identity(), 0.0);
        let intent = InputIntent::default();
        let tuning = CharacterTuning::default();
        let mut hooks = AnimationOverlay::default();
        let mut effects = StateEffects::default();
        let mut ctx = StateContext::new(
            PeerContext::new(1, 1),
            &mut body,
            &intent,
            &tuning,
            &mut hooks,
            &mut effects,
        );
        f(&mut ctx);
    }

    #[test]
    fn change_exits_then_configures_then_enters() {
        take_log();
        let mut sm = StateMachine::from_factories(&PROBES);
        run(|ctx| {
            assert!(sm.change_state(StateId(10), &StatePayload::new(), ctx));
            let payload = StatePayload::new().with("x", PayloadValue::Float(2.0));
            assert!(sm.change_state(StateId(11), &payload, ctx));
        });
        assert_eq!(
            take_log(),
            vec!["configure 10 0", "enter 10", "exit 10", "configure 11 2", "enter 11"]
        );
        assert_eq!(sm.current(), Some(StateId(11)));
    }

    #[test]
    fn unknown_tag_leaves_current_running() {
        take_log();
        let mut sm = StateMachine::from_factories(&PROBES);
        run(|ctx| {
            sm.change_state(StateId(10), &StatePayload::new(), ctx);
            assert!(!sm.change_state(StateId(99), &StatePayload::new(), ctx));
        });
        // No exit was issued for the unknown tag.
        assert_eq!(take_log(), vec!["configure 10 0", "enter 10"]);
        assert_eq!(sm.current(), Some(StateId(10)));
    }

    #[test]
    fn same_tag_re_enters_with_paired_hooks() {
        take_log();
        let mut sm = StateMachine::from_factories(&PROBES);
        run(|ctx| {
            sm.change_state(StateId(10), &StatePayload::new(), ctx);
            sm.change_state(StateId(10), &StatePayload::new(), ctx);
        });
        let log = take_log();
        let enters = log.iter().filter(|l| l.starts_with("enter")).count();
        let exits = log.iter().filter(|l| l.starts_with("exit")).count();
        assert_eq!((enters, exits), (2, 1));
    }

    #[test]
    fn payload_reads_numbers_and_vectors() {
        let payload = StatePayload::new()
            .with("jump_speed", PayloadValue::Int(9))
            .with("velocity_bias", PayloadValue::Vector(Vector3::new(1.0, 0.0, 0.0)))
            .with("label", PayloadValue::Text("hop".into()));
        assert_eq!(payload.float("jump_speed"), Some(9.0));
        assert_eq!(payload.vector("velocity_bias"), Some(Vector3::x()));
        assert_eq!(payload.float("label"), None);
        assert_eq!(payload.float("missing"), None);
    }

    #[test]
    fn locomotion_table_registers_all_three() {
        let sm = StateMachine::locomotion();
        for id in [StateId::IDLE, StateId::WALKING, StateId::JUMPING] {
            assert!(sm.contains(id));
        }
        assert!(!sm.contains(StateId(3)));
        assert_eq!(sm.current(), None);
    }
}
