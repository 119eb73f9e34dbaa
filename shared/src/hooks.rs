//! Cosmetic collaborators notified by actors.
//!
//! Nothing here feeds back into gameplay. Hooks run on every peer that applies
//! the corresponding change, including replicas.

use std::cell::RefCell;
use std::rc::Rc;

use crate::equipment::Slot;

pub trait ActorHooks {
    /// A state asked the animation layer to travel to `name`.
    fn anim_travel(&mut self, _name: &str) {}

    fn on_equipped(&mut self, _item: &str, _slot: Slot) {}

    fn on_unequipped(&mut self, _item: &str, _slot: Slot) {}

    /// The primary action of a held item fired.
    fn on_primary_use(&mut self) {}
}

/// Hooks that ignore everything.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoopHooks;

impl ActorHooks for NoopHooks {}

/// Upper-body overlay state derived from hook calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    /// Last travel target of the locomotion layer.
    pub travel: Option<String>,
    /// Blend weight of the hold pose (1.0 while something is in the right hand).
    pub hold_blend: f32,
    /// Number of shoot one-shots fired.
    pub shots: u32,
    /// Every travel target in call order.
    pub travel_log: Vec<String>,
    /// Equip/unequip notifications as `(item, slot, equipped)`.
    pub equip_log: Vec<(String, Slot, bool)>,
}

/// Animation overlay driver.
///
/// Cloning shares the underlying state, so a caller can keep a handle for
/// reading while the actor owns the hooks.
#[derive(Clone, Debug, Default)]
pub struct AnimationOverlay {
    state: Rc<RefCell<OverlayState>>,
}

impl AnimationOverlay {
    pub fn snapshot(&self) -> OverlayState {
        self.state.borrow().clone()
    }
}

impl ActorHooks for AnimationOverlay {
    fn anim_travel(&mut self, name: &str) {
        let mut state = self.state.borrow_mut();
        state.travel = Some(name.to_owned());
        state.travel_log.push(name.to_owned());
    }

    fn on_equipped(&mut self, item: &str, slot: Slot) {
        let mut state = self.state.borrow_mut();
        if slot == Slot::RightHand {
            state.hold_blend = 1.0;
        }
        state.equip_log.push((item.to_owned(), slot, true));
    }

    fn on_unequipped(&mut self, item: &str, slot: Slot) {
        let mut state = self.state.borrow_mut();
        if slot == Slot::RightHand {
            state.hold_blend = 0.0;
        }
        state.equip_log.push((item.to_owned(), slot, false));
    }

    fn on_primary_use(&mut self) {
        self.state.borrow_mut().shots += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_blend_follows_right_hand() {
        let overlay = AnimationOverlay::default();
        let mut hooks = overlay.clone();
        hooks.on_equipped("blaster", Slot::LeftHand);
        assert_eq!(overlay.snapshot().hold_blend, 0.0);
        hooks.on_equipped("blaster", Slot::RightHand);
        assert_eq!(overlay.snapshot().hold_blend, 1.0);
        hooks.on_unequipped("blaster", Slot::RightHand);
        assert_eq!(overlay.snapshot().hold_blend, 0.0);
        assert_eq!(overlay.snapshot().equip_log.len(), 3);
    }
}
