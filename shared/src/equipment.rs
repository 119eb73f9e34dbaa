/*!
Equipment slots and attachment.

Each actor has a fixed set of named [`Slot`]s, each holding at most one item
name. A slot is a replicated field; every change to it, whether written by the
authority or applied from an update, runs the same binding routine:

1. If the slot held an item that is leaving, that item is unfrozen, the
   unequipped hook fires and the actor no longer drives it.
2. If the slot now names an item, that item is resolved, frozen at rest, and
   the equipped hook fires.

Notes
- An item bound in any slot is frozen; an item bound in none is not. When an
  item leaves one slot while still bound in another, it stays frozen.
- Items are resolved by name. A name that does not resolve yet (e.g. the item
  has not been mirrored here) leaves the slot set and binds nothing.
- Equipped items follow their attachment point every physics tick on the
  authority and the owning peer only.
*/

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use nalgebra::{Isometry3, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::bitmask_flags::drop_surface_mask;
use crate::config::DropTuning;
use crate::constants::{AUTHORITY_ID, FLOAT_MATH_EPSILON};
use crate::hooks::ActorHooks;
use crate::item::{ItemName, ItemRegistry};
use crate::model::SocketLayout;
use crate::owner::ControllerId;
use crate::probe::SurfaceProbe;
use crate::replication::Replicated;
use crate::utils::{planar, pose_from_yaw, yaw_from_xz};

/// A named attachment point on a character.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    Head,
    Back,
    LeftHand,
    RightHand,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Head, Slot::Back, Slot::LeftHand, Slot::RightHand];

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Head => "Head",
            Slot::Back => "Back",
            Slot::LeftHand => "LeftHand",
            Slot::RightHand => "RightHand",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSlot(pub String);

impl FromStr for Slot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.name() == s)
            .ok_or_else(|| UnknownSlot(s.to_owned()))
    }
}

/// World pose of an equipped item.
///
/// The item is placed so that its grip point lands on `attach * offset`. Without
/// a grip, the item origin lands there instead.
pub fn aligned_transform(
    attach: &Isometry3<f32>,
    offset: &Isometry3<f32>,
    grip_local: Option<&Isometry3<f32>>,
) -> Isometry3<f32> {
    match grip_local {
        Some(grip) => attach * offset * grip.inverse(),
        None => attach * offset,
    }
}

/// Where an item dropped by an actor at `actor` comes to rest.
///
/// A probe ray is cast straight down from a point in front of and above the
/// actor. The item lands slightly above the first hit, or at the bottom of the
/// ray when nothing was hit, facing the actor's yaw.
pub fn drop_placement(
    actor: &Isometry3<f32>,
    probe: &dyn SurfaceProbe,
    tuning: &DropTuning,
) -> Isometry3<f32> {
    let facing = planar(actor.rotation * -Vector3::z());
    let forward = if facing.norm_squared() < FLOAT_MATH_EPSILON {
        -Vector3::z()
    } else {
        facing.normalize()
    };
    let up = Vector3::y();

    let origin = Point3::from(actor.translation.vector);
    let start = origin + forward * tuning.forward_offset + up * tuning.probe_height;
    let end = start - up * tuning.probe_depth;

    let rest = match probe.cast_segment(&start, &end, drop_surface_mask()) {
        Some(hit) => hit.point,
        None => end,
    };

    let yaw = yaw_from_xz(Vector2::new(forward.x, forward.z)).unwrap_or(0.0);
    pose_from_yaw(rest.coords + up * tuning.surface_lift, yaw)
}

/// An actor's slots.
pub struct Equipment {
    controller: ControllerId,
    slots: BTreeMap<Slot, Replicated<Option<ItemName>>>,
    sockets: Option<SocketLayout>,
}

impl Equipment {
    pub fn new(controller: ControllerId) -> Self {
        Self {
            controller,
            slots: Slot::ALL
                .into_iter()
                .map(|slot| (slot, Replicated::new(None)))
                .collect(),
            sockets: None,
        }
    }

    /// Attachment points of the current model. Until bound, nothing is driven.
    pub fn bind_sockets(&mut self, sockets: SocketLayout) {
        self.sockets = Some(sockets);
    }

    pub fn item_in(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot)?.get().as_deref()
    }

    pub fn slot_version(&self, slot: Slot) -> u32 {
        self.slots.get(&slot).map_or(0, |field| field.version())
    }

    /// Slots currently naming `item`.
    pub fn slots_holding<'a>(&'a self, item: &'a str) -> impl Iterator<Item = Slot> + 'a {
        self.slots
            .iter()
            .filter(move |(_, field)| field.get().as_deref() == Some(item))
            .map(|(slot, _)| *slot)
    }

    pub fn is_bound(&self, item: &str) -> bool {
        self.slots_holding(item).next().is_some()
    }

    /// The item primary/secondary use and drop act on: right hand, else left hand.
    pub fn primary_slot(&self) -> Option<(Slot, &str)> {
        [Slot::RightHand, Slot::LeftHand]
            .into_iter()
            .find_map(|slot| self.item_in(slot).map(|item| (slot, item)))
    }

    /// Authority write of one slot. Returns true when the slot changed.
    pub fn set_slot(
        &mut self,
        slot: Slot,
        next: Option<ItemName>,
        items: &mut ItemRegistry,
        hooks: &mut dyn ActorHooks,
    ) -> bool {
        let Some(field) = self.slots.get_mut(&slot) else {
            return false;
        };
        let prev = field.get().clone();
        if !field.set(next.clone()) {
            return false;
        }
        self.apply_slot(slot, prev.as_deref(), next.as_deref(), items, hooks);
        true
    }

    /// Applies a slot update from the authority. Returns true when the slot changed.
    pub fn apply_remote(
        &mut self,
        slot: Slot,
        version: u32,
        next: Option<ItemName>,
        items: &mut ItemRegistry,
        hooks: &mut dyn ActorHooks,
    ) -> bool {
        let Some(field) = self.slots.get_mut(&slot) else {
            return false;
        };
        let Some(prev) = field.apply_remote(version, next.clone()) else {
            return false;
        };
        self.apply_slot(slot, prev.as_deref(), next.as_deref(), items, hooks);
        true
    }

    fn apply_slot(
        &self,
        slot: Slot,
        prev: Option<&str>,
        next: Option<&str>,
        items: &mut ItemRegistry,
        hooks: &mut dyn ActorHooks,
    ) {
        if let Some(prev) = prev.filter(|prev| Some(*prev) != next) {
            if let Some(item) = items.get_mut(prev) {
                let ours = item.holder.is_none_or(|holder| holder == self.controller);
                if ours && !self.is_bound(prev) {
                    item.unfreeze();
                    item.holder = None;
                }
                hooks.on_unequipped(prev, slot);
            }
        }

        let Some(next) = next else {
            return;
        };
        let Some(item) = items.get_mut(next) else {
            log::debug!("slot {slot} names {next:?}, which is not present here yet");
            return;
        };
        item.freeze();
        item.holder = Some(self.controller);
        hooks.on_equipped(next, slot);
    }

    /// Clears every slot, releasing whatever was held.
    pub fn release_all(&mut self, items: &mut ItemRegistry, hooks: &mut dyn ActorHooks) {
        for slot in Slot::ALL {
            self.set_slot(slot, None, items, hooks);
        }
    }

    /// Moves every bound item onto its attachment point.
    ///
    /// Non-authoritative peers only predict the pose, leaving replication
    /// versions to the authority.
    pub fn drive(&self, actor: &Isometry3<f32>, items: &mut ItemRegistry, authoritative: bool) {
        let Some(sockets) = &self.sockets else {
            return;
        };
        for (slot, field) in &self.slots {
            let Some(name) = field.get() else {
                continue;
            };
            let Some(item) = items.get_mut(name) else {
                continue;
            };
            let attach = actor * sockets.socket(*slot);
            let pose = aligned_transform(&attach, &item.alignment_offset, item.grip_local.as_ref());
            if authoritative {
                item.transform.set(pose);
            } else {
                item.transform.predict(pose);
            }
        }
    }

    /// Pending slot changes for the outbound diff, in slot order.
    pub fn take_dirty(&mut self) -> Vec<(Slot, u32, Option<ItemName>)> {
        self.slots
            .iter_mut()
            .filter_map(|(slot, field)| {
                field
                    .take_dirty()
                    .map(|(version, item)| (*slot, version, item))
            })
            .collect()
    }

    /// Every slot with its version, for a join snapshot.
    pub fn snapshot(&self) -> Vec<(Slot, u32, Option<ItemName>)> {
        self.slots
            .iter()
            .map(|(slot, field)| (*slot, field.version(), field.get().clone()))
            .collect()
    }

    /// Releases the primary item and places it in the world in front of the actor.
    pub fn drop_primary(
        &mut self,
        actor: &Isometry3<f32>,
        probe: &dyn SurfaceProbe,
        tuning: &DropTuning,
        items: &mut ItemRegistry,
        hooks: &mut dyn ActorHooks,
    ) -> Option<ItemName> {
        let (slot, name) = self.primary_slot()?;
        let name = name.to_owned();
        self.set_slot(slot, None, items, hooks);

        let placement = drop_placement(actor, probe, tuning);
        if let Some(item) = items.get_mut(&name) {
            item.transform.set(placement);
            item.authority = AUTHORITY_ID;
            item.unfreeze();
            item.linear_velocity = Vector3::zeros();
            item.angular_velocity = Vector3::zeros();
        }
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::AnimationOverlay;
    use crate::item::Item;
    use crate::probe::{FlatSurface, NoSurface};
    use nalgebra::{Translation3, UnitQuaternion};
    use std::f32::consts::FRAC_PI_2;

    fn registry() -> ItemRegistry {
        let mut items = ItemRegistry::default();
        items.insert(Item::blaster("blaster", Isometry3::translation(3.0, 0.0, 0.0)));
        items.insert(Item::new("hat", Isometry3::translation(0.0, 0.0, 3.0)));
        items
    }

    fn close(a: &Isometry3<f32>, b: &Isometry3<f32>) -> bool {
        (a.translation.vector - b.translation.vector).norm() < 1.0e-4
            && a.rotation.angle_to(&b.rotation) < 1.0e-4
    }

    #[test]
    fn slot_names_parse_exactly() {
        assert_eq!("RightHand".parse::<Slot>(), Ok(Slot::RightHand));
        assert_eq!("Back".parse::<Slot>(), Ok(Slot::Back));
        assert_eq!("Tail".parse::<Slot>(), Err(UnknownSlot("Tail".into())));
    }

    #[test]
    fn equip_freezes_and_notifies() {
        let mut items = registry();
        items.get_mut("blaster").unwrap().linear_velocity = Vector3::new(1.0, 2.0, 3.0);
        let overlay = AnimationOverlay::default();
        let mut hooks = overlay.clone();
        let mut eq = Equipment::new(4);

        assert!(eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks));
        let blaster = items.get("blaster").unwrap();
        assert!(blaster.frozen);
        assert_eq!(blaster.linear_velocity, Vector3::zeros());
        assert_eq!(blaster.holder, Some(4));
        assert_eq!(
            overlay.snapshot().equip_log,
            vec![("blaster".to_owned(), Slot::RightHand, true)]
        );
    }

    #[test]
    fn equipping_the_same_item_twice_is_idempotent() {
        let mut items = registry();
        let overlay = AnimationOverlay::default();
        let mut hooks = overlay.clone();
        let mut eq = Equipment::new(4);

        eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks);
        assert!(!eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks));
        assert_eq!(overlay.snapshot().equip_log.len(), 1);
        assert_eq!(eq.slot_version(Slot::RightHand), 1);
    }

    #[test]
    fn replacing_releases_the_previous_item() {
        let mut items = registry();
        let overlay = AnimationOverlay::default();
        let mut hooks = overlay.clone();
        let mut eq = Equipment::new(4);

        eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks);
        eq.set_slot(Slot::RightHand, Some("hat".into()), &mut items, &mut hooks);

        assert!(!items.get("blaster").unwrap().frozen);
        assert_eq!(items.get("blaster").unwrap().holder, None);
        assert!(items.get("hat").unwrap().frozen);
        assert_eq!(
            overlay.snapshot().equip_log,
            vec![
                ("blaster".to_owned(), Slot::RightHand, true),
                ("blaster".to_owned(), Slot::RightHand, false),
                ("hat".to_owned(), Slot::RightHand, true),
            ]
        );
    }

    #[test]
    fn item_bound_elsewhere_stays_frozen_when_one_slot_clears() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);

        eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks);
        eq.set_slot(Slot::Back, Some("blaster".into()), &mut items, &mut hooks);
        eq.set_slot(Slot::RightHand, None, &mut items, &mut hooks);

        assert!(items.get("blaster").unwrap().frozen);
        assert_eq!(eq.slots_holding("blaster").collect::<Vec<_>>(), vec![Slot::Back]);
    }

    #[test]
    fn unresolved_names_leave_the_slot_set() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);

        assert!(eq.apply_remote(Slot::Head, 3, Some("ghost".into()), &mut items, &mut hooks));
        assert_eq!(eq.item_in(Slot::Head), Some("ghost"));
        // Stale update is ignored.
        assert!(!eq.apply_remote(Slot::Head, 2, None, &mut items, &mut hooks));
        assert_eq!(eq.item_in(Slot::Head), Some("ghost"));
    }

    #[test]
    fn primary_slot_prefers_right_hand() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);

        assert_eq!(eq.primary_slot(), None);
        eq.set_slot(Slot::LeftHand, Some("hat".into()), &mut items, &mut hooks);
        assert_eq!(eq.primary_slot(), Some((Slot::LeftHand, "hat")));
        eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks);
        assert_eq!(eq.primary_slot(), Some((Slot::RightHand, "blaster")));
    }

    #[test]
    fn grip_lands_on_the_attachment_point() {
        let attach = Isometry3::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.7),
        );
        let offset = Isometry3::from_parts(
            Translation3::new(0.0, 0.1, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2),
        );
        let grip = Isometry3::translation(0.0, -0.05, 0.08);

        let pose = aligned_transform(&attach, &offset, Some(&grip));
        assert!(close(&(pose * grip), &(attach * offset)));

        let no_grip = aligned_transform(&attach, &offset, None);
        assert!(close(&no_grip, &(attach * offset)));
    }

    #[test]
    fn drive_follows_sockets_and_needs_a_model() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);
        eq.set_slot(Slot::RightHand, Some("hat".into()), &mut items, &mut hooks);

        let actor = pose_from_yaw(Vector3::new(10.0, 0.0, 0.0), FRAC_PI_2);
        let before = *items.get("hat").unwrap().transform.get();
        eq.drive(&actor, &mut items, true);
        assert_eq!(*items.get("hat").unwrap().transform.get(), before);

        let sockets = SocketLayout::default();
        eq.bind_sockets(sockets.clone());
        eq.drive(&actor, &mut items, false);
        let expected = actor * sockets.right_hand;
        let hat = items.get("hat").unwrap();
        assert!(close(hat.transform.get(), &expected));
        // Prediction leaves the version to the authority.
        assert_eq!(hat.transform.version(), 0);

        eq.drive(&pose_from_yaw(Vector3::zeros(), 0.0), &mut items, true);
        assert_eq!(items.get("hat").unwrap().transform.version(), 1);
    }

    #[test]
    fn drop_lands_on_the_probed_surface() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);
        eq.set_slot(Slot::RightHand, Some("blaster".into()), &mut items, &mut hooks);
        items.get_mut("blaster").unwrap().authority = 4;

        // Facing -Z from the origin, floor at y = 0.25.
        let actor = Isometry3::identity();
        let floor = FlatSurface::world_floor(0.25);
        let dropped = eq.drop_primary(&actor, &floor, &DropTuning::default(), &mut items, &mut hooks);

        assert_eq!(dropped.as_deref(), Some("blaster"));
        assert_eq!(eq.item_in(Slot::RightHand), None);
        let blaster = items.get("blaster").unwrap();
        assert!(!blaster.frozen);
        assert_eq!(blaster.authority, AUTHORITY_ID);
        assert_eq!(blaster.holder, None);
        let p = blaster.position();
        assert!((p - Vector3::new(0.0, 0.3, -1.0)).norm() < 1.0e-4, "landed at {p:?}");
    }

    #[test]
    fn drop_without_a_hit_uses_the_ray_end() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);
        eq.set_slot(Slot::LeftHand, Some("hat".into()), &mut items, &mut hooks);

        // Facing +X.
        let actor = pose_from_yaw(Vector3::new(0.0, 5.0, 0.0), -FRAC_PI_2);
        eq.drop_primary(&actor, &NoSurface, &DropTuning::default(), &mut items, &mut hooks);

        // start = (1, 6, 0), end = start - 3 up, lifted 0.05.
        let p = items.get("hat").unwrap().position();
        assert!((p - Vector3::new(1.0, 3.05, 0.0)).norm() < 1.0e-4, "landed at {p:?}");
    }

    #[test]
    fn drop_with_empty_hands_does_nothing() {
        let mut items = registry();
        let mut hooks = AnimationOverlay::default();
        let mut eq = Equipment::new(4);
        eq.set_slot(Slot::Head, Some("hat".into()), &mut items, &mut hooks);
        let dropped = eq.drop_primary(
            &Isometry3::identity(),
            &NoSurface,
            &DropTuning::default(),
            &mut items,
            &mut hooks,
        );
        assert_eq!(dropped, None);
        assert_eq!(eq.item_in(Slot::Head), Some("hat"));
    }
}
