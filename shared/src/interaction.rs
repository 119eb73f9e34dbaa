/*!
Interaction targeting.

Objects with the [`Interactable`] capability that come within an actor's
detection cylinder become candidates. Candidates are kept in a deterministic
order and one of them is the current target, which the input layer can cycle
and the HUD can prompt for.

Ordering
- Descending alignment: `dot(forward, normalize(candidate - actor))`.
- Then ascending distance.
- Then ascending id, so ties never depend on discovery order.

The current target survives a reorder as long as it is still a candidate;
otherwise the first candidate becomes current.
*/

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{Point3, Vector3};

use crate::equipment::Slot;
use crate::error::InteractionError;
use crate::item::{ItemName, ItemRegistry};
use crate::messages::Request;
use crate::owner::ControllerId;

/// Capability of world objects an actor can interact with.
pub trait Interactable {
    /// Stable id, unique among interactables.
    fn id(&self) -> &str;

    /// Where the object is; `None` while it cannot be targeted.
    fn position(&self, items: &ItemRegistry) -> Option<Point3<f32>>;

    /// Optional HUD prompt.
    fn prompt(&self) -> Option<String> {
        None
    }

    /// Runs on the authority. Returns follow-up requests to apply to the interactor.
    fn interact(
        &mut self,
        interactor: ControllerId,
        items: &ItemRegistry,
    ) -> Result<Vec<Request>, InteractionError>;
}

/// Picks an item up into a fixed slot.
#[derive(Clone, Debug)]
pub struct PickupInteractable {
    item: ItemName,
    slot: Slot,
    label: String,
}

impl PickupInteractable {
    pub fn new(item: impl Into<ItemName>, slot: Slot) -> Self {
        let item = item.into();
        Self {
            label: item.clone(),
            item,
            slot,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Interactable for PickupInteractable {
    fn id(&self) -> &str {
        &self.item
    }

    fn position(&self, items: &ItemRegistry) -> Option<Point3<f32>> {
        let item = items.get(&self.item)?;
        if item.holder.is_some() {
            return None;
        }
        Some(Point3::from(item.position()))
    }

    fn prompt(&self) -> Option<String> {
        Some(format!("Pick up {}", self.label))
    }

    fn interact(
        &mut self,
        _interactor: ControllerId,
        items: &ItemRegistry,
    ) -> Result<Vec<Request>, InteractionError> {
        let Some(item) = items.get(&self.item) else {
            return Err(InteractionError::Failed {
                target: self.item.clone(),
                reason: "item no longer exists".into(),
            });
        };
        if item.holder.is_some() {
            return Err(InteractionError::Failed {
                target: self.item.clone(),
                reason: "item is already held".into(),
            });
        }
        Ok(vec![Request::Equip {
            item: self.item.clone(),
            slot: self.slot.name().to_owned(),
        }])
    }
}

/// Every interactable in the session, keyed by id.
#[derive(Default)]
pub struct InteractableRegistry {
    entries: BTreeMap<String, Box<dyn Interactable>>,
}

impl InteractableRegistry {
    pub fn insert(&mut self, interactable: Box<dyn Interactable>) {
        self.entries.insert(interactable.id().to_owned(), interactable);
    }

    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Interactable>> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&dyn Interactable> {
        self.entries.get(id).map(|entry| entry.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Box<dyn Interactable>> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Positions of every currently targetable interactable.
    pub fn positions(&self, items: &ItemRegistry) -> BTreeMap<String, Point3<f32>> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| entry.position(items).map(|p| (id.clone(), p)))
            .collect()
    }
}

/// Geometry the targeting order is computed from.
pub struct TargetingView<'a> {
    pub origin: Point3<f32>,
    /// Planar facing of the actor.
    pub forward: Vector3<f32>,
    pub positions: &'a BTreeMap<String, Point3<f32>>,
}

/// Sorts candidate ids by alignment, then distance, then id.
pub fn order_candidates<'a>(
    view: &TargetingView<'_>,
    ids: impl IntoIterator<Item = &'a String>,
) -> Vec<String> {
    let mut scored: Vec<(f32, f32, &String)> = ids
        .into_iter()
        .filter_map(|id| {
            let offset = view.positions.get(id)? - view.origin;
            let distance = offset.norm();
            let alignment = if distance > f32::EPSILON {
                view.forward.dot(&(offset / distance))
            } else {
                0.0
            };
            Some((alignment, distance, id))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.total_cmp(&b.1))
            .then_with(|| a.2.cmp(b.2))
    });
    scored.into_iter().map(|(_, _, id)| id.clone()).collect()
}

/// An actor's candidate set and current target.
#[derive(Clone, Debug, Default)]
pub struct InteractionTargeting {
    candidates: BTreeSet<String>,
    ordered: Vec<String>,
    current: Option<String>,
}

impl InteractionTargeting {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Candidates in targeting order.
    pub fn ordered(&self) -> &[String] {
        &self.ordered
    }

    pub fn contains(&self, id: &str) -> bool {
        self.candidates.contains(id)
    }

    /// Adds a qualifying object. Objects without a position in `view` are ignored.
    pub fn on_proximity_enter(&mut self, id: &str, view: &TargetingView<'_>) {
        if !view.positions.contains_key(id) {
            return;
        }
        self.candidates.insert(id.to_owned());
        self.refresh(view);
    }

    pub fn on_proximity_exit(&mut self, id: &str, view: &TargetingView<'_>) {
        if !self.candidates.remove(id) {
            return;
        }
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        self.refresh(view);
    }

    /// Drops candidates that can no longer be targeted and recomputes the order.
    pub fn refresh(&mut self, view: &TargetingView<'_>) {
        self.candidates.retain(|id| view.positions.contains_key(id));
        self.ordered = order_candidates(view, &self.candidates);

        let keep = self
            .current
            .as_ref()
            .is_some_and(|current| self.candidates.contains(current));
        if !keep {
            self.current = self.ordered.first().cloned();
        }
    }

    /// Moves the current target `direction` steps along the order, wrapping around.
    pub fn cycle(&mut self, direction: i32) {
        if self.ordered.is_empty() || direction == 0 {
            return;
        }
        let len = self.ordered.len() as i64;
        let index = self
            .current
            .as_ref()
            .and_then(|current| self.ordered.iter().position(|id| id == current));
        let next = match index {
            Some(index) => (index as i64 + direction as i64).rem_euclid(len),
            None => 0,
        };
        self.current = Some(self.ordered[next as usize].clone());
    }
}
