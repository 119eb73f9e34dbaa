/*!
Replicated fields and the updates that carry them.

The authority writes fields through [`Replicated::set`], which bumps a version
and marks the field dirty only when the value actually changes. At the end of
each authority tick the dirty fields are collected into [`FieldUpdate`]s and
broadcast. Peers apply them with [`Replicated::apply_remote`], which ignores
anything not strictly newer than what they already hold.

Design notes
- Versions are per field, so a late state id never overwrites a newer one
  even when updates for different fields interleave.
- An owning peer may predict a value with [`Replicated::predict`]. Prediction
  changes the value without touching the version, so the authority's next
  update always wins.
- Within one actor's diff, the state payload is emitted before the state id
  so peers configure the incoming state with the right payload.
*/

use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

use crate::equipment::Slot;
use crate::item::ItemName;
use crate::model::ModelId;
use crate::owner::ControllerId;
use crate::state::{StateId, StatePayload};

/// A value plus the bookkeeping needed to replicate it on change.
#[derive(Clone, Debug, PartialEq)]
pub struct Replicated<T> {
    value: T,
    version: u32,
    dirty: bool,
}

impl<T: Clone + PartialEq> Replicated<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            version: 0,
            dirty: false,
        }
    }

    /// A field mirrored from a snapshot, already at the authority's version.
    pub fn at_version(value: T, version: u32) -> Self {
        Self {
            value,
            version,
            dirty: false,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Authority write. Returns true when the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.version = self.version.wrapping_add(1);
        self.dirty = true;
        true
    }

    /// Owner-side prediction. Returns true when the value changed.
    pub fn predict(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }

    /// Takes the pending change, if any, for the outbound diff.
    pub fn take_dirty(&mut self) -> Option<(u32, T)> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some((self.version, self.value.clone()))
    }

    /// Applies an authority update. Stale or duplicate versions are ignored.
    ///
    /// Returns the previous value when the stored value changed.
    pub fn apply_remote(&mut self, version: u32, value: T) -> Option<T> {
        if version <= self.version {
            return None;
        }
        self.version = version;
        if self.value == value {
            return None;
        }
        Some(std::mem::replace(&mut self.value, value))
    }
}

/// A replicated actor field and its new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    StatePayload(StatePayload),
    StateId(StateId),
    ModelId(ModelId),
    DisplayName(String),
    Transform(Isometry3<f32>),
    Slot { slot: Slot, item: Option<ItemName> },
}

/// One field change on one actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub actor: ControllerId,
    pub version: u32,
    pub value: FieldValue,
}

/// Full description of an actor for peers that have not seen it yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub actor: ControllerId,
    pub fields: Vec<FieldUpdate>,
}

impl ActorSnapshot {
    pub fn model(&self) -> ModelId {
        self.fields
            .iter()
            .find_map(|update| match update.value {
                FieldValue::ModelId(model) => Some(model),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn transform(&self) -> Isometry3<f32> {
        self.fields
            .iter()
            .find_map(|update| match update.value {
                FieldValue::Transform(transform) => Some(transform),
                _ => None,
            })
            .unwrap_or_else(Isometry3::identity)
    }
}

/// Description of an item sufficient to mirror it on another peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: ItemName,
    pub transform: Isometry3<f32>,
    pub alignment_offset: Isometry3<f32>,
    pub grip_local: Option<Isometry3<f32>>,
    pub pickup_slot: Option<Slot>,
}

/// Everything the authority broadcasts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Replication {
    ActorSpawned(ActorSnapshot),
    ActorDespawned {
        actor: ControllerId,
    },
    Field(FieldUpdate),
    ItemSpawned(ItemSnapshot),
    ItemTransform {
        item: ItemName,
        version: u32,
        transform: Isometry3<f32>,
    },
    ProjectileSpawned {
        id: u64,
        transform: Isometry3<f32>,
        linear_velocity: Vector3<f32>,
    },
    ProjectileDespawned {
        id: u64,
    },
}
