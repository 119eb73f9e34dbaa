//! Character models and their attachment sockets.
//!
//! A model id is resolved into a [`ModelHandle`] through an [`AssetResolver`].
//! Handles are cached per id by [`ModelCache`], so each model is resolved once
//! per peer.

use std::collections::BTreeMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::equipment::Slot;
use crate::error::SetupError;

/// Selectable character appearances.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    CharacterA,
    CharacterB,
}

/// Local attachment points on a character model, relative to the actor root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocketLayout {
    pub head: Isometry3<f32>,
    pub back: Isometry3<f32>,
    pub left_hand: Isometry3<f32>,
    pub right_hand: Isometry3<f32>,
}

impl SocketLayout {
    pub fn socket(&self, slot: Slot) -> &Isometry3<f32> {
        match slot {
            Slot::Head => &self.head,
            Slot::Back => &self.back,
            Slot::LeftHand => &self.left_hand,
            Slot::RightHand => &self.right_hand,
        }
    }
}

impl Default for SocketLayout {
    fn default() -> Self {
        let at = |x: f32, y: f32, z: f32| {
            Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
        };
        Self {
            head: at(0.0, 1.75, 0.0),
            // Back items hang behind the actor, i.e. on +Z.
            back: Isometry3::from_parts(
                Translation3::new(0.0, 1.3, 0.2),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2),
            ),
            left_hand: at(-0.45, 1.0, -0.1),
            right_hand: at(0.45, 1.0, -0.1),
        }
    }
}

/// A resolved, instantiable model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelHandle {
    pub id: ModelId,
    pub sockets: SocketLayout,
}

/// Turns a model id into an instantiable representation.
pub trait AssetResolver {
    fn resolve(&mut self, id: ModelId) -> Result<ModelHandle, SetupError>;
}

/// Resolver for the models every build ships with.
#[derive(Default, Debug)]
pub struct BuiltinModels;

impl AssetResolver for BuiltinModels {
    fn resolve(&mut self, id: ModelId) -> Result<ModelHandle, SetupError> {
        let mut sockets = SocketLayout::default();
        if id == ModelId::CharacterB {
            // Slightly shorter rig.
            for socket in [
                &mut sockets.head,
                &mut sockets.back,
                &mut sockets.left_hand,
                &mut sockets.right_hand,
            ] {
                socket.translation.vector.y *= 0.92;
            }
        }
        Ok(ModelHandle { id, sockets })
    }
}

/// Caches resolved models by id.
pub struct ModelCache<R: AssetResolver> {
    resolver: R,
    cache: BTreeMap<ModelId, ModelHandle>,
}

impl<R: AssetResolver> ModelCache<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            cache: BTreeMap::new(),
        }
    }

    pub fn resolve(&mut self, id: ModelId) -> Result<ModelHandle, SetupError> {
        if let Some(handle) = self.cache.get(&id) {
            return Ok(handle.clone());
        }
        let handle = self.resolver.resolve(id)?;
        log::debug!("resolved model {id:?}");
        self.cache.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingResolver {
        calls: u32,
        fail: Option<ModelId>,
    }

    impl AssetResolver for CountingResolver {
        fn resolve(&mut self, id: ModelId) -> Result<ModelHandle, SetupError> {
            self.calls += 1;
            if self.fail == Some(id) {
                return Err(SetupError::ModelUnavailable(id, "missing".into()));
            }
            BuiltinModels.resolve(id)
        }
    }

    #[test]
    fn cache_resolves_each_model_once() {
        let mut cache = ModelCache::new(CountingResolver {
            calls: 0,
            fail: None,
        });
        cache.resolve(ModelId::CharacterA).unwrap();
        cache.resolve(ModelId::CharacterA).unwrap();
        cache.resolve(ModelId::CharacterB).unwrap();
        assert_eq!(cache.resolver.calls, 2);
        assert_eq!(cache.cached(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = ModelCache::new(CountingResolver {
            calls: 0,
            fail: Some(ModelId::CharacterB),
        });
        assert!(cache.resolve(ModelId::CharacterB).is_err());
        assert!(cache.resolve(ModelId::CharacterB).is_err());
        assert_eq!(cache.resolver.calls, 2);
        assert_eq!(cache.cached(), 0);
    }

    #[test]
    fn layouts_differ_per_model() {
        let a = BuiltinModels.resolve(ModelId::CharacterA).unwrap();
        let b = BuiltinModels.resolve(ModelId::CharacterB).unwrap();
        assert!(b.sockets.head.translation.vector.y < a.sockets.head.translation.vector.y);
    }
}
