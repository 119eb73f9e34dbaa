use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by flag enums whose variants each own one bit.
///
/// The discriminant (via `#[repr(u8)]`) is the bit index; `Storage` picks the backing integer.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container shared by every peer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    /// Builds a mask from a list of flags.
    pub fn of<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        flags.add_many(tags);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    /// True when the two masks share at least one bit.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// shared::define_bitmask_flags!(Surface, u8, {
///     Grass,
///     Stone,
///     Water,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(CollisionLayer, u32, {
    World,
    Props,
    Dynamic,
    Characters,
    Projectiles,
    Triggers,
    CameraOnly,
    Reserved,
});

/// Collision category/mask pair carried by every physical object.
pub type LayerMask = BitmaskFlags<u32>;

/// Categories a dropped item's placement ray may land on.
pub fn drop_surface_mask() -> LayerMask {
    LayerMask::of(&[
        CollisionLayer::World,
        CollisionLayer::Props,
        CollisionLayer::Dynamic,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_bits_follow_declaration_order() {
        assert_eq!(CollisionLayer::World.mask(), 1);
        assert_eq!(CollisionLayer::Props.mask(), 2);
        assert_eq!(CollisionLayer::Characters.mask(), 8);
        assert_eq!(CollisionLayer::Reserved.mask(), 128);
    }

    #[test]
    fn drop_mask_excludes_characters() {
        let mask = drop_surface_mask();
        assert_eq!(mask.bits, 0b111);
        assert!(!mask.has(CollisionLayer::Characters));
        assert!(mask.has_any(&[CollisionLayer::Triggers, CollisionLayer::Props]));
    }

    #[test]
    fn add_remove_round_trip() {
        let mut flags = LayerMask::default();
        assert!(flags.is_empty());
        flags.add(CollisionLayer::Projectiles);
        assert!(flags.intersects(LayerMask::of(&[CollisionLayer::Projectiles])));
        flags.remove(CollisionLayer::Projectiles);
        assert!(flags.is_empty());
    }
}
