//! Static level geometry backed by Rapier, used for placement probes.
//!
//! Every peer builds the same [`RapierQueryWorld`] from the level's
//! [`WorldStaticDef`]s and answers [`SurfaceProbe`] queries against it.
//!
//! Notes
//! - Deterministic: definitions are sorted by `id` before insertion.
//! - Each collider stores its collision category bits in `user_data`, so ray
//!   queries can be filtered by category without Rapier interaction groups.
//! - Statics never move after construction.

pub use rapier3d;

use rapier3d::na::{Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::bitmask_flags::{CollisionLayer, FlagBitmask, LayerMask};
use crate::probe::{SurfaceHit, SurfaceProbe};

/// Canonical definition of one immutable level collider.
///
/// Units are meters. For planes, the normal is `rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier; fixes insertion order.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    /// Collision category of this collider.
    pub layer: CollisionLayer,
}

impl WorldStaticDef {
    /// Ground plane at `height`, in the world category.
    pub fn ground(id: u32, height: f32) -> Self {
        Self {
            id,
            translation: vector![0.0, height, 0.0],
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
            layer: CollisionLayer::World,
        }
    }

    /// Axis-aligned box centred at `center`.
    pub fn block(
        id: u32,
        center: Vector<f32>,
        half_extents: Vector<f32>,
        layer: CollisionLayer,
    ) -> Self {
        Self {
            id,
            translation: center,
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid { half_extents },
            layer,
        }
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite half-space, offset along its normal.
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vector<f32> },
    Sphere { radius: f32 },
    CapsuleY { radius: f32, half_height: f32 },
    CylinderY { radius: f32, half_height: f32 },
}

/// Rapier sets for the static level plus the phases needed to query them.
pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
}

impl RapierQueryWorld {
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for def in defs.into_iter() {
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);

            let rb = RigidBodyBuilder::fixed().pose(iso).build();
            let rb_handle = bodies.insert(rb);

            let mut collider = collider_from_def(&def);
            collider.user_data = u128::from(def.layer.mask());
            colliders.insert_with_parent(collider, rb_handle, &mut bodies);
        }

        // Collision detection only, no dynamics: fills the broad-phase BVH so queries work.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut narrow_phase = NarrowPhase::new();
        let mut collision_pipeline = CollisionPipeline::new();
        let hooks = ();
        let events = ();
        collision_pipeline.step(
            0.0,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &hooks,
            &events,
        );

        log::info!("built static query world with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
        }
    }

    /// Borrowed query view; keep it within the borrow of `self`.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl SurfaceProbe for RapierQueryWorld {
    fn cast_segment(
        &self,
        from: &Point<f32>,
        to: &Point<f32>,
        mask: LayerMask,
    ) -> Option<SurfaceHit> {
        let dir = to - from;
        if dir.norm_squared() <= f32::EPSILON {
            return None;
        }

        let in_mask = |_: ColliderHandle, collider: &Collider| {
            (u128::from(mask.bits) & collider.user_data) != 0
        };
        let filter = QueryFilter::default().predicate(&in_mask);
        let pipeline = self.query_pipeline(filter);

        // Unnormalized direction: time of impact is the fraction along the segment.
        let ray = Ray::new(*from, dir);
        let (_, hit) = pipeline.cast_ray_and_get_normal(&ray, 1.0, true)?;
        Some(SurfaceHit {
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }
}

fn collider_from_def(def: &WorldStaticDef) -> Collider {
    match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // The collider inherits the body pose, so the half-space is expressed
            // in body space: normal +Y, shifted along it by the offset.
            let halfspace = HalfSpace::new(Vector::y_axis());
            ColliderBuilder::new(SharedShape::new(halfspace))
                .translation(vector![0.0, *offset_along_normal, 0.0])
                .build()
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).build(),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius).build(),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmask_flags::drop_surface_mask;

    fn level() -> RapierQueryWorld {
        RapierQueryWorld::build(vec![
            WorldStaticDef::block(
                2,
                vector![0.0, 0.5, -1.0],
                vector![0.5, 0.5, 0.5],
                CollisionLayer::Props,
            ),
            WorldStaticDef::block(
                3,
                vector![5.0, 0.5, 0.0],
                vector![0.5, 0.5, 0.5],
                CollisionLayer::Characters,
            ),
            WorldStaticDef::ground(1, 0.0),
        ])
    }

    #[test]
    fn probe_hits_the_ground() {
        let world = level();
        let hit = world
            .cast_segment(&point![3.0, 2.0, 3.0], &point![3.0, -2.0, 3.0], drop_surface_mask())
            .expect("ground below");
        assert!(hit.point.y.abs() < 1.0e-3, "hit at {:?}", hit.point);
    }

    #[test]
    fn probe_stops_on_props_first() {
        let world = level();
        let hit = world
            .cast_segment(&point![0.0, 2.0, -1.0], &point![0.0, -1.0, -1.0], drop_surface_mask())
            .expect("prop below");
        assert!((hit.point.y - 1.0).abs() < 1.0e-3, "hit at {:?}", hit.point);
    }

    #[test]
    fn probe_ignores_categories_outside_the_mask() {
        let world = level();
        // Only the Characters box is on this segment, and the segment ends above the ground.
        let miss = world.cast_segment(&point![5.0, 2.0, 0.0], &point![5.0, 0.5, 0.0], drop_surface_mask());
        assert!(miss.is_none());
    }

    #[test]
    fn probe_misses_beyond_segment_end() {
        let world = level();
        let miss = world.cast_segment(&point![3.0, 5.0, 3.0], &point![3.0, 1.0, 3.0], drop_surface_mask());
        assert!(miss.is_none());
    }
}
