use nalgebra::{Point3, Vector3};

use crate::bitmask_flags::LayerMask;

/// Where a probe ray struck a surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceHit {
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
}

/// Ray queries against world geometry, filtered by collision category.
pub trait SurfaceProbe {
    /// First surface on the segment `from -> to` whose category intersects `mask`.
    fn cast_segment(
        &self,
        from: &Point3<f32>,
        to: &Point3<f32>,
        mask: LayerMask,
    ) -> Option<SurfaceHit>;
}

/// A world with nothing to hit.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoSurface;

impl SurfaceProbe for NoSurface {
    fn cast_segment(&self, _: &Point3<f32>, _: &Point3<f32>, _: LayerMask) -> Option<SurfaceHit> {
        None
    }
}

/// Infinite horizontal floor at `height`, in the world category.
#[derive(Debug, Clone, Copy)]
pub struct FlatSurface {
    pub height: f32,
    pub layer: LayerMask,
}

impl FlatSurface {
    pub fn world_floor(height: f32) -> Self {
        Self {
            height,
            layer: LayerMask::of(&[crate::bitmask_flags::CollisionLayer::World]),
        }
    }
}

impl SurfaceProbe for FlatSurface {
    fn cast_segment(
        &self,
        from: &Point3<f32>,
        to: &Point3<f32>,
        mask: LayerMask,
    ) -> Option<SurfaceHit> {
        if !mask.intersects(self.layer) {
            return None;
        }
        let (a, b) = (from.y - self.height, to.y - self.height);
        if a < 0.0 || b > 0.0 || a == b {
            return None;
        }
        let t = a / (a - b);
        Some(SurfaceHit {
            point: from + (to - from) * t,
            normal: Vector3::y(),
        })
    }
}
