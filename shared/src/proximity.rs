use std::collections::BTreeSet;

use nalgebra::{Point3, Vector2};

use crate::config::InteractionTuning;
use crate::utils::planar_distance_sq;

/// Enter/exit notifications produced by one [`ProximityTracker::update`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProximityEvents {
    pub entered: Vec<String>,
    pub exited: Vec<String>,
}

impl ProximityEvents {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Vertical detection cylinder centred on the actor origin.
#[derive(Clone, Debug, Default)]
pub struct ProximityTracker {
    radius: f32,
    half_height: f32,
    inside: BTreeSet<String>,
}

impl ProximityTracker {
    pub fn new(tuning: &InteractionTuning) -> Self {
        Self {
            radius: tuning.radius,
            half_height: tuning.height * 0.5,
            inside: BTreeSet::new(),
        }
    }

    pub fn contains_point(&self, origin: &Point3<f32>, point: &Point3<f32>) -> bool {
        let planar = planar_distance_sq(
            Vector2::new(origin.x, origin.z),
            Vector2::new(point.x, point.z),
        );
        planar <= self.radius * self.radius && (point.y - origin.y).abs() <= self.half_height
    }

    /// Diffs the objects now inside the cylinder against the previous update.
    ///
    /// Objects missing from `objects` count as gone.
    pub fn update<'a>(
        &mut self,
        origin: &Point3<f32>,
        objects: impl IntoIterator<Item = (&'a str, Point3<f32>)>,
    ) -> ProximityEvents {
        let now: BTreeSet<String> = objects
            .into_iter()
            .filter(|(_, point)| self.contains_point(origin, point))
            .map(|(id, _)| id.to_owned())
            .collect();

        let events = ProximityEvents {
            entered: now.difference(&self.inside).cloned().collect(),
            exited: self.inside.difference(&now).cloned().collect(),
        };
        self.inside = now;
        events
    }
}
