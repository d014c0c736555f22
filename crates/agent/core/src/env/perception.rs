use super::{Point, Pose};
use crate::ids::EntityId;

/// Parameters of a line-of-sight / proximity query.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SightQuery {
    /// Maximum seeing distance.
    pub range: f32,
    /// Half-angle of the view cone, in degrees.
    pub field_of_view: f32,
    /// Radius inside which entities are sensed regardless of facing.
    pub near_sense_radius: f32,
    /// Whether near-sensed entities must also be unoccluded.
    pub occlusion_check: bool,
}

impl SightQuery {
    pub const fn new(range: f32, field_of_view: f32, near_sense_radius: f32) -> Self {
        Self {
            range,
            field_of_view,
            near_sense_radius,
            occlusion_check: true,
        }
    }

    pub const fn without_occlusion(mut self) -> Self {
        self.occlusion_check = false;
        self
    }

    /// Evaluates the query geometrically.
    ///
    /// An entity is seen when it is inside range and inside the view cone, or
    /// when it is inside the near-sense radius and (if requested) not occluded.
    pub fn admits(&self, eye: Pose, target: Point, occluded: impl FnOnce() -> bool) -> bool {
        let distance = eye.position.distance(target);
        let in_range = distance < self.range;
        let in_cone = eye.forward.angle_to(target - eye.position) < self.field_of_view;
        if in_range && in_cone {
            return true;
        }

        let near = distance < self.near_sense_radius;
        near && !(self.occlusion_check && occluded())
    }
}

impl Default for SightQuery {
    fn default() -> Self {
        Self::new(45.0, 60.0, -1.0)
    }
}

/// An entity reported by a perception query.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sighting {
    pub entity: EntityId,
    pub position: Point,
    pub distance: f32,
}

/// Agent-scoped perception collaborator.
pub trait Perception: Send + Sync {
    /// Nearest entity satisfying `query`, if any.
    fn nearest_visible(&self, query: SightQuery) -> Option<Sighting>;

    /// Whether a specific entity satisfies `query`.
    fn is_visible(&self, entity: EntityId, query: SightQuery) -> bool;
}
