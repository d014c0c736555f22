//! Inert collaborators for unit tests.

use std::sync::Arc;

use agent_core::{
    AgentHandles, AgentId, EntityId, EntityRoster, Frame, Navigation, PathStatus, Perception,
    Point, RandomStream, SightQuery, Sighting, SpeciesTag, TargetReference,
};

use crate::context::StateContext;
use crate::state::StateKey;

struct Nowhere;

impl Navigation for Nowhere {
    fn try_set_destination(&self, _point: Point) -> bool {
        false
    }
    fn calculate_path(&self, _point: Point) -> PathStatus {
        PathStatus::Invalid
    }
    fn path_corners(&self) -> Vec<Point> {
        Vec::new()
    }
    fn position(&self) -> Point {
        Point::ORIGIN
    }
}

impl Perception for Nowhere {
    fn nearest_visible(&self, _query: SightQuery) -> Option<Sighting> {
        None
    }
    fn is_visible(&self, _entity: EntityId, _query: SightQuery) -> bool {
        false
    }
}

impl EntityRoster for Nowhere {
    fn contains(&self, _entity: EntityId) -> bool {
        false
    }
    fn position(&self, _entity: EntityId) -> Option<Point> {
        None
    }
}

pub(crate) struct Harness {
    pub handles: AgentHandles,
    pub rng: RandomStream,
    pub target: TargetReference,
    pub override_request: Option<StateKey>,
}

impl Harness {
    pub fn new() -> Self {
        let nowhere = Arc::new(Nowhere);
        Self {
            handles: AgentHandles::new(nowhere.clone(), nowhere.clone(), nowhere),
            rng: RandomStream::from_seed(1),
            target: TargetReference::new(),
            override_request: None,
        }
    }

    pub fn context(&mut self) -> StateContext<'_> {
        StateContext::new(
            AgentId(0),
            SpeciesTag("test"),
            Frame::ZERO,
            0.02,
            true,
            &self.handles,
            &mut self.rng,
            &mut self.target,
            &mut self.override_request,
        )
    }
}
