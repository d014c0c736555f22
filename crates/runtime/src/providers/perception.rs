use agent_core::{AgentId, EntityId, Perception, SightQuery, Sighting};

use crate::world::WorldRegistry;

/// Sight queries evaluated against the world's tracked entities from the
/// agent's current pose.
pub struct WorldPerception {
    world: WorldRegistry,
    agent: AgentId,
}

impl WorldPerception {
    pub fn new(world: WorldRegistry, agent: AgentId) -> Self {
        Self { world, agent }
    }
}

impl Perception for WorldPerception {
    fn nearest_visible(&self, query: SightQuery) -> Option<Sighting> {
        let eye = self.world.agent_pose(self.agent)?;
        self.world
            .entities()
            .into_iter()
            .filter(|(_, tracked)| query.admits(eye, tracked.position, || tracked.occluded))
            .map(|(entity, tracked)| Sighting {
                entity,
                position: tracked.position,
                distance: eye.position.distance(tracked.position),
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn is_visible(&self, entity: EntityId, query: SightQuery) -> bool {
        let (Some(eye), Some(tracked)) = (self.world.agent_pose(self.agent), self.world.entity(entity))
        else {
            return false;
        };
        query.admits(eye, tracked.position, || tracked.occluded)
    }
}
