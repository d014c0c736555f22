use std::sync::{Mutex, PoisonError};

use agent_core::{AgentId, Navigation, PathStatus, Point};

use crate::world::WorldRegistry;

/// Straight-line navigation inside the world's walkable bounds.
///
/// A destination outside the bounds has a partial path ending at the
/// closest walkable point; an agent standing outside them has no path.
pub struct WorldNavigator {
    world: WorldRegistry,
    agent: AgentId,
    corners: Mutex<Vec<Point>>,
}

impl WorldNavigator {
    pub fn new(world: WorldRegistry, agent: AgentId) -> Self {
        Self {
            world,
            agent,
            corners: Mutex::new(Vec::new()),
        }
    }

    fn walkable(&self, point: Point) -> bool {
        self.world
            .walkable()
            .is_none_or(|bounds| bounds.contains(point))
    }
}

impl Navigation for WorldNavigator {
    fn try_set_destination(&self, point: Point) -> bool {
        if !self.walkable(self.position()) || !self.walkable(point) {
            return false;
        }
        self.world.set_agent_destination(self.agent, Some(point))
    }

    fn calculate_path(&self, point: Point) -> PathStatus {
        let start = self.position();
        let (status, corners) = match self.world.walkable() {
            Some(bounds) if !bounds.contains(start) => (PathStatus::Invalid, Vec::new()),
            Some(bounds) if !bounds.contains(point) => {
                (PathStatus::Partial, vec![start, bounds.clamp(point)])
            }
            _ => (PathStatus::Complete, vec![start, point]),
        };
        *self.corners.lock().unwrap_or_else(PoisonError::into_inner) = corners;
        status
    }

    fn path_corners(&self) -> Vec<Point> {
        self.corners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn position(&self) -> Point {
        self.world
            .agent_pose(self.agent)
            .map(|pose| pose.position)
            .unwrap_or_default()
    }
}
