//! Session-scoped registry of tracked entities and agent bodies.
//!
//! Replaces process-wide lists: every peer's session owns one
//! [`WorldRegistry`], hands clones of it to the collaborators it builds for
//! its agents, and clears it when the session ends.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use agent_core::{AgentId, EntityId, EntityRoster, Point, Pose, SpeciesTag};

/// Axis-aligned walkable area on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// Closest walkable point to `point`.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y,
            point.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Something agents can perceive and target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedEntity {
    pub species: SpeciesTag,
    pub position: Point,
    /// Hidden from near-sense checks that require line of sight.
    pub occluded: bool,
}

#[derive(Debug, Clone, Copy)]
struct AgentBody {
    pose: Pose,
    speed: f32,
    destination: Option<Point>,
}

#[derive(Debug, Default)]
struct WorldState {
    walkable: Option<Bounds>,
    entities: BTreeMap<EntityId, TrackedEntity>,
    agents: BTreeMap<AgentId, AgentBody>,
    groups: BTreeMap<String, BTreeSet<AgentId>>,
}

#[derive(Debug, Clone, Default)]
pub struct WorldRegistry {
    inner: Arc<RwLock<WorldState>>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts navigation to `bounds`.
    pub fn with_walkable(self, bounds: Bounds) -> Self {
        self.write().walkable = Some(bounds);
        self
    }

    pub fn walkable(&self) -> Option<Bounds> {
        self.read().walkable
    }

    pub fn track(&self, entity: EntityId, species: SpeciesTag, position: Point) {
        self.write().entities.insert(
            entity,
            TrackedEntity {
                species,
                position,
                occluded: false,
            },
        );
    }

    pub fn untrack(&self, entity: EntityId) -> bool {
        self.write().entities.remove(&entity).is_some()
    }

    pub fn move_entity(&self, entity: EntityId, position: Point) {
        if let Some(tracked) = self.write().entities.get_mut(&entity) {
            tracked.position = position;
        }
    }

    pub fn set_occluded(&self, entity: EntityId, occluded: bool) {
        if let Some(tracked) = self.write().entities.get_mut(&entity) {
            tracked.occluded = occluded;
        }
    }

    pub fn entity(&self, entity: EntityId) -> Option<TrackedEntity> {
        self.read().entities.get(&entity).copied()
    }

    /// Tracked entities in ascending id order.
    pub fn entities(&self) -> Vec<(EntityId, TrackedEntity)> {
        self.read()
            .entities
            .iter()
            .map(|(id, tracked)| (*id, *tracked))
            .collect()
    }

    pub fn place_agent(&self, agent: AgentId, pose: Pose, speed: f32) {
        self.write().agents.insert(
            agent,
            AgentBody {
                pose,
                speed,
                destination: None,
            },
        );
    }

    pub fn remove_agent(&self, agent: AgentId) {
        let mut state = self.write();
        state.agents.remove(&agent);
        for members in state.groups.values_mut() {
            members.remove(&agent);
        }
    }

    pub fn agent_pose(&self, agent: AgentId) -> Option<Pose> {
        self.read().agents.get(&agent).map(|body| body.pose)
    }

    pub fn agent_destination(&self, agent: AgentId) -> Option<Point> {
        self.read().agents.get(&agent).and_then(|body| body.destination)
    }

    pub(crate) fn set_agent_destination(&self, agent: AgentId, destination: Option<Point>) -> bool {
        match self.write().agents.get_mut(&agent) {
            Some(body) => {
                body.destination = destination;
                true
            }
            None => false,
        }
    }

    pub fn join_group(&self, group: &str, agent: AgentId) {
        self.write()
            .groups
            .entry(group.to_owned())
            .or_default()
            .insert(agent);
    }

    pub fn leave_group(&self, group: &str, agent: AgentId) {
        if let Some(members) = self.write().groups.get_mut(group) {
            members.remove(&agent);
        }
    }

    pub fn group(&self, group: &str) -> Vec<AgentId> {
        self.read()
            .groups
            .get(group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Moves every agent with a destination toward it by `speed * dt`,
    /// facing the direction of travel.
    pub fn advance(&self, dt: f32) {
        let mut state = self.write();
        for body in state.agents.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            let offset = destination - body.pose.position;
            let distance = offset.length();
            let step = body.speed * dt;
            if distance <= step || distance <= f32::EPSILON {
                body.pose.position = destination;
                body.destination = None;
            } else {
                body.pose.forward = offset * (1.0 / distance);
                body.pose.position = body.pose.position + body.pose.forward * step;
            }
        }
    }

    /// Forgets everything; called when the session ends.
    pub fn clear(&self) {
        let mut state = self.write();
        state.entities.clear();
        state.agents.clear();
        state.groups.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, WorldState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, WorldState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityRoster for WorldRegistry {
    fn contains(&self, entity: EntityId) -> bool {
        self.read().entities.contains_key(&entity)
    }

    fn position(&self, entity: EntityId) -> Option<Point> {
        self.read().entities.get(&entity).map(|tracked| tracked.position)
    }

    fn species(&self, entity: EntityId) -> Option<SpeciesTag> {
        self.read().entities.get(&entity).map(|tracked| tracked.species)
    }
}
