//! Interfaces to the collaborators an agent's behavior talks to.
//!
//! Navigation, animation, perception, audio and the entity roster are external
//! to the engine. States and transitions reach them only through the
//! [`AgentHandles`] bundle the driver attaches, which keeps the engine free of
//! any concrete path solver, renderer or physics layer.
mod channels;
mod geometry;
mod navigation;
mod perception;

use std::sync::Arc;

pub use channels::{Animation, AudioSink, Silent};
pub use geometry::{Point, Pose};
pub use navigation::{Navigation, NavigationError, PathStatus};
pub use perception::{Perception, SightQuery, Sighting};

use crate::ids::{EntityId, SpeciesTag};

/// Session-wide lookup of tracked entities by their stable index.
pub trait EntityRoster: Send + Sync {
    fn contains(&self, entity: EntityId) -> bool;
    fn position(&self, entity: EntityId) -> Option<Point>;

    /// Species of a tracked entity, when the roster records one.
    fn species(&self, _entity: EntityId) -> Option<SpeciesTag> {
        None
    }
}

/// Agent-scoped collaborator handles.
///
/// Cloning is cheap; lifecycle tasks clone the bundle so they can keep using
/// collaborators across frames without borrowing the driver.
#[derive(Clone)]
pub struct AgentHandles {
    pub navigation: Arc<dyn Navigation>,
    pub animation: Arc<dyn Animation>,
    pub perception: Arc<dyn Perception>,
    pub roster: Arc<dyn EntityRoster>,
    pub audio: Arc<dyn AudioSink>,
}

impl AgentHandles {
    pub fn new(
        navigation: Arc<dyn Navigation>,
        perception: Arc<dyn Perception>,
        roster: Arc<dyn EntityRoster>,
    ) -> Self {
        Self {
            navigation,
            animation: Arc::new(Silent),
            perception,
            roster,
            audio: Arc::new(Silent),
        }
    }

    pub fn with_animation(mut self, animation: Arc<dyn Animation>) -> Self {
        self.animation = animation;
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }
}

impl std::fmt::Debug for AgentHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandles").finish_non_exhaustive()
    }
}
