//! In-memory collaborator implementations backed by [`WorldRegistry`].
//!
//! These are what the host binary and the integration tests plug into
//! [`AgentHandles`]. A real simulation would replace them with adapters over
//! its own navigation, renderer and audio layers.

mod channels;
mod navigation;
mod perception;

use std::sync::Arc;

use agent_core::{AgentHandles, AgentId};

pub use channels::{TracingAnimator, TracingAudio};
pub use navigation::WorldNavigator;
pub use perception::WorldPerception;

use crate::world::WorldRegistry;

/// Builds the full collaborator bundle for `agent` over `world`.
pub fn world_handles(world: &WorldRegistry, agent: AgentId) -> AgentHandles {
    AgentHandles::new(
        Arc::new(WorldNavigator::new(world.clone(), agent)),
        Arc::new(WorldPerception::new(world.clone(), agent)),
        Arc::new(world.clone()),
    )
    .with_animation(Arc::new(TracingAnimator::new(agent)))
    .with_audio(Arc::new(TracingAudio::new(agent)))
}
