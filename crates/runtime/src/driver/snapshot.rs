use agent_core::{AgentId, EntityId, Frame};
use serde::{Deserialize, Serialize};

/// Point-in-time view of one agent on one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent: AgentId,
    pub species: String,
    pub authority: bool,
    pub phase: String,
    pub active: Option<String>,
    pub frame: Frame,
    pub target: Option<EntityId>,
    /// Seed of the agent's current random stream.
    pub seed: i32,
    pub awaiting_echo: bool,
    pub queued: usize,
    pub halted: bool,
    pub accepts_collision_damage: bool,
}
