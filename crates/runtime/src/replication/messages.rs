use agent_core::{AgentId, TargetIndex};
use serde::{Deserialize, Serialize};

/// Authority → coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Move `agent` through the transition or into the state called `name`.
    Transition {
        agent: AgentId,
        name: String,
        seed: i32,
    },
    /// Replace `agent`'s focus.
    Target { agent: AgentId, index: TargetIndex },
}

/// Coordinator → every peer, sender included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Broadcast {
    Transition {
        agent: AgentId,
        name: String,
        seed: i32,
    },
    Target { agent: AgentId, index: TargetIndex },
}

impl Request {
    pub fn agent(&self) -> AgentId {
        match self {
            Self::Transition { agent, .. } | Self::Target { agent, .. } => *agent,
        }
    }
}

impl Broadcast {
    pub fn agent(&self) -> AgentId {
        match self {
            Self::Transition { agent, .. } | Self::Target { agent, .. } => *agent,
        }
    }
}

impl From<Request> for Broadcast {
    fn from(request: Request) -> Self {
        match request {
            Request::Transition { agent, name, seed } => Self::Transition { agent, name, seed },
            Request::Target { agent, index } => Self::Target { agent, index },
        }
    }
}
