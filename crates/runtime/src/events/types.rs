//! Event types for different topics.

use agent_core::{AgentId, EntityId, Frame};
use serde::{Deserialize, Serialize};

/// State-machine progress of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// The exit task of `state` completed and the state was dropped.
    Exited {
        agent: AgentId,
        state: String,
        frame: Frame,
    },

    /// The entry task of `state` completed.
    Entered {
        agent: AgentId,
        state: String,
        /// Transition that led here; `None` for the initial state and overrides.
        via: Option<String>,
        seed: i32,
        frame: Frame,
    },

    /// A replicated transition resolved to the state already active.
    Unchanged {
        agent: AgentId,
        transition: String,
        state: String,
    },

    /// The agent was torn down without running exit.
    Halted { agent: AgentId, frame: Frame },
}

/// Replication traffic seen by one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplicationEvent {
    /// The authority asked the coordinator to move the agent.
    TransitionRequested {
        agent: AgentId,
        name: String,
        seed: i32,
    },

    /// The authority replicated a new target.
    TargetRequested {
        agent: AgentId,
        target: Option<EntityId>,
    },

    /// A broadcast arrived while a transition was in flight and was queued.
    Deferred { agent: AgentId, queued: usize },

    /// A replicated target was applied locally.
    TargetApplied {
        agent: AgentId,
        target: Option<EntityId>,
    },
}

/// Something went wrong for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FaultEvent {
    /// A hook failed and the agent was halted.
    HookFailed {
        agent: AgentId,
        state: Option<String>,
        error: String,
    },

    /// A broadcast could not be applied; the agent kept its state.
    BroadcastRejected { agent: AgentId, error: String },

    /// A hook asked for an override that could not be honoured.
    OverrideRejected {
        agent: AgentId,
        state: String,
        error: String,
    },

    /// A transition request never reached the coordinator. The agent stays
    /// in its current state and decides again on the next frame.
    RequestLost {
        agent: AgentId,
        name: String,
        error: String,
    },
}

impl LifecycleEvent {
    pub fn agent(&self) -> AgentId {
        match self {
            Self::Exited { agent, .. }
            | Self::Entered { agent, .. }
            | Self::Unchanged { agent, .. }
            | Self::Halted { agent, .. } => *agent,
        }
    }
}
