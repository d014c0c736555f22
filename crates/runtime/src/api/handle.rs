//! Cloneable façade for issuing commands to one agent.
//!
//! [`AgentHandle`] hides channel plumbing and offers async helpers for
//! forcing states, feeding collisions and reading snapshots.

use tokio::sync::{broadcast, mpsc, oneshot};

use agent_core::{AgentId, EntityId};
use behavior_fsm::Collision;

use super::errors::{Result, RuntimeError};
use crate::driver::AgentSnapshot;
use crate::events::{AgentEvent, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to one running agent
#[derive(Clone)]
pub struct AgentHandle {
    agent: AgentId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl AgentHandle {
    pub(crate) fn new(agent: AgentId, command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            agent,
            command_tx,
            event_bus,
        }
    }

    pub fn id(&self) -> AgentId {
        self.agent
    }

    /// Force `state`, bypassing transition predicates.
    ///
    /// Fails with `TransitionBusy` while a transition is in flight and with
    /// `NotAuthority` on observer peers.
    pub async fn override_state(&self, state: impl Into<String>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::OverrideState {
            state: state.into(),
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Replace the agent's target. Authority only.
    pub async fn set_target(&self, entity: Option<EntityId>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::SetTarget {
            entity,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Report a contact. Delivered even while a transition is in flight.
    pub async fn collide(&self, collision: Collision) -> Result<()> {
        self.send(Command::Collide { collision }).await
    }

    /// Query the agent's current state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<AgentSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Snapshot { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Destroy the agent without running its exit hook.
    pub async fn halt(&self) -> Result<AgentSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Halt { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// Events from every agent on this peer share the bus; filter by the
    /// agent id carried in each event.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AgentEvent> {
        self.event_bus.subscribe(topic)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
