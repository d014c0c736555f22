//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{FaultEvent, LifecycleEvent, ReplicationEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// State entries, exits and halts
    Lifecycle,
    /// Requests sent and broadcasts applied
    Replication,
    /// Hook failures and rejected broadcasts
    Fault,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    Lifecycle(LifecycleEvent),
    Replication(ReplicationEvent),
    Fault(FaultEvent),
}

impl AgentEvent {
    pub fn topic(&self) -> Topic {
        match self {
            AgentEvent::Lifecycle(_) => Topic::Lifecycle,
            AgentEvent::Replication(_) => Topic::Replication,
            AgentEvent::Fault(_) => Topic::Fault,
        }
    }
}

impl From<LifecycleEvent> for AgentEvent {
    fn from(event: LifecycleEvent) -> Self {
        Self::Lifecycle(event)
    }
}

impl From<ReplicationEvent> for AgentEvent {
    fn from(event: ReplicationEvent) -> Self {
        Self::Replication(event)
    }
}

impl From<FaultEvent> for AgentEvent {
    fn from(event: FaultEvent) -> Self {
        Self::Fault(event)
    }
}

struct Channels {
    lifecycle: broadcast::Sender<AgentEvent>,
    replication: broadcast::Sender<AgentEvent>,
    fault: broadcast::Sender<AgentEvent>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<AgentEvent> {
        match topic {
            Topic::Lifecycle => &self.lifecycle,
            Topic::Replication => &self.replication,
            Topic::Fault => &self.fault,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing is best-effort: events sent while a
/// topic has no subscribers are discarded.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                lifecycle: broadcast::channel(capacity).0,
                replication: broadcast::channel(capacity).0,
                fault: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<AgentEvent>) {
        let event = event.into();
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers for topic");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AgentEvent> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> Vec<(Topic, broadcast::Receiver<AgentEvent>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
