use async_trait::async_trait;
use tokio::sync::mpsc;

use agent_core::AgentId;

use super::error::ReplicationError;
use super::messages::Request;

/// Encoded broadcasts for one agent, in coordinator order.
pub type Inbound = mpsc::UnboundedReceiver<Vec<u8>>;

/// Link between a peer and the coordinator.
///
/// Implementations must deliver broadcasts for a given agent reliably and in
/// the order the coordinator produced them.
#[async_trait]
pub trait ReplicationTransport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<(), ReplicationError>;

    /// Starts receiving broadcasts addressed to `agent`.
    fn subscribe(&self, agent: AgentId) -> Result<Inbound, ReplicationError>;
}
