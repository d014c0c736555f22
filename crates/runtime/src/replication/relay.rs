use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use agent_core::AgentId;

use super::codec::{decode_request, encode_broadcast, encode_request};
use super::error::ReplicationError;
use super::messages::{Broadcast, Request};
use super::transport::{Inbound, ReplicationTransport};

/// Turns requests into broadcasts and fans them out per agent.
///
/// Every subscriber of an agent, including the requesting peer, receives
/// each broadcast exactly once and in request order.
#[derive(Default)]
pub struct Coordinator {
    subscribers: HashMap<AgentId, Vec<mpsc::UnboundedSender<Vec<u8>>>>,
    relayed: u64,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, agent: AgentId, tx: mpsc::UnboundedSender<Vec<u8>>) {
        self.subscribers.entry(agent).or_default().push(tx);
    }

    /// Relays one request. Returns the broadcast and how many peers got it.
    pub fn relay(&mut self, request: Request) -> Result<(Broadcast, usize), ReplicationError> {
        let broadcast = Broadcast::from(request);
        let bytes = encode_broadcast(&broadcast)?;
        let agent = broadcast.agent();

        let delivered = match self.subscribers.get_mut(&agent) {
            Some(peers) => {
                peers.retain(|tx| tx.send(bytes.clone()).is_ok());
                peers.len()
            }
            None => 0,
        };
        self.relayed += 1;

        trace!(
            target: "runtime::replication",
            %agent,
            delivered,
            message = ?broadcast,
            "relayed broadcast"
        );
        Ok((broadcast, delivered))
    }

    pub fn relayed(&self) -> u64 {
        self.relayed
    }
}

enum RelayCommand {
    Subscribe {
        agent: AgentId,
        tx: mpsc::UnboundedSender<Vec<u8>>,
    },
    Request(Vec<u8>),
}

/// In-process coordinator task for single-process sessions and tests.
pub struct LocalRelay {
    commands: mpsc::UnboundedSender<RelayCommand>,
    task: JoinHandle<u64>,
}

impl LocalRelay {
    /// Spawns the coordinator task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (commands, mut rx) = mpsc::unbounded_channel::<RelayCommand>();
        let task = tokio::spawn(async move {
            let mut coordinator = Coordinator::new();
            while let Some(command) = rx.recv().await {
                match command {
                    RelayCommand::Subscribe { agent, tx } => coordinator.subscribe(agent, tx),
                    RelayCommand::Request(bytes) => {
                        let relayed =
                            decode_request(&bytes).and_then(|request| coordinator.relay(request));
                        if let Err(error) = relayed {
                            warn!(
                                target: "runtime::replication",
                                %error,
                                "dropping malformed request"
                            );
                        }
                    }
                }
            }
            debug!(
                target: "runtime::replication",
                relayed = coordinator.relayed(),
                "local relay stopped"
            );
            coordinator.relayed()
        });
        Self { commands, task }
    }

    /// A peer-side link to this relay.
    pub fn transport(&self) -> RelayTransport {
        RelayTransport {
            commands: self.commands.clone(),
        }
    }

    /// Waits for the relay to stop; it stops once every transport is dropped.
    ///
    /// Returns the number of broadcasts relayed.
    pub async fn join(self) -> u64 {
        drop(self.commands);
        self.task.await.unwrap_or_default()
    }
}

/// Peer-side handle to a [`LocalRelay`].
#[derive(Clone)]
pub struct RelayTransport {
    commands: mpsc::UnboundedSender<RelayCommand>,
}

#[async_trait]
impl ReplicationTransport for RelayTransport {
    async fn send(&self, request: &Request) -> Result<(), ReplicationError> {
        let bytes = encode_request(request)?;
        self.commands
            .send(RelayCommand::Request(bytes))
            .map_err(|_| ReplicationError::RelayClosed)
    }

    fn subscribe(&self, agent: AgentId) -> Result<Inbound, ReplicationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.commands
            .send(RelayCommand::Subscribe { agent, tx })
            .map_err(|_| ReplicationError::RelayClosed)?;
        Ok(rx)
    }
}
