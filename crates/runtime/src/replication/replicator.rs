use std::collections::VecDeque;

use agent_core::{AgentId, TargetIndex};

use super::error::ReplicationError;
use super::messages::Request;

/// Per-agent outbox of requests this peer wants replicated.
///
/// Only the authority may queue anything; observers get
/// [`ReplicationError::NotAuthority`]. Requests leave in the order they
/// were queued.
#[derive(Debug)]
pub struct AuthorityReplicator {
    agent: AgentId,
    authority: bool,
    outbox: VecDeque<Request>,
}

impl AuthorityReplicator {
    pub fn new(agent: AgentId, authority: bool) -> Self {
        Self {
            agent,
            authority,
            outbox: VecDeque::new(),
        }
    }

    pub fn is_authority(&self) -> bool {
        self.authority
    }

    pub fn request_transition(
        &mut self,
        name: impl Into<String>,
        seed: i32,
    ) -> Result<(), ReplicationError> {
        self.ensure_authority()?;
        self.outbox.push_back(Request::Transition {
            agent: self.agent,
            name: name.into(),
            seed,
        });
        Ok(())
    }

    pub fn request_target(&mut self, index: TargetIndex) -> Result<(), ReplicationError> {
        self.ensure_authority()?;
        self.outbox.push_back(Request::Target {
            agent: self.agent,
            index,
        });
        Ok(())
    }

    /// Takes every queued request, oldest first.
    pub fn drain(&mut self) -> Vec<Request> {
        self.outbox.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    fn ensure_authority(&self) -> Result<(), ReplicationError> {
        if self.authority {
            Ok(())
        } else {
            Err(ReplicationError::NotAuthority(self.agent))
        }
    }
}
