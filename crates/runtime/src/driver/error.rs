use agent_core::{AgentError, AgentId, ErrorSeverity};
use behavior_fsm::{HookError, RegistryError, StateKey};
use thiserror::Error;

use crate::replication::ReplicationError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{0} has been halted")]
    AgentHalted(AgentId),

    #[error("a transition is already in flight for {0}")]
    TransitionBusy(AgentId),

    #[error("peer is not the authority for {0}")]
    NotAuthority(AgentId),

    #[error("broadcast for {received} delivered to driver of {expected}")]
    Misrouted { expected: AgentId, received: AgentId },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Replication(ReplicationError),

    #[error("hook failed in state {state:?}")]
    Hook {
        state: Option<StateKey>,
        #[source]
        source: HookError,
    },
}

impl From<ReplicationError> for DriverError {
    fn from(error: ReplicationError) -> Self {
        match error {
            ReplicationError::NotAuthority(agent) => Self::NotAuthority(agent),
            other => Self::Replication(other),
        }
    }
}

impl AgentError for DriverError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TransitionBusy(_) => ErrorSeverity::Recoverable,
            Self::NotAuthority(_) | Self::Misrouted { .. } | Self::AgentHalted(_) => {
                ErrorSeverity::Validation
            }
            Self::Registry(error) => error.severity(),
            Self::Replication(error) => error.severity(),
            Self::Hook { .. } => ErrorSeverity::Fatal,
        }
    }
}
