//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from drivers, replication and worker coordination so
//! hosts can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use agent_core::{AgentError, AgentId, ErrorSeverity};
use behavior_fsm::RegistryError;

use crate::driver::DriverError;
use crate::replication::ReplicationError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("agent worker command channel closed")]
    CommandChannelClosed,

    #[error("agent worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("agent worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a state registry before building")]
    MissingRegistry,

    #[error("runtime requires a replication transport before building")]
    MissingTransport,

    #[error("{0} is already running on this peer")]
    DuplicateAgent(AgentId),

    #[error("{0} is not running on this peer")]
    UnknownAgent(AgentId),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

impl AgentError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Driver(error) => error.severity(),
            Self::Registry(error) => error.severity(),
            Self::Replication(error) => error.severity(),
            Self::DuplicateAgent(_) | Self::UnknownAgent(_) => ErrorSeverity::Validation,
            Self::MissingRegistry | Self::MissingTransport => ErrorSeverity::Internal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Fatal
            }
        }
    }
}
