use agent_core::{AgentError, AgentId, ErrorSeverity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("peer is not the authority for {0}")]
    NotAuthority(AgentId),

    #[error("failed to encode or decode a replication message")]
    Codec(#[from] bincode::Error),

    #[error("replication relay is closed")]
    RelayClosed,
}

impl AgentError for ReplicationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAuthority(_) => ErrorSeverity::Validation,
            Self::Codec(_) => ErrorSeverity::Internal,
            Self::RelayClosed => ErrorSeverity::Fatal,
        }
    }
}
