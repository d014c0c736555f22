use agent_core::{AgentError, ErrorSeverity, NavigationError, TargetError};
use thiserror::Error;

/// Failure raised by a state or transition hook.
///
/// The driver treats any hook error as fatal for the agent: it halts and
/// surfaces the error to the host.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl HookError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl AgentError for HookError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }
}

pub type HookResult = Result<(), HookError>;
