//! Common error infrastructure shared by the engine crates.
//!
//! Domain errors (`TargetError`, `NavigationError`, registry and driver errors
//! in downstream crates) are defined next to the code that produces them and
//! implement [`AgentError`] so hosts can route them uniformly.

/// Severity level of an error, used for logging and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Recoverable in place: fall back, retry on a later tick, or ignore.
    ///
    /// Examples: destination unreachable, target unset.
    Recoverable,

    /// Rejected input; the caller must change what it asks for.
    ///
    /// Examples: unknown state name on the wire, transition while busy.
    Validation,

    /// Unexpected inconsistency that indicates a bug.
    Internal,

    /// The agent cannot continue and must be torn down.
    ///
    /// Examples: conflicting registry configuration, failing lifecycle hook.
    Fatal,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if the agent must stop after this error.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Common trait for all engine errors.
pub trait AgentError: std::error::Error {
    fn severity(&self) -> ErrorSeverity;
}
