//! Public API surface for runtime consumers.
//!
//! Re-exports the handle used to talk to running agents and the error type
//! every runtime call returns.

mod errors;
mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::AgentHandle;
