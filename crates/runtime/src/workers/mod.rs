//! Worker tasks that back the runtime orchestration.
//!
//! One [`AgentWorker`] per agent owns that agent's [`Driver`](crate::Driver)
//! and is the only place it is touched.

mod agent;

pub use agent::{AgentWorker, Command, WorkerChannels};
