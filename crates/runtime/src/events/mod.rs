//! Topic-based event bus for agent diagnostics.
//!
//! Drivers record what happened to an agent; the worker publishes those
//! records here so hosts can watch state changes, replication traffic and
//! faults without polling.

mod bus;
mod types;

pub use bus::{AgentEvent, EventBus, Topic};
pub use types::{FaultEvent, LifecycleEvent, ReplicationEvent};
