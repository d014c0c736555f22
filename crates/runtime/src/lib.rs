//! Runtime orchestration for replicated agent behavior.
//!
//! This crate wires behavior state machines to a replication transport and
//! to tokio worker tasks. Hosts embed a [`Runtime`] per peer, spawn agents
//! on it and talk to them through [`AgentHandle`].
//!
//! Modules are organized by responsibility:
//! - [`driver`] runs one agent's state machine, synchronously
//! - [`replication`] carries transition authority between peers
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for diagnostics
//! - [`world`] and [`providers`] supply in-memory collaborators
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod driver;
pub mod events;
pub mod providers;
pub mod replication;
pub mod runtime;
pub mod world;

mod workers;

pub use api::{AgentHandle, Result, RuntimeError};
pub use driver::{AgentSnapshot, Driver, DriverError, DriverOptions, TickOutcome};
pub use events::{AgentEvent, EventBus, FaultEvent, LifecycleEvent, ReplicationEvent, Topic};
pub use providers::world_handles;
pub use replication::{
    AuthorityReplicator, Broadcast, Coordinator, LocalRelay, RelayTransport, ReplicationError,
    ReplicationTransport, Request,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use world::{Bounds, TrackedEntity, WorldRegistry};
