//! Transition authority over the wire.
//!
//! The authority never mutates its own agent when a transition fires. It
//! queues a [`Request`] on its [`AuthorityReplicator`]; the worker hands the
//! request to a [`ReplicationTransport`]; the coordinator on the other side
//! turns it into a [`Broadcast`] for every subscriber of that agent,
//! including the sender. Every peer, authority included, changes state only
//! when that broadcast comes back.
//!
//! Delivery per agent must be reliable and ordered. [`LocalRelay`] provides
//! that for single-process sessions by funnelling every request through one
//! task and fanning broadcasts out on unbounded mpsc channels.

mod codec;
mod error;
mod messages;
mod relay;
mod replicator;
mod transport;

pub use codec::{decode_broadcast, decode_request, encode_broadcast, encode_request};
pub use error::ReplicationError;
pub use messages::{Broadcast, Request};
pub use relay::{Coordinator, LocalRelay, RelayTransport};
pub use replicator::AuthorityReplicator;
pub use transport::{Inbound, ReplicationTransport};
