//! Deterministic agent data types shared by every peer.
//!
//! `agent-core` defines the pieces of an agent that must agree across the
//! network without re-running decision logic: stable identifiers, the
//! seed-replicated [`RandomStream`], and the dirty-checked
//! [`TargetReference`]. It also declares the collaborator interfaces in
//! [`env`] that the state machine drives but never implements.
pub mod env;
pub mod error;
pub mod ids;
pub mod rng;
pub mod target;

pub use env::{
    AgentHandles, Animation, AudioSink, EntityRoster, Navigation, NavigationError, PathStatus,
    Perception, Point, Pose, SightQuery, Sighting, Silent,
};
pub use error::{AgentError, ErrorSeverity};
pub use ids::{AgentId, EntityId, Frame, SpeciesTag};
pub use rng::{RandomStream, spawn_seed};
pub use target::{TargetError, TargetIndex, TargetReference};
