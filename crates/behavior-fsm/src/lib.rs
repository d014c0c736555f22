//! Behavior state machine building blocks.
//!
//! An agent's behavior is a set of named [`BehaviorState`]s connected by
//! guarded [`Transition`]s. Both are addressed by name through a
//! [`StateRegistry`] so the only thing that has to cross the wire to move an
//! agent is a short string and a seed.
//!
//! - **One active state**: the driver owns exactly one state at a time
//! - **Suspendable lifecycle**: entry and exit return a [`LifecycleTask`]
//!   that may take several frames to finish
//! - **No transport**: nothing in this crate knows how names are replicated
//!
//! # Architecture
//!
//! - [`BehaviorState`] / [`Transition`]: content-facing traits
//! - [`StateContext`]: per-hook view of the agent (rng, target, collaborators)
//! - [`StateRegistry`] / [`ResolutionCache`]: name → factory lookup
//! - [`DriverPhase`]: where the driver is in a transition

pub mod context;
pub mod error;
pub mod phase;
pub mod registry;
pub mod state;
pub mod task;
pub mod transition;

#[cfg(test)]
mod testing;

pub use context::StateContext;
pub use error::{HookError, HookResult};
pub use phase::DriverPhase;
pub use registry::{
    RegistryBuilder, RegistryError, ResolutionCache, Resolved, SpeciesBuilder, StateRegistry,
};
pub use state::{BehaviorState, Collision, StateKey};
pub use task::{LifecycleTask, WaitUntil, YieldFrames, finished, poll_once, wait_until, yield_frames};
pub use transition::{Transition, TransitionKey, TransitionList};
