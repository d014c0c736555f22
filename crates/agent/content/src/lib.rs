//! Data-driven creature content built on the behavior state machine.
//!
//! This crate houses the reference creature and the data it is tuned with:
//! - the lurker's states and transitions ([`lurker`])
//! - creature tuning ([`LurkerConfig`]), loadable from TOML
//! - per-species voice lines ([`VoiceTable`])
//!
//! Content only talks to collaborators through the handles the driver
//! attaches; it never reaches into a concrete world.

pub mod config;
pub mod lurker;
pub mod voice;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use config::LurkerConfig;
pub use lurker::{LURKER, register, registry};
pub use voice::{Voice, VoiceLine, VoiceTable};

#[cfg(feature = "loaders")]
pub use loaders::ConfigLoader;
