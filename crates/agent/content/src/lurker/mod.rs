//! The lurker: a creature that wanders, notices, stares, then chases.
//!
//! ```text
//!   WanderState --Investigate--> InvestigateState --Escalate--> ChaseState
//!        ^                              |                           |
//!        +---------- LostTarget --------+------- LostTarget --------+
//!
//!   DeadTemporarilyState (override only) --Awake--> WanderState
//! ```
//!
//! Guards run on the authority only; everything a state does on entry, exit
//! and per interval runs on every peer.

mod states;
mod transitions;

use std::sync::Arc;

use agent_core::{EntityId, Point, SpeciesTag};
use behavior_fsm::{RegistryBuilder, RegistryError, StateContext, StateRegistry};
use tracing::debug;

pub use states::{ChaseState, DeadTemporarilyState, InvestigateState, WanderState};
pub use transitions::{
    AwakeTransition, EscalateTransition, InvestigateTransition, LostTargetTransition,
};

use crate::config::LurkerConfig;
use crate::voice::Voice;

pub const LURKER: SpeciesTag = SpeciesTag("lurker");

/// Animation parameter names the lurker drives.
pub mod anim {
    pub const IS_MOVING: &str = "isMoving";
    pub const IS_RUNNING: &str = "isRunning";
    pub const DO_ROAR: &str = "doRoar";
    pub const DO_BITE: &str = "doBite";
    pub const DO_KILL: &str = "KillEnemy";
}

/// Sound effects. Played whether or not speaking is enabled.
pub mod sfx {
    pub const DEFEATED: &str = "sfx.defeated";
    pub const SPAWN: &str = "sfx.spawn";
}

/// Tuning and voice shared by every lurker state and transition.
#[derive(Clone, Debug)]
pub(crate) struct Kit {
    pub config: Arc<LurkerConfig>,
    pub voice: Voice,
}

impl Kit {
    fn new(config: &LurkerConfig) -> Self {
        Self {
            voice: Voice::new(config.speaking_enabled, config.voice.clone()),
            config: Arc::new(config.clone()),
        }
    }
}

/// Current target and where it stands, or `None` (logged) when either is
/// unknown.
pub(crate) fn locate_target(cx: &StateContext<'_>) -> Option<(EntityId, Point)> {
    let target = match cx.target().require() {
        Ok(target) => target,
        Err(error) => {
            debug!(target: "content::lurker", agent = %cx.agent(), %error, "no target to follow");
            return None;
        }
    };
    let position = cx.handles().roster.position(target);
    if position.is_none() {
        debug!(target: "content::lurker", agent = %cx.agent(), %target, "target left the roster");
    }
    position.map(|position| (target, position))
}

/// Adds the lurker species to `builder`.
pub fn register(builder: RegistryBuilder, config: &LurkerConfig) -> RegistryBuilder {
    let kit = Kit::new(config);
    builder.species(LURKER, move |species| {
        let (wander, investigate, chase, dead) =
            (kit.clone(), kit.clone(), kit.clone(), kit.clone());
        let (notice, escalate, lost, awake) =
            (kit.clone(), kit.clone(), kit.clone(), kit.clone());

        species
            .initial_state(move || WanderState::new(wander.clone()))
            .state(move || InvestigateState::new(investigate.clone()))
            .state(move || ChaseState::new(chase.clone()))
            .state(move || DeadTemporarilyState::new(dead.clone()))
            .transition(move || InvestigateTransition::new(notice.clone()))
            .transition(move || EscalateTransition::new(escalate.clone()))
            .transition(move || LostTargetTransition::new(lost.clone()))
            .transition(move || AwakeTransition::new(awake.clone()))
    })
}

/// Registry holding only the lurker.
pub fn registry(config: &LurkerConfig) -> Result<StateRegistry, RegistryError> {
    register(StateRegistry::builder(), config).build()
}

#[cfg(test)]
mod tests {
    use behavior_fsm::Resolved;

    use super::*;

    #[test]
    fn every_lurker_name_resolves() {
        let registry = registry(&LurkerConfig::default()).unwrap();

        for state in ["WanderState", "InvestigateState", "ChaseState", "DeadTemporarilyState"] {
            assert!(matches!(
                registry.lookup(state, LURKER).unwrap(),
                Resolved::State(..)
            ));
        }
        for transition in [
            "InvestigateTransition",
            "EscalateTransition",
            "LostTargetTransition",
            "AwakeTransition",
        ] {
            assert!(registry.lookup(transition, LURKER).unwrap().is_transition());
        }
        assert_eq!(registry.initial_state(LURKER).unwrap().as_str(), "WanderState");
    }

    #[test]
    fn registering_twice_is_rejected() {
        let config = LurkerConfig::default();
        let err = register(register(StateRegistry::builder(), &config), &config)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
    }
}
