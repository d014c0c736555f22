use behavior_fsm::{StateContext, StateKey, Transition, TransitionKey};
use tracing::{debug, trace};

use super::states::{ChaseState, InvestigateState, WanderState};
use super::Kit;

/// Fires when anything satisfies the notice query, focusing on the nearest.
pub struct InvestigateTransition {
    kit: Kit,
}

impl InvestigateTransition {
    pub(crate) fn new(kit: Kit) -> Self {
        Self { kit }
    }
}

impl Transition for InvestigateTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("InvestigateTransition")
    }

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool {
        let Some(sighting) = cx.perception().nearest_visible(self.kit.config.notice_sight) else {
            return false;
        };
        debug!(
            target: "content::lurker",
            agent = %cx.agent(),
            entity = %sighting.entity,
            distance = sighting.distance,
            "noticed something"
        );
        cx.target_mut().set(Some(sighting.entity));
        true
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        InvestigateState::KEY
    }
}

/// Fires once the target has stayed in sight for enough consecutive ticks.
pub struct EscalateTransition {
    kit: Kit,
    visible_ticks: u32,
}

impl EscalateTransition {
    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            kit,
            visible_ticks: 0,
        }
    }
}

impl Transition for EscalateTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("EscalateTransition")
    }

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool {
        let visible = cx
            .target()
            .get()
            .is_some_and(|target| cx.perception().is_visible(target, self.kit.config.chase_sight));
        if !visible {
            self.visible_ticks = 0;
            return false;
        }

        self.visible_ticks += 1;
        if self.visible_ticks < self.kit.config.escalate_after_ticks {
            return false;
        }
        self.visible_ticks = 0;
        true
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        ChaseState::KEY
    }
}

/// Fires after the target has been out of sight for too long, dropping it.
/// The cleared target is replicated ahead of the transition, so the states
/// it leaves see no target on every peer.
pub struct LostTargetTransition {
    kit: Kit,
    unseen_ticks: u32,
}

impl LostTargetTransition {
    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            kit,
            unseen_ticks: 0,
        }
    }
}

impl Transition for LostTargetTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("LostTargetTransition")
    }

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool {
        let seen = cx
            .target()
            .get()
            .is_some_and(|target| cx.perception().is_visible(target, self.kit.config.lost_sight));
        if seen {
            self.unseen_ticks = 0;
            return false;
        }

        self.unseen_ticks += 1;
        if self.unseen_ticks < self.kit.config.give_up_after_ticks {
            return false;
        }
        cx.target_mut().clear();
        true
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        WanderState::KEY
    }
}

/// Wake-up timer of the knocked-out state, counted in simulated seconds.
pub struct AwakeTransition {
    kit: Kit,
    elapsed: f32,
}

impl AwakeTransition {
    pub(crate) fn new(kit: Kit) -> Self {
        Self { kit, elapsed: 0.0 }
    }
}

impl Transition for AwakeTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("AwakeTransition")
    }

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool {
        self.elapsed += cx.delta();
        trace!(target: "content::lurker", agent = %cx.agent(), elapsed = self.elapsed, "playing dead");
        self.elapsed >= self.kit.config.dead_seconds
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        WanderState::KEY
    }
}
