use std::sync::Arc;

use agent_core::{AgentHandles, Animation, Point};
use behavior_fsm::{
    BehaviorState, Collision, HookResult, LifecycleTask, StateContext, StateKey, TransitionList,
    finished, yield_frames,
};
use futures::FutureExt;
use tracing::{debug, warn};

use super::transitions::{
    AwakeTransition, EscalateTransition, InvestigateTransition, LostTargetTransition,
};
use super::{Kit, anim, locate_target, sfx};
use crate::voice::VoiceLine;

/// Initial state. Strolls to random points around itself until something
/// comes into view.
pub struct WanderState {
    kit: Kit,
    destination: Option<Point>,
    transitions: TransitionList,
}

impl WanderState {
    pub const KEY: StateKey = StateKey("WanderState");

    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            transitions: TransitionList::new().with(InvestigateTransition::new(kit.clone())),
            destination: None,
            kit,
        }
    }

    fn pick_destination(&mut self, cx: &mut StateContext<'_>) {
        let origin = cx.navigation().position();
        let radius = self.kit.config.wander_radius;
        let heading = cx.rng().range_f32(0.0, 360.0).to_radians();
        let distance = cx.rng().range_f32(radius * 0.25, radius);
        let goal = origin + Point::new(heading.sin(), 0.0, heading.cos()) * distance;

        match cx.navigation().set_destination_with_fallback(goal) {
            Ok(chosen) => self.destination = Some(chosen),
            Err(error) => {
                debug!(target: "content::lurker", agent = %cx.agent(), %error, "wander destination rejected");
                self.destination = None;
            }
        }
    }
}

impl BehaviorState for WanderState {
    fn key(&self) -> StateKey {
        Self::KEY
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        cx.animation().set_bool(anim::IS_MOVING, true);
        cx.animation().set_bool(anim::IS_RUNNING, false);
        finished()
    }

    fn on_interval(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        let arrived = self.destination.is_none_or(|destination| {
            cx.navigation().position().flat_distance(destination) <= self.kit.config.arrival_radius
        });
        if arrived {
            self.pick_destination(cx);
        }
        Ok(())
    }

    fn on_exit(&mut self, _cx: &mut StateContext<'_>) -> LifecycleTask {
        finished()
    }
}

/// Walks toward whatever it noticed while deciding whether to give chase.
pub struct InvestigateState {
    kit: Kit,
    transitions: TransitionList,
}

impl InvestigateState {
    pub const KEY: StateKey = StateKey("InvestigateState");

    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            transitions: TransitionList::new()
                .with(EscalateTransition::new(kit.clone()))
                .with(LostTargetTransition::new(kit.clone())),
            kit,
        }
    }
}

impl BehaviorState for InvestigateState {
    fn key(&self) -> StateKey {
        Self::KEY
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        cx.animation().set_bool(anim::IS_MOVING, true);
        finished()
    }

    fn on_interval(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        if let Some((target, position)) = locate_target(cx)
            && let Err(error) = cx.navigation().set_destination_with_fallback(position)
        {
            debug!(target: "content::lurker", agent = %cx.agent(), %target, %error, "cannot approach target");
        }
        Ok(())
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        complain_if_lost(&self.kit, cx);
        finished()
    }
}

/// Roars, then runs the target down. Gives up and wanders when the target
/// cannot be reached at all.
pub struct ChaseState {
    kit: Kit,
    animation: Option<Arc<dyn Animation>>,
    transitions: TransitionList,
}

impl ChaseState {
    pub const KEY: StateKey = StateKey("ChaseState");

    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            transitions: TransitionList::new().with(LostTargetTransition::new(kit.clone())),
            animation: None,
            kit,
        }
    }
}

impl BehaviorState for ChaseState {
    fn key(&self) -> StateKey {
        Self::KEY
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn attach(&mut self, handles: &AgentHandles) {
        self.animation = Some(handles.animation.clone());
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        self.kit.voice.say(cx.audio(), VoiceLine::ChasingForSomeTime);
        let species = cx
            .target()
            .get()
            .and_then(|target| cx.handles().roster.species(target));
        self.kit.voice.engage(cx.audio(), species);

        cx.animation().set_bool(anim::IS_MOVING, false);
        cx.animation().set_trigger(anim::DO_ROAR);

        let roar = self.kit.config.roar_frames;
        let animation = self.animation.clone();
        async move {
            yield_frames(roar).await;
            if let Some(animation) = animation {
                animation.set_bool(anim::IS_MOVING, true);
                animation.set_bool(anim::IS_RUNNING, true);
            }
            Ok(())
        }
        .boxed()
    }

    fn on_interval(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        let Some((target, position)) = locate_target(cx) else {
            return Ok(());
        };
        if let Err(error) = cx.navigation().set_destination_with_fallback(position) {
            warn!(target: "content::lurker", agent = %cx.agent(), %target, %error, "target unreachable, wandering instead");
            cx.request_override(WanderState::KEY);
        }
        Ok(())
    }

    fn on_collision(&mut self, cx: &mut StateContext<'_>, collision: &Collision) -> HookResult {
        if cx.target().get() == Some(collision.other) {
            cx.animation().set_trigger(anim::DO_BITE);
        }
        Ok(())
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        complain_if_lost(&self.kit, cx);
        cx.animation().set_bool(anim::IS_RUNNING, false);
        finished()
    }
}

/// Leaving a pursuit with the target already dropped means it got away.
fn complain_if_lost(kit: &Kit, cx: &StateContext<'_>) {
    if cx.target().get().is_none() {
        kit.voice.say(cx.audio(), VoiceLine::LostTarget);
    }
}

/// Knocked out. Only reachable by override; wakes up on its own.
pub struct DeadTemporarilyState {
    kit: Kit,
    transitions: TransitionList,
}

impl DeadTemporarilyState {
    pub const KEY: StateKey = StateKey("DeadTemporarilyState");

    pub(crate) fn new(kit: Kit) -> Self {
        Self {
            transitions: TransitionList::new().with(AwakeTransition::new(kit.clone())),
            kit,
        }
    }
}

impl BehaviorState for DeadTemporarilyState {
    fn key(&self) -> StateKey {
        Self::KEY
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        cx.audio().play_one_shot(sfx::DEFEATED);
        cx.animation().set_bool(anim::IS_MOVING, false);
        cx.animation().set_trigger(anim::DO_KILL);
        finished()
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        cx.audio().play_one_shot(sfx::SPAWN);
        self.kit.voice.say(cx.audio(), VoiceLine::Revival);
        cx.animation().set_bool(anim::IS_MOVING, true);
        finished()
    }

    fn accepts_collision_damage(&self) -> bool {
        false
    }
}
