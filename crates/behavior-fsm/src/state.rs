use std::fmt;

use agent_core::{AgentHandles, EntityId, Point};

use crate::context::StateContext;
use crate::error::HookResult;
use crate::task::LifecycleTask;
use crate::transition::TransitionList;

/// Registry name of a behavior state. This is what crosses the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(pub &'static str);

impl StateKey {
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A physical contact reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub other: EntityId,
    pub point: Point,
}

/// One mode of an agent's behavior.
///
/// A state owns its local transitions. The driver instantiates it through
/// the registry, calls [`attach`](BehaviorState::attach) exactly once, then
/// runs `on_enter` → (`update` / `late_update` / `on_interval` /
/// `on_collision`)* → `on_exit`.
///
/// Hooks run identically on every peer; only the authority evaluates
/// transitions.
pub trait BehaviorState: Send {
    fn key(&self) -> StateKey;

    /// Transitions checked only while this state is active, in order.
    fn transitions(&mut self) -> &mut TransitionList;

    /// Binds the agent's collaborators. Called once, before `on_enter`.
    fn attach(&mut self, _handles: &AgentHandles) {}

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask;

    /// Runs every frame while the state is active and not transitioning.
    fn update(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        Ok(())
    }

    /// Runs after `update` in the same frame, once the frame's target change
    /// has been replicated.
    fn late_update(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        Ok(())
    }

    /// Runs on the slower AI cadence.
    fn on_interval(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        Ok(())
    }

    fn on_collision(&mut self, _cx: &mut StateContext<'_>, _collision: &Collision) -> HookResult {
        Ok(())
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask;

    /// Whether contact damage applies to the agent while in this state.
    fn accepts_collision_damage(&self) -> bool {
        true
    }
}

impl<S: BehaviorState + ?Sized> BehaviorState for Box<S> {
    fn key(&self) -> StateKey {
        (**self).key()
    }

    fn transitions(&mut self) -> &mut TransitionList {
        (**self).transitions()
    }

    fn attach(&mut self, handles: &AgentHandles) {
        (**self).attach(handles)
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        (**self).on_enter(cx)
    }

    fn update(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        (**self).update(cx)
    }

    fn late_update(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        (**self).late_update(cx)
    }

    fn on_interval(&mut self, cx: &mut StateContext<'_>) -> HookResult {
        (**self).on_interval(cx)
    }

    fn on_collision(&mut self, cx: &mut StateContext<'_>, collision: &Collision) -> HookResult {
        (**self).on_collision(cx, collision)
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        (**self).on_exit(cx)
    }

    fn accepts_collision_damage(&self) -> bool {
        (**self).accepts_collision_damage()
    }
}
