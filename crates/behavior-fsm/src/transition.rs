use std::fmt;

use agent_core::AgentHandles;

use crate::context::StateContext;
use crate::error::HookResult;
use crate::state::{Collision, StateKey};

/// Registry name of a transition. Replicated the same way as a state name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionKey(pub &'static str);

impl TransitionKey {
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A guarded edge to another state.
///
/// `can_transition` is evaluated on the authority only. When it fires, the
/// authority replicates this transition's *name*; every peer then builds a
/// fresh instance and asks it for [`next_state`](Transition::next_state).
/// `next_state` must therefore depend only on the context, never on private
/// counters accumulated by the guard.
pub trait Transition: Send {
    fn key(&self) -> TransitionKey;

    /// Binds the agent's collaborators. Called once per instance, before the
    /// first guard evaluation.
    fn attach(&mut self, _handles: &AgentHandles) {}

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool;

    fn next_state(&self, cx: &StateContext<'_>) -> StateKey;

    fn on_collision(&mut self, _cx: &mut StateContext<'_>, _collision: &Collision) -> HookResult {
        Ok(())
    }
}

/// Ordered transitions plus whether each one has been attached yet.
#[derive(Default)]
pub struct TransitionList {
    slots: Vec<Slot>,
}

struct Slot {
    transition: Box<dyn Transition>,
    primed: bool,
}

impl Slot {
    fn prime(&mut self, handles: &AgentHandles) {
        if !self.primed {
            self.transition.attach(handles);
            self.primed = true;
        }
    }
}

impl TransitionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, transition: impl Transition + 'static) -> Self {
        self.push(Box::new(transition));
        self
    }

    pub fn push(&mut self, transition: Box<dyn Transition>) {
        self.slots.push(Slot {
            transition,
            primed: false,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = TransitionKey> + '_ {
        self.slots.iter().map(|slot| slot.transition.key())
    }

    /// Evaluates guards in declaration order; returns the first that fires.
    ///
    /// Transitions are attached right before their first use and never again.
    pub fn first_firing(&mut self, cx: &mut StateContext<'_>) -> Option<TransitionKey> {
        let handles = cx.handles();
        for slot in &mut self.slots {
            slot.prime(handles);
            if slot.transition.can_transition(cx) {
                return Some(slot.transition.key());
            }
        }
        None
    }

    /// Forwards a collision to every transition, stopping at the first error.
    pub fn dispatch_collision(
        &mut self,
        cx: &mut StateContext<'_>,
        collision: &Collision,
    ) -> HookResult {
        let handles = cx.handles();
        for slot in &mut self.slots {
            slot.prime(handles);
            slot.transition.on_collision(cx, collision)?;
        }
        Ok(())
    }
}

impl From<Vec<Box<dyn Transition>>> for TransitionList {
    fn from(transitions: Vec<Box<dyn Transition>>) -> Self {
        let mut list = Self::new();
        for transition in transitions {
            list.push(transition);
        }
        list
    }
}

impl fmt::Debug for TransitionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use agent_core::{EntityId, Point};

    use super::*;
    use crate::testing::Harness;

    struct Probe {
        key: &'static str,
        fires: bool,
        attaches: Arc<AtomicU32>,
        guards: Arc<AtomicU32>,
        collisions: Arc<AtomicU32>,
    }

    impl Probe {
        fn new(key: &'static str, fires: bool) -> Self {
            Self {
                key,
                fires,
                attaches: Arc::default(),
                guards: Arc::default(),
                collisions: Arc::default(),
            }
        }
    }

    impl Transition for Probe {
        fn key(&self) -> TransitionKey {
            TransitionKey(self.key)
        }
        fn attach(&mut self, _handles: &AgentHandles) {
            self.attaches.fetch_add(1, Ordering::SeqCst);
        }
        fn can_transition(&mut self, _cx: &mut StateContext<'_>) -> bool {
            self.guards.fetch_add(1, Ordering::SeqCst);
            self.fires
        }
        fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
            StateKey("Next")
        }
        fn on_collision(&mut self, _cx: &mut StateContext<'_>, _collision: &Collision) -> HookResult {
            self.collisions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn first_firing_short_circuits_in_declaration_order() {
        let quiet = Probe::new("Quiet", false);
        let first = Probe::new("First", true);
        let second = Probe::new("Second", true);
        let second_guards = second.guards.clone();
        let mut list = TransitionList::new().with(quiet).with(first).with(second);
        let mut harness = Harness::new();

        let fired = list.first_firing(&mut harness.context());

        assert_eq!(fired, Some(TransitionKey("First")));
        assert_eq!(second_guards.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transitions_are_attached_once() {
        let quiet = Probe::new("Quiet", false);
        let attaches = quiet.attaches.clone();
        let collisions = quiet.collisions.clone();
        let mut list = TransitionList::new().with(quiet);
        let mut harness = Harness::new();

        for _ in 0..3 {
            assert_eq!(list.first_firing(&mut harness.context()), None);
        }
        let collision = Collision {
            other: EntityId(1),
            point: Point::ORIGIN,
        };
        list.dispatch_collision(&mut harness.context(), &collision)
            .unwrap();

        assert_eq!(attaches.load(Ordering::SeqCst), 1);
        assert_eq!(collisions.load(Ordering::SeqCst), 1);
    }
}
