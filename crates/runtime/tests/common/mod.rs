//! Small species used to exercise the driver without real content.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use agent_core::{
    AgentHandles, AgentId, EntityId, EntityRoster, Navigation, PathStatus, Perception, Point,
    SightQuery, Sighting, SpeciesTag,
};
use agent_runtime::{Broadcast, Driver, DriverOptions};
use behavior_fsm::{
    BehaviorState, Collision, HookError, HookResult, LifecycleTask, StateContext, StateKey,
    StateRegistry, Transition, TransitionKey, TransitionList, finished, yield_frames,
};
use futures::FutureExt;

pub const BEAST: SpeciesTag = SpeciesTag("beast");
pub const PREY: EntityId = EntityId(9);

/// Knobs shared by every peer of a test session.
#[derive(Clone, Default)]
pub struct Switches {
    pub roam: Arc<AtomicBool>,
    pub panic: Arc<AtomicBool>,
    pub stay: Arc<AtomicBool>,
    pub fail_update: Arc<AtomicBool>,
    pub exit_frames: Arc<AtomicU32>,
    pub enter_frames: Arc<AtomicU32>,
    pub collisions: Arc<AtomicU32>,
    /// State `IdleState` forces from its collision hook.
    pub override_on_collision: Arc<Mutex<Option<&'static str>>>,
    /// Frame and interval hooks of `IdleState` and `RoamState`, in order.
    pub hooks: Journal,
}

impl Switches {
    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }
}

/// What one peer's states did, in order.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

struct Static;

impl Navigation for Static {
    fn try_set_destination(&self, _point: Point) -> bool {
        true
    }
    fn calculate_path(&self, _point: Point) -> PathStatus {
        PathStatus::Complete
    }
    fn path_corners(&self) -> Vec<Point> {
        Vec::new()
    }
    fn position(&self) -> Point {
        Point::ORIGIN
    }
}

impl Perception for Static {
    fn nearest_visible(&self, _query: SightQuery) -> Option<Sighting> {
        None
    }
    fn is_visible(&self, _entity: EntityId, _query: SightQuery) -> bool {
        false
    }
}

impl EntityRoster for Static {
    fn contains(&self, entity: EntityId) -> bool {
        entity == PREY
    }
    fn position(&self, _entity: EntityId) -> Option<Point> {
        Some(Point::ORIGIN)
    }
}

pub fn handles() -> AgentHandles {
    let world = Arc::new(Static);
    AgentHandles::new(world.clone(), world.clone(), world)
}

struct IdleState {
    journal: Journal,
    switches: Switches,
    transitions: TransitionList,
}

impl BehaviorState for IdleState {
    fn key(&self) -> StateKey {
        StateKey("IdleState")
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn attach(&mut self, _handles: &AgentHandles) {
        self.journal.push("attach IdleState");
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        let draw = cx.rng().range(0, 1000);
        self.journal.push(format!("enter IdleState {draw}"));
        finished()
    }

    fn update(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        self.switches.hooks.push("update IdleState");
        Ok(())
    }

    fn late_update(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        self.switches.hooks.push("late IdleState");
        Ok(())
    }

    fn on_interval(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        self.switches.hooks.push("interval IdleState");
        Ok(())
    }

    fn on_collision(&mut self, cx: &mut StateContext<'_>, _collision: &Collision) -> HookResult {
        self.switches.collisions.fetch_add(1, Ordering::SeqCst);
        if let Some(state) = *self.switches.override_on_collision.lock().unwrap() {
            cx.request_override(StateKey(state));
        }
        Ok(())
    }

    fn on_exit(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        let draw = cx.rng().range(0, 1000);
        self.journal.push(format!("exit IdleState {draw}"));
        let frames = self.switches.exit_frames.load(Ordering::SeqCst);
        let journal = self.journal.clone();
        async move {
            yield_frames(frames).await;
            journal.push("exited IdleState");
            Ok(())
        }
        .boxed()
    }
}

struct RoamState {
    journal: Journal,
    switches: Switches,
    transitions: TransitionList,
}

impl BehaviorState for RoamState {
    fn key(&self) -> StateKey {
        StateKey("RoamState")
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn attach(&mut self, _handles: &AgentHandles) {
        self.journal.push("attach RoamState");
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        let draw = cx.rng().range(0, 1000);
        self.journal.push(format!("enter RoamState {draw}"));
        let frames = self.switches.enter_frames.load(Ordering::SeqCst);
        async move {
            yield_frames(frames).await;
            Ok(())
        }
        .boxed()
    }

    fn update(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        if self.switches.fail_update.load(Ordering::SeqCst) {
            return Err(HookError::msg("roam update failed"));
        }
        self.switches.hooks.push("update RoamState");
        Ok(())
    }

    fn on_interval(&mut self, _cx: &mut StateContext<'_>) -> HookResult {
        self.switches.hooks.push("interval RoamState");
        Ok(())
    }

    fn on_exit(&mut self, _cx: &mut StateContext<'_>) -> LifecycleTask {
        self.journal.push("exit RoamState");
        finished()
    }
}

struct PanicState {
    journal: Journal,
    transitions: TransitionList,
}

impl BehaviorState for PanicState {
    fn key(&self) -> StateKey {
        StateKey("PanicState")
    }

    fn transitions(&mut self) -> &mut TransitionList {
        &mut self.transitions
    }

    fn on_enter(&mut self, cx: &mut StateContext<'_>) -> LifecycleTask {
        let draw = cx.rng().range(0, 1000);
        self.journal.push(format!("enter PanicState {draw}"));
        finished()
    }

    fn on_exit(&mut self, _cx: &mut StateContext<'_>) -> LifecycleTask {
        self.journal.push("exit PanicState");
        finished()
    }

    fn accepts_collision_damage(&self) -> bool {
        false
    }
}

/// Fires while `roam` is set and focuses the prey on the way.
struct RoamTransition {
    switches: Switches,
}

impl Transition for RoamTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("RoamTransition")
    }

    fn can_transition(&mut self, cx: &mut StateContext<'_>) -> bool {
        if !self.switches.roam.load(Ordering::SeqCst) {
            return false;
        }
        cx.target_mut().set(Some(PREY));
        true
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        StateKey("RoamState")
    }
}

/// Fires while `stay` is set and leads back into `RoamState`.
struct StayTransition {
    switches: Switches,
}

impl Transition for StayTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("StayTransition")
    }

    fn can_transition(&mut self, _cx: &mut StateContext<'_>) -> bool {
        self.switches.stay.load(Ordering::SeqCst)
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        StateKey("RoamState")
    }
}

/// Agent-wide escape hatch.
struct PanicTransition {
    switches: Switches,
}

impl Transition for PanicTransition {
    fn key(&self) -> TransitionKey {
        TransitionKey("PanicTransition")
    }

    fn can_transition(&mut self, _cx: &mut StateContext<'_>) -> bool {
        self.switches.panic.load(Ordering::SeqCst)
    }

    fn next_state(&self, _cx: &StateContext<'_>) -> StateKey {
        StateKey("PanicState")
    }

    fn on_collision(&mut self, _cx: &mut StateContext<'_>, _collision: &Collision) -> HookResult {
        self.switches.collisions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn registry(switches: &Switches, journal: &Journal) -> Arc<StateRegistry> {
    let (idle_journal, idle_switches) = (journal.clone(), switches.clone());
    let (roam_journal, roam_switches) = (journal.clone(), switches.clone());
    let panic_journal = journal.clone();
    let (roam_t, stay_t, panic_t) = (switches.clone(), switches.clone(), switches.clone());

    let registry = StateRegistry::builder()
        .species(BEAST, move |s| {
            s.initial_state(move || IdleState {
                journal: idle_journal.clone(),
                switches: idle_switches.clone(),
                transitions: TransitionList::new()
                    .with(RoamTransition {
                        switches: idle_switches.clone(),
                    }),
            })
            .state(move || RoamState {
                journal: roam_journal.clone(),
                switches: roam_switches.clone(),
                transitions: TransitionList::new().with(StayTransition {
                    switches: roam_switches.clone(),
                }),
            })
            .state(move || PanicState {
                journal: panic_journal.clone(),
                transitions: TransitionList::new(),
            })
            .transition(move || RoamTransition {
                switches: roam_t.clone(),
            })
            .transition(move || StayTransition {
                switches: stay_t.clone(),
            })
            .global_transition(move || PanicTransition {
                switches: panic_t.clone(),
            })
        })
        .build()
        .expect("fixture registry is valid");
    Arc::new(registry)
}

/// A peer-local driver for agent 1 with its own journal.
pub struct Peer {
    pub driver: Driver,
    pub journal: Journal,
}

impl Peer {
    pub fn new(switches: &Switches, authority: bool) -> Self {
        let journal = Journal::default();
        let mut driver = Driver::new(
            AgentId(1),
            BEAST,
            registry(switches, &journal),
            handles(),
            DriverOptions {
                authority,
                spawn_seed: 77,
                frame_delta: 0.02,
            },
        )
        .unwrap();
        driver.start().unwrap();
        Self { driver, journal }
    }
}

/// Relays everything the authority queued to every peer, in order, until
/// nothing is left.
pub fn pump(authority: &mut Peer, observers: &mut [&mut Peer]) -> Vec<Broadcast> {
    let mut relayed = Vec::new();
    loop {
        let requests = authority.driver.drain_outbox();
        if requests.is_empty() {
            return relayed;
        }
        for request in requests {
            let broadcast = Broadcast::from(request);
            authority.driver.receive(broadcast.clone()).unwrap();
            for observer in observers.iter_mut() {
                observer.driver.receive(broadcast.clone()).unwrap();
            }
            relayed.push(broadcast);
        }
    }
}
