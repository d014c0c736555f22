//! Per-agent state-machine driver.
//!
//! A [`Driver`] owns one agent's active [`BehaviorState`], its global
//! transitions, its random stream and its target slot. It is purely
//! synchronous: the worker calls [`Driver::tick`] once per frame,
//! [`Driver::interval`] on the AI cadence, [`Driver::collide`] on contact and
//! [`Driver::receive`] for every decoded broadcast, then ships whatever the
//! driver queued in its outbox.
//!
//! Transitions are never applied where they are decided. The authority only
//! queues a request; every peer, the authority included, swaps states when
//! the matching broadcast arrives. While a swap is in flight (entry or exit
//! task pending, or the authority waiting for its own echo) nothing new is
//! decided, and broadcasts that arrive are queued and applied in order once
//! the swap completes.

mod error;
mod snapshot;

use std::collections::VecDeque;
use std::sync::Arc;

use agent_core::{
    AgentHandles, AgentId, EntityId, Frame, RandomStream, SpeciesTag, TargetIndex,
    TargetReference,
};
use behavior_fsm::{
    BehaviorState, Collision, DriverPhase, HookError, HookResult, LifecycleTask,
    ResolutionCache, Resolved, StateContext, StateKey, StateRegistry, TransitionKey,
    TransitionList, finished, poll_once,
};
use tracing::{debug, error, trace, warn};

use crate::events::{AgentEvent, FaultEvent, LifecycleEvent, ReplicationEvent};
use crate::replication::{AuthorityReplicator, Broadcast, Request};

pub use error::DriverError;
pub use snapshot::AgentSnapshot;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Mixed into the spawn seed to derive the authority's seed stream.
const SEED_STREAM_SALT: i32 = 0x5eed_1e55;

/// Static parameters of one driver.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub authority: bool,
    /// Seed of the initial random stream.
    pub spawn_seed: i32,
    /// Seconds covered by one frame, exposed to hooks as `delta`.
    pub frame_delta: f32,
}

/// What a call to [`Driver::tick`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No state has been entered yet.
    Idle,
    /// A lifecycle task was polled; no hooks ran.
    InFlight,
    /// The authority is waiting for the echo of its own request.
    AwaitingEcho,
    /// The authority queued a request for this transition or override.
    Requested(&'static str),
    /// The active state's `update` ran.
    Updated,
}

/// Agent-scoped data handed to hooks through [`StateContext`].
struct AgentCore {
    agent: AgentId,
    species: SpeciesTag,
    authority: bool,
    frame: Frame,
    delta: f32,
    handles: AgentHandles,
    rng: RandomStream,
    target: TargetReference,
    override_request: Option<StateKey>,
}

impl AgentCore {
    fn context(&mut self) -> StateContext<'_> {
        StateContext::new(
            self.agent,
            self.species,
            self.frame,
            self.delta,
            self.authority,
            &self.handles,
            &mut self.rng,
            &mut self.target,
            &mut self.override_request,
        )
    }
}

/// A swap decided by a broadcast and waiting on the old state's exit.
#[derive(Debug, Clone, Copy)]
struct Swap {
    next: StateKey,
    seed: i32,
    via: Option<TransitionKey>,
}

pub struct Driver {
    core: AgentCore,
    cache: ResolutionCache,
    globals: TransitionList,
    active: Option<Box<dyn BehaviorState>>,
    phase: DriverPhase,
    task: Option<LifecycleTask>,
    pending: Option<Swap>,
    entering: Option<Swap>,
    inbox: VecDeque<Broadcast>,
    replicator: AuthorityReplicator,
    seeds: RandomStream,
    awaiting_echo: bool,
    halted: bool,
    events: Vec<AgentEvent>,
}

impl Driver {
    /// Creates a driver for `agent`. Nothing is entered until
    /// [`Driver::start`].
    pub fn new(
        agent: AgentId,
        species: SpeciesTag,
        registry: Arc<StateRegistry>,
        handles: AgentHandles,
        options: DriverOptions,
    ) -> Result<Self> {
        let globals = registry.global_transitions(species)?;
        registry.initial_state(species)?;

        Ok(Self {
            core: AgentCore {
                agent,
                species,
                authority: options.authority,
                frame: Frame::ZERO,
                delta: options.frame_delta,
                handles,
                rng: RandomStream::from_seed(options.spawn_seed),
                target: TargetReference::new(),
                override_request: None,
            },
            cache: ResolutionCache::new(registry),
            globals,
            active: None,
            phase: DriverPhase::Idle,
            task: None,
            pending: None,
            entering: None,
            inbox: VecDeque::new(),
            replicator: AuthorityReplicator::new(agent, options.authority),
            seeds: RandomStream::from_seed(options.spawn_seed ^ SEED_STREAM_SALT),
            awaiting_echo: false,
            halted: false,
            events: Vec::new(),
        })
    }

    pub fn agent(&self) -> AgentId {
        self.core.agent
    }

    pub fn species(&self) -> SpeciesTag {
        self.core.species
    }

    pub fn is_authority(&self) -> bool {
        self.core.authority
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn frame(&self) -> Frame {
        self.core.frame
    }

    pub fn active_state(&self) -> Option<StateKey> {
        self.active.as_ref().map(|state| state.key())
    }

    pub fn target(&self) -> Option<EntityId> {
        self.core.target.get()
    }

    pub fn rng(&self) -> &RandomStream {
        &self.core.rng
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// A transition is in flight: entry or exit pending, or an echo awaited.
    pub fn is_busy(&self) -> bool {
        self.phase.is_in_flight() || self.awaiting_echo
    }

    /// Whether contact damage applies right now. An agent without an active
    /// state takes none.
    pub fn accepts_collision_damage(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|state| state.accepts_collision_damage())
    }

    /// Constructs and enters the species' initial state.
    ///
    /// Calling it again after the first entry does nothing.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_running()?;
        if self.active.is_some() || self.phase != DriverPhase::Idle {
            return Ok(());
        }

        let registry = Arc::clone(self.cache.registry());
        let initial = registry.initial_state(self.core.species)?;
        let mut state = self.cache.instantiate_state(initial, self.core.species)?;
        state.attach(&self.core.handles);

        let swap = Swap {
            next: initial,
            seed: self.core.rng.seed(),
            via: None,
        };
        self.begin_entry(state, swap);
        self.drive_task()
    }

    /// Advances one frame.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.ensure_running()?;
        self.core.frame = self.core.frame.next();

        if self.phase.is_in_flight() {
            self.drive_task()?;
            return Ok(TickOutcome::InFlight);
        }
        if self.active.is_none() {
            return Ok(TickOutcome::Idle);
        }
        if self.awaiting_echo {
            return Ok(TickOutcome::AwaitingEcho);
        }

        if self.core.authority {
            if let Some(state) = self.core.override_request.take() {
                match self.check_override(state.as_str()) {
                    Ok(()) => {
                        self.flush_target()?;
                        self.initiate(state.as_str())?;
                        return Ok(TickOutcome::Requested(state.as_str()));
                    }
                    Err(error) => self.reject_override(state, &error),
                }
            } else if let Some(key) = self.evaluate() {
                self.flush_target()?;
                self.initiate(key.as_str())?;
                return Ok(TickOutcome::Requested(key.as_str()));
            }
        } else if let Some(state) = self.core.override_request.take() {
            trace!(
                target: "runtime::driver",
                agent = %self.core.agent,
                %state,
                "observer discards hook override"
            );
        }

        self.run_hook(|state, cx| state.update(cx))?;
        self.flush_target()?;
        self.run_hook(|state, cx| state.late_update(cx))?;
        self.flush_target()?;
        Ok(TickOutcome::Updated)
    }

    /// Runs the active state's interval hook. Suppressed while busy.
    pub fn interval(&mut self) -> Result<bool> {
        self.ensure_running()?;
        if self.is_busy() || self.active.is_none() {
            return Ok(false);
        }
        self.run_hook(|state, cx| state.on_interval(cx))?;
        self.flush_target()?;
        Ok(true)
    }

    /// Dispatches a contact to the active state and every transition.
    ///
    /// Collisions are delivered even while a transition is in flight.
    pub fn collide(&mut self, collision: Collision) -> Result<()> {
        self.ensure_running()?;

        let result = {
            let mut cx = self.core.context();
            let mut result = self.globals.dispatch_collision(&mut cx, &collision);
            if result.is_ok()
                && let Some(state) = self.active.as_mut()
            {
                result = state
                    .on_collision(&mut cx, &collision)
                    .and_then(|()| state.transitions().dispatch_collision(&mut cx, &collision));
            }
            result
        };
        if let Err(source) = result {
            return Err(self.fail(source));
        }
        if self.is_busy() {
            self.drop_override_in_flight();
        }
        self.flush_target()
    }

    /// Forces `state` through the replication path, bypassing predicates.
    pub fn override_state(&mut self, state: &str) -> Result<()> {
        self.ensure_running()?;
        if self.is_busy() {
            return Err(DriverError::TransitionBusy(self.core.agent));
        }
        if !self.core.authority {
            return Err(DriverError::NotAuthority(self.core.agent));
        }
        self.check_override(state)?;

        self.flush_target()?;
        self.initiate(state)
    }

    /// Reports that the last transition request never reached the
    /// coordinator, so no echo is coming. The agent keeps its state and
    /// decides again on the next frame.
    pub fn request_lost(&mut self, name: &str, error: &str) {
        if !self.awaiting_echo || self.halted {
            return;
        }
        self.awaiting_echo = false;
        warn!(
            target: "runtime::driver",
            agent = %self.core.agent,
            name,
            error,
            "transition request lost"
        );
        self.events.push(
            FaultEvent::RequestLost {
                agent: self.core.agent,
                name: name.to_owned(),
                error: error.to_owned(),
            }
            .into(),
        );
    }

    /// Sets the target on the authority and replicates it.
    pub fn set_target(&mut self, entity: Option<EntityId>) -> Result<()> {
        self.ensure_running()?;
        if !self.core.authority {
            return Err(DriverError::NotAuthority(self.core.agent));
        }
        self.core.target.set(entity);
        self.flush_target()
    }

    /// Applies one broadcast addressed to this agent.
    ///
    /// While a transition is in flight the broadcast is queued and applied
    /// once the new state's entry completes. Unknown names are reported and
    /// leave the agent where it is.
    pub fn receive(&mut self, message: Broadcast) -> Result<()> {
        self.ensure_running()?;
        if message.agent() != self.core.agent {
            return Err(DriverError::Misrouted {
                expected: self.core.agent,
                received: message.agent(),
            });
        }

        if self.phase.is_in_flight() {
            self.inbox.push_back(message);
            trace!(
                target: "runtime::driver",
                agent = %self.core.agent,
                queued = self.inbox.len(),
                "broadcast deferred until transition completes"
            );
            self.events.push(
                ReplicationEvent::Deferred {
                    agent: self.core.agent,
                    queued: self.inbox.len(),
                }
                .into(),
            );
            return Ok(());
        }

        self.apply(message)?;
        self.drive_task()
    }

    /// Tears the agent down without running the active state's exit.
    pub fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;
        self.active = None;
        self.task = None;
        self.pending = None;
        self.entering = None;
        self.inbox.clear();
        self.awaiting_echo = false;
        self.phase = DriverPhase::Idle;

        debug!(
            target: "runtime::driver",
            agent = %self.core.agent,
            frame = self.core.frame.0,
            "agent halted"
        );
        self.events.push(
            LifecycleEvent::Halted {
                agent: self.core.agent,
                frame: self.core.frame,
            }
            .into(),
        );
    }

    /// Requests waiting to be sent to the coordinator, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<Request> {
        self.replicator.drain()
    }

    /// Diagnostics recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            agent: self.core.agent,
            species: self.core.species.as_str().to_owned(),
            authority: self.core.authority,
            phase: self.phase.to_string(),
            active: self.active_state().map(|key| key.as_str().to_owned()),
            frame: self.core.frame,
            target: self.core.target.get(),
            seed: self.core.rng.seed(),
            awaiting_echo: self.awaiting_echo,
            queued: self.inbox.len(),
            halted: self.halted,
            accepts_collision_damage: self.accepts_collision_damage(),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.halted {
            Err(DriverError::AgentHalted(self.core.agent))
        } else {
            Ok(())
        }
    }

    /// Globals first, then the active state's own transitions.
    fn evaluate(&mut self) -> Option<TransitionKey> {
        let mut cx = self.core.context();
        if let Some(key) = self.globals.first_firing(&mut cx) {
            return Some(key);
        }
        self.active
            .as_mut()
            .and_then(|state| state.transitions().first_firing(&mut cx))
    }

    /// An override must name a state known to this species.
    fn check_override(&mut self, name: &str) -> Result<()> {
        match self.cache.resolve(name, self.core.species)? {
            Resolved::State(..) => Ok(()),
            Resolved::Transition(key, _) => Err(behavior_fsm::RegistryError::NotAState {
                name: key.as_str(),
            }
            .into()),
        }
    }

    fn reject_override(&mut self, state: StateKey, error: &DriverError) {
        warn!(
            target: "runtime::driver",
            agent = %self.core.agent,
            %state,
            %error,
            "hook override rejected"
        );
        self.events.push(
            FaultEvent::OverrideRejected {
                agent: self.core.agent,
                state: state.as_str().to_owned(),
                error: error.to_string(),
            }
            .into(),
        );
    }

    /// Overrides requested by hooks while a transition is in flight get the
    /// same answer as [`Driver::override_state`] and never carry over into
    /// the next state.
    fn drop_override_in_flight(&mut self) {
        let Some(state) = self.core.override_request.take() else {
            return;
        };
        if self.core.authority {
            let busy = DriverError::TransitionBusy(self.core.agent);
            self.reject_override(state, &busy);
        } else {
            trace!(
                target: "runtime::driver",
                agent = %self.core.agent,
                %state,
                "observer discards hook override"
            );
        }
    }

    fn initiate(&mut self, name: &str) -> Result<()> {
        let seed = self.seeds.next_seed();
        self.replicator.request_transition(name, seed)?;
        self.awaiting_echo = true;

        debug!(
            target: "runtime::driver",
            agent = %self.core.agent,
            name,
            seed,
            "transition requested"
        );
        self.events.push(
            ReplicationEvent::TransitionRequested {
                agent: self.core.agent,
                name: name.to_owned(),
                seed,
            }
            .into(),
        );
        Ok(())
    }

    fn flush_target(&mut self) -> Result<()> {
        if !self.core.authority {
            return Ok(());
        }
        let Some(index) = self.core.target.take_divergence() else {
            return Ok(());
        };
        self.replicator.request_target(index)?;
        self.events.push(
            ReplicationEvent::TargetRequested {
                agent: self.core.agent,
                target: self.core.target.get(),
            }
            .into(),
        );
        Ok(())
    }

    fn run_hook<F>(&mut self, hook: F) -> Result<()>
    where
        F: FnOnce(&mut dyn BehaviorState, &mut StateContext<'_>) -> HookResult,
    {
        let Some(state) = self.active.as_mut() else {
            return Ok(());
        };
        let result = hook(state.as_mut(), &mut self.core.context());
        result.map_err(|source| self.fail(source))
    }

    fn apply(&mut self, message: Broadcast) -> Result<()> {
        match message {
            Broadcast::Target { index, .. } => {
                self.apply_target(index);
                Ok(())
            }
            Broadcast::Transition { name, seed, .. } => self.apply_transition(&name, seed),
        }
    }

    fn apply_target(&mut self, index: TargetIndex) {
        let core = &mut self.core;
        match core.target.apply_replicated(index, core.handles.roster.as_ref()) {
            Ok(target) => self.events.push(
                ReplicationEvent::TargetApplied {
                    agent: self.core.agent,
                    target,
                }
                .into(),
            ),
            Err(error) => {
                warn!(
                    target: "runtime::driver",
                    agent = %self.core.agent,
                    %error,
                    "ignoring replicated target"
                );
                self.events.push(
                    FaultEvent::BroadcastRejected {
                        agent: self.core.agent,
                        error: error.to_string(),
                    }
                    .into(),
                );
            }
        }
    }

    fn apply_transition(&mut self, name: &str, seed: i32) -> Result<()> {
        // Only the authority's own request can come back for this agent.
        self.awaiting_echo = false;

        let species = self.core.species;
        let resolved = self.cache.resolve(name, species).inspect_err(|error| {
            warn!(
                target: "runtime::driver",
                agent = %self.core.agent,
                name,
                %error,
                "cannot resolve replicated transition"
            );
        })?;

        let swap = match resolved {
            Resolved::Transition(key, factory) => {
                let next = factory().next_state(&self.core.context());
                if self.active_state() == Some(next) {
                    debug!(
                        target: "runtime::driver",
                        agent = %self.core.agent,
                        via = %key,
                        state = %next,
                        "transition resolves to the active state"
                    );
                    self.events.push(
                        LifecycleEvent::Unchanged {
                            agent: self.core.agent,
                            transition: key.as_str().to_owned(),
                            state: next.as_str().to_owned(),
                        }
                        .into(),
                    );
                    return Ok(());
                }
                Swap {
                    next,
                    seed,
                    via: Some(key),
                }
            }
            Resolved::State(key, _) => Swap {
                next: key,
                seed,
                via: None,
            },
        };

        if let Resolved::Transition(key, _) = self.cache.resolve(swap.next.as_str(), species)? {
            return Err(behavior_fsm::RegistryError::NotAState {
                name: key.as_str(),
            }
            .into());
        }

        self.begin_exit(swap);
        Ok(())
    }

    fn begin_exit(&mut self, swap: Swap) {
        let task = match self.active.as_mut() {
            Some(state) => state.on_exit(&mut self.core.context()),
            None => finished(),
        };
        self.phase = DriverPhase::Exiting;
        self.pending = Some(swap);
        self.task = Some(task);
        self.drop_override_in_flight();
    }

    fn begin_entry(&mut self, mut state: Box<dyn BehaviorState>, swap: Swap) {
        let task = state.on_enter(&mut self.core.context());
        self.active = Some(state);
        self.phase = DriverPhase::Entering;
        self.entering = Some(swap);
        self.task = Some(task);
        self.drop_override_in_flight();
    }

    /// Polls the in-flight task and follows through every phase that
    /// completes synchronously.
    fn drive_task(&mut self) -> Result<()> {
        loop {
            let Some(task) = self.task.as_mut() else {
                return Ok(());
            };
            match poll_once(task) {
                None => return Ok(()),
                Some(Err(source)) => return Err(self.fail(source)),
                Some(Ok(())) => self.task = None,
            }

            match self.phase {
                DriverPhase::Exiting => self.finish_exit()?,
                DriverPhase::Entering => {
                    self.finish_entry()?;
                    self.drain_inbox()?;
                }
                DriverPhase::Idle | DriverPhase::Active => {}
            }
            self.flush_target()?;
        }
    }

    fn finish_exit(&mut self) -> Result<()> {
        let Some(swap) = self.pending.take() else {
            self.phase = DriverPhase::Active;
            return Ok(());
        };

        if let Some(old) = self.active.take() {
            debug!(
                target: "runtime::driver",
                agent = %self.core.agent,
                state = %old.key(),
                "exit"
            );
            self.events.push(
                LifecycleEvent::Exited {
                    agent: self.core.agent,
                    state: old.key().as_str().to_owned(),
                    frame: self.core.frame,
                }
                .into(),
            );
        }
        if let Some(via) = swap.via {
            debug!(
                target: "runtime::driver",
                agent = %self.core.agent,
                %via,
                "transition"
            );
        }

        let mut state = match self.cache.instantiate_state(swap.next, self.core.species) {
            Ok(state) => state,
            Err(error) => {
                self.halt();
                return Err(error.into());
            }
        };
        self.core.rng = RandomStream::from_seed(swap.seed);
        state.attach(&self.core.handles);
        self.begin_entry(state, swap);
        Ok(())
    }

    fn finish_entry(&mut self) -> Result<()> {
        self.phase = DriverPhase::Active;
        let Some(swap) = self.entering.take() else {
            return Ok(());
        };

        debug!(
            target: "runtime::driver",
            agent = %self.core.agent,
            state = %swap.next,
            seed = swap.seed,
            "enter"
        );
        self.events.push(
            LifecycleEvent::Entered {
                agent: self.core.agent,
                state: swap.next.as_str().to_owned(),
                via: swap.via.map(|key| key.as_str().to_owned()),
                seed: swap.seed,
                frame: self.core.frame,
            }
            .into(),
        );
        Ok(())
    }

    /// Applies queued broadcasts until one starts a new transition.
    fn drain_inbox(&mut self) -> Result<()> {
        while !self.phase.is_in_flight() {
            let Some(message) = self.inbox.pop_front() else {
                break;
            };
            match self.apply(message) {
                Ok(()) => {}
                Err(DriverError::Registry(error)) => {
                    self.events.push(
                        FaultEvent::BroadcastRejected {
                            agent: self.core.agent,
                            error: error.to_string(),
                        }
                        .into(),
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Halts the agent after a hook failure and builds the error to surface.
    fn fail(&mut self, source: HookError) -> DriverError {
        let state = self.active_state();
        error!(
            target: "runtime::driver",
            agent = %self.core.agent,
            state = ?state,
            error = %source,
            "hook failed, halting agent"
        );
        self.events.push(
            FaultEvent::HookFailed {
                agent: self.core.agent,
                state: state.map(|key| key.as_str().to_owned()),
                error: source.to_string(),
            }
            .into(),
        );
        self.halt();
        DriverError::Hook { state, source }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("agent", &self.core.agent)
            .field("species", &self.core.species)
            .field("phase", &self.phase)
            .field("active", &self.active_state())
            .field("queued", &self.inbox.len())
            .finish_non_exhaustive()
    }
}
