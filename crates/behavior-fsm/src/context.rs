use agent_core::{
    AgentHandles, AgentId, Animation, AudioSink, Frame, Navigation, Perception, RandomStream,
    SpeciesTag, TargetReference,
};

use crate::state::StateKey;

/// Everything a hook may see or touch for the duration of one call.
///
/// The driver builds a fresh context for every hook invocation. Borrowed
/// fields are only valid for that call; lifecycle tasks that outlive it
/// clone what they need from [`StateContext::handles`].
pub struct StateContext<'a> {
    agent: AgentId,
    species: SpeciesTag,
    frame: Frame,
    delta: f32,
    authority: bool,
    handles: &'a AgentHandles,
    rng: &'a mut RandomStream,
    target: &'a mut TargetReference,
    override_request: &'a mut Option<StateKey>,
}

impl<'a> StateContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent: AgentId,
        species: SpeciesTag,
        frame: Frame,
        delta: f32,
        authority: bool,
        handles: &'a AgentHandles,
        rng: &'a mut RandomStream,
        target: &'a mut TargetReference,
        override_request: &'a mut Option<StateKey>,
    ) -> Self {
        Self {
            agent,
            species,
            frame,
            delta,
            authority,
            handles,
            rng,
            target,
            override_request,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn species(&self) -> SpeciesTag {
        self.species
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Seconds covered by the current frame.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Whether this peer decides transitions for the agent.
    pub fn is_authority(&self) -> bool {
        self.authority
    }

    /// Collaborators of this agent. The reference outlives the context
    /// borrow, so it can be held across `&mut self` calls.
    pub fn handles(&self) -> &'a AgentHandles {
        self.handles
    }

    pub fn navigation(&self) -> &'a dyn Navigation {
        self.handles.navigation.as_ref()
    }

    pub fn perception(&self) -> &'a dyn Perception {
        self.handles.perception.as_ref()
    }

    pub fn animation(&self) -> &'a dyn Animation {
        self.handles.animation.as_ref()
    }

    pub fn audio(&self) -> &'a dyn AudioSink {
        self.handles.audio.as_ref()
    }

    /// The agent's per-state random stream. Every peer draws the same
    /// sequence as long as hooks draw in the same order.
    pub fn rng(&mut self) -> &mut RandomStream {
        self.rng
    }

    pub fn target(&self) -> &TargetReference {
        self.target
    }

    pub fn target_mut(&mut self) -> &mut TargetReference {
        self.target
    }

    /// Asks the driver to force `state` once the current hook returns.
    ///
    /// Only honoured on the authority, where it goes through the same
    /// replication path and checks as an external override: a request made
    /// while a transition is in flight is rejected, never deferred. A later
    /// request in the same hook replaces an earlier one.
    pub fn request_override(&mut self, state: StateKey) {
        *self.override_request = Some(state);
    }
}
