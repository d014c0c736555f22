use agent_core::{AgentId, Animation, AudioSink};

/// Animation sink that only logs parameter changes.
#[derive(Debug, Clone, Copy)]
pub struct TracingAnimator {
    agent: AgentId,
}

impl TracingAnimator {
    pub fn new(agent: AgentId) -> Self {
        Self { agent }
    }
}

impl Animation for TracingAnimator {
    fn set_bool(&self, name: &str, value: bool) {
        tracing::trace!(target: "runtime::animation", agent = %self.agent, name, value, "set bool");
    }

    fn set_trigger(&self, name: &str) {
        tracing::trace!(target: "runtime::animation", agent = %self.agent, name, "trigger");
    }
}

/// Audio sink that logs cues instead of playing them.
#[derive(Debug, Clone, Copy)]
pub struct TracingAudio {
    agent: AgentId,
}

impl TracingAudio {
    pub fn new(agent: AgentId) -> Self {
        Self { agent }
    }
}

impl AudioSink for TracingAudio {
    fn play_one_shot(&self, cue: &str) {
        tracing::debug!(target: "runtime::audio", agent = %self.agent, cue, "voice cue");
    }
}
