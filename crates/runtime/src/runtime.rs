//! High-level runtime orchestrator for one peer.
//!
//! The runtime owns one worker per agent, wires each to the replication
//! transport and the event bus, and exposes a builder-based API for hosts.

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use agent_core::{AgentHandles, AgentId, SpeciesTag, spawn_seed};
use behavior_fsm::StateRegistry;

use crate::api::{AgentHandle, Result, RuntimeError};
use crate::driver::{AgentSnapshot, Driver, DriverOptions};
use crate::events::{AgentEvent, EventBus, Topic};
use crate::replication::ReplicationTransport;
use crate::workers::{AgentWorker, WorkerChannels};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Period of the per-frame `update` tick.
    pub frame_period: Duration,
    /// Period of the slower `on_interval` tick.
    pub interval_period: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Session-wide seed; each agent's initial stream is derived from it.
    pub map_seed: i32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_period: Duration::from_millis(20),
            interval_period: Duration::from_millis(200),
            event_buffer_size: 256,
            command_buffer_size: 32,
            map_seed: 0,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `AGENT_FRAME_MS` - Frame tick period in milliseconds (default: 20)
    /// - `AGENT_INTERVAL_MS` - AI interval period in milliseconds (default: 200)
    /// - `AGENT_EVENT_BUFFER` - Per-topic event capacity (default: 256)
    /// - `AGENT_COMMAND_BUFFER` - Per-agent command queue size (default: 32)
    /// - `AGENT_MAP_SEED` - Session seed (default: 0)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("AGENT_FRAME_MS") {
            config.frame_period = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("AGENT_INTERVAL_MS") {
            config.interval_period = Duration::from_millis(ms.max(1));
        }
        if let Some(capacity) = read_env::<usize>("AGENT_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("AGENT_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(seed) = read_env::<i32>("AGENT_MAP_SEED") {
            config.map_seed = seed;
        }

        config
    }

    /// Seconds covered by one frame.
    pub fn frame_delta(&self) -> f32 {
        self.frame_period.as_secs_f32()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

struct RunningAgent {
    handle: AgentHandle,
    worker: JoinHandle<AgentSnapshot>,
}

/// One peer's set of running agents.
///
/// Design: Runtime owns workers and coordinates spawning and teardown.
/// [`AgentHandle`] provides a cloneable façade per agent.
pub struct Runtime {
    config: RuntimeConfig,
    authority: bool,
    registry: Arc<StateRegistry>,
    transport: Arc<dyn ReplicationTransport>,
    events: EventBus,
    agents: BTreeMap<AgentId, RunningAgent>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Whether this peer owns transition decisions for its agents.
    pub fn is_authority(&self) -> bool {
        self.authority
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe(topic)
    }

    /// Starts a worker for `agent` and enters its initial state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_agent(
        &mut self,
        agent: AgentId,
        species: SpeciesTag,
        handles: AgentHandles,
    ) -> Result<AgentHandle> {
        if self.agents.contains_key(&agent) {
            return Err(RuntimeError::DuplicateAgent(agent));
        }

        let driver = Driver::new(
            agent,
            species,
            Arc::clone(&self.registry),
            handles,
            DriverOptions {
                authority: self.authority,
                spawn_seed: spawn_seed(self.config.map_seed, agent),
                frame_delta: self.config.frame_delta(),
            },
        )?;
        let inbound = self.transport.subscribe(agent)?;
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);

        let worker = AgentWorker::new(
            driver,
            WorkerChannels {
                commands: command_rx,
                inbound,
                transport: Arc::clone(&self.transport),
                events: self.events.clone(),
            },
            self.config.frame_period,
            self.config.interval_period,
        );
        let worker = tokio::spawn(worker.run());

        info!(
            target: "runtime::worker",
            %agent,
            %species,
            authority = self.authority,
            "agent spawned"
        );

        let handle = AgentHandle::new(agent, command_tx, self.events.clone());
        self.agents.insert(
            agent,
            RunningAgent {
                handle: handle.clone(),
                worker,
            },
        );
        Ok(handle)
    }

    pub fn agent(&self, agent: AgentId) -> Option<AgentHandle> {
        self.agents.get(&agent).map(|running| running.handle.clone())
    }

    pub fn agents(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Destroys one agent and waits for its worker.
    pub async fn despawn(&mut self, agent: AgentId) -> Result<AgentSnapshot> {
        let running = self
            .agents
            .remove(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;
        stop(running).await
    }

    /// Destroys every agent. Returns final snapshots in agent order.
    pub async fn shutdown(mut self) -> Result<Vec<AgentSnapshot>> {
        let mut snapshots = Vec::with_capacity(self.agents.len());
        for (_, running) in std::mem::take(&mut self.agents) {
            snapshots.push(stop(running).await?);
        }
        Ok(snapshots)
    }
}

async fn stop(running: RunningAgent) -> Result<AgentSnapshot> {
    // A worker that already exited reports its snapshot through the join.
    let _ = running.handle.halt().await;
    drop(running.handle);
    running.worker.await.map_err(RuntimeError::WorkerJoin)
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    authority: bool,
    registry: Option<Arc<StateRegistry>>,
    transport: Option<Arc<dyn ReplicationTransport>>,
    events: Option<EventBus>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            authority: true,
            registry: None,
            transport: None,
            events: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether this peer decides transitions (default: true)
    pub fn authority(mut self, authority: bool) -> Self {
        self.authority = authority;
        self
    }

    /// Set required state registry
    pub fn registry(mut self, registry: Arc<StateRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set required replication transport
    pub fn transport(mut self, transport: impl ReplicationTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<Runtime> {
        let registry = self.registry.ok_or(RuntimeError::MissingRegistry)?;
        let transport = self.transport.ok_or(RuntimeError::MissingTransport)?;
        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));

        Ok(Runtime {
            config: self.config,
            authority: self.authority,
            registry,
            transport,
            events,
            agents: BTreeMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_registry() {
        let err = Runtime::builder().build().err().unwrap();
        assert!(matches!(err, RuntimeError::MissingRegistry));
    }

    #[test]
    fn frame_delta_follows_period() {
        let config = RuntimeConfig {
            frame_period: Duration::from_millis(50),
            ..RuntimeConfig::default()
        };
        assert!((config.frame_delta() - 0.05).abs() < 1e-6);
    }
}
