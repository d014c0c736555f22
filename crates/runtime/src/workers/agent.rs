//! Agent worker that owns one [`Driver`].
//!
//! Multiplexes the frame clock, the AI interval clock, inbound broadcasts
//! and host commands in a single `select!` loop, so the driver sees a
//! strictly sequential stream of calls. After every step it ships the
//! driver's outbox through the transport and publishes its diagnostics.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, warn};

use agent_core::{AgentError, EntityId};
use behavior_fsm::Collision;

use crate::api::{Result, RuntimeError};
use crate::driver::{AgentSnapshot, Driver, DriverError};
use crate::events::{EventBus, FaultEvent};
use crate::replication::{Inbound, ReplicationTransport, Request, decode_broadcast};

/// Commands that can be sent to an agent worker
pub enum Command {
    /// Physical contact with another entity.
    Collide { collision: Collision },
    /// Force a state through the replication path.
    OverrideState {
        state: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replace the agent's target (authority only).
    SetTarget {
        entity: Option<EntityId>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Read-only view of the agent.
    Snapshot { reply: oneshot::Sender<AgentSnapshot> },
    /// Tear the agent down and stop the worker.
    Halt { reply: oneshot::Sender<AgentSnapshot> },
}

/// Everything a worker reads from or writes to besides its driver.
pub struct WorkerChannels {
    pub commands: mpsc::Receiver<Command>,
    pub inbound: Inbound,
    pub transport: Arc<dyn ReplicationTransport>,
    pub events: EventBus,
}

/// Background task that drives one agent.
pub struct AgentWorker {
    driver: Driver,
    channels: WorkerChannels,
    frame_period: Duration,
    interval_period: Duration,
}

impl AgentWorker {
    pub fn new(
        driver: Driver,
        channels: WorkerChannels,
        frame_period: Duration,
        interval_period: Duration,
    ) -> Self {
        Self {
            driver,
            channels,
            frame_period,
            interval_period,
        }
    }

    /// Main worker loop. Returns the agent's final snapshot.
    pub async fn run(mut self) -> AgentSnapshot {
        let agent = self.driver.agent();
        if let Err(error) = self.driver.start() {
            self.report(&error);
        }
        self.flush().await;

        let mut frames = time::interval(self.frame_period);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ai = time::interval(self.interval_period);
        ai.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                command = self.channels.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }
                Some(bytes) = self.channels.inbound.recv() => {
                    self.handle_broadcast(&bytes);
                }
                _ = frames.tick() => {
                    if !self.driver.is_halted()
                        && let Err(error) = self.driver.tick()
                    {
                        self.report(&error);
                    }
                }
                _ = ai.tick() => {
                    if !self.driver.is_halted()
                        && let Err(error) = self.driver.interval()
                    {
                        self.report(&error);
                    }
                }
            }
            self.flush().await;
        }

        debug!(target: "runtime::worker", %agent, "agent worker stopped");
        self.driver.snapshot()
    }

    /// Breaks once the worker should stop.
    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Collide { collision } => {
                if let Err(error) = self.driver.collide(collision) {
                    self.report(&error);
                }
            }
            Command::OverrideState { state, reply } => {
                let result = self.driver.override_state(&state).map_err(RuntimeError::from);
                let _ = reply.send(result);
            }
            Command::SetTarget { entity, reply } => {
                let result = self.driver.set_target(entity).map_err(RuntimeError::from);
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.driver.snapshot());
            }
            Command::Halt { reply } => {
                self.driver.halt();
                self.flush().await;
                let _ = reply.send(self.driver.snapshot());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_broadcast(&mut self, bytes: &[u8]) {
        let result = decode_broadcast(bytes)
            .map_err(DriverError::from)
            .and_then(|message| self.driver.receive(message));
        if let Err(error) = result {
            if let DriverError::Registry(_) | DriverError::Replication(_) = &error {
                self.channels.events.publish(FaultEvent::BroadcastRejected {
                    agent: self.driver.agent(),
                    error: error.to_string(),
                });
            }
            self.report(&error);
        }
    }

    /// Sends queued requests and publishes recorded events.
    async fn flush(&mut self) {
        for request in self.driver.drain_outbox() {
            if let Err(error) = self.channels.transport.send(&request).await {
                error!(
                    target: "runtime::worker",
                    agent = %self.driver.agent(),
                    %error,
                    "failed to send replication request"
                );
                // No echo will come back for a request the coordinator never saw.
                if let Request::Transition { name, .. } = &request {
                    self.driver.request_lost(name, &error.to_string());
                }
            }
        }
        for event in self.driver.drain_events() {
            self.channels.events.publish(event);
        }
    }

    fn report(&self, error: &DriverError) {
        let agent = self.driver.agent();
        let severity = error.severity();
        if severity.is_fatal() {
            error!(target: "runtime::worker", %agent, severity = severity.as_str(), %error, "agent failed");
        } else {
            warn!(target: "runtime::worker", %agent, severity = severity.as_str(), %error, "agent step rejected");
        }
    }
}
