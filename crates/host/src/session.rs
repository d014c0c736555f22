use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use agent_content::{LURKER, LurkerConfig, registry};
use agent_core::{AgentId, EntityId, Point, Pose, SpeciesTag};
use agent_runtime::{
    AgentEvent, AgentSnapshot, Bounds, LifecycleEvent, LocalRelay, Runtime, RuntimeConfig, Topic,
    WorldRegistry, world_handles,
};
use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

const PLAYER: EntityId = EntityId(100);
const LURKER_SPEED: f32 = 3.0;
const PATROL_RADIUS: f32 = 20.0;

/// Session shape, read from the environment.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub duration: Duration,
    pub lurkers: u32,
    /// When set, the first lurker is knocked out this long into the session.
    pub knockout_after: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            lurkers: 1,
            knockout_after: None,
        }
    }
}

impl SessionConfig {
    /// Environment variables:
    /// - `HOST_SESSION_MS` - Session length in milliseconds (default: 5000)
    /// - `HOST_LURKERS` - Lurkers spawned on every peer (default: 1)
    /// - `HOST_KNOCKOUT_MS` - Knock the first lurker out after this long
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = read_env::<u64>("HOST_SESSION_MS") {
            config.duration = Duration::from_millis(ms);
        }
        if let Some(count) = read_env::<u32>("HOST_LURKERS") {
            config.lurkers = count.max(1);
        }
        config.knockout_after = read_env::<u64>("HOST_KNOCKOUT_MS").map(Duration::from_millis);
        config
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

struct Peer {
    name: &'static str,
    runtime: Runtime,
    world: WorldRegistry,
    stepper: JoinHandle<()>,
}

/// What the host prints when the session ends.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub relayed: u64,
    pub peers: BTreeMap<&'static str, Vec<AgentSnapshot>>,
}

pub struct Session {
    config: SessionConfig,
    relay: LocalRelay,
    peers: Vec<Peer>,
}

impl Session {
    /// Builds both peers and spawns every lurker on each of them.
    pub fn start(
        runtime_config: RuntimeConfig,
        config: SessionConfig,
        lurker: &LurkerConfig,
    ) -> Result<Self> {
        let registry = Arc::new(registry(lurker).context("invalid lurker registry")?);
        let relay = LocalRelay::spawn();

        let mut peers = Vec::with_capacity(2);
        for (name, authority) in [("authority", true), ("observer", false)] {
            let world = build_world();
            let mut runtime = Runtime::builder()
                .config(runtime_config.clone())
                .authority(authority)
                .registry(registry.clone())
                .transport(relay.transport())
                .build()?;

            for index in 1..=config.lurkers {
                let agent = AgentId(index);
                let spawn = Point::new(index as f32 * 3.0, 0.0, 0.0);
                world.place_agent(agent, Pose::new(spawn, Point::FORWARD), LURKER_SPEED);
                world.join_group(LURKER.as_str(), agent);
                runtime.spawn_agent(agent, LURKER, world_handles(&world, agent))?;
            }

            let stepper = tokio::spawn(step_world(world.clone(), runtime_config.frame_period));
            peers.push(Peer {
                name,
                runtime,
                world,
                stepper,
            });
        }

        Ok(Self {
            config,
            relay,
            peers,
        })
    }

    /// Lets the session play out, then tears every peer down.
    pub async fn run(self) -> Result<SessionReport> {
        let Self {
            config,
            relay,
            peers,
        } = self;

        let journal = peers
            .first()
            .map(|peer| tokio::spawn(log_lifecycle(peer.name, peer.runtime.subscribe(Topic::Lifecycle))));

        let mut remaining = config.duration;
        if let Some(after) = config.knockout_after.filter(|after| *after < config.duration) {
            time::sleep(after).await;
            remaining -= after;
            knock_out(&peers).await;
        }
        time::sleep(remaining).await;

        let mut report = BTreeMap::new();
        for peer in peers {
            peer.stepper.abort();
            let snapshots = peer.runtime.shutdown().await?;
            info!(peer = peer.name, agents = snapshots.len(), "peer stopped");
            peer.world.clear();
            report.insert(peer.name, snapshots);
        }
        if let Some(journal) = journal {
            journal.abort();
        }

        let relayed = relay.join().await;
        Ok(SessionReport {
            relayed,
            peers: report,
        })
    }
}

async fn knock_out(peers: &[Peer]) {
    let Some(lurker) = peers
        .iter()
        .find(|peer| peer.runtime.is_authority())
        .and_then(|peer| peer.runtime.agent(AgentId(1)))
    else {
        return;
    };
    match lurker.override_state("DeadTemporarilyState").await {
        Ok(()) => info!(agent = %lurker.id(), "knocked out"),
        Err(error) => warn!(agent = %lurker.id(), %error, "knockout refused"),
    }
}

fn build_world() -> WorldRegistry {
    let world = WorldRegistry::new().with_walkable(Bounds::new(
        Point::new(-40.0, 0.0, -40.0),
        Point::new(40.0, 0.0, 40.0),
    ));
    world.track(PLAYER, SpeciesTag("player"), patrol_point(0));
    world
}

/// Where the player walks on frame `frame`: a slow circle around the origin.
fn patrol_point(frame: u64) -> Point {
    let angle = frame as f32 * 0.01;
    Point::new(angle.cos() * PATROL_RADIUS, 0.0, angle.sin() * PATROL_RADIUS)
}

async fn step_world(world: WorldRegistry, period: Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let dt = period.as_secs_f32();
    let mut frame = 0u64;
    loop {
        ticker.tick().await;
        frame += 1;
        world.move_entity(PLAYER, patrol_point(frame));
        world.advance(dt);
    }
}

async fn log_lifecycle(
    peer: &'static str,
    mut events: tokio::sync::broadcast::Receiver<AgentEvent>,
) {
    loop {
        match events.recv().await {
            Ok(AgentEvent::Lifecycle(LifecycleEvent::Entered {
                agent, state, via, ..
            })) => {
                info!(peer, %agent, %state, ?via, "entered");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(peer, skipped, "lifecycle log lagging"),
            Err(RecvError::Closed) => break,
        }
    }
}
