use agent_core::SightQuery;
use serde::{Deserialize, Serialize};

use crate::voice::VoiceTable;

/// Tuning for the lurker. Every field has a default, so a TOML file only
/// needs to name what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LurkerConfig {
    /// Whether voice lines are played at all. Sound effects are unaffected.
    pub speaking_enabled: bool,
    /// Query that makes a wandering lurker notice something.
    pub notice_sight: SightQuery,
    /// Query a target must keep satisfying for the lurker to give chase.
    pub chase_sight: SightQuery,
    /// Query that keeps the lurker from losing its target.
    pub lost_sight: SightQuery,
    /// Consecutive ticks the target must stay visible before chasing.
    pub escalate_after_ticks: u32,
    /// Consecutive ticks without sight before giving up on the target.
    pub give_up_after_ticks: u32,
    /// Frames the roar on chase entry lasts.
    pub roar_frames: u32,
    /// Seconds spent playing dead before waking up.
    pub dead_seconds: f32,
    /// Farthest a wander destination is picked from the current position.
    pub wander_radius: f32,
    /// Distance at which a wander destination counts as reached.
    pub arrival_radius: f32,
    pub voice: VoiceTable,
}

impl LurkerConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_NOTICE_SIGHT: SightQuery = SightQuery::new(60.0, 45.0, 15.0);
    pub const DEFAULT_CHASE_SIGHT: SightQuery = SightQuery::new(60.0, 45.0, 10.0);
    pub const DEFAULT_LOST_SIGHT: SightQuery = SightQuery::new(20.0, 45.0, 6.0);
    pub const DEFAULT_ESCALATE_AFTER_TICKS: u32 = 10;
    pub const DEFAULT_GIVE_UP_AFTER_TICKS: u32 = 450;
    pub const DEFAULT_ROAR_FRAMES: u32 = 105;
    pub const DEFAULT_DEAD_SECONDS: f32 = 60.0;
    pub const DEFAULT_WANDER_RADIUS: f32 = 25.0;
    pub const DEFAULT_ARRIVAL_RADIUS: f32 = 1.5;

    pub fn new() -> Self {
        Self {
            speaking_enabled: true,
            notice_sight: Self::DEFAULT_NOTICE_SIGHT,
            chase_sight: Self::DEFAULT_CHASE_SIGHT,
            lost_sight: Self::DEFAULT_LOST_SIGHT,
            escalate_after_ticks: Self::DEFAULT_ESCALATE_AFTER_TICKS,
            give_up_after_ticks: Self::DEFAULT_GIVE_UP_AFTER_TICKS,
            roar_frames: Self::DEFAULT_ROAR_FRAMES,
            dead_seconds: Self::DEFAULT_DEAD_SECONDS,
            wander_radius: Self::DEFAULT_WANDER_RADIUS,
            arrival_radius: Self::DEFAULT_ARRIVAL_RADIUS,
            voice: VoiceTable::default(),
        }
    }
}

impl Default for LurkerConfig {
    fn default() -> Self {
        Self::new()
    }
}
