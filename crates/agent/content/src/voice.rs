//! Voice lines and the per-species engage table.

use std::collections::BTreeMap;
use std::sync::Arc;

use agent_core::{AudioSink, SpeciesTag};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// Fixed lines the lurker speaks on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum VoiceLine {
    #[strum(serialize = "voice.useless")]
    ChasingForSomeTime,
    #[strum(serialize = "voice.cowards")]
    LostTarget,
    #[strum(serialize = "voice.full_rant")]
    Revival,
}

impl VoiceLine {
    pub fn cue(self) -> &'static str {
        self.into()
    }
}

/// Cue spoken when engaging a target, keyed by the target's species name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceTable {
    pub engage: BTreeMap<String, String>,
    /// Used when the species has no entry. `None` means stay silent.
    pub engage_fallback: Option<String>,
}

impl VoiceTable {
    pub fn engage_cue(&self, species: Option<SpeciesTag>) -> Option<&str> {
        species
            .and_then(|tag| self.engage.get(tag.as_str()))
            .or(self.engage_fallback.as_ref())
            .map(String::as_str)
    }
}

impl Default for VoiceTable {
    fn default() -> Self {
        let engage = [
            ("baboon_hawk", "voice.bothersome"),
            ("forest_giant", "voice.abomination"),
            ("eyeless_dog", "voice.disgrace"),
            ("player", "voice.pathetic"),
        ]
        .into_iter()
        .map(|(species, cue)| (species.to_owned(), cue.to_owned()))
        .collect();

        Self {
            engage,
            engage_fallback: Some("voice.worms".to_owned()),
        }
    }
}

/// Speaks lines through an [`AudioSink`] when speaking is enabled.
#[derive(Clone, Debug)]
pub struct Voice {
    enabled: bool,
    table: Arc<VoiceTable>,
}

impl Voice {
    pub fn new(enabled: bool, table: VoiceTable) -> Self {
        Self {
            enabled,
            table: Arc::new(table),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn say(&self, audio: &dyn AudioSink, line: VoiceLine) {
        if self.enabled {
            audio.play_one_shot(line.cue());
        }
    }

    /// Speaks the engage line for a target of `species`, if there is one.
    pub fn engage(&self, audio: &dyn AudioSink, species: Option<SpeciesTag>) {
        if !self.enabled {
            return;
        }
        if let Some(cue) = self.table.engage_cue(species) {
            audio.play_one_shot(cue);
        }
    }
}
