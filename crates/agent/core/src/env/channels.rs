//! Write-only side channels: animation parameters and voice cues.
//!
//! Both are fire-and-forget and keyed by names the content layer enumerates.

/// Animation parameter sink.
pub trait Animation: Send + Sync {
    fn set_bool(&self, name: &str, value: bool);
    fn set_trigger(&self, name: &str);
}

/// One-shot audio cue sink.
pub trait AudioSink: Send + Sync {
    fn play_one_shot(&self, cue: &str);
}

/// Sink that discards everything; used by peers that render nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Animation for Silent {
    fn set_bool(&self, _name: &str, _value: bool) {}
    fn set_trigger(&self, _name: &str) {}
}

impl AudioSink for Silent {
    fn play_one_shot(&self, _cue: &str) {}
}
