/// Where the driver currently is relative to a transition.
///
/// `Entering` and `Exiting` are the in-flight phases: a lifecycle task is
/// pending and no new transition may start until it completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DriverPhase {
    /// No state has been entered yet, or the agent was halted.
    #[default]
    Idle,
    /// The new state's entry task is running.
    Entering,
    /// A state is active and ticking.
    Active,
    /// The old state's exit task is running.
    Exiting,
}

impl DriverPhase {
    #[inline]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Entering | Self::Exiting)
    }

    #[inline]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}
