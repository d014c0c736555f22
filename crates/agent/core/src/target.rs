//! Replicated "who am I focused on" slot.
//!
//! A [`TargetReference`] keeps two copies of the focus: the value observed by
//! local logic and a shadow of the value last put on the wire. The authority
//! compares the two after running agent logic; when they diverge it emits a
//! single [`TargetIndex`] and updates the shadow, so writing the same value
//! twice in a row produces one message. Receiving a replicated index
//! overwrites both copies on every peer.

use thiserror::Error;

use crate::env::EntityRoster;
use crate::error::{AgentError, ErrorSeverity};
use crate::ids::EntityId;

/// Compact wire form of a target: the entity's stable index, or `-1` for none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetIndex(pub i32);

impl TargetIndex {
    /// Sentinel meaning "clear the target".
    pub const NONE: Self = Self(-1);

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl From<Option<EntityId>> for TargetIndex {
    fn from(entity: Option<EntityId>) -> Self {
        match entity {
            Some(EntityId(id)) => Self(id as i32),
            None => Self::NONE,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("operation requires a target but none is set")]
    Missing,

    #[error("replicated target index {0} does not name a tracked entity")]
    UnknownEntity(i32),
}

impl AgentError for TargetError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Missing => ErrorSeverity::Recoverable,
            Self::UnknownEntity(_) => ErrorSeverity::Validation,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetReference {
    observed: Option<EntityId>,
    replicated: Option<EntityId>,
}

impl TargetReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently observed target.
    pub fn get(&self) -> Option<EntityId> {
        self.observed
    }

    /// Observed target, or [`TargetError::Missing`] when unset.
    pub fn require(&self) -> Result<EntityId, TargetError> {
        self.observed.ok_or(TargetError::Missing)
    }

    /// Writes the locally observed target. Replication happens on the next
    /// [`TargetReference::take_divergence`] call made by the authority.
    pub fn set(&mut self, entity: Option<EntityId>) {
        self.observed = entity;
    }

    pub fn clear(&mut self) {
        self.observed = None;
    }

    /// Value last sent or received over the wire.
    pub fn replicated(&self) -> Option<EntityId> {
        self.replicated
    }

    pub fn is_dirty(&self) -> bool {
        self.observed != self.replicated
    }

    /// Returns the index to replicate when the observed value diverged from
    /// the shadow, and marks it as sent.
    pub fn take_divergence(&mut self) -> Option<TargetIndex> {
        if !self.is_dirty() {
            return None;
        }
        self.replicated = self.observed;
        Some(TargetIndex::from(self.observed))
    }

    /// Applies a replicated index on any peer, overwriting both copies.
    ///
    /// An index that does not resolve through `roster` leaves the reference
    /// unchanged.
    pub fn apply_replicated(
        &mut self,
        index: TargetIndex,
        roster: &dyn EntityRoster,
    ) -> Result<Option<EntityId>, TargetError> {
        if index.is_none() {
            self.observed = None;
            self.replicated = None;
            return Ok(None);
        }

        let entity = EntityId(index.0 as u32);
        if !roster.contains(entity) {
            return Err(TargetError::UnknownEntity(index.0));
        }

        self.observed = Some(entity);
        self.replicated = Some(entity);
        Ok(Some(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Point;

    struct Roster(Vec<EntityId>);

    impl EntityRoster for Roster {
        fn contains(&self, entity: EntityId) -> bool {
            self.0.contains(&entity)
        }

        fn position(&self, _entity: EntityId) -> Option<Point> {
            None
        }
    }

    #[test]
    fn same_value_twice_diverges_once() {
        let mut target = TargetReference::new();

        target.set(Some(EntityId(2)));
        assert_eq!(target.take_divergence(), Some(TargetIndex(2)));

        target.set(Some(EntityId(2)));
        assert_eq!(target.take_divergence(), None);
    }

    #[test]
    fn clearing_replicates_sentinel() {
        let mut target = TargetReference::new();
        target.set(Some(EntityId(1)));
        target.take_divergence();

        target.clear();
        assert_eq!(target.take_divergence(), Some(TargetIndex::NONE));
    }

    #[test]
    fn replicated_index_overwrites_both_copies() {
        let roster = Roster(vec![EntityId(4)]);
        let mut target = TargetReference::new();

        let applied = target.apply_replicated(TargetIndex(4), &roster).unwrap();

        assert_eq!(applied, Some(EntityId(4)));
        assert_eq!(target.get(), Some(EntityId(4)));
        assert!(!target.is_dirty());
    }

    #[test]
    fn unknown_index_is_rejected_without_change() {
        let roster = Roster(vec![]);
        let mut target = TargetReference::new();
        target.set(Some(EntityId(1)));

        let err = target.apply_replicated(TargetIndex(9), &roster).unwrap_err();

        assert_eq!(err, TargetError::UnknownEntity(9));
        assert_eq!(target.get(), Some(EntityId(1)));
    }

    #[test]
    fn require_reports_missing_target() {
        let target = TargetReference::new();
        assert_eq!(target.require(), Err(TargetError::Missing));
        assert!(TargetError::Missing.severity().is_recoverable());
    }
}
