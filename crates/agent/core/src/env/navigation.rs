use thiserror::Error;

use super::Point;
use crate::error::{AgentError, ErrorSeverity};

/// Outcome of a path query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathStatus {
    /// The destination is reachable.
    Complete,
    /// Only part of the way is reachable; the path's corners end short of it.
    Partial,
    /// No path at all.
    Invalid,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavigationError {
    #[error("no path to destination {destination:?} ({status})")]
    Unreachable {
        destination: Point,
        status: PathStatus,
    },
}

impl AgentError for NavigationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

/// Agent-scoped navigation collaborator.
///
/// The engine never plans paths itself; it asks "go there" and "is there a
/// way" and reacts to the yes/no answers.
pub trait Navigation: Send + Sync {
    /// Starts moving toward `point`. Returns `false` when it is unreachable.
    fn try_set_destination(&self, point: Point) -> bool;

    /// Computes (and keeps) a path to `point` without committing to it.
    fn calculate_path(&self, point: Point) -> PathStatus;

    /// Corners of the most recently calculated path.
    fn path_corners(&self) -> Vec<Point>;

    /// Current position of the agent.
    fn position(&self) -> Point;

    /// Moves toward `point`, or toward the closest reachable corner when
    /// only a partial path exists.
    ///
    /// Returns the point actually chosen as destination.
    fn set_destination_with_fallback(&self, point: Point) -> Result<Point, NavigationError> {
        if self.try_set_destination(point) {
            return Ok(point);
        }

        let status = self.calculate_path(point);
        if status == PathStatus::Partial
            && let Some(corner) = self.path_corners().last().copied()
            && self.try_set_destination(corner)
        {
            return Ok(corner);
        }

        Err(NavigationError::Unreachable {
            destination: point,
            status,
        })
    }
}
