//! Error types for the puzzle core.

use thiserror::Error;

use crate::geometry::Direction;

/// Why a turn or sequence request was refused.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusyReason {
    /// A single layer turn is still outstanding.
    TurnInFlight,
    /// A scripted sequence (scramble or reverse solve) holds the cube.
    SequenceRunning,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("unsupported cube size {size}")]
    InvalidSize { size: usize },

    #[error("puzzle is busy: {0:?}")]
    Busy(BusyReason),

    #[error("no pieces in layer {layer} along {axis:?}")]
    EmptyLayer { axis: Direction, layer: usize },

    #[error("no sequence is running")]
    NoSequence,

    #[error("no turn is in flight")]
    NoTurnInFlight,
}

/// Reasons a drag gesture produced no move.
///
/// Every variant means "take no action"; none of them change state.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GestureRejection {
    #[error("drag shorter than the minimum distance")]
    DragTooShort,

    #[error("rotation axis is too close to zero")]
    DegenerateAxis,

    #[error("rotation axis does not snap to a single cardinal axis")]
    AmbiguousAxis,

    #[error("drag has no component along either face direction")]
    NoTurnDirection,

    #[error("clicked piece lies outside the cube")]
    OutsideCube,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid move notation: {0:?}")]
pub struct ParseMoveError(pub String);
