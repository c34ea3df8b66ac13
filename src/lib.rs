//! NxNxN Twisty Puzzle Library
//!
//! Provides the logical core of a Rubik's-style cube of any size: the cube
//! state, quarter-turn layer transforms, solve detection, drag-to-move
//! resolution, and a session that scrambles and solves by reversal.
//!
//! Rendering is left to callers; the [`grid::CubeSnapshot`] read-out carries
//! everything a renderer needs.

pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod pieces;
pub mod resolver;
pub mod session;
pub mod solver;

pub use engine::{TurnEngine, TurnOutcome};
pub use error::{BusyReason, GestureRejection, ParseMoveError, PuzzleError};
pub use geometry::{Axis, Direction, Move, Turn};
pub use grid::{format_cube, Cube, CubeSnapshot};
pub use pieces::{Color, Coord, Piece};
pub use session::{
    FinishedTurn, ManualOutcome, SequenceKind, SequenceOutcome, SequenceReport, SequenceStep,
    Session, SolvePlan, SolveReward, StopHandle,
};
pub use solver::is_solved;
