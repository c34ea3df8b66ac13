//! Layer turn engine: the only code path that mutates a [`Cube`].
//!
//! A turn is split into `begin` and `finish` so a renderer can animate in
//! between. While a turn is outstanding every other `begin` is refused.

use crate::error::{BusyReason, PuzzleError};
use crate::geometry::{rotate_cell, rotate_direction, Direction, Move};
use crate::grid::{coord_to_idx, Cube};
use crate::pieces::{Color, NUM_FACELETS};

/// Result of a completed turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TurnOutcome {
    pub mv: Move,
    /// Number of pieces that moved.
    pub moved: usize,
}

impl Cube {
    /// Rotates one layer a quarter turn, carrying each piece's facelets with it.
    pub(crate) fn rotate_layer(&mut self, mv: Move) -> Result<usize, PuzzleError> {
        let axis = mv.axis.axis();
        let quarter = mv.signed_quarter();
        let layer = mv.layer as i32;
        let size = self.size;

        let selected: Vec<usize> = self
            .pieces
            .iter()
            .enumerate()
            .filter(|(_, piece)| axis.component(piece.position) == layer)
            .map(|(index, _)| index)
            .collect();

        if selected.is_empty() {
            tracing::warn!(%mv, size, "no pieces in layer");
            return Err(PuzzleError::EmptyLayer {
                axis: mv.axis,
                layer: mv.layer,
            });
        }

        // vacate first: a layer turn permutes cells among the selected pieces
        for &index in &selected {
            self.cells[coord_to_idx(size, self.pieces[index].position)] = 0;
        }

        for &index in &selected {
            let piece = &mut self.pieces[index];
            piece.position = rotate_cell(piece.position, size, axis, quarter);

            let mut rotated = [Color::Hidden; NUM_FACELETS];
            for direction in Direction::ALL {
                rotated[rotate_direction(direction, axis, quarter) as usize] =
                    piece.facelets[direction as usize];
            }
            piece.facelets = rotated;

            self.cells[coord_to_idx(size, piece.position)] = index as u32 + 1;
        }

        Ok(selected.len())
    }
}

/// Owns the cube and enforces the single-turn exclusion.
#[derive(Clone, Debug)]
pub struct TurnEngine {
    cube: Cube,
    in_flight: Option<Move>,
}

impl TurnEngine {
    pub fn new(cube: Cube) -> Self {
        Self {
            cube,
            in_flight: None,
        }
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    /// The turn currently being animated, if any.
    pub fn in_flight(&self) -> Option<Move> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Claims the turn slot for `mv`. The cube is not touched until [`finish`](Self::finish).
    pub fn begin(&mut self, mv: Move) -> Result<(), PuzzleError> {
        if self.in_flight.is_some() {
            return Err(PuzzleError::Busy(BusyReason::TurnInFlight));
        }
        if mv.layer >= self.cube.size {
            tracing::warn!(%mv, size = self.cube.size, "layer out of range");
            return Err(PuzzleError::EmptyLayer {
                axis: mv.axis,
                layer: mv.layer,
            });
        }
        self.in_flight = Some(mv);
        Ok(())
    }

    /// Applies the outstanding turn and releases the slot.
    pub fn finish(&mut self) -> Result<TurnOutcome, PuzzleError> {
        let mv = self.in_flight.take().ok_or(PuzzleError::NoTurnInFlight)?;
        let moved = self.cube.rotate_layer(mv)?;
        debug_assert!(self.cube.check_invariants());
        tracing::debug!(%mv, moved, "turn applied");
        Ok(TurnOutcome { mv, moved })
    }

    /// Begins and immediately finishes a turn.
    pub fn apply(&mut self, mv: Move) -> Result<TurnOutcome, PuzzleError> {
        self.begin(mv)?;
        self.finish()
    }

    /// Swaps in a fresh cube. Refused while a turn is outstanding.
    pub fn replace(&mut self, cube: Cube) -> Result<(), PuzzleError> {
        if self.in_flight.is_some() {
            return Err(PuzzleError::Busy(BusyReason::TurnInFlight));
        }
        self.cube = cube;
        Ok(())
    }
}
