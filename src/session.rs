//! Puzzle session: manual turns, scrambles and solve-by-reversal.
//!
//! A session owns the cube (through its [`TurnEngine`]), the scramble history
//! and the dirty flag. Two exclusions guard it: the engine's single in-flight
//! turn, and the sequence-busy state held for the whole of a scramble or
//! reverse solve. Cancellation is cooperative and only observed between turns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::engine::{TurnEngine, TurnOutcome};
use crate::error::{BusyReason, PuzzleError};
use crate::geometry::{Direction, Move, Turn};
use crate::grid::{Cube, CubeSnapshot};
use crate::solver::is_solved;

/// Scramble length is `size * SCRAMBLE_MOVES_PER_DIMENSION`.
pub const SCRAMBLE_MOVES_PER_DIMENSION: usize = 10;

/// Redraws allowed when a scramble candidate repeats the previous axis and layer.
pub const SCRAMBLE_RETRY_LIMIT: usize = 20;

/// Coins paid out for a manual solve.
pub const SOLVE_REWARD_COINS: u32 = 100;

/// Shared cancellation flag for the running sequence.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SequenceKind {
    Scramble,
    Solve,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SequenceOutcome {
    Completed,
    Cancelled,
}

/// Reward signal for the bookkeeping collaborator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SolveReward {
    pub coins: u32,
}

/// Result of a manual turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ManualOutcome {
    pub turn: TurnOutcome,
    pub solved: bool,
    pub reward: Option<SolveReward>,
}

/// A turn that just finished, tagged by who started it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FinishedTurn {
    Manual(ManualOutcome),
    Sequence(TurnOutcome),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SequenceReport {
    pub kind: SequenceKind,
    pub outcome: SequenceOutcome,
    pub applied: usize,
    pub total: usize,
    pub solved: bool,
}

/// What a sequence step did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SequenceStep {
    /// A turn was started; call [`Session::finish_turn`] when it is done animating.
    Turn(Move),
    /// The sequence ended and the busy state was released.
    Finished(SequenceReport),
}

/// How a solve request will be carried out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolvePlan {
    AlreadySolved,
    /// A reverse sequence of this many turns was started.
    Reverse { moves: usize },
    /// No exact reversal was available; the cube was reinitialized.
    Reset,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TurnOrigin {
    Manual,
    Sequence,
}

#[derive(Clone, Debug)]
struct ActiveSequence {
    kind: SequenceKind,
    moves: Vec<Move>,
    /// Index of the next move to start.
    next: usize,
    applied: usize,
}

/// Generates `size * SCRAMBLE_MOVES_PER_DIMENSION` random turns.
///
/// Axes are drawn from the three positive axes; a candidate that repeats the
/// previous move's axis and layer is redrawn up to [`SCRAMBLE_RETRY_LIMIT`] times.
pub fn generate_scramble(size: usize, rng: &mut impl Rng) -> Vec<Move> {
    const AXES: [Direction; 3] = [Direction::PosX, Direction::PosY, Direction::PosZ];

    let count = size * SCRAMBLE_MOVES_PER_DIMENSION;
    let mut moves: Vec<Move> = Vec::with_capacity(count);

    for _ in 0..count {
        let previous = moves.last().copied();
        let mut attempts = 0;
        let mv = loop {
            let candidate = Move::new(
                AXES[rng.gen_range(0..AXES.len())],
                rng.gen_range(0..size),
                Turn::from_positive(rng.gen_bool(0.5)),
            );
            attempts += 1;
            let repeats = previous
                .is_some_and(|last| last.axis == candidate.axis && last.layer == candidate.layer);
            if !repeats || attempts >= SCRAMBLE_RETRY_LIMIT {
                break candidate;
            }
        };
        moves.push(mv);
    }

    moves
}

/// Process-wide puzzle state.
#[derive(Debug)]
pub struct Session {
    engine: TurnEngine,
    scramble_history: Vec<Move>,
    /// Set by manual turns; invalidates reversal and enables the solve reward.
    dirty: bool,
    sequence: Option<ActiveSequence>,
    origin: Option<TurnOrigin>,
    stop: StopHandle,
    revision: u64,
}

impl Session {
    pub fn new(size: usize) -> Result<Self, PuzzleError> {
        let cube = Cube::new(size)?;
        tracing::info!(size, "session created");
        Ok(Self {
            engine: TurnEngine::new(cube),
            scramble_history: Vec::new(),
            dirty: false,
            sequence: None,
            origin: None,
            stop: StopHandle::default(),
            revision: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.engine.cube().size()
    }

    pub fn cube(&self) -> &Cube {
        self.engine.cube()
    }

    pub fn scramble_history(&self) -> &[Move] {
        &self.scramble_history
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_solved(&self) -> bool {
        is_solved(self.engine.cube())
    }

    pub fn is_sequence_running(&self) -> bool {
        self.sequence.is_some()
    }

    /// Kind and progress (`applied`, `total`) of the running sequence.
    pub fn sequence_progress(&self) -> Option<(SequenceKind, usize, usize)> {
        self.sequence
            .as_ref()
            .map(|sequence| (sequence.kind, sequence.applied, sequence.moves.len()))
    }

    /// Bumped after every applied turn and every reinitialization.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> CubeSnapshot {
        self.engine.cube().snapshot(self.revision)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Asks the running sequence to stop before its next turn.
    ///
    /// Returns false when no sequence is running or a stop is already pending.
    pub fn request_stop(&mut self) -> bool {
        if self.sequence.is_none() || self.stop.is_requested() {
            return false;
        }
        tracing::info!("stop requested");
        self.stop.request();
        true
    }

    fn ensure_idle(&self) -> Result<(), PuzzleError> {
        if self.sequence.is_some() {
            return Err(PuzzleError::Busy(BusyReason::SequenceRunning));
        }
        if self.engine.is_busy() {
            return Err(PuzzleError::Busy(BusyReason::TurnInFlight));
        }
        Ok(())
    }

    /// Replaces the cube with a solved one of `size` and clears all history.
    pub fn set_size(&mut self, size: usize) -> Result<(), PuzzleError> {
        self.ensure_idle()?;
        let cube = Cube::new(size)?;
        self.engine.replace(cube)?;
        self.scramble_history.clear();
        self.dirty = false;
        self.revision += 1;
        tracing::info!(size, "cube reinitialized");
        Ok(())
    }

    /// Reinitializes the cube at its current size.
    pub fn reset(&mut self) -> Result<(), PuzzleError> {
        self.set_size(self.size())
    }

    /// Starts a manual turn; finish it with [`finish_turn`](Self::finish_turn).
    pub fn begin_manual_turn(&mut self, mv: Move) -> Result<(), PuzzleError> {
        self.ensure_idle()?;
        self.engine.begin(mv)?;
        self.origin = Some(TurnOrigin::Manual);
        Ok(())
    }

    /// Applies a manual turn without an animation pause.
    pub fn manual_turn(&mut self, mv: Move) -> Result<ManualOutcome, PuzzleError> {
        self.ensure_idle()?;
        let turn = self.engine.apply(mv)?;
        self.revision += 1;
        Ok(self.after_manual_turn(turn))
    }

    /// Completes the turn in flight, whether manual or part of a sequence.
    pub fn finish_turn(&mut self) -> Result<FinishedTurn, PuzzleError> {
        let origin = self.origin.take().ok_or(PuzzleError::NoTurnInFlight)?;
        let result = self.engine.finish();

        match origin {
            TurnOrigin::Manual => {
                let turn = result?;
                self.revision += 1;
                Ok(FinishedTurn::Manual(self.after_manual_turn(turn)))
            }
            TurnOrigin::Sequence => {
                if let Some(sequence) = self.sequence.as_mut() {
                    sequence.next += 1;
                    if result.is_ok() {
                        sequence.applied += 1;
                    }
                }
                let turn = result?;
                self.revision += 1;
                Ok(FinishedTurn::Sequence(turn))
            }
        }
    }

    fn after_manual_turn(&mut self, turn: TurnOutcome) -> ManualOutcome {
        if !self.scramble_history.is_empty() {
            tracing::info!(
                discarded = self.scramble_history.len(),
                "manual turn discards scramble history"
            );
            self.scramble_history.clear();
        }
        self.dirty = true;

        let solved = self.is_solved();
        let reward = if solved && self.dirty {
            tracing::info!(coins = SOLVE_REWARD_COINS, "manual solve");
            self.dirty = false;
            Some(SolveReward {
                coins: SOLVE_REWARD_COINS,
            })
        } else {
            None
        };

        ManualOutcome {
            turn,
            solved,
            reward,
        }
    }

    /// Generates a scramble, records it for reversal and starts it as a sequence.
    ///
    /// Returns the number of turns queued. The new scramble replaces any
    /// earlier history, so a reverse solve undoes only the latest scramble.
    pub fn scramble(&mut self, rng: &mut impl Rng) -> Result<usize, PuzzleError> {
        self.ensure_idle()?;
        let moves = generate_scramble(self.size(), rng);
        self.scramble_history = moves.clone();
        self.dirty = false;
        tracing::info!(size = self.size(), moves = moves.len(), "scrambling");
        Ok(self.start_sequence(SequenceKind::Scramble, moves))
    }

    /// Decides how to solve and starts doing it.
    ///
    /// Reverses the scramble history when no manual turn has invalidated it,
    /// otherwise falls back to reinitializing the cube.
    pub fn solve(&mut self) -> Result<SolvePlan, PuzzleError> {
        self.ensure_idle()?;

        if self.is_solved() {
            tracing::info!("solve requested on a solved cube");
            return Ok(SolvePlan::AlreadySolved);
        }

        if !self.scramble_history.is_empty() && !self.dirty {
            let moves: Vec<Move> = self
                .scramble_history
                .drain(..)
                .rev()
                .map(Move::inverse)
                .collect();
            tracing::info!(moves = moves.len(), "solving by reversing scramble");
            let queued = self.start_sequence(SequenceKind::Solve, moves);
            return Ok(SolvePlan::Reverse { moves: queued });
        }

        tracing::info!(size = self.size(), "no reversible history, resetting");
        self.reset()?;
        Ok(SolvePlan::Reset)
    }

    fn start_sequence(&mut self, kind: SequenceKind, moves: Vec<Move>) -> usize {
        let total = moves.len();
        self.stop.clear();
        self.sequence = Some(ActiveSequence {
            kind,
            moves,
            next: 0,
            applied: 0,
        });
        total
    }

    /// Advances the running sequence by one step.
    ///
    /// The stop flag is checked here, between turns, never during one.
    pub fn next_sequence_step(&mut self) -> Result<SequenceStep, PuzzleError> {
        if self.engine.is_busy() {
            return Err(PuzzleError::Busy(BusyReason::TurnInFlight));
        }

        loop {
            let sequence = self.sequence.as_mut().ok_or(PuzzleError::NoSequence)?;

            let next = sequence.moves.get(sequence.next).copied();
            let outcome = match next {
                _ if self.stop.is_requested() => SequenceOutcome::Cancelled,
                Some(mv) => {
                    match self.engine.begin(mv) {
                        Ok(()) => {
                            self.origin = Some(TurnOrigin::Sequence);
                            return Ok(SequenceStep::Turn(mv));
                        }
                        Err(PuzzleError::EmptyLayer { .. }) => {
                            // logged by the engine; nothing to animate
                            sequence.next += 1;
                            continue;
                        }
                        Err(error) => return Err(error),
                    }
                }
                None => SequenceOutcome::Completed,
            };

            if let Some(sequence) = self.sequence.take() {
                return Ok(SequenceStep::Finished(self.end_sequence(sequence, outcome)));
            }
        }
    }

    /// Runs the active sequence to completion or cancellation without pauses.
    pub fn run_sequence(&mut self) -> Result<SequenceReport, PuzzleError> {
        loop {
            match self.next_sequence_step()? {
                SequenceStep::Turn(_) => {
                    self.finish_turn()?;
                }
                SequenceStep::Finished(report) => return Ok(report),
            }
        }
    }

    fn end_sequence(
        &mut self,
        sequence: ActiveSequence,
        outcome: SequenceOutcome,
    ) -> SequenceReport {
        self.stop.clear();

        if outcome == SequenceOutcome::Cancelled {
            let unapplied = &sequence.moves[sequence.next..];
            match sequence.kind {
                SequenceKind::Scramble => {
                    // keep only the prefix that actually happened
                    let keep = self.scramble_history.len().saturating_sub(unapplied.len());
                    self.scramble_history.truncate(keep);
                }
                SequenceKind::Solve => {
                    // whatever was not undone yet is still undoable
                    self.scramble_history = unapplied.iter().rev().map(|mv| mv.inverse()).collect();
                }
            }
        }

        let solved = self.is_solved();
        if solved {
            self.dirty = false;
            self.scramble_history.clear();
        }

        let report = SequenceReport {
            kind: sequence.kind,
            outcome,
            applied: sequence.applied,
            total: sequence.moves.len(),
            solved,
        };
        tracing::info!(
            kind = ?report.kind,
            outcome = ?report.outcome,
            applied = report.applied,
            total = report.total,
            solved,
            "sequence finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn scrambled(size: usize, seed: u64) -> Session {
        let mut session = Session::new(size).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        session.scramble(&mut rng).unwrap();
        session.run_sequence().unwrap();
        session
    }

    #[test]
    fn test_scramble_length_and_history() {
        let session = scrambled(3, 1);
        assert_eq!(session.scramble_history().len(), 30);
        assert!(!session.is_dirty());
        assert!(!session.is_sequence_running());
        assert_eq!(session.revision(), 30);
    }

    #[test]
    fn test_scramble_never_repeats_axis_and_layer() {
        for size in 1..=5 {
            for seed in 0..10 {
                let mut rng = StdRng::seed_from_u64(seed);
                let moves = generate_scramble(size, &mut rng);
                assert_eq!(moves.len(), size * SCRAMBLE_MOVES_PER_DIMENSION);
                for pair in moves.windows(2) {
                    assert!(
                        pair[0].axis != pair[1].axis || pair[0].layer != pair[1].layer,
                        "size {size}, seed {seed}: {} then {}",
                        pair[0],
                        pair[1]
                    );
                }
                assert!(moves.iter().all(|mv| mv.axis.is_positive() && mv.layer < size));
            }
        }
    }

    #[test]
    fn test_reverse_solve_returns_to_solved() {
        for size in 1..=5 {
            for seed in 0..4 {
                let mut session = scrambled(size, seed);
                let expected = session.scramble_history().len();
                let plan = session.solve().unwrap();
                if size == 1 {
                    assert_eq!(plan, SolvePlan::AlreadySolved);
                    continue;
                }
                assert_eq!(plan, SolvePlan::Reverse { moves: expected });
                let report = session.run_sequence().unwrap();
                assert_eq!(report.outcome, SequenceOutcome::Completed);
                assert_eq!(report.applied, expected);
                assert!(report.solved, "size {size}, seed {seed}");
                assert_eq!(session.cube(), &Cube::new(size).unwrap());
                assert!(session.scramble_history().is_empty());
            }
        }
    }

    #[test]
    fn test_manual_turn_forces_reset_fallback() {
        let mut session = scrambled(3, 9);
        let outcome = session
            .manual_turn(Move::new(Direction::PosX, 0, Turn::Positive))
            .unwrap();
        assert!(session.scramble_history().is_empty());
        assert!(session.is_dirty() || outcome.solved);

        assert_eq!(session.solve().unwrap(), SolvePlan::Reset);
        assert!(session.is_solved());
        assert!(!session.is_dirty());
        assert!(!session.is_sequence_running());
    }

    #[test]
    fn test_manual_solve_pays_reward_once() {
        let mut session = Session::new(3).unwrap();
        let mv = Move::new(Direction::PosZ, 2, Turn::Negative);

        let first = session.manual_turn(mv).unwrap();
        assert!(!first.solved);
        assert_eq!(first.reward, None);
        assert!(session.is_dirty());

        let second = session.manual_turn(mv.inverse()).unwrap();
        assert!(second.solved);
        assert_eq!(
            second.reward,
            Some(SolveReward {
                coins: SOLVE_REWARD_COINS
            })
        );
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_manual_turn_is_rejected_while_busy() {
        let mut session = Session::new(3).unwrap();
        let mv = Move::new(Direction::PosY, 1, Turn::Positive);

        session.begin_manual_turn(mv).unwrap();
        assert_eq!(
            session.manual_turn(mv),
            Err(PuzzleError::Busy(BusyReason::TurnInFlight))
        );
        assert!(matches!(session.finish_turn(), Ok(FinishedTurn::Manual(_))));

        let mut rng = StdRng::seed_from_u64(5);
        session.scramble(&mut rng).unwrap();
        assert_eq!(
            session.manual_turn(mv),
            Err(PuzzleError::Busy(BusyReason::SequenceRunning))
        );
        assert_eq!(
            session.scramble(&mut rng),
            Err(PuzzleError::Busy(BusyReason::SequenceRunning))
        );
        assert_eq!(
            session.set_size(4),
            Err(PuzzleError::Busy(BusyReason::SequenceRunning))
        );
        assert_eq!(
            session.solve(),
            Err(PuzzleError::Busy(BusyReason::SequenceRunning))
        );

        // a sequence turn holds the single-turn slot too
        assert!(matches!(
            session.next_sequence_step(),
            Ok(SequenceStep::Turn(_))
        ));
        assert_eq!(
            session.next_sequence_step(),
            Err(PuzzleError::Busy(BusyReason::TurnInFlight))
        );
        assert!(matches!(
            session.finish_turn(),
            Ok(FinishedTurn::Sequence(_))
        ));
    }

    #[test]
    fn test_cancelled_scramble_keeps_applied_prefix() {
        let mut session = Session::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        session.scramble(&mut rng).unwrap();

        for _ in 0..5 {
            assert!(matches!(
                session.next_sequence_step().unwrap(),
                SequenceStep::Turn(_)
            ));
            session.finish_turn().unwrap();
        }
        assert!(session.request_stop());
        assert!(!session.request_stop(), "stop is already pending");

        let SequenceStep::Finished(report) = session.next_sequence_step().unwrap() else {
            panic!("sequence should stop at the move boundary");
        };
        assert_eq!(report.outcome, SequenceOutcome::Cancelled);
        assert_eq!(report.applied, 5);
        assert_eq!(report.total, 30);
        assert!(!session.is_sequence_running());

        // stop flag is re-armed after the sequence ends
        assert!(!session.stop_handle().is_requested());

        if !report.solved {
            assert_eq!(session.scramble_history().len(), 5);
            assert_eq!(session.solve().unwrap(), SolvePlan::Reverse { moves: 5 });
            assert!(session.run_sequence().unwrap().solved);
        }
        assert!(session.is_solved());
    }

    #[test]
    fn test_cancelled_reverse_solve_stays_reversible() {
        let mut session = scrambled(4, 21);
        let total = session.scramble_history().len();
        session.solve().unwrap();

        for _ in 0..10 {
            session.next_sequence_step().unwrap();
            session.finish_turn().unwrap();
        }
        // a stop requested through a cloned handle is seen at the next boundary
        session.stop_handle().request();
        let SequenceStep::Finished(report) = session.next_sequence_step().unwrap() else {
            panic!("sequence should stop at the move boundary");
        };
        assert_eq!(report.kind, SequenceKind::Solve);
        assert_eq!(report.outcome, SequenceOutcome::Cancelled);

        if !report.solved {
            assert_eq!(session.scramble_history().len(), total - 10);
            assert_eq!(
                session.solve().unwrap(),
                SolvePlan::Reverse { moves: total - 10 }
            );
            assert!(session.run_sequence().unwrap().solved);
        }
        assert_eq!(session.cube(), &Cube::new(4).unwrap());
    }

    #[test]
    fn test_request_stop_without_sequence_is_ignored() {
        let mut session = Session::new(2).unwrap();
        assert!(!session.request_stop());
        assert_eq!(session.next_sequence_step(), Err(PuzzleError::NoSequence));
        assert_eq!(session.finish_turn(), Err(PuzzleError::NoTurnInFlight));
    }

    #[test]
    fn test_set_size_rebuilds_session() {
        let mut session = scrambled(3, 2);
        let revision = session.revision();
        session.set_size(2).unwrap();
        assert_eq!(session.size(), 2);
        assert!(session.is_solved());
        assert!(session.scramble_history().is_empty());
        assert_eq!(session.revision(), revision + 1);
        assert_eq!(session.snapshot().pieces.len(), 8);
        assert_eq!(
            session.set_size(0),
            Err(PuzzleError::InvalidSize { size: 0 })
        );
        assert_eq!(session.size(), 2);
    }

    #[test]
    fn test_solve_on_fresh_cube_is_noop() {
        let mut session = Session::new(3).unwrap();
        assert_eq!(session.solve().unwrap(), SolvePlan::AlreadySolved);
        assert!(!session.is_sequence_running());
    }

    #[test]
    fn test_second_scramble_replaces_history() {
        let mut session = scrambled(3, 30);
        let after_first = session.cube().clone();

        session.scramble(&mut StdRng::seed_from_u64(31)).unwrap();
        session.run_sequence().unwrap();
        let expected = generate_scramble(3, &mut StdRng::seed_from_u64(31));
        assert_eq!(session.scramble_history(), expected.as_slice());

        assert_eq!(session.solve().unwrap(), SolvePlan::Reverse { moves: 30 });
        session.run_sequence().unwrap();
        assert_eq!(session.cube(), &after_first);
    }

    #[test]
    fn test_empty_layer_in_sequence_is_skipped() {
        let mut session = Session::new(3).unwrap();
        let valid = Move::new(Direction::PosY, 0, Turn::Positive);
        session.start_sequence(
            SequenceKind::Scramble,
            vec![Move::new(Direction::PosX, 5, Turn::Positive), valid],
        );

        assert_eq!(session.next_sequence_step(), Ok(SequenceStep::Turn(valid)));
        session.finish_turn().unwrap();
        let SequenceStep::Finished(report) = session.next_sequence_step().unwrap() else {
            panic!("sequence should be exhausted");
        };
        assert_eq!(report.outcome, SequenceOutcome::Completed);
        assert_eq!(report.applied, 1);
        assert_eq!(report.total, 2);
        assert_eq!(session.revision(), 1);
    }
}
