//! NxNxN Twisty Puzzle
//!
//! Plays a Rubik's-style cube of any size in an interactive 3D viewer, or
//! scrambles, solves and checks cubes from the command line.

mod visualization;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rubix::geometry::format_moves;
use rubix::{format_cube, Move, PuzzleError, SequenceStep, Session, SolvePlan};

/// Default quarter-turn animation time in milliseconds.
const DEFAULT_MOVE_DURATION_MS: u64 = 200;
/// Animation time bounds accepted by the viewer.
const MOVE_DURATION_RANGE_MS: (u64, u64) = (50, 1000);

/// Scrambles, solves and displays NxNxN twisty puzzles.
#[derive(Parser)]
#[command(name = "rubix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cube dimension (N for an NxNxN cube).
    #[arg(long, global = true, default_value_t = 3, value_parser = parse_size)]
    size: usize,

    /// Seed for reproducible scrambles.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive 3D viewer.
    Play {
        /// Quarter-turn animation time in milliseconds (50 to 1000).
        #[arg(long, default_value_t = DEFAULT_MOVE_DURATION_MS)]
        move_duration: u64,
    },
    /// Print a scramble and the resulting cube.
    Scramble,
    /// Scramble, then solve by reversing the scramble.
    Solve,
    /// Apply moves such as `Y+2` or `X-0'` to a fresh cube and report whether it is solved.
    Check {
        #[arg(required = true, allow_hyphen_values = true)]
        moves: Vec<Move>,
    },
}

fn parse_size(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(size) if size >= 1 => Ok(size),
        Ok(_) => Err("size must be at least 1".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut rng = make_rng(cli.seed);

    let result = match cli.command {
        Some(Command::Scramble) => scramble_report(cli.size, &mut rng).map(|s| print!("{s}")),
        Some(Command::Solve) => solve_report(cli.size, &mut rng).map(|s| print!("{s}")),
        Some(Command::Check { moves }) => check_report(cli.size, &moves).map(|s| print!("{s}")),
        Some(Command::Play { move_duration }) => run_viewer(cli.size, move_duration, rng),
        None => run_viewer(cli.size, DEFAULT_MOVE_DURATION_MS, rng),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_viewer(size: usize, move_duration: u64, rng: StdRng) -> Result<(), PuzzleError> {
    let (low, high) = MOVE_DURATION_RANGE_MS;
    let move_duration = move_duration.clamp(low, high);
    let session = Session::new(size)?;
    println!(
        "Controls: left-drag a face to turn, right-drag to orbit, X/Y/Z axis, 1-9 layer, Left/Right turn, S scramble, V solve, C stop, R reset, Up/Down size"
    );
    visualization::display(session, move_duration, rng);
    Ok(())
}

/// Scrambles a fresh cube and renders the moves and the resulting net.
fn scramble_report(size: usize, rng: &mut StdRng) -> Result<String, PuzzleError> {
    let mut session = Session::new(size)?;
    session.scramble(rng)?;
    let report = session.run_sequence()?;

    let mut output = format!(
        "Scramble ({} moves): {}\n\n",
        report.applied,
        format_moves(session.scramble_history())
    );
    output.push_str(&format_cube(session.cube()));
    Ok(output)
}

/// Scrambles, reverse-solves, and renders both nets.
fn solve_report(size: usize, rng: &mut StdRng) -> Result<String, PuzzleError> {
    let mut session = Session::new(size)?;
    session.scramble(rng)?;
    session.run_sequence()?;

    let mut output = format!("Scrambled ({} moves):\n", session.scramble_history().len());
    output.push_str(&format_cube(session.cube()));

    match session.solve()? {
        SolvePlan::AlreadySolved => output.push_str("\nAlready solved\n"),
        SolvePlan::Reset => output.push_str("\nReset to a fresh cube\n"),
        SolvePlan::Reverse { moves } => {
            output.push_str(&format!("\nReversing {} moves:\n", moves));
            let mut applied = Vec::with_capacity(moves);
            loop {
                match session.next_sequence_step()? {
                    SequenceStep::Turn(mv) => {
                        session.finish_turn()?;
                        applied.push(mv);
                    }
                    SequenceStep::Finished(_) => break,
                }
            }
            output.push_str(&format_moves(&applied));
            output.push('\n');
        }
    }

    output.push_str(&format_cube(session.cube()));
    output.push_str(&format!("solved: {}\n", session.is_solved()));
    Ok(output)
}

/// Applies `moves` to a fresh cube and renders the result.
fn check_report(size: usize, moves: &[Move]) -> Result<String, PuzzleError> {
    let mut session = Session::new(size)?;
    for &mv in moves {
        session.manual_turn(mv)?;
    }

    let mut output = format!("{}\n", format_moves(moves));
    output.push_str(&format_cube(session.cube()));
    output.push_str(&format!("solved: {}\n", session.is_solved()));
    Ok(output)
}
