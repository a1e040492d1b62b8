use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use crossfill::puzzle::Puzzle;
use crossfill::render;
use crossfill::solver::{SolveStatus, Solver};
use crossfill::word_list::WordList;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Crossfill crossword grid filler
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Cli {
    /// Path to the grid structure file ('_' marks an open cell)
    structure: String,

    /// Path to the word list file (one word per line, '#' starts a comment)
    words: String,

    /// Also write the rendered solution grid to this file
    #[arg(short, long)]
    output: Option<String>,

    /// Wall-clock budget for the search, in seconds
    #[arg(short = 't', long)]
    time_budget: Option<u64>,
}

/// Entry point of the crossfill CLI.
///
/// Delegates to [`try_main`], catching any errors and printing them
/// in a user-friendly way before exiting with code 1.
fn main() -> ExitCode {
    // Set up logging
    let debug_enabled = std::env::var("CROSSFILL_DEBUG").is_ok();
    crossfill::logging::init_logger(debug_enabled);

    log::info!("Starting crossfill");

    if let Err(e) = try_main() {
        // Print the error message to stderr, with detailed formatting where available
        if let Some(puzzle_err) = e.downcast_ref::<crossfill::errors::PuzzleError>() {
            eprintln!("Error: {}", puzzle_err.display_detailed());
        } else if let Some(solver_err) = e.downcast_ref::<crossfill::solver::SolverError>() {
            eprintln!("Error: {}", solver_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        // Exit explicitly with a nonzero code so scripts can detect failure
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Core application logic for the crossfill CLI.
///
/// Steps:
/// 1. Parse CLI arguments with Clap.
/// 2. Load the structure and the word list from disk.
/// 3. Solve the fill, honoring the optional time budget.
/// 4. Print the solved grid (or the failure outcome) on stdout.
/// 5. Print performance metrics (timings, counts) on stderr.
///
/// Returns `Ok(())` on success or an error (e.g., an unreadable structure
/// file) which bubbles up to [`main`]. An unfillable grid is *not* an error:
/// it prints "No solution." and exits successfully, like any other final
/// answer.
fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // 1. Load the structure and the word list from disk
    let t_load = Instant::now();
    let puzzle = Puzzle::load_from_path(&cli.structure)?;
    let word_list = WordList::load_from_path(&cli.words)?;
    let load_secs = t_load.elapsed().as_secs_f64();

    // 2. Solve the fill
    let mut solver = Solver::new(&puzzle, &word_list);

    let t_solve = Instant::now();
    let result = solver.solve_with_budget(cli.time_budget.map(Duration::from_secs))?;
    let solve_secs = t_solve.elapsed().as_secs_f64();

    // 3. Report the outcome on stdout
    match (&result.assignment, result.status) {
        (Some(assignment), _) => {
            print!("{}", render::render_text(&puzzle, assignment));
            if let Some(output) = &cli.output {
                render::save_text(&puzzle, assignment, output)?;
                eprintln!("Saved solution to {output}");
            }
        }
        (None, SolveStatus::TimedOut { elapsed }) => {
            println!("No solution found within {:.1}s.", elapsed.as_secs_f64());
        }
        (None, _) => {
            println!("No solution.");
        }
    }

    // 4. Print diagnostics (slot/word counts, timings, search effort) to stderr
    let stats = result.stats;
    eprintln!(
        "Loaded {} slots and {} words in {:.3}s; searched {} nodes ({} dead ends, {} revisions) in {:.3}s.",
        puzzle.variables().len(),
        word_list.words.len(),
        load_secs,
        stats.nodes,
        stats.dead_ends,
        stats.revisions,
        solve_secs
    );

    Ok(())
}
