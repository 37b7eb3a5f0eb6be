//! CLI entry point for the puzzle solvers.
//!
//! Usage:
//!   puzzle-solver facility <input.txt> [options]
//!   puzzle-solver registers <input.txt> [options]
//!   puzzle-solver toggle --stdin [options]
//!
//! Each subcommand prints a JSON report with the part one and part two
//! answers on stdout. With `--verbose`, a human-readable trace goes to
//! stderr.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use puzzle_solver::{
    execute, find_minimum_moves, replay_path, Dialect, ExecutionMetrics, ExecutionResult,
    ExecutionStatus, Facility, Program, Register, Registers, SolverConfig, SolverResult,
};

#[derive(Parser)]
#[command(name = "puzzle-solver")]
#[command(about = "Facility elevator search and assembunny interpreters")]
#[command(version)]
struct Cli {
    /// Print the move path or execution metrics on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Path to the puzzle input (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read puzzle input from stdin instead of a file
    #[arg(long)]
    stdin: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Minimum elevator moves to bring every item to the top floor
    Facility {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum search time in seconds, per part
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Maximum distinct states to discover, per part
        #[arg(long, default_value = "5000000")]
        max_states: usize,

        /// Elements added as generator/microchip pairs on the ground floor for part two
        #[arg(long, value_delimiter = ',', default_value = "elerium,dilithium")]
        extra_elements: Vec<String>,
    },

    /// Run an assembunny program with the base instruction set
    Registers {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum instructions executed per part (unbounded by default)
        #[arg(long)]
        max_steps: Option<u64>,

        /// Initial value of register c for part one
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        part_one_c: i64,

        /// Initial value of register c for part two
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        part_two_c: i64,
    },

    /// Run a self-modifying assembunny program (with tgl)
    Toggle {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum instructions executed per part (unbounded by default)
        #[arg(long)]
        max_steps: Option<u64>,

        /// Initial value of register a for part one
        #[arg(long, default_value = "7", allow_negative_numbers = true)]
        part_one_a: i64,

        /// Initial value of register a for part two
        #[arg(long, default_value = "12", allow_negative_numbers = true)]
        part_two_a: i64,
    },
}

/// Output format for both parts of a puzzle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<T: Serialize> {
    puzzle: &'static str,
    part_one: Option<i64>,
    part_two: Option<i64>,
    details: PartDetails<T>,
    time_elapsed_ms: u64,
}

impl<T: Serialize> Report<T> {
    fn solved(&self) -> bool {
        self.part_one.is_some() && self.part_two.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartDetails<T: Serialize> {
    part_one: T,
    part_two: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput {
    elements: Vec<String>,
    steps: Option<usize>,
    path: Vec<String>,
    states_explored: usize,
    states_discovered: usize,
    max_frontier: usize,
    search_exhausted: bool,
    time_elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionOutput {
    status: ExecutionStatus,
    initial_registers: Registers,
    final_registers: Registers,
    metrics: ExecutionMetrics,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether both parts produced an answer
fn run(cli: Cli) -> Result<bool> {
    let start_time = Instant::now();
    let verbose = cli.verbose;

    match cli.command {
        Commands::Facility {
            input,
            timeout,
            max_states,
            extra_elements,
        } => {
            let text = read_input(&input)?;
            let facility = Facility::parse(&text).context("Failed to parse facility")?;
            let extended = facility
                .with_extra_elements(&extra_elements, 0)
                .context("Failed to add part two elements")?;

            let config = SolverConfig {
                timeout: Duration::from_secs(timeout),
                max_states,
            };

            let report = search_report(&facility, &extended, &config, verbose, start_time);
            emit(&report)
        }

        Commands::Registers {
            input,
            max_steps,
            part_one_c,
            part_two_c,
        } => {
            let program = read_program(&input)?;
            let first = Registers::default().with(Register::C, part_one_c);
            let second = Registers::default().with(Register::C, part_two_c);
            let report = run_program(
                "registers",
                &program,
                Dialect::Base,
                [first, second],
                max_steps,
                verbose,
                start_time,
            )?;
            emit(&report)
        }

        Commands::Toggle {
            input,
            max_steps,
            part_one_a,
            part_two_a,
        } => {
            let program = read_program(&input)?;
            let first = Registers::default().with(Register::A, part_one_a);
            let second = Registers::default().with(Register::A, part_two_a);
            let report = run_program(
                "toggle",
                &program,
                Dialect::SelfModifying,
                [first, second],
                max_steps,
                verbose,
                start_time,
            )?;
            emit(&report)
        }
    }
}

fn read_input(input: &InputArgs) -> Result<String> {
    if input.stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = &input.file {
        fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
    } else {
        bail!("Must provide either a file path or --stdin");
    }
}

fn read_program(input: &InputArgs) -> Result<Program> {
    let text = read_input(input)?;
    Program::parse(&text).context("Failed to parse program")
}

fn search_report(
    facility: &Facility,
    extended: &Facility,
    config: &SolverConfig,
    verbose: bool,
    start_time: Instant,
) -> Report<SearchOutput> {
    let part_one = find_minimum_moves(facility, config);
    let part_two = find_minimum_moves(extended, config);

    if verbose {
        trace_search("part one", facility, &part_one);
        trace_search("part two", extended, &part_two);
    }

    Report {
        puzzle: "facility",
        part_one: part_one.steps.and_then(|s| i64::try_from(s).ok()),
        part_two: part_two.steps.and_then(|s| i64::try_from(s).ok()),
        details: PartDetails {
            part_one: format_search(facility, &part_one),
            part_two: format_search(extended, &part_two),
        },
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    }
}

fn run_program(
    puzzle: &'static str,
    program: &Program,
    dialect: Dialect,
    initial: [Registers; 2],
    max_steps: Option<u64>,
    verbose: bool,
    start_time: Instant,
) -> Result<Report<ExecutionOutput>> {
    let [first, second] = initial;
    let part_one = execute(program, dialect, first, max_steps)?;
    let part_two = execute(program, dialect, second, max_steps)?;

    if verbose {
        trace_execution("part one", &part_one);
        trace_execution("part two", &part_two);
    }

    Ok(Report {
        puzzle,
        part_one: part_one.halted().then_some(part_one.registers.a),
        part_two: part_two.halted().then_some(part_two.registers.a),
        details: PartDetails {
            part_one: format_execution(first, &part_one),
            part_two: format_execution(second, &part_two),
        },
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    })
}

/// Print the report, returning whether both parts produced an answer
fn emit<T: Serialize>(report: &Report<T>) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(report.solved())
}

fn format_search(facility: &Facility, result: &SolverResult) -> SearchOutput {
    SearchOutput {
        elements: facility.elements().to_vec(),
        steps: result.steps,
        path: result
            .path
            .iter()
            .map(|mv| facility.describe_move(mv))
            .collect(),
        states_explored: result.states_explored,
        states_discovered: result.states_discovered,
        max_frontier: result.max_frontier,
        search_exhausted: result.search_exhausted,
        time_elapsed_ms: result.time_elapsed_ms,
    }
}

fn format_execution(initial: Registers, result: &ExecutionResult) -> ExecutionOutput {
    ExecutionOutput {
        status: result.status,
        initial_registers: initial,
        final_registers: result.registers,
        metrics: result.metrics.clone(),
    }
}

fn trace_search(label: &str, facility: &Facility, result: &SolverResult) {
    if !result.solved() {
        if result.search_exhausted {
            eprintln!("{label}: no solution, search space exhausted");
        } else {
            eprintln!(
                "{label}: search stopped after {} states in {} ms",
                result.states_discovered, result.time_elapsed_ms
            );
        }
        return;
    }

    eprintln!(
        "{label}: {} moves ({} states explored, {} discovered)",
        result.path.len(),
        result.states_explored,
        result.states_discovered
    );

    let Some(states) = replay_path(facility, &result.path) else {
        eprintln!("{label}: path does not replay");
        return;
    };
    eprintln!("start:\n{}", facility.render(&states[0]));
    for (index, (mv, state)) in result.path.iter().zip(&states[1..]).enumerate() {
        eprintln!(
            "move {}: {}\n{}",
            index + 1,
            facility.describe_move(mv),
            facility.render(state)
        );
    }
}

fn trace_execution(label: &str, result: &ExecutionResult) {
    let metrics = &result.metrics;
    eprintln!(
        "{label}: {:?} after {} steps, a={} b={} c={} d={} (jumps {}, toggles {}, toggles out of range {}, skipped {})",
        result.status,
        metrics.steps,
        result.registers.a,
        result.registers.b,
        result.registers.c,
        result.registers.d,
        metrics.jumps_taken,
        metrics.toggles_applied,
        metrics.toggles_out_of_range,
        metrics.invalid_skipped,
    );
}
