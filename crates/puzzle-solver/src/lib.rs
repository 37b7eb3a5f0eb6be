//! Puzzle solvers for the radioisotope facility and assembunny programs.
//!
//! This crate provides a bounded breadth-first search for moving generator
//! and microchip pairs up a facility without frying any microchip, and an
//! interpreter for the assembunny register machine in its base and
//! self-modifying (`tgl`) dialects.

pub mod error;
pub mod executor;
pub mod facility;
pub mod program;
pub mod pruning;
pub mod solver;

// Re-export main types
pub use error::{FacilityError, ProgramError};
pub use executor::{
    execute, Dialect, ExecutionMetrics, ExecutionResult, ExecutionStatus, Machine,
};
pub use facility::{Direction, Facility, Floor, Item, ItemKind, Move, Pair, State, StateKey};
pub use program::{Instruction, Opcode, Operand, Program, Register, Registers};
pub use solver::{find_minimum_moves, replay_path, SolverConfig, SolverResult};
