//! Bounded breadth-first search for the minimum number of elevator moves.
//!
//! Every move costs one step, so a FIFO frontier reaches the goal along a
//! shortest path. Visited states are deduplicated by their canonical
//! [`StateKey`](crate::facility::StateKey), which treats elements as
//! interchangeable.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::facility::{Facility, Move, State};
use crate::pruning::{is_consistent, legal_moves};

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum time to search
    pub timeout: Duration,
    /// Maximum number of distinct states to discover
    pub max_states: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_states: 5_000_000,
        }
    }
}

/// Result of the solver search
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Minimum number of moves, if the goal was reached
    pub steps: Option<usize>,
    /// Moves taken from the start state to the goal
    pub path: Vec<Move>,
    /// States taken off the frontier
    pub states_explored: usize,
    /// Distinct states ever added to the frontier, including the start
    pub states_discovered: usize,
    /// Largest frontier size seen
    pub max_frontier: usize,
    /// Whether the reachable state space was fully explored
    pub search_exhausted: bool,
    /// Time elapsed in milliseconds
    pub time_elapsed_ms: u64,
}

impl SolverResult {
    pub fn solved(&self) -> bool {
        self.steps.is_some()
    }
}

/// A discovered state and how it was reached
#[derive(Debug, Clone)]
struct SearchNode {
    state: State,
    parent: Option<usize>,
    via: Option<Move>,
    depth: usize,
}

/// Find the minimum number of moves that bring every item to the top floor
/// without frying a microchip on the way.
pub fn find_minimum_moves(facility: &Facility, config: &SolverConfig) -> SolverResult {
    let start_time = Instant::now();
    let deadline = start_time + config.timeout;
    let floors = facility.floors();
    let top = facility.top_floor();

    let mut nodes: Vec<SearchNode> = vec![SearchNode {
        state: facility.start().clone(),
        parent: None,
        via: None,
        depth: 0,
    }];
    let mut seen = HashSet::new();
    seen.insert(facility.start().key());

    let mut frontier: VecDeque<usize> = VecDeque::new();
    frontier.push_back(0);

    let mut states_explored: usize = 0;
    let mut max_frontier: usize = 1;

    let bounded = |nodes: &[SearchNode], states_explored, max_frontier| SolverResult {
        steps: None,
        path: Vec::new(),
        states_explored,
        states_discovered: nodes.len(),
        max_frontier,
        search_exhausted: false,
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    };

    while let Some(index) = frontier.pop_front() {
        if Instant::now() > deadline {
            return bounded(&nodes, states_explored, max_frontier);
        }

        states_explored += 1;

        if nodes[index].state.is_complete(top) {
            let path = path_to(&nodes, index);
            return SolverResult {
                steps: Some(nodes[index].depth),
                path,
                states_explored,
                states_discovered: nodes.len(),
                max_frontier,
                search_exhausted: false,
                time_elapsed_ms: start_time.elapsed().as_millis() as u64,
            };
        }

        let depth = nodes[index].depth;
        for (mv, next) in legal_moves(&nodes[index].state, floors) {
            if !seen.insert(next.key()) {
                continue;
            }

            if nodes.len() >= config.max_states {
                return bounded(&nodes, states_explored, max_frontier);
            }

            nodes.push(SearchNode {
                state: next,
                parent: Some(index),
                via: Some(mv),
                depth: depth + 1,
            });
            frontier.push_back(nodes.len() - 1);
        }

        max_frontier = max_frontier.max(frontier.len());
    }

    // Reachable space exhausted without reaching the goal
    SolverResult {
        steps: None,
        path: Vec::new(),
        states_explored,
        states_discovered: nodes.len(),
        max_frontier,
        search_exhausted: true,
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    }
}

fn path_to(nodes: &[SearchNode], mut index: usize) -> Vec<Move> {
    let mut path = Vec::with_capacity(nodes[index].depth);
    while let Some(parent) = nodes[index].parent {
        if let Some(mv) = &nodes[index].via {
            path.push(mv.clone());
        }
        index = parent;
    }
    path.reverse();
    path
}

/// Replay `path` from the facility's start, returning every state visited
/// (start included).
///
/// Returns `None` if a move is not legal from the state it is applied to:
/// an item is unknown or not on the elevator's floor, the elevator leaves
/// the building, or the resulting state fries a microchip.
pub fn replay_path(facility: &Facility, path: &[Move]) -> Option<Vec<State>> {
    let floors = facility.floors();
    let mut states = vec![facility.start().clone()];

    for mv in path {
        let current = states.last()?;
        if mv.items.is_empty() || mv.items.len() > 2 {
            return None;
        }
        if mv
            .items
            .iter()
            .any(|&item| current.floor_of(item) != Some(current.elevator))
        {
            return None;
        }

        let to = mv.direction.step_from(current.elevator, floors)?;
        let next = current.with_move(&mv.items, to);
        if !is_consistent(&next, floors) {
            return None;
        }
        states.push(next);
    }

    Some(states)
}
