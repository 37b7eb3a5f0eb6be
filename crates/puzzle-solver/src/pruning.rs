//! Shielding rules and legal move generation for the facility search.
//!
//! A microchip left on a floor with a foreign generator and without its own
//! generator is fried. Every state the solver may enter has to pass
//! [`is_consistent`]; everything else is pruned before it reaches the
//! frontier.

use itertools::Itertools;
use smallvec::{smallvec, SmallVec};

use crate::facility::{Direction, Floor, Item, Move, State};

/// Check one floor: either no generator is present, or every microchip on it
/// is connected to its own generator
pub fn floor_is_consistent(state: &State, floor: Floor) -> bool {
    if !state.has_generator_on(floor) {
        return true;
    }
    state
        .pairs
        .iter()
        .filter(|pair| pair.microchip == floor)
        .all(|pair| pair.is_connected())
}

/// Check every floor of the facility
pub fn is_consistent(state: &State, floors: u8) -> bool {
    (0..floors).all(|floor| floor_is_consistent(state, floor))
}

/// Microchips on `floor` that would be fried, for diagnostics
pub fn fried_microchips(state: &State, floor: Floor) -> Vec<Item> {
    if !state.has_generator_on(floor) {
        return Vec::new();
    }
    state
        .pairs
        .iter()
        .enumerate()
        .filter(|(_, pair)| pair.microchip == floor && !pair.is_connected())
        .map(|(element, _)| Item::microchip(element))
        .collect()
}

/// Every load the elevator can take from its floor: all pairs of items, then
/// all single items. An empty elevator does not move.
pub fn candidate_loads(state: &State) -> Vec<SmallVec<[Item; 2]>> {
    let items = state.items_on_floor(state.elevator);
    let pairs = items
        .iter()
        .copied()
        .tuple_combinations()
        .map(|(a, b)| smallvec![a, b]);
    let singles = items.iter().copied().map(|item| smallvec![item]);
    pairs.chain(singles).collect()
}

/// Successor states reachable in one move that keep every floor consistent
pub fn legal_moves(state: &State, floors: u8) -> Vec<(Move, State)> {
    let mut moves = Vec::new();

    for items in candidate_loads(state) {
        for direction in Direction::ALL {
            let Some(to) = direction.step_from(state.elevator, floors) else {
                continue;
            };

            let next = state.with_move(&items, to);
            if !is_consistent(&next, floors) {
                continue;
            }

            moves.push((
                Move {
                    direction,
                    items: items.clone(),
                },
                next,
            ));
        }
    }

    moves
}
