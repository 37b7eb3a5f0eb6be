//! Facility representation for the generator/microchip elevator puzzle.
//!
//! A facility is a stack of floors holding one generator and one microchip
//! per element, plus an elevator. Positions live in [`State`], which is what
//! the solver clones and explores; element names and the floor count stay in
//! [`Facility`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::FacilityError;

/// Floor index, 0 is the ground floor
pub type Floor = u8;

/// Per-element floor assignments, inline for typical puzzle sizes
pub type Pairs = SmallVec<[Pair; 8]>;

/// Kind of item carried by the elevator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Generator,
    Microchip,
}

impl ItemKind {
    pub fn other(self) -> ItemKind {
        match self {
            ItemKind::Generator => ItemKind::Microchip,
            ItemKind::Microchip => ItemKind::Generator,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Generator => write!(f, "generator"),
            ItemKind::Microchip => write!(f, "microchip"),
        }
    }
}

/// A single generator or microchip, identified by its element index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub element: usize,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(element: usize, kind: ItemKind) -> Self {
        Self { element, kind }
    }

    pub fn generator(element: usize) -> Self {
        Self::new(element, ItemKind::Generator)
    }

    pub fn microchip(element: usize) -> Self {
        Self::new(element, ItemKind::Microchip)
    }
}

/// Floors holding one element's generator and microchip.
///
/// Field order matters: the derived `Ord` sorts by generator floor first,
/// which is what [`State::key`] relies on for a stable canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub generator: Floor,
    pub microchip: Floor,
}

impl Pair {
    pub fn new(generator: Floor, microchip: Floor) -> Self {
        Self {
            generator,
            microchip,
        }
    }

    pub fn floor_of(&self, kind: ItemKind) -> Floor {
        match kind {
            ItemKind::Generator => self.generator,
            ItemKind::Microchip => self.microchip,
        }
    }

    pub fn set_floor(&mut self, kind: ItemKind, floor: Floor) {
        match kind {
            ItemKind::Generator => self.generator = floor,
            ItemKind::Microchip => self.microchip = floor,
        }
    }

    /// Microchip is powered by its own generator
    pub fn is_connected(&self) -> bool {
        self.generator == self.microchip
    }
}

/// Elevator travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Up, Direction::Down];

    /// Floor reached from `floor`, or `None` past either end of the building
    pub fn step_from(self, floor: Floor, floors: u8) -> Option<Floor> {
        match self {
            Direction::Up => floor.checked_add(1).filter(|&next| next < floors),
            Direction::Down => floor.checked_sub(1),
        }
    }
}

/// One elevator trip carrying one or two items
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub direction: Direction,
    pub items: SmallVec<[Item; 2]>,
}

/// Canonical form of a [`State`] used for visited-set deduplication.
///
/// Elements are interchangeable, so the pairs are sorted: two states that
/// differ only by a permutation of elements share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    elevator: Floor,
    pairs: Pairs,
}

/// Positions of the elevator and every item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub elevator: Floor,
    pub pairs: Pairs,
}

impl State {
    pub fn new(elevator: Floor, pairs: Pairs) -> Self {
        Self { elevator, pairs }
    }

    pub fn key(&self) -> StateKey {
        let mut pairs = self.pairs.clone();
        pairs.sort_unstable();
        StateKey {
            elevator: self.elevator,
            pairs,
        }
    }

    /// Floor holding `item`, or `None` for an element this state does not track
    pub fn floor_of(&self, item: Item) -> Option<Floor> {
        self.pairs.get(item.element).map(|pair| pair.floor_of(item.kind))
    }

    /// Items on a floor, generators and microchips interleaved by element
    pub fn items_on_floor(&self, floor: Floor) -> SmallVec<[Item; 16]> {
        let mut items = SmallVec::new();
        for (element, pair) in self.pairs.iter().enumerate() {
            if pair.generator == floor {
                items.push(Item::generator(element));
            }
            if pair.microchip == floor {
                items.push(Item::microchip(element));
            }
        }
        items
    }

    pub fn has_generator_on(&self, floor: Floor) -> bool {
        self.pairs.iter().any(|pair| pair.generator == floor)
    }

    /// Everything is on `top`; the elevator position does not matter
    pub fn is_complete(&self, top: Floor) -> bool {
        self.pairs
            .iter()
            .all(|pair| pair.generator == top && pair.microchip == top)
    }

    /// Clone with the elevator and `items` moved to `to`.
    ///
    /// Every item must belong to an element of this state.
    pub fn with_move(&self, items: &[Item], to: Floor) -> Self {
        let mut next = self.clone();
        next.elevator = to;
        for item in items {
            next.pairs[item.element].set_floor(item.kind, to);
        }
        next
    }
}

/// A parsed facility: element names, floor count and starting positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    elements: Vec<String>,
    floors: u8,
    start: State,
}

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?<element>[a-z]+)(?<kind> generator|-compatible microchip)")
            .expect("item pattern is a valid regex")
    })
}

impl Facility {
    /// Build a facility from element names and a start state, checking that
    /// every element has a pair and every position lies inside the building.
    pub fn new(elements: Vec<String>, floors: u8, start: State) -> Result<Self, FacilityError> {
        if floors == 0 {
            return Err(FacilityError::NoFloors);
        }
        if elements.len() != start.pairs.len() {
            return Err(FacilityError::ElementCountMismatch {
                elements: elements.len(),
                pairs: start.pairs.len(),
            });
        }
        let highest = start
            .pairs
            .iter()
            .flat_map(|pair| [pair.generator, pair.microchip])
            .chain(std::iter::once(start.elevator))
            .max()
            .unwrap_or(0);
        if highest >= floors {
            return Err(FacilityError::FloorOutOfRange {
                floor: highest,
                floors,
            });
        }

        Ok(Self {
            elements,
            floors,
            start,
        })
    }

    /// Parse one line per floor, ground floor first. The elevator starts on
    /// the ground floor.
    pub fn parse(input: &str) -> Result<Self, FacilityError> {
        let lines: Vec<&str> = input.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return Err(FacilityError::NoFloors);
        }
        let floors =
            u8::try_from(lines.len()).map_err(|_| FacilityError::TooManyFloors(lines.len()))?;

        let mut elements: Vec<String> = Vec::new();
        let mut placements: Vec<(Option<Floor>, Option<Floor>)> = Vec::new();

        for (floor, line) in lines.iter().enumerate() {
            let floor = floor as Floor;
            for capture in item_pattern().captures_iter(line) {
                let name = &capture["element"];
                let kind = if capture["kind"].ends_with("generator") {
                    ItemKind::Generator
                } else {
                    ItemKind::Microchip
                };

                let element = match elements.iter().position(|e| e == name) {
                    Some(index) => index,
                    None => {
                        elements.push(name.to_string());
                        placements.push((None, None));
                        elements.len() - 1
                    }
                };

                let slot = match kind {
                    ItemKind::Generator => &mut placements[element].0,
                    ItemKind::Microchip => &mut placements[element].1,
                };
                if slot.is_some() {
                    return Err(FacilityError::DuplicateItem {
                        element: name.to_string(),
                        kind,
                        line: floor as usize + 1,
                    });
                }
                *slot = Some(floor);
            }
        }

        let mut pairs = Pairs::with_capacity(elements.len());
        for (name, placement) in elements.iter().zip(&placements) {
            match *placement {
                (Some(generator), Some(microchip)) => pairs.push(Pair::new(generator, microchip)),
                (generator, _) => {
                    let present = if generator.is_some() {
                        ItemKind::Generator
                    } else {
                        ItemKind::Microchip
                    };
                    return Err(FacilityError::UnpairedElement {
                        element: name.clone(),
                        present,
                        missing: present.other(),
                    });
                }
            }
        }

        Self::new(elements, floors, State::new(0, pairs))
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn element_name(&self, element: usize) -> &str {
        self.elements.get(element).map_or("?", String::as_str)
    }

    pub fn floors(&self) -> u8 {
        self.floors
    }

    pub fn top_floor(&self) -> Floor {
        self.floors.saturating_sub(1)
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    /// Place a generator and microchip for each named element on `floor`,
    /// overwriting the position of elements that already exist.
    pub fn with_extra_elements<S: AsRef<str>>(
        &self,
        names: &[S],
        floor: Floor,
    ) -> Result<Self, FacilityError> {
        if floor >= self.floors {
            return Err(FacilityError::FloorOutOfRange {
                floor,
                floors: self.floors,
            });
        }

        let mut facility = self.clone();
        for name in names {
            let name = name.as_ref();
            match facility.elements.iter().position(|e| e == name) {
                Some(index) => facility.start.pairs[index] = Pair::new(floor, floor),
                None => {
                    facility.elements.push(name.to_string());
                    facility.start.pairs.push(Pair::new(floor, floor));
                }
            }
        }
        Ok(facility)
    }

    /// Short label such as `HG` or `LM`
    pub fn label(&self, item: Item) -> String {
        let initial = self
            .element_name(item.element)
            .chars()
            .next()
            .map_or('?', |c| c.to_ascii_uppercase());
        let suffix = match item.kind {
            ItemKind::Generator => 'G',
            ItemKind::Microchip => 'M',
        };
        format!("{initial}{suffix}")
    }

    pub fn describe_move(&self, mv: &Move) -> String {
        let items: Vec<String> = mv.items.iter().map(|&item| self.label(item)).collect();
        let direction = match mv.direction {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        format!("{} {}", items.join("+"), direction)
    }

    /// Floor diagram, top floor first
    pub fn render(&self, state: &State) -> String {
        let mut out = String::new();
        for floor in (0..self.floors).rev() {
            out.push_str(&format!("F{} ", floor as usize + 1));
            out.push_str(if state.elevator == floor { "E " } else { ". " });
            for (element, pair) in state.pairs.iter().enumerate() {
                for kind in [ItemKind::Generator, ItemKind::Microchip] {
                    if pair.floor_of(kind) == floor {
                        out.push_str(&self.label(Item::new(element, kind)));
                        out.push(' ');
                    } else {
                        out.push_str(".  ");
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

impl FromStr for Facility {
    type Err = FacilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facility::parse(s)
    }
}
