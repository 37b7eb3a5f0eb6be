use thiserror::Error;

use crate::facility::ItemKind;

/// Errors raised while reading a facility description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacilityError {
    /// The input had no floor lines at all.
    #[error("facility has no floors")]
    NoFloors,

    /// More floors than a `u8` floor index can address.
    #[error("facility has {0} floors, at most {max} are supported", max = u8::MAX)]
    TooManyFloors(usize),

    /// The same generator or microchip was listed twice.
    #[error("{element} {kind} appears more than once (line {line})")]
    DuplicateItem {
        element: String,
        kind: ItemKind,
        line: usize,
    },

    /// An element has a generator without a microchip or the other way round.
    #[error("{element} has a {present} but no {missing}")]
    UnpairedElement {
        element: String,
        present: ItemKind,
        missing: ItemKind,
    },

    /// Element names and start positions disagree on the element count.
    #[error("{elements} element names for {pairs} generator/microchip pairs")]
    ElementCountMismatch { elements: usize, pairs: usize },

    /// A floor index outside the facility.
    #[error("floor {floor} is outside a {floors}-floor facility")]
    FloorOutOfRange { floor: u8, floors: u8 },
}

/// Errors raised while reading or loading an assembunny program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// A line did not parse as an instruction.
    #[error("line {line}: cannot parse instruction `{text}`")]
    Parse { line: usize, text: String },

    /// The instruction exists but not in the chosen dialect.
    #[error("line {line}: `{opcode}` is not supported by the {dialect} dialect")]
    UnsupportedOpcode {
        line: usize,
        opcode: &'static str,
        dialect: &'static str,
    },
}
