//! Assembunny program representation and parsing.
//!
//! Programs are plain text, one instruction per line:
//!
//! ```text
//! cpy 41 a
//! inc a
//! jnz a 2
//! ```

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of, space0, space1},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize, value},
    multi::many1,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ProgramError;

/// One of the four machine registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    A,
    B,
    C,
    D,
}

impl Register {
    pub fn from_char(c: char) -> Option<Register> {
        match c {
            'a' => Some(Register::A),
            'b' => Some(Register::B),
            'c' => Some(Register::C),
            'd' => Some(Register::D),
            _ => None,
        }
    }

    pub fn name(self) -> char {
        match self {
            Register::A => 'a',
            Register::B => 'b',
            Register::C => 'c',
            Register::D => 'd',
        }
    }
}

/// Register file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

impl Registers {
    pub fn get(&self, register: Register) -> i64 {
        match register {
            Register::A => self.a,
            Register::B => self.b,
            Register::C => self.c,
            Register::D => self.d,
        }
    }

    pub fn get_mut(&mut self, register: Register) -> &mut i64 {
        match register {
            Register::A => &mut self.a,
            Register::B => &mut self.b,
            Register::C => &mut self.c,
            Register::D => &mut self.d,
        }
    }

    /// Copy with one register set
    pub fn with(mut self, register: Register, value: i64) -> Self {
        *self.get_mut(register) = value;
        self
    }
}

/// Instruction argument: a register or a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Register(Register),
    Literal(i64),
}

impl Operand {
    pub fn value(self, registers: &Registers) -> i64 {
        match self {
            Operand::Register(r) => registers.get(r),
            Operand::Literal(n) => n,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r.name()),
            Operand::Literal(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Cpy,
    Inc,
    Dec,
    Jnz,
    Tgl,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Cpy => "cpy",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Jnz => "jnz",
            Opcode::Tgl => "tgl",
        }
    }

    /// Number of operands the instruction takes
    pub fn arity(self) -> usize {
        match self {
            Opcode::Inc | Opcode::Dec | Opcode::Tgl => 1,
            Opcode::Cpy | Opcode::Jnz => 2,
        }
    }

    /// Opcode after being hit by `tgl`. Arity is preserved.
    pub fn toggled(self) -> Opcode {
        match self {
            Opcode::Inc => Opcode::Dec,
            Opcode::Dec => Opcode::Inc,
            Opcode::Tgl => Opcode::Inc,
            Opcode::Jnz => Opcode::Cpy,
            Opcode::Cpy => Opcode::Jnz,
        }
    }
}

/// An opcode with its operands. The opcode may be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: SmallVec<[Operand; 2]>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: &[Operand]) -> Self {
        Self {
            opcode,
            operands: SmallVec::from_slice(operands),
        }
    }

    pub fn toggle(&mut self) {
        self.opcode = self.opcode.toggled();
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

fn register(input: &str) -> IResult<&str, Register> {
    map_opt(one_of("abcd"), Register::from_char)(input)
}

fn literal(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((
        map(register, Operand::Register),
        map(literal, Operand::Literal),
    ))(input)
}

fn opcode(input: &str) -> IResult<&str, Opcode> {
    alt((
        value(Opcode::Cpy, tag("cpy")),
        value(Opcode::Inc, tag("inc")),
        value(Opcode::Dec, tag("dec")),
        value(Opcode::Jnz, tag("jnz")),
        value(Opcode::Tgl, tag("tgl")),
    ))(input)
}

fn instruction(input: &str) -> IResult<&str, (Opcode, Vec<Operand>)> {
    all_consuming(delimited(
        space0,
        tuple((opcode, many1(preceded(space1, operand)))),
        space0,
    ))(input)
}

/// Parse one line; `line` is the 1-based line number used in errors
pub fn parse_instruction(text: &str, line: usize) -> Result<Instruction, ProgramError> {
    let parse_error = || ProgramError::Parse {
        line,
        text: text.trim().to_string(),
    };

    let (_, (opcode, operands)) = instruction(text).map_err(|_| parse_error())?;
    if operands.len() != opcode.arity() {
        return Err(parse_error());
    }
    Ok(Instruction::new(opcode, &operands))
}

/// An ordered, mutable instruction stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Parse a program, skipping blank lines
    pub fn parse(input: &str) -> Result<Self, ProgramError> {
        let instructions = input
            .lines()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, text)| parse_instruction(text, index + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(instructions))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at a signed position; `None` outside the program
    pub fn get(&self, position: i64) -> Option<&Instruction> {
        usize::try_from(position)
            .ok()
            .and_then(|index| self.instructions.get(index))
    }

    pub fn get_mut(&mut self, position: i64) -> Option<&mut Instruction> {
        usize::try_from(position)
            .ok()
            .and_then(|index| self.instructions.get_mut(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }
}

impl FromStr for Program {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Program::parse(s)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instruction_forms() {
        assert_eq!(
            parse_instruction("cpy 41 a", 1).unwrap(),
            Instruction::new(
                Opcode::Cpy,
                &[Operand::Literal(41), Operand::Register(Register::A)]
            )
        );
        assert_eq!(
            parse_instruction("jnz c -2", 1).unwrap(),
            Instruction::new(
                Opcode::Jnz,
                &[Operand::Register(Register::C), Operand::Literal(-2)]
            )
        );
        assert_eq!(
            parse_instruction("  tgl b ", 1).unwrap(),
            Instruction::new(Opcode::Tgl, &[Operand::Register(Register::B)])
        );
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        for bad in ["mul a b", "inc", "inc a b", "cpy 1", "cpy 1 e", "jnz a 2x"] {
            assert!(
                matches!(parse_instruction(bad, 7), Err(ProgramError::Parse { line: 7, .. })),
                "accepted `{bad}`"
            );
        }
    }

    #[test]
    fn test_program_parse_reports_line_numbers() {
        let err = Program::parse("cpy 1 a\n\nbogus\n").unwrap_err();
        assert_eq!(
            err,
            ProgramError::Parse {
                line: 3,
                text: "bogus".to_string()
            }
        );
    }

    #[test]
    fn test_toggle_mapping() {
        assert_eq!(Opcode::Inc.toggled(), Opcode::Dec);
        assert_eq!(Opcode::Dec.toggled(), Opcode::Inc);
        assert_eq!(Opcode::Tgl.toggled(), Opcode::Inc);
        assert_eq!(Opcode::Jnz.toggled(), Opcode::Cpy);
        assert_eq!(Opcode::Cpy.toggled(), Opcode::Jnz);

        for opcode in [Opcode::Cpy, Opcode::Inc, Opcode::Dec, Opcode::Jnz, Opcode::Tgl] {
            assert_eq!(opcode.toggled().arity(), opcode.arity());
        }
    }

    #[test]
    fn test_display_round_trips_fixture() {
        let source = include_str!("../fixtures/toggle.txt");
        let program = Program::parse(source).unwrap();

        assert_eq!(program.len(), 7);
        assert_eq!(program.to_string(), source);
    }

    #[test]
    fn test_program_get_out_of_range() {
        let program = Program::parse("inc a").unwrap();
        assert!(program.get(0).is_some());
        assert!(program.get(1).is_none());
        assert!(program.get(-1).is_none());
    }
}
