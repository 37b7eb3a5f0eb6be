//! Assembunny execution engine with optional step bounds and metrics.
//!
//! Both dialects share one instruction table. The self-modifying dialect only
//! adds `tgl`, which rewrites opcodes in the machine's own copy of the
//! program. Instructions made invalid by toggling are skipped.

use serde::{Deserialize, Serialize};

use crate::error::ProgramError;
use crate::program::{Instruction, Opcode, Operand, Program, Registers};

/// Instruction set accepted by a [`Machine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `cpy`, `inc`, `dec`, `jnz`
    Base,
    /// The base set plus `tgl`
    SelfModifying,
}

impl Dialect {
    pub fn supports(self, opcode: Opcode) -> bool {
        match self {
            Dialect::Base => opcode != Opcode::Tgl,
            Dialect::SelfModifying => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Base => "base",
            Dialect::SelfModifying => "self-modifying",
        }
    }

    /// Reject programs using opcodes outside this dialect
    pub fn check(self, program: &Program) -> Result<(), ProgramError> {
        match program
            .iter()
            .enumerate()
            .find(|(_, instruction)| !self.supports(instruction.opcode))
        {
            Some((index, instruction)) => Err(ProgramError::UnsupportedOpcode {
                line: index + 1,
                opcode: instruction.opcode.mnemonic(),
                dialect: self.name(),
            }),
            None => Ok(()),
        }
    }
}

/// Result status of program execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Program counter left the program
    Halted,
    /// Exceeded maximum steps
    StepLimit,
}

/// Metrics collected during execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub steps: u64,
    pub jumps_taken: u64,
    pub toggles_applied: u64,
    pub toggles_out_of_range: u64,
    pub invalid_skipped: u64,
}

/// Result of running a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub registers: Registers,
    pub metrics: ExecutionMetrics,
}

impl ExecutionResult {
    pub fn halted(&self) -> bool {
        self.status == ExecutionStatus::Halted
    }
}

/// A program, its register file and program counter
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    registers: Registers,
    pc: i64,
    dialect: Dialect,
    metrics: ExecutionMetrics,
}

impl Machine {
    pub fn new(program: Program, dialect: Dialect) -> Result<Self, ProgramError> {
        dialect.check(&program)?;
        Ok(Self {
            program,
            registers: Registers::default(),
            pc: 0,
            dialect,
            metrics: ExecutionMetrics::default(),
        })
    }

    pub fn with_registers(mut self, registers: Registers) -> Self {
        self.registers = registers;
        self
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> i64 {
        self.pc
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn metrics(&self) -> &ExecutionMetrics {
        &self.metrics
    }

    pub fn is_halted(&self) -> bool {
        self.program.get(self.pc).is_none()
    }

    /// Execute the instruction at the program counter. Returns `false` once
    /// the machine has halted.
    pub fn step(&mut self) -> bool {
        let Some(instruction) = self.program.get(self.pc) else {
            return false;
        };
        let Instruction { opcode, operands } = instruction.clone();
        self.metrics.steps += 1;

        let mut offset = 1;
        match (opcode, operands.as_slice()) {
            (Opcode::Cpy, &[source, Operand::Register(target)]) => {
                *self.registers.get_mut(target) = source.value(&self.registers);
            }
            (Opcode::Inc, &[Operand::Register(target)]) => {
                let value = self.registers.get_mut(target);
                *value = value.wrapping_add(1);
            }
            (Opcode::Dec, &[Operand::Register(target)]) => {
                let value = self.registers.get_mut(target);
                *value = value.wrapping_sub(1);
            }
            (Opcode::Jnz, &[condition, jump]) => {
                if condition.value(&self.registers) != 0 {
                    offset = jump.value(&self.registers);
                    self.metrics.jumps_taken += 1;
                }
            }
            (Opcode::Tgl, &[distance]) if self.dialect.supports(Opcode::Tgl) => {
                let target = self.pc.saturating_add(distance.value(&self.registers));
                match self.program.get_mut(target) {
                    Some(instruction) => {
                        instruction.toggle();
                        self.metrics.toggles_applied += 1;
                    }
                    None => self.metrics.toggles_out_of_range += 1,
                }
            }
            // Literal targets and other shapes only arise from toggling
            _ => self.metrics.invalid_skipped += 1,
        }

        self.pc = self.pc.saturating_add(offset);
        true
    }

    /// Run until the machine halts or `max_steps` more steps have executed
    pub fn run(&mut self, max_steps: Option<u64>) -> ExecutionResult {
        let mut executed: u64 = 0;
        loop {
            if self.is_halted() {
                return self.result(ExecutionStatus::Halted);
            }
            if max_steps.is_some_and(|limit| executed >= limit) {
                return self.result(ExecutionStatus::StepLimit);
            }
            self.step();
            executed += 1;
        }
    }

    fn result(&self, status: ExecutionStatus) -> ExecutionResult {
        ExecutionResult {
            status,
            registers: self.registers,
            metrics: self.metrics.clone(),
        }
    }
}

/// Run a fresh copy of `program` from `registers`
pub fn execute(
    program: &Program,
    dialect: Dialect,
    registers: Registers,
    max_steps: Option<u64>,
) -> Result<ExecutionResult, ProgramError> {
    let mut machine = Machine::new(program.clone(), dialect)?.with_registers(registers);
    Ok(machine.run(max_steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Register;
    use proptest::prelude::*;

    fn run(source: &str, dialect: Dialect, registers: Registers) -> ExecutionResult {
        let program = Program::parse(source).unwrap();
        execute(&program, dialect, registers, Some(10_000)).unwrap()
    }

    #[test]
    fn test_single_copy() {
        let result = run("cpy 41 a", Dialect::Base, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers.a, 41);
        assert_eq!(result.metrics.steps, 1);
    }

    #[test]
    fn test_registers_fixture() {
        let source = include_str!("../fixtures/registers.txt");
        let result = run(source, Dialect::Base, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers.a, 42);
        assert_eq!(result.metrics.jumps_taken, 1);
    }

    #[test]
    fn test_toggle_fixture() {
        let source = include_str!("../fixtures/toggle.txt");
        let result = run(source, Dialect::SelfModifying, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers.a, 3);
        // The third tgl is itself rewritten to inc before it runs
        assert_eq!(result.metrics.toggles_applied, 2);
        assert_eq!(result.metrics.toggles_out_of_range, 0);
        assert_eq!(result.metrics.jumps_taken, 1);
    }

    #[test]
    fn test_toggle_does_not_touch_source_program() {
        let program = Program::parse(include_str!("../fixtures/toggle.txt")).unwrap();
        let before = program.clone();
        execute(&program, Dialect::SelfModifying, Registers::default(), None).unwrap();

        assert_eq!(program, before);
    }

    #[test]
    fn test_self_toggling_loop_hits_step_limit() {
        // tgl at index 5 turns itself into inc, leaving dec/inc/jnz spinning
        let source = "cpy 2 a\ntgl a\ntgl a\ninc a\ninc a\ntgl a\njnz 1 -2\ninc a";
        let program = Program::parse(source).unwrap();
        let mut machine = Machine::new(program, Dialect::SelfModifying).unwrap();
        let result = machine.run(Some(1_000));

        assert_eq!(result.status, ExecutionStatus::StepLimit);
        assert_eq!(result.metrics.toggles_applied, 3);
        assert_eq!(machine.program().get(5).unwrap().opcode, Opcode::Inc);
        assert!((-1..=0).contains(&result.registers.a));
    }

    #[test]
    fn test_toggled_copy_with_literal_target_is_skipped() {
        // jnz 1 2 becomes cpy 1 2, which must not execute
        let source = "tgl 1\njnz 1 2\ninc a";
        let result = run(source, Dialect::SelfModifying, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers, Registers::default().with(Register::A, 1));
        assert_eq!(result.metrics.invalid_skipped, 1);
    }

    #[test]
    fn test_toggled_increment_of_literal_is_skipped() {
        // tgl 2 becomes inc 2 after the first tgl rewrites it
        let source = "tgl 1\ntgl 2\ninc a";
        let result = run(source, Dialect::SelfModifying, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers.a, 1);
        assert_eq!(result.metrics.invalid_skipped, 1);
    }

    #[test]
    fn test_out_of_range_toggle_is_noop() {
        let source = "tgl -5\ntgl 9\ninc a";
        let program = Program::parse(source).unwrap();
        let mut machine = Machine::new(program.clone(), Dialect::SelfModifying).unwrap();
        let result = machine.run(None);

        assert!(result.halted());
        assert_eq!(result.registers.a, 1);
        assert_eq!(result.metrics.toggles_out_of_range, 2);
        assert_eq!(machine.program(), &program);
    }

    #[test]
    fn test_base_dialect_rejects_toggle() {
        let program = Program::parse("inc a\ntgl a").unwrap();
        let err = Machine::new(program, Dialect::Base).unwrap_err();

        assert_eq!(
            err,
            ProgramError::UnsupportedOpcode {
                line: 2,
                opcode: "tgl",
                dialect: "base",
            }
        );
    }

    #[test]
    fn test_backward_jump_halts_below_zero() {
        let result = run("inc a\njnz a -5", Dialect::Base, Registers::default());

        assert!(result.halted());
        assert_eq!(result.registers.a, 1);
    }

    #[test]
    fn test_jump_offset_read_from_register() {
        let result = run(
            "cpy 2 b\njnz 1 b\ninc a\ninc a",
            Dialect::Base,
            Registers::default(),
        );

        assert!(result.halted());
        assert_eq!(result.registers.a, 1);
        assert_eq!(result.metrics.jumps_taken, 1);

        // A negative register offset jumps backwards, here off the start
        let result = run(
            "cpy -3 b\ninc a\njnz 1 b",
            Dialect::Base,
            Registers::default(),
        );

        assert!(result.halted());
        assert_eq!(result.registers.a, 1);
        assert_eq!(result.metrics.steps, 3);
    }

    #[test]
    fn test_initial_registers_are_used() {
        let source = "cpy c a\ninc a";
        let result = run(source, Dialect::Base, Registers::default().with(Register::C, 1));

        assert_eq!(result.registers.a, 2);
    }

    #[test]
    fn test_empty_program_halts_immediately() {
        let result = run("", Dialect::Base, Registers::default());

        assert!(result.halted());
        assert_eq!(result.metrics.steps, 0);
    }

    fn register_strategy() -> impl Strategy<Value = Register> {
        prop_oneof![
            Just(Register::A),
            Just(Register::B),
            Just(Register::C),
            Just(Register::D),
        ]
    }

    fn registers_strategy() -> impl Strategy<Value = Registers> {
        (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>()).prop_map(|(a, b, c, d)| {
            Registers {
                a: a.into(),
                b: b.into(),
                c: c.into(),
                d: d.into(),
            }
        })
    }

    fn single_step(instruction: Instruction, registers: Registers) -> Machine {
        let program = Program::new(vec![instruction.clone(), instruction]);
        let mut machine = Machine::new(program, Dialect::Base)
            .unwrap()
            .with_registers(registers);
        assert!(machine.step());
        machine
    }

    proptest! {
        #[test]
        fn prop_cpy_sets_target_and_advances(
            source in register_strategy(),
            target in register_strategy(),
            registers in registers_strategy(),
        ) {
            let instruction = Instruction::new(
                Opcode::Cpy,
                &[Operand::Register(source), Operand::Register(target)],
            );
            let machine = single_step(instruction, registers);

            prop_assert_eq!(machine.registers().get(target), registers.get(source));
            prop_assert_eq!(machine.pc(), 1);
        }

        #[test]
        fn prop_inc_dec_change_by_one(
            target in register_strategy(),
            registers in registers_strategy(),
        ) {
            let inc = single_step(
                Instruction::new(Opcode::Inc, &[Operand::Register(target)]),
                registers,
            );
            let dec = single_step(
                Instruction::new(Opcode::Dec, &[Operand::Register(target)]),
                registers,
            );

            prop_assert_eq!(inc.registers().get(target), registers.get(target) + 1);
            prop_assert_eq!(dec.registers().get(target), registers.get(target) - 1);
            prop_assert_eq!(inc.pc(), 1);
            prop_assert_eq!(dec.pc(), 1);
        }

        #[test]
        fn prop_jnz_offset(
            condition in register_strategy(),
            jump in -50i64..50,
            registers in registers_strategy(),
        ) {
            let instruction = Instruction::new(
                Opcode::Jnz,
                &[Operand::Register(condition), Operand::Literal(jump)],
            );
            let machine = single_step(instruction, registers);
            let expected = if registers.get(condition) != 0 { jump } else { 1 };

            prop_assert_eq!(machine.pc(), expected);
            prop_assert_eq!(machine.registers(), &registers);
        }

        #[test]
        fn prop_jnz_register_offset(
            jump in register_strategy(),
            registers in registers_strategy(),
        ) {
            let instruction = Instruction::new(
                Opcode::Jnz,
                &[Operand::Literal(1), Operand::Register(jump)],
            );
            let machine = single_step(instruction, registers);

            prop_assert_eq!(machine.pc(), registers.get(jump));
            prop_assert_eq!(machine.registers(), &registers);
        }
    }
}
