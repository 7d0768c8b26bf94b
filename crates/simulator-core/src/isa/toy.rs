//! TOY: a 16-bit word-addressed teaching machine with 16 registers and 256
//! memory words, plus the S-TOY variant that adds stack instructions inside
//! the `HLT` opcode space (`RF` is the stack pointer).

use super::{ExecFn, Format, InstDescription, Instruction, IsaTable};
use crate::fault::SimulationError;
use crate::memory::{ByteOrder, Cell, MemorySubsystem};
use crate::state::ExecutionState;

/// Number of registers (`R0..RF`).
pub const REGISTER_COUNT: usize = 16;
/// Register used as stack pointer by S-TOY.
pub const STACK_POINTER: u8 = 0xF;
/// Number of addressable memory words.
pub const MEMORY_WORDS: usize = 256;
/// Address where programs start unless placed with `ORG`.
pub const PROGRAM_START: u32 = 0x10;

/// Opcode of `HLT` and of the S-TOY stack sub-instructions.
pub const OPCODE_HLT: u32 = 0x0;

/// ISA variant selected by the `-t`/`-s` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToyMode {
    /// Standard TOY.
    Standard,
    /// S-TOY with `PUSH`/`POP`/`CALL`/`RET`.
    Stack,
}

impl ToyMode {
    /// Both variants in flag order.
    pub const ALL: [Self; 2] = [Self::Standard, Self::Stack];

    /// Parses a mode flag.
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-t" => Some(Self::Standard),
            "-s" => Some(Self::Stack),
            _ => None,
        }
    }

    /// Command-line flag selecting this variant.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Standard => "-t",
            Self::Stack => "-s",
        }
    }

    /// Human-readable variant description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Standard => "standard TOY",
            Self::Stack => "S-TOY (i.e., TOY with stack instructions)",
        }
    }

    /// Builds the instruction table of this variant.
    #[must_use]
    pub fn instructions(self) -> IsaTable {
        let descriptions = match self {
            Self::Standard => standard(),
            Self::Stack => stack(),
        };
        IsaTable::new(self.table_name(), 16, 16, ByteOrder::Big, descriptions)
    }

    const fn table_name(self) -> &'static str {
        match self {
            Self::Standard => "toy",
            Self::Stack => "s-toy",
        }
    }
}

/// Builds the table for a mode flag; an unknown flag yields an empty table.
#[must_use]
pub fn instructions(mode: &str) -> IsaTable {
    ToyMode::from_flag(mode).map_or_else(
        || IsaTable::new("toy", 16, 16, ByteOrder::Big, Vec::new()),
        ToyMode::instructions,
    )
}

/// Renders register `nr` as `R0`..`RF`.
#[must_use]
pub fn register_name(nr: u8) -> String {
    format!("R{nr:X}")
}

/// Parses `R0`..`RF`, ignoring case.
#[must_use]
pub fn register_index(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('R' | 'r'), Some(digit), None) => digit
            .to_digit(16)
            .and_then(|nr| u8::try_from(nr).ok()),
        _ => None,
    }
}

fn to_cell(value: i64) -> Cell {
    Cell::try_from(value & 0xFFFF).unwrap_or_default()
}

fn shift_amount(value: i64) -> u32 {
    u32::try_from(value & 0xFFFF).unwrap_or(u32::MAX)
}

fn shl(a: i64, b: i64) -> i64 {
    let amount = shift_amount(b);
    if amount >= 16 {
        0
    } else {
        a << amount
    }
}

fn shr(a: i64, b: i64) -> i64 {
    a >> shift_amount(b).min(63)
}

fn exec_lda(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    state.set_reg(inst.rd(), inst.addr())?;
    state.advance_pc(1)
}

fn exec_ld(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let value = memory.read_cell(inst.addr())?;
    state.set_reg(inst.rd(), i64::from(value))?;
    state.advance_pc(1)
}

fn exec_st(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    memory.write_cell(inst.addr(), to_cell(state.reg(inst.rd())?))?;
    state.advance_pc(1)
}

fn exec_ldi(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let address = state.reg(inst.rt())? + inst.imm();
    let value = memory.read_cell(address)?;
    state.set_reg(inst.rd(), i64::from(value))?;
    state.advance_pc(1)
}

fn exec_sti(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let address = state.reg(inst.rt())? + inst.imm();
    memory.write_cell(address, to_cell(state.reg(inst.rd())?))?;
    state.advance_pc(1)
}

fn exec_hlt(
    _inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    state.halt();
    state.advance_pc(1)
}

fn exec_bz(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    if state.reg(inst.rd())? == 0 {
        state.set_pc(inst.addr())
    } else {
        state.advance_pc(1)
    }
}

fn exec_bp(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let value = state.reg(inst.rd())?;
    if 0 < value && value < 0x8000 {
        state.set_pc(inst.addr())
    } else {
        state.advance_pc(1)
    }
}

fn exec_jr(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    state.set_pc(state.reg(inst.rd())?)
}

fn exec_jl(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let link = i64::from(state.pc()) + 1;
    state.set_pc(inst.addr())?;
    state.set_reg(inst.rd(), link)
}

fn push(
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
    value: i64,
) -> Result<(), SimulationError> {
    state.set_reg(STACK_POINTER, state.reg(STACK_POINTER)? - 1)?;
    memory.write_cell(state.reg(STACK_POINTER)?, to_cell(value))
}

fn stack_top(
    state: &ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<i64, SimulationError> {
    let value = memory.read_cell(state.reg(STACK_POINTER)?)?;
    Ok(i64::from(value))
}

fn exec_push(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    push(state, memory, state.reg(inst.rt())?)?;
    state.advance_pc(1)
}

fn exec_pop(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let value = stack_top(state, memory)?;
    state.set_reg(inst.rt(), value)?;
    state.set_reg(STACK_POINTER, state.reg(STACK_POINTER)? + 1)?;
    state.advance_pc(1)
}

fn exec_call(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    push(state, memory, i64::from(state.pc()) + 1)?;
    state.set_pc(inst.addr())
}

fn exec_ret(
    _inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let target = stack_top(state, memory)?;
    state.set_pc(target)?;
    state.set_reg(STACK_POINTER, state.reg(STACK_POINTER)? + 1)
}

const fn alu(mnemonic: &'static str, opcode: u32, op: fn(i64, i64) -> i64) -> InstDescription {
    InstDescription::new(mnemonic, opcode, Format::ToyRegister3 { op })
}

const fn addressed(mnemonic: &'static str, opcode: u32, exec: ExecFn) -> InstDescription {
    InstDescription::new(mnemonic, opcode, Format::ToyAddress { exec })
}

fn arithmetic() -> [InstDescription; 9] {
    [
        alu("ADD", 0x1, i64::wrapping_add),
        alu("SUB", 0x2, i64::wrapping_sub),
        alu("AND", 0x3, |a, b| a & b),
        alu("XOR", 0x4, |a, b| a ^ b),
        alu("SHL", 0x5, shl),
        alu("SHR", 0x6, shr),
        addressed("LDA", 0x7, exec_lda),
        addressed("LD", 0x8, exec_ld),
        addressed("ST", 0x9, exec_st),
    ]
}

fn control() -> [InstDescription; 4] {
    [
        addressed("BZ", 0xC, exec_bz),
        addressed("BP", 0xD, exec_bp),
        InstDescription::new("JR", 0xE, Format::ToyRegister1 { exec: exec_jr }),
        addressed("JL", 0xF, exec_jl),
    ]
}

fn standard() -> Vec<InstDescription> {
    let mut descriptions = arithmetic().to_vec();
    descriptions.extend([
        InstDescription::new("LDI", 0xA, Format::ToyRegister2 { exec: exec_ldi }),
        InstDescription::new("STI", 0xB, Format::ToyRegister2 { exec: exec_sti }),
        InstDescription::new(
            "HLT",
            OPCODE_HLT,
            Format::ToyNoArg {
                mask: 0xF000,
                exec: exec_hlt,
            },
        ),
    ]);
    descriptions.extend(control());
    descriptions
}

fn stack() -> Vec<InstDescription> {
    let mut descriptions = arithmetic().to_vec();
    descriptions.extend([
        InstDescription::new("LDI", 0xA, Format::ToyRegister2Offset { exec: exec_ldi }),
        InstDescription::new("STI", 0xB, Format::ToyRegister2Offset { exec: exec_sti }),
        InstDescription::new(
            "HLT",
            OPCODE_HLT,
            Format::ToyNoArg {
                mask: 0xFF00,
                exec: exec_hlt,
            },
        ),
        InstDescription::new(
            "PUSH",
            OPCODE_HLT,
            Format::ToyStackRegister {
                minor: 0x1,
                exec: exec_push,
            },
        ),
        InstDescription::new(
            "POP",
            OPCODE_HLT,
            Format::ToyStackRegister {
                minor: 0x2,
                exec: exec_pop,
            },
        ),
        InstDescription::new(
            "CALL",
            OPCODE_HLT,
            Format::ToyStackAddress {
                minor: 0x3,
                exec: exec_call,
            },
        ),
        InstDescription::new(
            "RET",
            OPCODE_HLT,
            Format::ToyStackNoArg {
                minor: 0x4,
                exec: exec_ret,
            },
        ),
    ]);
    descriptions.extend(control());
    descriptions
}
