//! RV32I subset: integer register-register ops, `ADDI`, `LUI`, word loads and
//! stores, conditional branches, `JAL`/`JALR` and `EBREAK`.

use super::format::word32;
use super::{Format, ImmediateSyntax, InstDescription, Instruction, IsaTable};
use crate::bitfield::sign_extend;
use crate::fault::SimulationError;
use crate::memory::{combine_cells, split_cells, ByteOrder, MemorySubsystem};
use crate::state::ExecutionState;

/// Major opcode of register-register arithmetic.
pub const OPCODE_OP: u32 = 0x33;
/// Major opcode of loads.
pub const OPCODE_LOAD: u32 = 0x03;
/// Major opcode of stores.
pub const OPCODE_STORE: u32 = 0x23;
/// Major opcode of conditional branches.
pub const OPCODE_BRANCH: u32 = 0x63;
/// Major opcode of register-immediate arithmetic.
pub const OPCODE_OP_IMM: u32 = 0x13;
/// Major opcode of `LUI`.
pub const OPCODE_LUI: u32 = 0x37;
/// Major opcode of `JALR`.
pub const OPCODE_JALR: u32 = 0x67;
/// Major opcode of `JAL`.
pub const OPCODE_JAL: u32 = 0x6F;
/// Full encoding of `EBREAK`.
pub const EBREAK: u32 = 0x0010_0073;

/// Number of integer registers.
pub const REGISTER_COUNT: usize = 32;

/// ABI names indexed by register number.
pub const ABI_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "fp/s0", "s1", "a0", "a1", "a2", "a3",
    "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3",
    "t4", "t5", "t6",
];

/// Renders register `nr` as `xN` or by ABI name.
#[must_use]
pub fn register_name(nr: u8, abi: bool) -> String {
    match ABI_NAMES.get(usize::from(nr)) {
        Some(name) if abi => (*name).to_string(),
        _ => format!("x{nr}"),
    }
}

/// Parses `xN`, an ABI name, `fp` or `s0`, ignoring case.
#[must_use]
pub fn register_index(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    if lower == "fp" || lower == "s0" {
        return Some(8);
    }
    if let Some(digits) = lower.strip_prefix('x') {
        if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
            return None;
        }
        return digits
            .parse::<u8>()
            .ok()
            .filter(|nr| usize::from(*nr) < REGISTER_COUNT);
    }
    ABI_NAMES
        .iter()
        .position(|abi| *abi == lower)
        .and_then(|nr| u8::try_from(nr).ok())
}

fn shamt(value: i64) -> u32 {
    u32::try_from(value & 0x1F).unwrap_or(0)
}

fn srl(a: i64, b: i64) -> i64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let unsigned = a as u32;
    i64::from(unsigned >> shamt(b))
}

fn exec_lw(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let address = state.reg(inst.rs1())? + inst.imm();
    let cells = memory.read(address, 4)?;
    let word = u32::try_from(combine_cells(&cells, 8, ByteOrder::Little)).unwrap_or_default();
    state.set_reg(inst.rd(), word_value(word))?;
    state.advance_pc(4)
}

fn exec_sw(
    inst: &Instruction,
    state: &mut ExecutionState,
    memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let address = state.reg(inst.rs1())? + inst.imm();
    #[allow(clippy::cast_sign_loss)]
    let value = state.reg(inst.rs2())? as u64;
    memory.write(address, &split_cells(value, 4, 8, ByteOrder::Little))?;
    state.advance_pc(4)
}

fn exec_addi(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let value = state.reg(inst.rs1())?.wrapping_add(inst.imm());
    state.set_reg(inst.rd(), value)?;
    state.advance_pc(4)
}

fn exec_lui(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    state.set_reg(inst.rd(), inst.imm())?;
    state.advance_pc(4)
}

fn exec_jalr(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let target = state.reg(inst.rs1())?.wrapping_add(inst.imm()) & !1;
    let link = i64::from(state.pc()) + 4;
    state.set_pc(target)?;
    state.set_reg(inst.rd(), link)
}

fn exec_jal(
    inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    let pc = i64::from(state.pc());
    state.set_pc((pc + inst.imm()) & !1)?;
    state.set_reg(inst.rd(), pc + 4)
}

fn exec_ebreak(
    _inst: &Instruction,
    state: &mut ExecutionState,
    _memory: &mut dyn MemorySubsystem,
) -> Result<(), SimulationError> {
    state.halt();
    state.advance_pc(4)
}

const fn r_type(
    mnemonic: &'static str,
    funct3: u32,
    funct7: u32,
    op: fn(i64, i64) -> i64,
) -> InstDescription {
    InstDescription::new(mnemonic, OPCODE_OP, Format::R { funct3, funct7, op })
}

const fn b_type(
    mnemonic: &'static str,
    funct3: u32,
    cond: fn(i64, i64) -> bool,
) -> InstDescription {
    InstDescription::new(mnemonic, OPCODE_BRANCH, Format::B { funct3, cond })
}

/// Builds the RISC-V instruction table in decode order.
#[must_use]
pub fn instructions() -> IsaTable {
    let descriptions = vec![
        r_type("ADD", 0x0, 0x00, |a, b| word32(a.wrapping_add(b))),
        r_type("SUB", 0x0, 0x20, |a, b| word32(a.wrapping_sub(b))),
        r_type("AND", 0x7, 0x00, |a, b| a & b),
        r_type("OR", 0x6, 0x00, |a, b| a | b),
        r_type("SRA", 0x5, 0x20, |a, b| word32(a) >> shamt(b)),
        r_type("SRL", 0x5, 0x00, srl),
        r_type("SLL", 0x1, 0x00, |a, b| word32(a << shamt(b))),
        r_type("XOR", 0x4, 0x00, |a, b| a ^ b),
        InstDescription::new(
            "LW",
            OPCODE_LOAD,
            Format::I {
                funct3: 0x2,
                syntax: ImmediateSyntax::Load,
                exec: exec_lw,
            },
        ),
        InstDescription::new(
            "SW",
            OPCODE_STORE,
            Format::S {
                funct3: 0x2,
                exec: exec_sw,
            },
        ),
        b_type("BEQ", 0x0, |a, b| a == b),
        b_type("BNE", 0x1, |a, b| a != b),
        b_type("BLT", 0x4, |a, b| a < b),
        b_type("BGE", 0x5, |a, b| a >= b),
        InstDescription::new(
            "ADDI",
            OPCODE_OP_IMM,
            Format::I {
                funct3: 0x0,
                syntax: ImmediateSyntax::Immediate,
                exec: exec_addi,
            },
        ),
        InstDescription::new("LUI", OPCODE_LUI, Format::U { exec: exec_lui }),
        InstDescription::new(
            "JALR",
            OPCODE_JALR,
            Format::I {
                funct3: 0x0,
                syntax: ImmediateSyntax::Offset,
                exec: exec_jalr,
            },
        ),
        InstDescription::new("JAL", OPCODE_JAL, Format::J { exec: exec_jal }),
        InstDescription::new("EBREAK", EBREAK, Format::Raw { exec: exec_ebreak }),
    ];
    IsaTable::new("riscv", 32, 8, ByteOrder::Little, descriptions)
}

/// Sign-extends a raw 32-bit word read from memory.
#[must_use]
pub fn word_value(word: u32) -> i64 {
    sign_extend(i64::from(word), 32)
}

#[cfg(test)]
mod tests {
    use super::{instructions, register_index, register_name, word_value, EBREAK};
    use rstest::rstest;

    #[rstest]
    #[case("x0", Some(0))]
    #[case("X31", Some(31))]
    #[case("x32", None)]
    #[case("x05", None)]
    #[case("sp", Some(2))]
    #[case("fp", Some(8))]
    #[case("s0", Some(8))]
    #[case("t6", Some(31))]
    #[case("label", None)]
    fn register_names_parse(#[case] name: &str, #[case] expected: Option<u8>) {
        assert_eq!(register_index(name), expected);
    }

    #[test]
    fn register_names_render() {
        assert_eq!(register_name(10, false), "x10");
        assert_eq!(register_name(10, true), "a0");
        assert_eq!(register_name(8, true), "fp/s0");
    }

    #[test]
    fn table_keeps_declaration_order() {
        let table = instructions();
        let mnemonics: Vec<_> = table.descriptions().iter().map(|d| d.mnemonic).collect();
        assert_eq!(
            mnemonics,
            [
                "ADD", "SUB", "AND", "OR", "SRA", "SRL", "SLL", "XOR", "LW", "SW", "BEQ", "BNE",
                "BLT", "BGE", "ADDI", "LUI", "JALR", "JAL", "EBREAK"
            ]
        );
        assert_eq!(table.instruction_cells(), 4);
    }

    #[test]
    fn ebreak_is_matched_on_all_bits() {
        let table = instructions();
        let ebreak = table.find("ebreak").unwrap();
        assert!(ebreak.matches(EBREAK));
        assert!(!ebreak.matches(EBREAK | 0x80));
    }

    #[test]
    fn words_are_sign_extended() {
        assert_eq!(word_value(0xFFFF_FFFF), -1);
        assert_eq!(word_value(0x7FFF_FFFF), 0x7FFF_FFFF);
    }
}
