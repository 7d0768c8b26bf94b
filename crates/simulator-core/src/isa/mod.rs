//! Instruction-format descriptions shared by the assembler and the simulator.
//!
//! Each mnemonic is an [`InstDescription`]: a name, a major opcode and one
//! [`Format`] variant carrying the format's remaining constants plus the
//! function that implements it. Tables of descriptions ([`IsaTable`]) are
//! plain values built by [`riscv::instructions`] and [`toy::instructions`]
//! and passed explicitly to the assembler and the simulator.

/// Per-format bit layout, decode, display and execute dispatch.
pub mod format;
/// RISC-V RV32I subset.
pub mod riscv;
/// TOY and S-TOY 16-bit teaching ISA.
pub mod toy;

use thiserror::Error;

use crate::bitfield::BitFieldError;
use crate::fault::SimulationError;
use crate::memory::{ByteOrder, MemorySubsystem};
use crate::state::ExecutionState;

/// Register-register (or register-immediate) computation.
pub type BinaryOp = fn(i64, i64) -> i64;
/// Branch condition over two register values.
pub type BranchCond = fn(i64, i64) -> bool;
/// Instruction semantics for formats without a shared execute shape.
pub type ExecFn =
    fn(&Instruction, &mut ExecutionState, &mut dyn MemorySubsystem) -> Result<(), SimulationError>;

/// Operand syntax of RISC-V I-type instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmediateSyntax {
    /// `rd, imm(rs1)` or `rd, label` (loads).
    Load,
    /// `rd, imm(rs1)` (register-relative jumps).
    Offset,
    /// `rd, rs1, imm` or `rd, rs1, label` (arithmetic).
    Immediate,
}

/// Closed set of instruction formats.
#[derive(Debug, Clone, Copy)]
pub enum Format {
    /// RISC-V `funct7 rs2 rs1 funct3 rd opcode`.
    R {
        /// Minor opcode.
        funct3: u32,
        /// Upper minor opcode.
        funct7: u32,
        /// `rd = op(rs1, rs2)`.
        op: BinaryOp,
    },
    /// RISC-V `imm[11:0] rs1 funct3 rd opcode`.
    I {
        /// Minor opcode.
        funct3: u32,
        /// Accepted operand syntax.
        syntax: ImmediateSyntax,
        /// Semantics.
        exec: ExecFn,
    },
    /// RISC-V `imm[11:5] rs2 rs1 funct3 imm[4:0] opcode`.
    S {
        /// Minor opcode.
        funct3: u32,
        /// Semantics.
        exec: ExecFn,
    },
    /// RISC-V conditional branch with a 13-bit, 2-aligned offset.
    B {
        /// Minor opcode.
        funct3: u32,
        /// Branch taken when `cond(rs1, rs2)`.
        cond: BranchCond,
    },
    /// RISC-V `imm[31:12] rd opcode`.
    U {
        /// Semantics.
        exec: ExecFn,
    },
    /// RISC-V jump with a 21-bit, 2-aligned offset.
    J {
        /// Semantics.
        exec: ExecFn,
    },
    /// Fixed 32-bit word without operands; the opcode is the full encoding.
    Raw {
        /// Semantics.
        exec: ExecFn,
    },
    /// TOY `op d 0 0`.
    ToyRegister1 {
        /// Semantics.
        exec: ExecFn,
    },
    /// TOY `op d 0 t`.
    ToyRegister2 {
        /// Semantics.
        exec: ExecFn,
    },
    /// TOY `op d s t`.
    ToyRegister3 {
        /// `R[d] = op(R[s], R[t])`.
        op: BinaryOp,
    },
    /// TOY `op d addr`.
    ToyAddress {
        /// Semantics.
        exec: ExecFn,
    },
    /// TOY operand-less instruction; `mask` selects the bits that must be zero.
    ToyNoArg {
        /// Decode mask.
        mask: u32,
        /// Semantics.
        exec: ExecFn,
    },
    /// S-TOY `op d offset t`.
    ToyRegister2Offset {
        /// Semantics.
        exec: ExecFn,
    },
    /// S-TOY `0 minor 0 t` inside the HLT opcode.
    ToyStackRegister {
        /// Minor opcode nibble.
        minor: u32,
        /// Semantics.
        exec: ExecFn,
    },
    /// S-TOY `0 minor addr` inside the HLT opcode.
    ToyStackAddress {
        /// Minor opcode nibble.
        minor: u32,
        /// Semantics.
        exec: ExecFn,
    },
    /// S-TOY `0 minor 0 0` inside the HLT opcode.
    ToyStackNoArg {
        /// Minor opcode nibble.
        minor: u32,
        /// Semantics.
        exec: ExecFn,
    },
}

/// Resolved or decoded operand values of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Fields {
    /// No operands.
    None,
    R { rd: u8, rs1: u8, rs2: u8 },
    I { rd: u8, rs1: u8, imm: i64 },
    S { rs1: u8, rs2: u8, imm: i64 },
    B { rs1: u8, rs2: u8, imm: i64 },
    U { rd: u8, imm: i64 },
    J { rd: u8, imm: i64 },
    ToyRegister1 { rd: u8 },
    ToyRegister2 { rd: u8, rt: u8 },
    ToyRegister3 { rd: u8, rs: u8, rt: u8 },
    ToyAddress { rd: u8, addr: u8 },
    ToyOffset { rd: u8, offset: u8, rt: u8 },
    ToyStackRegister { rt: u8 },
    ToyStackAddress { addr: u8 },
}

impl Fields {
    /// Destination register (`0` when absent).
    #[must_use]
    pub const fn rd(&self) -> u8 {
        match *self {
            Self::R { rd, .. }
            | Self::I { rd, .. }
            | Self::U { rd, .. }
            | Self::J { rd, .. }
            | Self::ToyRegister1 { rd }
            | Self::ToyRegister2 { rd, .. }
            | Self::ToyRegister3 { rd, .. }
            | Self::ToyAddress { rd, .. }
            | Self::ToyOffset { rd, .. } => rd,
            _ => 0,
        }
    }

    /// First source register (TOY `s`).
    #[must_use]
    pub const fn rs1(&self) -> u8 {
        match *self {
            Self::R { rs1, .. } | Self::I { rs1, .. } | Self::S { rs1, .. } | Self::B { rs1, .. } => {
                rs1
            }
            Self::ToyRegister3 { rs, .. } => rs,
            _ => 0,
        }
    }

    /// Second source register (TOY `t`).
    #[must_use]
    pub const fn rs2(&self) -> u8 {
        match *self {
            Self::R { rs2, .. } | Self::S { rs2, .. } | Self::B { rs2, .. } => rs2,
            Self::ToyRegister2 { rt, .. }
            | Self::ToyRegister3 { rt, .. }
            | Self::ToyOffset { rt, .. }
            | Self::ToyStackRegister { rt } => rt,
            _ => 0,
        }
    }

    /// Immediate, offset or address operand.
    #[must_use]
    pub fn imm(&self) -> i64 {
        match *self {
            Self::I { imm, .. }
            | Self::S { imm, .. }
            | Self::B { imm, .. }
            | Self::U { imm, .. }
            | Self::J { imm, .. } => imm,
            Self::ToyAddress { addr, .. } | Self::ToyStackAddress { addr } => i64::from(addr),
            Self::ToyOffset { offset, .. } => i64::from(offset),
            _ => 0,
        }
    }
}

/// One mnemonic of an ISA.
#[derive(Debug, Clone, Copy)]
pub struct InstDescription {
    /// Upper-case mnemonic.
    pub mnemonic: &'static str,
    /// Major opcode (full word for [`Format::Raw`]).
    pub opcode: u32,
    /// Format and semantics.
    pub format: Format,
}

impl InstDescription {
    /// Creates a description.
    #[must_use]
    pub const fn new(mnemonic: &'static str, opcode: u32, format: Format) -> Self {
        Self {
            mnemonic,
            opcode,
            format,
        }
    }
}

/// Options for [`Instruction::format`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Render registers by ABI name (`sp`, `a0`) instead of number.
    pub abi_names: bool,
}

/// A decoded instruction bound to its address.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    /// Description the word was decoded with.
    pub desc: InstDescription,
    /// Address of the first cell.
    pub address: u32,
    /// Raw encoding.
    pub encoding: u32,
    /// Decoded operands.
    pub fields: Fields,
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.desc.mnemonic == other.desc.mnemonic
            && self.address == other.address
            && self.encoding == other.encoding
            && self.fields == other.fields
    }
}

impl Eq for Instruction {}

impl Instruction {
    /// Mnemonic of the decoded description.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        self.desc.mnemonic
    }

    /// Destination register.
    #[must_use]
    pub const fn rd(&self) -> u8 {
        self.fields.rd()
    }

    /// First source register.
    #[must_use]
    pub const fn rs1(&self) -> u8 {
        self.fields.rs1()
    }

    /// Second source register.
    #[must_use]
    pub const fn rs2(&self) -> u8 {
        self.fields.rs2()
    }

    /// TOY `s` register.
    #[must_use]
    pub const fn rs(&self) -> u8 {
        self.fields.rs1()
    }

    /// TOY `t` register.
    #[must_use]
    pub const fn rt(&self) -> u8 {
        self.fields.rs2()
    }

    /// Immediate or offset operand.
    #[must_use]
    pub fn imm(&self) -> i64 {
        self.fields.imm()
    }

    /// TOY address operand.
    #[must_use]
    pub fn addr(&self) -> i64 {
        self.fields.imm()
    }

    /// Runs the instruction against `state` and `memory`.
    ///
    /// # Errors
    ///
    /// Propagates register, memory and program-counter faults.
    pub fn execute(
        &self,
        state: &mut ExecutionState,
        memory: &mut dyn MemorySubsystem,
    ) -> Result<(), SimulationError> {
        self.desc.execute(self, state, memory)
    }

    /// Human-readable disassembly.
    #[must_use]
    pub fn format(&self, options: DisplayOptions) -> String {
        self.desc.format_instruction(self, options)
    }
}

/// Errors raised while packing fields into an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A field value does not fit its bit slot.
    #[error(transparent)]
    BitField(#[from] BitFieldError),
    /// The fields variant does not belong to the description's format.
    #[error("operands do not match the format of {mnemonic}")]
    FieldsMismatch {
        /// Mnemonic being encoded.
        mnemonic: &'static str,
    },
}

/// Pair of formats whose mask/match patterns make decode order-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConflict {
    /// Earlier-registered mnemonic.
    pub earlier: &'static str,
    /// Later-registered mnemonic.
    pub later: &'static str,
}

/// Ordered instruction table of one ISA variant.
#[derive(Debug, Clone)]
pub struct IsaTable {
    name: &'static str,
    word_bits: u32,
    cell_bits: u32,
    byte_order: ByteOrder,
    descriptions: Vec<InstDescription>,
}

impl IsaTable {
    /// Creates a table; `descriptions` are tried in order during decode.
    #[must_use]
    pub const fn new(
        name: &'static str,
        word_bits: u32,
        cell_bits: u32,
        byte_order: ByteOrder,
        descriptions: Vec<InstDescription>,
    ) -> Self {
        Self {
            name,
            word_bits,
            cell_bits,
            byte_order,
            descriptions,
        }
    }

    /// Short ISA name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Width of an instruction word in bits.
    #[must_use]
    pub const fn word_bits(&self) -> u32 {
        self.word_bits
    }

    /// Width of one memory cell in bits.
    #[must_use]
    pub const fn cell_bits(&self) -> u32 {
        self.cell_bits
    }

    /// Layout of multi-cell values.
    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Cells occupied by one instruction word.
    #[must_use]
    pub const fn instruction_cells(&self) -> u32 {
        self.word_bits / self.cell_bits
    }

    /// Registered descriptions in decode order.
    #[must_use]
    pub fn descriptions(&self) -> &[InstDescription] {
        &self.descriptions
    }

    /// Number of registered descriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// Returns `true` when no description is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Finds a description by mnemonic, ignoring case.
    #[must_use]
    pub fn find(&self, mnemonic: &str) -> Option<&InstDescription> {
        self.descriptions
            .iter()
            .find(|desc| desc.mnemonic.eq_ignore_ascii_case(mnemonic))
    }

    /// Appends extra descriptions after the built-in ones.
    pub fn extend(&mut self, extra: impl IntoIterator<Item = InstDescription>) {
        self.descriptions.extend(extra);
    }

    /// Builder form of [`IsaTable::extend`].
    #[must_use]
    pub fn with_extension(mut self, extra: impl IntoIterator<Item = InstDescription>) -> Self {
        self.extend(extra);
        self
    }

    /// Lists format pairs that can claim the same encoding without the
    /// earlier one being a strict refinement of the later one.
    #[must_use]
    pub fn dispatch_conflicts(&self) -> Vec<DispatchConflict> {
        let mut conflicts = Vec::new();
        for (index, earlier) in self.descriptions.iter().enumerate() {
            let (earlier_mask, earlier_match) = earlier.patterns();
            for later in &self.descriptions[index + 1..] {
                let (later_mask, later_match) = later.patterns();
                let common = earlier_mask & later_mask;
                let overlapping = (earlier_match ^ later_match) & common == 0;
                let refines = common == later_mask && earlier_mask != later_mask;
                if overlapping && !refines {
                    conflicts.push(DispatchConflict {
                        earlier: earlier.mnemonic,
                        later: later.mnemonic,
                    });
                }
            }
        }
        conflicts
    }
}
