use super::{
    riscv, toy, DisplayOptions, EncodingError, Fields, Format, ImmediateSyntax, InstDescription,
    Instruction,
};
use crate::bitfield::{sign_extend, BitField, BitFieldError};
use crate::fault::SimulationError;
use crate::memory::MemorySubsystem;
use crate::state::ExecutionState;

fn bits(value: impl Into<i64>, width: u32) -> Result<BitField, BitFieldError> {
    BitField::new(value.into(), width)
}

fn zero(width: u32) -> Result<BitField, BitFieldError> {
    BitField::new(0, width)
}

fn register(field: BitField, hi: i32, lo: i32) -> Result<u8, BitFieldError> {
    Ok(u8::try_from(field.slice(hi, lo)?.n()).unwrap_or(u8::MAX))
}

impl Format {
    /// Instruction word width in bits.
    #[must_use]
    pub const fn word_bits(&self) -> u32 {
        if self.is_toy() {
            16
        } else {
            32
        }
    }

    /// Returns `true` for TOY/S-TOY formats.
    #[must_use]
    pub const fn is_toy(&self) -> bool {
        matches!(
            self,
            Self::ToyRegister1 { .. }
                | Self::ToyRegister2 { .. }
                | Self::ToyRegister3 { .. }
                | Self::ToyAddress { .. }
                | Self::ToyNoArg { .. }
                | Self::ToyRegister2Offset { .. }
                | Self::ToyStackRegister { .. }
                | Self::ToyStackAddress { .. }
                | Self::ToyStackNoArg { .. }
        )
    }

    /// Memory cells occupied by one instruction (bytes on RISC-V, words on TOY).
    #[must_use]
    pub const fn cells(&self) -> u32 {
        if self.is_toy() {
            1
        } else {
            4
        }
    }
}

impl InstDescription {
    /// Memory cells occupied by the encoded instruction.
    #[must_use]
    pub const fn cells(&self) -> u32 {
        self.format.cells()
    }

    /// Returns the `(mask, match)` pair claiming an encoding for this
    /// description: `encoding & mask == match`.
    #[must_use]
    pub const fn patterns(&self) -> (u32, u32) {
        let op = self.opcode;
        match self.format {
            Format::R { funct3, funct7, .. } => (0xFE00_707F, (funct7 << 25) | (funct3 << 12) | op),
            Format::I { funct3, .. } | Format::S { funct3, .. } | Format::B { funct3, .. } => {
                (0x0000_707F, (funct3 << 12) | op)
            }
            Format::U { .. } | Format::J { .. } => (0x0000_007F, op),
            Format::Raw { .. } => (0xFFFF_FFFF, op),
            Format::ToyRegister1 { .. } => (0xF0FF, op << 12),
            Format::ToyRegister2 { .. } => (0xF0F0, op << 12),
            Format::ToyRegister3 { .. }
            | Format::ToyAddress { .. }
            | Format::ToyRegister2Offset { .. } => (0xF000, op << 12),
            Format::ToyNoArg { mask, .. } => (mask, op << 12),
            Format::ToyStackRegister { minor, .. } => (0xFFF0, (op << 12) | (minor << 8)),
            Format::ToyStackAddress { minor, .. } => (0xFF00, (op << 12) | (minor << 8)),
            Format::ToyStackNoArg { minor, .. } => (0xFFFF, (op << 12) | (minor << 8)),
        }
    }

    /// Returns `true` when this description claims `encoding`.
    #[must_use]
    pub const fn matches(&self, encoding: u32) -> bool {
        let (mask, value) = self.patterns();
        encoding & mask == value
    }

    /// Packs resolved operands into an instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::BitField`] when an operand does not fit its
    /// slot and [`EncodingError::FieldsMismatch`] when `fields` belongs to a
    /// different format.
    pub fn encode(&self, fields: &Fields) -> Result<u32, EncodingError> {
        let op = self.opcode;
        let word = match (self.format, *fields) {
            (Format::R { funct3, funct7, .. }, Fields::R { rd, rs1, rs2 }) => BitField::concat(&[
                bits(funct7, 7)?,
                bits(rs2, 5)?,
                bits(rs1, 5)?,
                bits(funct3, 3)?,
                bits(rd, 5)?,
                bits(op, 7)?,
            ])?,
            (Format::I { funct3, .. }, Fields::I { rd, rs1, imm }) => BitField::concat(&[
                bits(imm, 12)?,
                bits(rs1, 5)?,
                bits(funct3, 3)?,
                bits(rd, 5)?,
                bits(op, 7)?,
            ])?,
            (Format::S { funct3, .. }, Fields::S { rs1, rs2, imm }) => {
                let imm = bits(imm, 12)?;
                BitField::concat(&[
                    imm.slice(11, 5)?,
                    bits(rs2, 5)?,
                    bits(rs1, 5)?,
                    bits(funct3, 3)?,
                    imm.slice(4, 0)?,
                    bits(op, 7)?,
                ])?
            }
            (Format::B { funct3, .. }, Fields::B { rs1, rs2, imm }) => {
                let imm = bits(imm, 13)?;
                BitField::concat(&[
                    imm.bit(12)?,
                    imm.slice(10, 5)?,
                    bits(rs2, 5)?,
                    bits(rs1, 5)?,
                    bits(funct3, 3)?,
                    imm.slice(4, 1)?,
                    imm.bit(11)?,
                    bits(op, 7)?,
                ])?
            }
            (Format::U { .. }, Fields::U { rd, imm }) => {
                BitField::concat(&[bits(imm >> 12, 20)?, bits(rd, 5)?, bits(op, 7)?])?
            }
            (Format::J { .. }, Fields::J { rd, imm }) => {
                let imm = bits(imm, 21)?;
                BitField::concat(&[
                    imm.bit(20)?,
                    imm.slice(10, 1)?,
                    imm.bit(11)?,
                    imm.slice(19, 12)?,
                    bits(rd, 5)?,
                    bits(op, 7)?,
                ])?
            }
            (Format::Raw { .. }, Fields::None) => bits(op, 32)?,
            (Format::ToyRegister1 { .. }, Fields::ToyRegister1 { rd }) => {
                BitField::concat(&[bits(op, 4)?, bits(rd, 4)?, zero(8)?])?
            }
            (Format::ToyRegister2 { .. }, Fields::ToyRegister2 { rd, rt }) => {
                BitField::concat(&[bits(op, 4)?, bits(rd, 4)?, zero(4)?, bits(rt, 4)?])?
            }
            (Format::ToyRegister3 { .. }, Fields::ToyRegister3 { rd, rs, rt }) => {
                BitField::concat(&[bits(op, 4)?, bits(rd, 4)?, bits(rs, 4)?, bits(rt, 4)?])?
            }
            (Format::ToyAddress { .. }, Fields::ToyAddress { rd, addr }) => {
                BitField::concat(&[bits(op, 4)?, bits(rd, 4)?, bits(addr, 8)?])?
            }
            (Format::ToyNoArg { .. }, Fields::None) => BitField::concat(&[bits(op, 4)?, zero(12)?])?,
            (Format::ToyRegister2Offset { .. }, Fields::ToyOffset { rd, offset, rt }) => {
                BitField::concat(&[bits(op, 4)?, bits(rd, 4)?, bits(offset, 4)?, bits(rt, 4)?])?
            }
            (Format::ToyStackRegister { minor, .. }, Fields::ToyStackRegister { rt }) => {
                BitField::concat(&[bits(op, 4)?, bits(minor, 4)?, zero(4)?, bits(rt, 4)?])?
            }
            (Format::ToyStackAddress { minor, .. }, Fields::ToyStackAddress { addr }) => {
                BitField::concat(&[bits(op, 4)?, bits(minor, 4)?, bits(addr, 8)?])?
            }
            (Format::ToyStackNoArg { minor, .. }, Fields::None) => {
                BitField::concat(&[bits(op, 4)?, bits(minor, 4)?, zero(8)?])?
            }
            _ => {
                return Err(EncodingError::FieldsMismatch {
                    mnemonic: self.mnemonic,
                })
            }
        };
        u32::try_from(word.n()).map_err(|_| EncodingError::FieldsMismatch {
            mnemonic: self.mnemonic,
        })
    }

    /// Extracts operands from `encoding`.
    ///
    /// # Errors
    ///
    /// Returns [`BitFieldError::ValueOutOfRange`] when `encoding` is wider
    /// than the format's instruction word.
    pub fn decode(&self, address: u32, encoding: u32) -> Result<Instruction, BitFieldError> {
        let v = BitField::from_bits(u64::from(encoding), self.format.word_bits())?;
        let fields = match self.format {
            Format::R { .. } => Fields::R {
                rd: register(v, 11, 7)?,
                rs1: register(v, 19, 15)?,
                rs2: register(v, 24, 20)?,
            },
            Format::I { .. } => Fields::I {
                rd: register(v, 11, 7)?,
                rs1: register(v, 19, 15)?,
                imm: v.slice(31, 20)?.sn(),
            },
            Format::S { .. } => Fields::S {
                rs1: register(v, 19, 15)?,
                rs2: register(v, 24, 20)?,
                imm: BitField::concat(&[v.slice(31, 25)?, v.slice(11, 7)?])?.sn(),
            },
            Format::B { .. } => Fields::B {
                rs1: register(v, 19, 15)?,
                rs2: register(v, 24, 20)?,
                imm: BitField::concat(&[
                    v.bit(31)?,
                    v.bit(7)?,
                    v.slice(30, 25)?,
                    v.slice(11, 8)?,
                    zero(1)?,
                ])?
                .sn(),
            },
            Format::U { .. } => Fields::U {
                rd: register(v, 11, 7)?,
                imm: BitField::concat(&[v.slice(31, 12)?, zero(12)?])?.sn(),
            },
            Format::J { .. } => Fields::J {
                rd: register(v, 11, 7)?,
                imm: BitField::concat(&[
                    v.bit(31)?,
                    v.slice(19, 12)?,
                    v.bit(20)?,
                    v.slice(30, 21)?,
                    zero(1)?,
                ])?
                .sn(),
            },
            Format::Raw { .. } | Format::ToyNoArg { .. } | Format::ToyStackNoArg { .. } => {
                Fields::None
            }
            Format::ToyRegister1 { .. } => Fields::ToyRegister1 {
                rd: register(v, 11, 8)?,
            },
            Format::ToyRegister2 { .. } => Fields::ToyRegister2 {
                rd: register(v, 11, 8)?,
                rt: register(v, 3, 0)?,
            },
            Format::ToyRegister3 { .. } => Fields::ToyRegister3 {
                rd: register(v, 11, 8)?,
                rs: register(v, 7, 4)?,
                rt: register(v, 3, 0)?,
            },
            Format::ToyAddress { .. } => Fields::ToyAddress {
                rd: register(v, 11, 8)?,
                addr: register(v, 7, 0)?,
            },
            Format::ToyRegister2Offset { .. } => Fields::ToyOffset {
                rd: register(v, 11, 8)?,
                offset: register(v, 7, 4)?,
                rt: register(v, 3, 0)?,
            },
            Format::ToyStackRegister { .. } => Fields::ToyStackRegister {
                rt: register(v, 3, 0)?,
            },
            Format::ToyStackAddress { .. } => Fields::ToyStackAddress {
                addr: register(v, 7, 0)?,
            },
        };
        Ok(Instruction {
            desc: *self,
            address,
            encoding,
            fields,
        })
    }

    pub(crate) fn format_instruction(&self, inst: &Instruction, options: DisplayOptions) -> String {
        let mn = self.mnemonic;
        let x = |nr: u8| riscv::register_name(nr, options.abi_names);
        let r = toy::register_name;
        let imm = inst.imm();
        match self.format {
            Format::R { .. } => format!("{mn} {}, {}, {}", x(inst.rd()), x(inst.rs1()), x(inst.rs2())),
            Format::I {
                syntax: ImmediateSyntax::Immediate,
                ..
            } => format!("{mn} {}, {}, {imm}", x(inst.rd()), x(inst.rs1())),
            Format::I { .. } => format!("{mn} {}, {imm}({})", x(inst.rd()), x(inst.rs1())),
            Format::S { .. } => format!("{mn} {}, {imm}({})", x(inst.rs2()), x(inst.rs1())),
            Format::B { .. } => format!("{mn} {}, {}, {imm}", x(inst.rs1()), x(inst.rs2())),
            Format::U { .. } => format!("{mn} {}, {}", x(inst.rd()), imm >> 12),
            Format::J { .. } => format!("{mn} {}, {imm}", x(inst.rd())),
            Format::Raw { .. } | Format::ToyNoArg { .. } | Format::ToyStackNoArg { .. } => {
                mn.to_string()
            }
            Format::ToyRegister1 { .. } => format!("{mn} {}", r(inst.rd())),
            Format::ToyRegister2 { .. } => format!("{mn} {} {}", r(inst.rd()), r(inst.rt())),
            Format::ToyRegister3 { .. } => {
                format!("{mn} {} {} {}", r(inst.rd()), r(inst.rs()), r(inst.rt()))
            }
            Format::ToyAddress { .. } => format!("{mn} {} {imm:#04x}", r(inst.rd())),
            Format::ToyRegister2Offset { .. } => {
                format!("{mn} {} {imm:#x} {}", r(inst.rd()), r(inst.rt()))
            }
            Format::ToyStackRegister { .. } => format!("{mn} {}", r(inst.rt())),
            Format::ToyStackAddress { .. } => format!("{mn} {imm:#04x}"),
        }
    }

    pub(crate) fn execute(
        &self,
        inst: &Instruction,
        state: &mut ExecutionState,
        memory: &mut dyn MemorySubsystem,
    ) -> Result<(), SimulationError> {
        match self.format {
            Format::R { op, .. } | Format::ToyRegister3 { op } => {
                let value = op(state.reg(inst.rs1())?, state.reg(inst.rs2())?);
                state.set_reg(inst.rd(), value)?;
                state.advance_pc(self.cells())
            }
            Format::B { cond, .. } => {
                if cond(state.reg(inst.rs1())?, state.reg(inst.rs2())?) {
                    state.set_pc(i64::from(state.pc()) + inst.imm())
                } else {
                    state.advance_pc(self.cells())
                }
            }
            Format::I { exec, .. }
            | Format::S { exec, .. }
            | Format::U { exec }
            | Format::J { exec }
            | Format::Raw { exec }
            | Format::ToyRegister1 { exec }
            | Format::ToyRegister2 { exec }
            | Format::ToyAddress { exec }
            | Format::ToyNoArg { exec, .. }
            | Format::ToyRegister2Offset { exec }
            | Format::ToyStackRegister { exec, .. }
            | Format::ToyStackAddress { exec, .. }
            | Format::ToyStackNoArg { exec, .. } => exec(inst, state, memory),
        }
    }
}

/// Sign-extends a 32-bit register result (used by RISC-V semantics).
#[must_use]
pub const fn word32(value: i64) -> i64 {
    sign_extend(value, 32)
}
