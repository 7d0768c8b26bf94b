//! Assembler-side capabilities of instruction formats and directives.
//!
//! Every mnemonic the assembler accepts is an [`AsmDescription`]: either an
//! ISA [`InstDescription`] or a [`Directive`]. A description provides the
//! argument patterns of its line grammar and the three pipeline steps:
//! `construct` (place at an address), `resolve` (turn captured tokens into
//! operand values) and `encode` (produce memory cells).

use simulator_core::isa::{riscv, toy};
use simulator_core::{
    sign_extend, split_cells, Cell, Fields, Format, ImmediateSyntax, InstDescription, IsaTable,
};

use crate::directive::Directive;
use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::lexer::{Token, TokenKind};
use crate::parser::{Captures, Pattern, LABEL_KINDS};
use crate::symbols::{Context, OperandRange};

const RD: &str = "rd";
const RS1: &str = "rs1";
const RS2: &str = "rs2";
const RS: &str = "rs";
const RT: &str = "rt";
const IMM: &str = "imm";
const ADDR: &str = "addr";
const OFFSET: &str = "offset";
const LABEL: &str = "label";

const IMMEDIATE: OperandRange = OperandRange::new("Immediate/Offset", -2048, 2047);
const ARITHMETIC_IMMEDIATE: OperandRange = OperandRange::new("Immediate/Offset", -2048, 4095);
const LOW_ADDRESS: OperandRange = OperandRange::new("Address", 0, 2047);
const BRANCH_OFFSET: OperandRange = OperandRange::new("Offset", -4096, 4095).aligned(2);
const JUMP_OFFSET: OperandRange = OperandRange::new("Offset", -(1 << 20), (1 << 20) - 1).aligned(2);
const UPPER_IMMEDIATE: OperandRange = OperandRange::new("Immediate", 0, (1 << 20) - 1);
const TOY_ADDRESS: OperandRange = OperandRange::new("Address", 0, 0xFF);
const TOY_OFFSET: OperandRange = OperandRange::new("Offset", 0, 0xF);

/// A mnemonic known to the assembler.
#[derive(Debug, Clone, Copy)]
pub enum AsmDescription {
    /// Machine instruction of the ISA table.
    Instruction(InstDescription),
    /// Assembler directive.
    Directive(Directive),
}

/// Resolved operands of a placed instruction or data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    /// Instruction fields.
    Fields(Fields),
    /// Data values, one per emitted value.
    Data(Vec<u64>),
}

/// An instruction or data block placed at an address.
#[derive(Debug, Clone)]
pub struct AsmInstruction {
    /// Description that produced the item.
    pub description: AsmDescription,
    /// First occupied address.
    pub address: i64,
    /// Occupied cells.
    pub size: i64,
    /// Mnemonic token as written.
    pub mnemonic: Token,
    /// Captured argument tokens.
    pub arguments: Captures,
    /// Operands, available once resolved.
    pub operands: Option<Operands>,
}

impl AsmInstruction {
    /// Source line of the mnemonic.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.mnemonic.position.line
    }
}

impl AsmDescription {
    /// Mnemonic as registered.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Instruction(desc) => desc.mnemonic,
            Self::Directive(directive) => directive.mnemonic(),
        }
    }

    /// Argument patterns, in source order.
    #[must_use]
    pub fn arguments(&self) -> Vec<Pattern> {
        match self {
            Self::Instruction(desc) => instruction_arguments(&desc.format),
            Self::Directive(directive) => directive.arguments(),
        }
    }

    /// Places the mnemonic at the location counter and advances it.
    ///
    /// Returns `None` for directives that only move the counter.
    ///
    /// # Errors
    ///
    /// Fails when a directive argument is out of range.
    pub fn construct(
        self,
        ctx: &mut Context,
        table: &IsaTable,
        mnemonic: Token,
        arguments: Captures,
    ) -> Result<Option<AsmInstruction>, AssemblerError> {
        let (address, size) = match self {
            Self::Instruction(_) => {
                let program_start = i64::from(toy::PROGRAM_START);
                let address = if ctx.auto_org && ctx.current_address < program_start {
                    program_start
                } else {
                    ctx.current_address
                };
                (address, i64::from(table.instruction_cells()))
            }
            Self::Directive(directive) => match directive.construct(ctx, &arguments)? {
                Some(size) => (ctx.current_address, size),
                None => return Ok(None),
            },
        };
        ctx.current_address = address + size;
        Ok(Some(AsmInstruction {
            description: self,
            address,
            size,
            mnemonic,
            arguments,
            operands: None,
        }))
    }

    /// Resolves captured tokens against the final symbol table.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range or misaligned operands and undefined labels.
    pub fn resolve(
        &self,
        inst: &AsmInstruction,
        ctx: &Context,
    ) -> Result<Operands, AssemblerError> {
        match self {
            Self::Instruction(desc) => {
                resolve_fields(&desc.format, inst, ctx).map(Operands::Fields)
            }
            Self::Directive(directive) => directive.resolve(inst, ctx),
        }
    }

    /// Encodes resolved operands into memory cells of `table`'s layout.
    ///
    /// # Errors
    ///
    /// Fails when the operands do not fit the encoding.
    pub fn encode(
        &self,
        inst: &AsmInstruction,
        operands: &Operands,
        table: &IsaTable,
    ) -> Result<Vec<Cell>, AssemblerError> {
        let cell_bits = table.cell_bits();
        let order = table.byte_order();
        match (self, operands) {
            (Self::Instruction(desc), Operands::Fields(fields)) => {
                let word = desc
                    .encode(fields)
                    .map_err(|err| AssemblerError::at_token(err.into(), &inst.mnemonic))?;
                let cells = usize::try_from(table.instruction_cells()).unwrap_or_default();
                Ok(split_cells(u64::from(word), cells, cell_bits, order))
            }
            (Self::Directive(directive), Operands::Data(values)) => Ok(values
                .iter()
                .flat_map(|value| split_cells(*value, directive.value_cells(), cell_bits, order))
                .collect()),
            _ => Err(AssemblerError::at_token(
                AssemblerErrorKind::Encoding(simulator_core::EncodingError::FieldsMismatch {
                    mnemonic: self.mnemonic(),
                }),
                &inst.mnemonic,
            )),
        }
    }
}

pub(crate) fn required<'a>(
    arguments: &'a Captures,
    name: &'static str,
) -> Result<&'a Token, AssemblerError> {
    arguments
        .token(name)
        .ok_or_else(|| AssemblerError::new(AssemblerErrorKind::MissingOperand { operand: name }))
}

fn instruction_arguments(format: &Format) -> Vec<Pattern> {
    let reg = |name: &'static str| Pattern::capture(TokenKind::Register, name);
    let int = |name: &'static str| Pattern::capture(TokenKind::Integer, name);
    let label = || Pattern::capture_any(&LABEL_KINDS, LABEL);
    let based = || {
        int(IMM)
            + Pattern::token(TokenKind::LBracket)
            + reg(RS1)
            + Pattern::token(TokenKind::RBracket)
    };
    match format {
        Format::R { .. } => vec![reg(RD), reg(RS1), reg(RS2)],
        Format::I { syntax, .. } => match syntax {
            ImmediateSyntax::Load => vec![reg(RD), based() | label()],
            ImmediateSyntax::Offset => vec![reg(RD), based()],
            ImmediateSyntax::Immediate => vec![reg(RD), reg(RS1), int(IMM) | label()],
        },
        Format::S { .. } => vec![reg(RS2), based() | label()],
        Format::B { .. } => vec![reg(RS1), reg(RS2), label() | int(IMM)],
        Format::U { .. } => vec![reg(RD), int(IMM)],
        Format::J { .. } => vec![reg(RD), label() | int(IMM)],
        Format::Raw { .. } | Format::ToyNoArg { .. } | Format::ToyStackNoArg { .. } => Vec::new(),
        Format::ToyRegister1 { .. } => vec![reg(RD)],
        Format::ToyRegister2 { .. } => vec![reg(RD), reg(RT)],
        Format::ToyRegister3 { .. } => vec![reg(RD), reg(RS), reg(RT)],
        Format::ToyAddress { .. } => vec![reg(RD), int(ADDR) | label()],
        Format::ToyRegister2Offset { .. } => {
            vec![reg(RD), Pattern::optional(int(OFFSET)), reg(RT)]
        }
        Format::ToyStackRegister { .. } => vec![reg(RT)],
        Format::ToyStackAddress { .. } => vec![int(ADDR) | label()],
    }
}

fn narrow(value: i64, token: &Token, range: OperandRange) -> Result<u8, AssemblerError> {
    u8::try_from(value).map_err(|_| {
        AssemblerError::at_token(
            AssemblerErrorKind::OutOfRange {
                name: range.name.to_string(),
                value,
                min: range.min,
                max: range.max,
            },
            token,
        )
    })
}

struct Resolver<'a> {
    inst: &'a AsmInstruction,
    ctx: &'a Context,
}

impl Resolver<'_> {
    fn register(&self, name: &'static str, count: usize) -> Result<u8, AssemblerError> {
        let token = required(&self.inst.arguments, name)?;
        let max = i64::try_from(count).unwrap_or(i64::MAX) - 1;
        let range = OperandRange::new("Register number", 0, max);
        narrow(self.ctx.resolve_integer(token, range)?, token, range)
    }

    fn riscv(&self, name: &'static str) -> Result<u8, AssemblerError> {
        self.register(name, riscv::REGISTER_COUNT)
    }

    fn toy(&self, name: &'static str) -> Result<u8, AssemblerError> {
        self.register(name, toy::REGISTER_COUNT)
    }

    fn integer(&self, name: &'static str, range: OperandRange) -> Result<i64, AssemblerError> {
        self.ctx.resolve_integer(required(&self.inst.arguments, name)?, range)
    }

    /// Absolute label address, or the integer operand `name` when no label was written.
    fn absolute(
        &self,
        name: &'static str,
        integer: OperandRange,
        label: OperandRange,
    ) -> Result<i64, AssemblerError> {
        match self.inst.arguments.token(LABEL) {
            Some(token) => self.ctx.resolve_label(token, label),
            None => self.integer(name, integer),
        }
    }

    /// Label offset from the instruction, or the integer operand `imm`.
    fn relative(&self, range: OperandRange) -> Result<i64, AssemblerError> {
        match self.inst.arguments.token(LABEL) {
            Some(token) => self
                .ctx
                .resolve_label_offset(token, self.inst.address, range),
            None => self.integer(IMM, range),
        }
    }

    /// `imm(rs1)` or a label, which addresses relative to `x0`.
    fn based(&self) -> Result<(u8, i64), AssemblerError> {
        if self.inst.arguments.contains(LABEL) {
            Ok((0, self.absolute(IMM, IMMEDIATE, LOW_ADDRESS)?))
        } else {
            Ok((self.riscv(RS1)?, self.integer(IMM, IMMEDIATE)?))
        }
    }

    fn toy_address(&self) -> Result<u8, AssemblerError> {
        let value = self.absolute(ADDR, TOY_ADDRESS, TOY_ADDRESS)?;
        narrow(value, &self.inst.mnemonic, TOY_ADDRESS)
    }
}

fn resolve_fields(
    format: &Format,
    inst: &AsmInstruction,
    ctx: &Context,
) -> Result<Fields, AssemblerError> {
    let r = Resolver { inst, ctx };
    Ok(match format {
        Format::R { .. } => Fields::R {
            rd: r.riscv(RD)?,
            rs1: r.riscv(RS1)?,
            rs2: r.riscv(RS2)?,
        },
        Format::I { syntax, .. } => {
            let rd = r.riscv(RD)?;
            let (rs1, imm) = match syntax {
                ImmediateSyntax::Load | ImmediateSyntax::Offset => r.based()?,
                ImmediateSyntax::Immediate => (
                    r.riscv(RS1)?,
                    r.absolute(IMM, ARITHMETIC_IMMEDIATE, LOW_ADDRESS)?,
                ),
            };
            Fields::I { rd, rs1, imm }
        }
        Format::S { .. } => {
            let rs2 = r.riscv(RS2)?;
            let (rs1, imm) = r.based()?;
            Fields::S { rs1, rs2, imm }
        }
        Format::B { .. } => Fields::B {
            rs1: r.riscv(RS1)?,
            rs2: r.riscv(RS2)?,
            imm: r.relative(BRANCH_OFFSET)?,
        },
        Format::U { .. } => Fields::U {
            rd: r.riscv(RD)?,
            imm: sign_extend(r.integer(IMM, UPPER_IMMEDIATE)? << 12, 32),
        },
        Format::J { .. } => Fields::J {
            rd: r.riscv(RD)?,
            imm: r.relative(JUMP_OFFSET)?,
        },
        Format::Raw { .. } | Format::ToyNoArg { .. } | Format::ToyStackNoArg { .. } => Fields::None,
        Format::ToyRegister1 { .. } => Fields::ToyRegister1 { rd: r.toy(RD)? },
        Format::ToyRegister2 { .. } => Fields::ToyRegister2 {
            rd: r.toy(RD)?,
            rt: r.toy(RT)?,
        },
        Format::ToyRegister3 { .. } => Fields::ToyRegister3 {
            rd: r.toy(RD)?,
            rs: r.toy(RS)?,
            rt: r.toy(RT)?,
        },
        Format::ToyAddress { .. } => Fields::ToyAddress {
            rd: r.toy(RD)?,
            addr: r.toy_address()?,
        },
        Format::ToyRegister2Offset { .. } => {
            let offset = match inst.arguments.token(OFFSET) {
                Some(token) => narrow(ctx.resolve_integer(token, TOY_OFFSET)?, token, TOY_OFFSET)?,
                None => 0,
            };
            Fields::ToyOffset {
                rd: r.toy(RD)?,
                offset,
                rt: r.toy(RT)?,
            }
        }
        Format::ToyStackRegister { .. } => Fields::ToyStackRegister { rt: r.toy(RT)? },
        Format::ToyStackAddress { .. } => Fields::ToyStackAddress {
            addr: r.toy_address()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use simulator_core::isa::toy::ToyMode;

    use super::*;
    use crate::assembler::AssemblerConfig;
    use crate::lexer::{tokenize, Syntax};
    use crate::parser::LineParser;

    fn place(
        table: &IsaTable,
        syntax: Syntax,
        ctx: &mut Context,
        source: &str,
    ) -> Result<AsmInstruction, AssemblerError> {
        let tokens = tokenize(source, syntax)?;
        let descriptions: Vec<AsmDescription> = table
            .descriptions()
            .iter()
            .copied()
            .map(AsmDescription::Instruction)
            .collect();
        let parser = LineParser::new(
            syntax,
            descriptions.iter().map(|d| (d.mnemonic(), d.arguments())),
        );
        let (line, _) = parser.parse_line(&tokens, 0)?;
        let mnemonic = line.mnemonic.unwrap();
        let desc = descriptions
            .iter()
            .find(|d| d.mnemonic().eq_ignore_ascii_case(&mnemonic.text))
            .copied()
            .unwrap();
        Ok(desc.construct(ctx, table, mnemonic, line.arguments)?.unwrap())
    }

    fn assemble_one(
        table: &IsaTable,
        syntax: Syntax,
        config: &AssemblerConfig,
        source: &str,
    ) -> Result<Vec<Cell>, AssemblerError> {
        let mut ctx = Context::new(config);
        let inst = place(table, syntax, &mut ctx, source)?;
        let operands = inst.description.resolve(&inst, &ctx)?;
        inst.description.encode(&inst, &operands, table)
    }

    fn riscv(source: &str) -> Result<Vec<Cell>, AssemblerError> {
        assemble_one(&riscv::instructions(), Syntax::riscv(), &AssemblerConfig::riscv(), source)
    }

    fn toy(mode: ToyMode, source: &str) -> Result<Vec<Cell>, AssemblerError> {
        assemble_one(&mode.instructions(), Syntax::toy(), &AssemblerConfig::toy(), source)
    }

    #[rstest]
    #[case("ADDI x5, x6, -1", [0x93, 0x02, 0xF3, 0xFF])]
    #[case("ADD x3, x1, x2", [0xB3, 0x81, 0x20, 0x00])]
    #[case("LW x4, 512(x0)", [0x03, 0x22, 0x00, 0x20])]
    #[case("SW x3, 8(sp)", [0x23, 0x24, 0x31, 0x00])]
    #[case("LUI x7, 0x12345", [0xB7, 0x53, 0x34, 0x12])]
    #[case("JALR x0, 0(ra)", [0x67, 0x80, 0x00, 0x00])]
    #[case("EBREAK", [0x73, 0x00, 0x10, 0x00])]
    fn riscv_encodings_are_little_endian(#[case] source: &str, #[case] bytes: [Cell; 4]) {
        assert_eq!(riscv(source).unwrap(), bytes);
    }

    #[rstest]
    #[case(ToyMode::Standard, "ADD R1 R2 R3", 0x1123)]
    #[case(ToyMode::Standard, "ld ra, 0x42", 0x8A42)]
    #[case(ToyMode::Standard, "JR RE", 0xEE00)]
    #[case(ToyMode::Standard, "LDI R1 R2", 0xA102)]
    #[case(ToyMode::Standard, "HLT", 0x0000)]
    #[case(ToyMode::Stack, "LDI R1 3 R2", 0xA132)]
    #[case(ToyMode::Stack, "LDI R1, R2", 0xA102)]
    #[case(ToyMode::Stack, "PUSH R1", 0x0101)]
    #[case(ToyMode::Stack, "CALL 0x20", 0x0320)]
    #[case(ToyMode::Stack, "RET", 0x0400)]
    fn toy_encodings_fill_one_word(
        #[case] mode: ToyMode,
        #[case] source: &str,
        #[case] word: Cell,
    ) {
        assert_eq!(toy(mode, source).unwrap(), [word]);
    }

    #[rstest]
    #[case("ADDI x1, x0, 4095", true)]
    #[case("ADDI x1, x0, -2048", true)]
    #[case("ADDI x1, x0, 4096", false)]
    #[case("LW x1, 2047(x2)", true)]
    #[case("LW x1, 2048(x2)", false)]
    #[case("LW x1, -2049(x2)", false)]
    #[case("LUI x1, 0xFFFFF", true)]
    #[case("LUI x1, 0x100000", false)]
    #[case("BEQ x1, x2, 4094", true)]
    #[case("BEQ x1, x2, 4095", false)]
    #[case("JAL x1, -1048576", true)]
    fn riscv_immediate_bounds(#[case] source: &str, #[case] ok: bool) {
        assert_eq!(riscv(source).is_ok(), ok, "{source}");
    }

    #[test]
    fn toy_address_beyond_memory_is_out_of_range() {
        let err = toy(ToyMode::Standard, "BZ R1 257").unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "Address 257 is not in the valid range [0,255]!"
        );
        assert_eq!(err.token.as_deref(), Some("257"));
    }

    #[test]
    fn toy_offset_is_four_bits() {
        assert!(toy(ToyMode::Stack, "LDI R1 15 R2").is_ok());
        assert!(toy(ToyMode::Stack, "LDI R1 16 R2").is_err());
    }

    #[test]
    fn first_toy_instruction_is_moved_to_program_start() {
        let table = ToyMode::Standard.instructions();
        let mut ctx = Context::new(&AssemblerConfig::toy());
        let inst = place(&table, Syntax::toy(), &mut ctx, "HLT").unwrap();
        assert_eq!(inst.address, 0x10);
        assert_eq!(ctx.current_address, 0x11);
    }

    #[test]
    fn label_operand_in_register_position_is_an_undefined_label() {
        let err = toy(ToyMode::Standard, "LDA R1 R2").unwrap_err();
        assert_eq!(
            err.kind,
            AssemblerErrorKind::UndefinedLabel {
                label: "R2".to_string()
            }
        );
    }
}
