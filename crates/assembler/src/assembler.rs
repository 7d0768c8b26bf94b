//! Top-level assembler pipeline.
//!
//! This module wires all phases together:
//!
//! 1. **Pass 1**: Tokenizing, line parsing, label binding and placement
//! 2. **Pass 2**: Operand resolution against the completed symbol table
//! 3. **Pass 3**: Encoding to memory cells
//!
//! The main entry point is [`Assembler::assemble`], which takes source text
//! and returns an [`Assembly`] ready to be loaded into simulator memory.

use simulator_core::isa::{riscv, toy};
use simulator_core::{Cell, InstDescription, IsaTable, MemorySubsystem, SimulationError};

use crate::directive::Directive;
use crate::encoder::{encode_all, flatten_bytes, flatten_cells, Encodings};
use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::lexer::{tokenize, Syntax};
use crate::mnemonic::{AsmDescription, AsmInstruction};
use crate::parser::LineParser;
use crate::symbols::{Context, SymbolTable};

/// Address-space settings of one assembly run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Location counter before the first line.
    pub initial_address: i64,
    /// Lowest address an item may occupy.
    pub address_min: i64,
    /// Highest address an item may occupy.
    pub address_max: i64,
    /// Move the first instruction to the TOY program start until `ORG` is seen.
    pub auto_org: bool,
}

impl AssemblerConfig {
    /// 32-bit byte-addressed space starting at 0.
    #[must_use]
    pub const fn riscv() -> Self {
        Self {
            initial_address: 0,
            address_min: 0,
            address_max: 0xFFFF_FFFF,
            auto_org: false,
        }
    }

    /// 256-word TOY memory with auto-org enabled.
    #[must_use]
    pub const fn toy() -> Self {
        Self {
            initial_address: 0,
            address_min: 0,
            address_max: 0xFF,
            auto_org: true,
        }
    }
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::riscv()
    }
}

/// Listing entry mapping an address range to its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// First address of the item.
    pub address: i64,
    /// Encoded cells.
    pub cells: Vec<Cell>,
    /// 1-indexed source line.
    pub line: usize,
    /// Source line text, trimmed.
    pub source: String,
}

/// Result of a successful assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Placed instructions and data blocks in source order, with resolved operands.
    pub instructions: Vec<AsmInstruction>,
    /// Bound labels.
    pub symbols: SymbolTable,
    /// Encoded cells by address.
    pub encodings: Encodings,
    /// Per-item listing in source order.
    pub listing: Vec<ListingEntry>,
    cell_bits: u32,
}

impl Assembly {
    /// Lowest occupied address, if anything was emitted.
    #[must_use]
    pub fn base_address(&self) -> Option<i64> {
        self.encodings.keys().next().copied()
    }

    /// Cells from [`Self::base_address`] to the highest occupied address, gaps zero-filled.
    #[must_use]
    pub fn cells(&self) -> Vec<Cell> {
        flatten_cells(&self.encodings)
    }

    /// Byte image of [`Self::cells`]; 16-bit cells are serialized big-endian.
    #[must_use]
    pub fn to_image(&self) -> Vec<u8> {
        flatten_bytes(&self.encodings, self.cell_bits)
    }

    /// Address bound to `label`.
    #[must_use]
    pub fn symbol(&self, label: &str) -> Option<i64> {
        self.symbols.get(label).map(|symbol| symbol.address)
    }

    /// Writes every encoded cell into `memory`.
    ///
    /// # Errors
    ///
    /// Fails when a cell lies outside the device.
    pub fn load_into(&self, memory: &mut dyn MemorySubsystem) -> Result<(), SimulationError> {
        for (&address, &cell) in &self.encodings {
            memory.write_cell(address, cell)?;
        }
        Ok(())
    }
}

/// Two-pass assembler for one ISA table and dialect.
#[derive(Debug, Clone)]
pub struct Assembler {
    table: IsaTable,
    syntax: Syntax,
    config: AssemblerConfig,
    directives: Vec<Directive>,
    descriptions: Vec<AsmDescription>,
    lines: LineParser,
}

impl Assembler {
    /// Builds an assembler accepting `table`'s mnemonics plus `directives`.
    #[must_use]
    pub fn new(
        table: IsaTable,
        syntax: Syntax,
        config: AssemblerConfig,
        directives: &[Directive],
    ) -> Self {
        let descriptions = describe(&table, directives);
        let lines = line_parser(syntax, &descriptions);
        Self {
            table,
            syntax,
            config,
            directives: directives.to_vec(),
            descriptions,
            lines,
        }
    }

    /// RISC-V assembler with `.org` and `.word`.
    #[must_use]
    pub fn riscv() -> Self {
        Self::new(
            riscv::instructions(),
            Syntax::riscv(),
            AssemblerConfig::riscv(),
            &Directive::RISCV,
        )
    }

    /// TOY or S-TOY assembler with `ORG`, `DUP` and `DW`.
    #[must_use]
    pub fn toy(mode: toy::ToyMode) -> Self {
        Self::new(
            mode.instructions(),
            Syntax::toy(),
            AssemblerConfig::toy(),
            &Directive::TOY,
        )
    }

    /// Same assembler with extra instructions appended to its table.
    #[must_use]
    pub fn with_extension(self, extra: impl IntoIterator<Item = InstDescription>) -> Self {
        let table = self.table.with_extension(extra);
        Self::new(table, self.syntax, self.config, &self.directives)
    }

    /// ISA table instructions are encoded with.
    #[must_use]
    pub const fn table(&self) -> &IsaTable {
        &self.table
    }

    /// Dialect settings.
    #[must_use]
    pub const fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Address-space settings.
    #[must_use]
    pub const fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Every accepted mnemonic, instructions first.
    #[must_use]
    pub fn descriptions(&self) -> &[AsmDescription] {
        &self.descriptions
    }

    fn find(&self, mnemonic: &str) -> Option<AsmDescription> {
        self.descriptions
            .iter()
            .find(|desc| desc.mnemonic().eq_ignore_ascii_case(mnemonic))
            .copied()
    }

    /// Assembles `source` into encoded memory cells.
    ///
    /// # Errors
    ///
    /// Returns the first lexical, syntax, symbol, range, placement or
    /// encoding error, located at the offending token.
    pub fn assemble(&self, source: &str) -> Result<Assembly, AssemblerError> {
        let tokens = tokenize(source, self.syntax)?;
        let lines = self.lines.parse_all(&tokens)?;

        // Pass 1: place items and bind labels.
        let mut ctx = Context::new(&self.config);
        let mut instructions = Vec::new();
        for line in lines {
            if let Some(label) = &line.label {
                ctx.define(label, ctx.current_address)?;
            }
            let Some(mnemonic) = line.mnemonic else {
                continue;
            };
            let desc = self.find(&mnemonic.text).ok_or_else(|| {
                AssemblerError::at_token(
                    AssemblerErrorKind::UnknownMnemonic {
                        mnemonic: mnemonic.text.clone(),
                    },
                    &mnemonic,
                )
            })?;
            if let Some(inst) = desc.construct(&mut ctx, &self.table, mnemonic, line.arguments)? {
                ctx.check_placement(&inst.mnemonic, inst.address, inst.size)?;
                instructions.push(inst);
            }
        }

        // Pass 2: resolve operands.
        for inst in &mut instructions {
            let operands = inst.description.resolve(inst, &ctx)?;
            inst.operands = Some(operands);
        }

        // Pass 3: encode.
        let encodings = encode_all(&instructions, &self.table)?;
        let listing = listing(&instructions, &encodings, source);

        Ok(Assembly {
            instructions,
            symbols: ctx.symbols,
            encodings,
            listing,
            cell_bits: self.table.cell_bits(),
        })
    }
}

fn describe(table: &IsaTable, directives: &[Directive]) -> Vec<AsmDescription> {
    table
        .descriptions()
        .iter()
        .copied()
        .map(AsmDescription::Instruction)
        .chain(directives.iter().copied().map(AsmDescription::Directive))
        .collect()
}

fn line_parser(syntax: Syntax, descriptions: &[AsmDescription]) -> LineParser {
    LineParser::new(
        syntax,
        descriptions
            .iter()
            .map(|desc| (desc.mnemonic(), desc.arguments())),
    )
}

fn listing(instructions: &[AsmInstruction], encodings: &Encodings, source: &str) -> Vec<ListingEntry> {
    let lines: Vec<&str> = source.lines().collect();
    instructions
        .iter()
        .map(|inst| ListingEntry {
            address: inst.address,
            cells: encodings
                .range(inst.address..inst.address + inst.size)
                .map(|(_, &cell)| cell)
                .collect(),
            line: inst.line(),
            source: lines
                .get(inst.line().saturating_sub(1))
                .map_or_else(String::new, |text| text.trim().to_string()),
        })
        .collect()
}
