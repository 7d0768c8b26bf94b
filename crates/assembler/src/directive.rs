//! Assembler directives.
//!
//! RISC-V sources use `.org` and `.word`; TOY sources use `ORG`, `DUP` and
//! `DW`. Directives share the instruction pipeline: `.org`/`ORG` only move
//! the location counter, the others emit data that is resolved and encoded
//! like any instruction.

use crate::errors::AssemblerError;
use crate::lexer::TokenKind;
use crate::mnemonic::{required, AsmInstruction, Operands};
use crate::parser::{Captures, Pattern, LABEL_KINDS};
use crate::symbols::{Context, OperandRange};

const HEAD: &str = "head";
const TAIL: &str = "tail";
const VALUES: &str = "values";
const ADDRESS: &str = "address";
const COUNT: &str = "count";

/// Directive mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `.org INT`: set the location counter.
    Org,
    /// `.word (INT|LABEL)(, (INT|LABEL))*`: 32-bit little-endian data words.
    Word,
    /// `ORG INT`: move the location counter forward and disable auto-org.
    ToyOrg,
    /// `DUP INT`: reserve zero-filled words.
    Dup,
    /// `DW INT+`: 16-bit data words.
    Dw,
}

impl Directive {
    /// Directives of the RISC-V dialect.
    pub const RISCV: [Self; 2] = [Self::Org, Self::Word];
    /// Directives of the TOY dialect.
    pub const TOY: [Self; 3] = [Self::ToyOrg, Self::Dup, Self::Dw];

    /// Mnemonic as written in source.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Org => ".org",
            Self::Word => ".word",
            Self::ToyOrg => "ORG",
            Self::Dup => "DUP",
            Self::Dw => "DW",
        }
    }

    /// Argument patterns.
    #[must_use]
    pub fn arguments(self) -> Vec<Pattern> {
        let integer = |name: &'static str| Pattern::capture(TokenKind::Integer, name);
        match self {
            Self::Org | Self::ToyOrg => vec![integer(ADDRESS)],
            Self::Dup => vec![integer(COUNT)],
            Self::Word => {
                let value = |name: &'static str| {
                    Pattern::capture(TokenKind::Integer, name) | Pattern::capture_any(&LABEL_KINDS, name)
                };
                vec![
                    value(HEAD)
                        + Pattern::repeat(Pattern::token(TokenKind::Comma) + value(TAIL), 0, None),
                ]
            }
            Self::Dw => {
                let separator = Pattern::optional(Pattern::token(TokenKind::Comma));
                vec![Pattern::repeat(integer(VALUES) + separator, 1, None)]
            }
        }
    }

    /// Applies the directive to the location counter and returns the data block it emits.
    ///
    /// # Errors
    ///
    /// Fails when an origin or reservation size is out of range.
    pub(crate) fn construct(
        self,
        ctx: &mut Context,
        arguments: &Captures,
    ) -> Result<Option<i64>, AssemblerError> {
        match self {
            Self::Org => {
                let address = required(arguments, ADDRESS)?;
                let range = OperandRange::new("Address", 0, i64::from(u32::MAX));
                ctx.current_address = ctx.resolve_integer(address, range)?;
                Ok(None)
            }
            Self::ToyOrg => {
                let address = required(arguments, ADDRESS)?;
                let range = OperandRange::new("Address", ctx.current_address, ctx.address_max);
                ctx.current_address = ctx.resolve_integer(address, range)?;
                ctx.auto_org = false;
                Ok(None)
            }
            Self::Dup => {
                let count = required(arguments, COUNT)?;
                let range = OperandRange::new("Size", 1, ctx.address_max + 1 - ctx.current_address);
                Ok(Some(ctx.resolve_integer(count, range)?))
            }
            Self::Word => {
                let values = arguments.tokens(HEAD).len() + arguments.tokens(TAIL).len();
                Ok(Some(cell_count(values) * 4))
            }
            Self::Dw => Ok(Some(cell_count(arguments.tokens(VALUES).len()))),
        }
    }

    /// Resolves the data values of an emitted block.
    ///
    /// # Errors
    ///
    /// Fails when a value is out of range or a label is undefined.
    pub(crate) fn resolve(
        self,
        inst: &AsmInstruction,
        ctx: &Context,
    ) -> Result<Operands, AssemblerError> {
        match self {
            Self::Word => {
                let integer = OperandRange::new("Integer value", -(1 << 31), i64::from(u32::MAX));
                let label = OperandRange::new("Address", 0, i64::from(u32::MAX));
                let tokens = inst.arguments.tokens(HEAD).iter().chain(inst.arguments.tokens(TAIL));
                let values = tokens
                    .map(|token| {
                        let value = if token.kind == TokenKind::Integer {
                            ctx.resolve_integer(token, integer)?
                        } else {
                            ctx.resolve_label(token, label)?
                        };
                        Ok(value.rem_euclid(1 << 32).unsigned_abs())
                    })
                    .collect::<Result<_, AssemblerError>>()?;
                Ok(Operands::Data(values))
            }
            Self::Dw => {
                let range = OperandRange::new("Integer value", 0, 0xFFFF);
                let values = inst
                    .arguments
                    .tokens(VALUES)
                    .iter()
                    .map(|token| ctx.resolve_integer(token, range).map(|v| v.unsigned_abs()))
                    .collect::<Result<_, AssemblerError>>()?;
                Ok(Operands::Data(values))
            }
            Self::Dup => Ok(Operands::Data(vec![0; usize::try_from(inst.size).unwrap_or(0)])),
            Self::Org | Self::ToyOrg => Ok(Operands::Data(Vec::new())),
        }
    }

    /// Cells occupied by one data value.
    #[must_use]
    pub const fn value_cells(self) -> usize {
        match self {
            Self::Word => 4,
            _ => 1,
        }
    }
}

fn cell_count(values: usize) -> i64 {
    i64::try_from(values).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::AssemblerConfig;
    use crate::lexer::{tokenize, Syntax};

    fn captures(directive: Directive, syntax: Syntax, source: &str) -> Captures {
        let tokens = tokenize(source, syntax).unwrap();
        let pattern = Pattern::arguments(directive.arguments(), syntax.separator);
        pattern.parse(&tokens, 0).unwrap().captures
    }

    #[test]
    fn word_sizes_four_bytes_per_value() {
        let args = captures(Directive::Word, Syntax::riscv(), "5, 6, 7");
        let mut ctx = Context::new(&AssemblerConfig::riscv());
        assert_eq!(Directive::Word.construct(&mut ctx, &args), Ok(Some(12)));
    }

    #[test]
    fn dw_accepts_optional_commas() {
        let args = captures(Directive::Dw, Syntax::toy(), "1, 2 3");
        let mut ctx = Context::new(&AssemblerConfig::toy());
        assert_eq!(Directive::Dw.construct(&mut ctx, &args), Ok(Some(3)));
    }

    #[test]
    fn toy_org_cannot_move_backwards_and_disables_auto_org() {
        let args = captures(Directive::ToyOrg, Syntax::toy(), "0x20");
        let mut ctx = Context::new(&AssemblerConfig::toy());
        assert_eq!(Directive::ToyOrg.construct(&mut ctx, &args), Ok(None));
        assert_eq!(ctx.current_address, 0x20);
        assert!(!ctx.auto_org);

        ctx.current_address = 0x30;
        let err = Directive::ToyOrg.construct(&mut ctx, &args).unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "Address 32 is not in the valid range [48,255]!"
        );
    }

    #[test]
    fn dup_is_bounded_by_remaining_memory() {
        let mut ctx = Context::new(&AssemblerConfig::toy());
        ctx.current_address = 0xF0;
        let ok = captures(Directive::Dup, Syntax::toy(), "16");
        assert_eq!(Directive::Dup.construct(&mut ctx, &ok), Ok(Some(16)));
        let too_many = captures(Directive::Dup, Syntax::toy(), "17");
        assert!(Directive::Dup.construct(&mut ctx, &too_many).is_err());
    }
}
