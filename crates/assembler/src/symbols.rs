//! Symbol table, location counter and operand resolution.
//!
//! The [`Context`] is threaded through every assembler pass. Pass 1 binds
//! labels and advances the location counter; pass 2 resolves operand tokens
//! against the completed symbol table. Resolution is a pure function of the
//! token and the table, so resolving an operand twice gives the same value.

use std::collections::HashMap;

use crate::assembler::AssemblerConfig;
use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::lexer::{Position, Token};

/// A symbol (label) with its assigned address and definition location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// The address assigned to this label.
    pub address: i64,
    /// Source position where the label was defined.
    pub defined_at: Position,
}

/// Symbol table mapping label names to their definitions.
///
/// Label names are case-sensitive.
pub type SymbolTable = HashMap<String, Symbol>;

/// Accepted values of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRange {
    /// Role named in error messages.
    pub name: &'static str,
    /// Lowest accepted value.
    pub min: i64,
    /// Highest accepted value.
    pub max: i64,
    /// Required alignment.
    pub alignment: i64,
}

impl OperandRange {
    /// Range `[min, max]` without alignment constraint.
    #[must_use]
    pub const fn new(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            min,
            max,
            alignment: 1,
        }
    }

    /// Same range, additionally requiring multiples of `alignment`.
    #[must_use]
    pub const fn aligned(self, alignment: i64) -> Self {
        Self { alignment, ..self }
    }

    const fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    const fn is_aligned(&self, value: i64) -> bool {
        self.alignment <= 1 || value % self.alignment == 0
    }
}

/// Assembly state shared by all passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Bound labels.
    pub symbols: SymbolTable,
    /// Location counter.
    pub current_address: i64,
    /// Move the first instruction to the program start until an explicit origin is set.
    pub auto_org: bool,
    /// Lowest address an instruction may occupy.
    pub address_min: i64,
    /// Highest address an instruction may occupy.
    pub address_max: i64,
}

impl Context {
    /// Fresh context for one assembly run.
    #[must_use]
    pub fn new(config: &AssemblerConfig) -> Self {
        Self {
            symbols: SymbolTable::new(),
            current_address: config.initial_address,
            auto_org: config.auto_org,
            address_min: config.address_min,
            address_max: config.address_max,
        }
    }

    /// Binds `label` to `address`.
    ///
    /// # Errors
    ///
    /// Fails when the label is already bound.
    pub fn define(&mut self, label: &Token, address: i64) -> Result<(), AssemblerError> {
        if let Some(first) = self.symbols.get(&label.text) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::DuplicateLabel {
                    label: label.text.clone(),
                    first: first.defined_at,
                },
                label,
            ));
        }
        self.symbols.insert(
            label.text.clone(),
            Symbol {
                address,
                defined_at: label.position,
            },
        );
        Ok(())
    }

    /// Checks that the instruction occupying `[address, address + size)` fits the address space.
    ///
    /// # Errors
    ///
    /// Fails with an address-space overflow located at `mnemonic`, naming the
    /// item's first address.
    pub fn check_placement(
        &self,
        mnemonic: &Token,
        address: i64,
        size: i64,
    ) -> Result<(), AssemblerError> {
        let last = address + size.max(1) - 1;
        if address < self.address_min || last > self.address_max {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::AddressSpaceOverflow {
                    address,
                    min: self.address_min,
                    max: self.address_max,
                },
                mnemonic,
            ));
        }
        Ok(())
    }

    /// Value of an integer (or register) token checked against `range`.
    ///
    /// # Errors
    ///
    /// Fails when the value is out of range or misaligned.
    pub fn resolve_integer(
        &self,
        token: &Token,
        range: OperandRange,
    ) -> Result<i64, AssemblerError> {
        let value = token.value;
        if !range.contains(value) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::OutOfRange {
                    name: range.name.to_string(),
                    value,
                    min: range.min,
                    max: range.max,
                },
                token,
            ));
        }
        if !range.is_aligned(value) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::Misaligned {
                    name: range.name.to_string(),
                    value,
                    alignment: range.alignment,
                },
                token,
            ));
        }
        Ok(value)
    }

    /// Address bound to a label token, checked against `range`.
    ///
    /// # Errors
    ///
    /// Fails when the label is unbound, out of range or misaligned.
    pub fn resolve_label(
        &self,
        token: &Token,
        range: OperandRange,
    ) -> Result<i64, AssemblerError> {
        let address = self.lookup(token)?;
        if !range.contains(address) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::LabelOutOfRange {
                    label: token.text.clone(),
                    address,
                    min: range.min,
                    max: range.max,
                },
                token,
            ));
        }
        if !range.is_aligned(address) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::LabelMisaligned {
                    label: token.text.clone(),
                    address,
                    alignment: range.alignment,
                },
                token,
            ));
        }
        Ok(address)
    }

    /// Offset from `address` to a label token, checked against `range`.
    ///
    /// # Errors
    ///
    /// Fails when the label is unbound or the offset is out of range or misaligned.
    pub fn resolve_label_offset(
        &self,
        token: &Token,
        address: i64,
        range: OperandRange,
    ) -> Result<i64, AssemblerError> {
        let offset = self.lookup(token)? - address;
        if !range.contains(offset) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::OffsetOutOfRange {
                    label: token.text.clone(),
                    offset,
                    min: range.min,
                    max: range.max,
                },
                token,
            ));
        }
        if !range.is_aligned(offset) {
            return Err(AssemblerError::at_token(
                AssemblerErrorKind::OffsetMisaligned {
                    label: token.text.clone(),
                    offset,
                    alignment: range.alignment,
                },
                token,
            ));
        }
        Ok(offset)
    }

    fn lookup(&self, token: &Token) -> Result<i64, AssemblerError> {
        self.symbols
            .get(&token.text)
            .map(|symbol| symbol.address)
            .ok_or_else(|| {
                AssemblerError::at_token(
                    AssemblerErrorKind::UndefinedLabel {
                        label: token.text.clone(),
                    },
                    token,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::lexer::TokenKind;

    fn token(kind: TokenKind, text: &str, value: i64) -> Token {
        Token {
            kind,
            text: text.to_string(),
            value,
            position: Position { line: 1, column: 1 },
        }
    }

    fn context() -> Context {
        let mut ctx = Context::new(&AssemblerConfig::riscv());
        ctx.define(&token(TokenKind::Word, "target", 0), 0x40).unwrap();
        ctx
    }

    #[rstest]
    #[case(-2048, true)]
    #[case(2047, true)]
    #[case(-2049, false)]
    #[case(2048, false)]
    fn integer_bounds_are_inclusive(#[case] value: i64, #[case] ok: bool) {
        let range = OperandRange::new("Immediate/Offset", -2048, 2047);
        let result = context().resolve_integer(&token(TokenKind::Integer, "", value), range);
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn misaligned_integer_is_reported_after_range() {
        let range = OperandRange::new("Offset", -4096, 4095).aligned(2);
        let err = context()
            .resolve_integer(&token(TokenKind::Integer, "3", 3), range)
            .unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "Offset 3 is incorrectly aligned (mod 2 != 0)!"
        );
    }

    #[test]
    fn label_offset_is_relative_to_instruction() {
        let range = OperandRange::new("Offset", -4096, 4095).aligned(2);
        let ctx = context();
        let label = token(TokenKind::Word, "target", 0);
        assert_eq!(ctx.resolve_label_offset(&label, 0x50, range), Ok(-0x10));
        assert_eq!(ctx.resolve_label(&label, OperandRange::new("Address", 0, 2047)), Ok(0x40));
    }

    #[test]
    fn label_outside_window_is_rejected() {
        let err = context()
            .resolve_label(
                &token(TokenKind::Word, "target", 0),
                OperandRange::new("Address", 0, 0x3F),
            )
            .unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "Label 'target' at address 64 is out of range [0,63]!"
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        let err = context()
            .resolve_label(&token(TokenKind::Word, "TARGET", 0), OperandRange::new("Address", 0, 255))
            .unwrap_err();
        assert_eq!(
            err.kind,
            AssemblerErrorKind::UndefinedLabel {
                label: "TARGET".to_string()
            }
        );
    }

    #[test]
    fn redefinition_names_first_definition() {
        let mut ctx = context();
        let err = ctx.define(&token(TokenKind::Word, "target", 0), 0x80).unwrap_err();
        assert!(matches!(err.kind, AssemblerErrorKind::DuplicateLabel { .. }));
        assert_eq!(ctx.symbols["target"].address, 0x40);
    }

    #[test]
    fn placement_outside_address_space_overflows() {
        let mut ctx = Context::new(&AssemblerConfig::toy());
        ctx.current_address = 0xFF;
        let mnemonic = token(TokenKind::Word, "DW", 0);
        assert!(ctx.check_placement(&mnemonic, 0xFF, 1).is_ok());
        let err = ctx.check_placement(&mnemonic, 0xFF, 2).unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "Address space [0,255] overflow! Instruction can not be placed at address 255 (0xff)."
        );
    }
}
