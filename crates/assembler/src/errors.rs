//! Structured error reporting for assembler phases.
//!
//! Every failure carries an [`AssemblerErrorKind`], the source position of the
//! offending token when one exists, and the token text. Errors render in the
//! usual compiler style:
//!
//! ```text
//! 3:9: error: Immediate/Offset 5000 is not in the valid range [-2048,4095]!
//! ```

use std::fmt;

use simulator_core::EncodingError;
use thiserror::Error;

use crate::lexer::{Position, Token};

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerErrorKind {
    /// A character that starts no token of the dialect.
    #[error("unexpected character {character:?}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
    },
    /// Integer literal that is malformed or does not fit 64 bits.
    #[error("invalid integer literal '{text}'")]
    InvalidInteger {
        /// Literal as written.
        text: String,
    },
    /// Mnemonic without a registered description.
    #[error("unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic {
        /// Mnemonic as written.
        mnemonic: String,
    },
    /// Operand capture absent from a matched line.
    #[error("missing operand '{operand}'")]
    MissingOperand {
        /// Capture name.
        operand: &'static str,
    },
    /// The line grammar rejected the furthest token reached.
    #[error("{message}")]
    Syntax {
        /// Rendered expectation message.
        message: String,
    },
    /// Integer operand outside its accepted range.
    #[error("{name} {value} is not in the valid range [{min},{max}]!")]
    OutOfRange {
        /// Operand role, e.g. `Register number`.
        name: String,
        /// Supplied value.
        value: i64,
        /// Lowest accepted value.
        min: i64,
        /// Highest accepted value.
        max: i64,
    },
    /// Integer operand violating its alignment.
    #[error("{name} {value} is incorrectly aligned (mod {alignment} != 0)!")]
    Misaligned {
        /// Operand role.
        name: String,
        /// Supplied value.
        value: i64,
        /// Required alignment.
        alignment: i64,
    },
    /// Label referenced but never defined.
    #[error("Label '{label}' is not defined!")]
    UndefinedLabel {
        /// Label name.
        label: String,
    },
    /// Label address outside the operand range.
    #[error("Label '{label}' at address {address} is out of range [{min},{max}]!")]
    LabelOutOfRange {
        /// Label name.
        label: String,
        /// Bound address.
        address: i64,
        /// Lowest accepted address.
        min: i64,
        /// Highest accepted address.
        max: i64,
    },
    /// Label address violating the operand alignment.
    #[error("Label '{label}' at address {address} is incorrectly aligned (mod {alignment} != 0)!")]
    LabelMisaligned {
        /// Label name.
        label: String,
        /// Bound address.
        address: i64,
        /// Required alignment.
        alignment: i64,
    },
    /// Label-relative offset outside the operand range.
    #[error("Relative offset ({offset}) to the label '{label}' is out of range [{min},{max}]!")]
    OffsetOutOfRange {
        /// Label name.
        label: String,
        /// Label address minus instruction address.
        offset: i64,
        /// Lowest accepted offset.
        min: i64,
        /// Highest accepted offset.
        max: i64,
    },
    /// Label-relative offset violating the operand alignment.
    #[error("Relative offset ({offset}) to the label '{label}' is incorrectly aligned (mod {alignment} != 0)!")]
    OffsetMisaligned {
        /// Label name.
        label: String,
        /// Label address minus instruction address.
        offset: i64,
        /// Required alignment.
        alignment: i64,
    },
    /// Label bound twice.
    #[error("Redefinition of label '{label}'! First defined at {first}.")]
    DuplicateLabel {
        /// Label name.
        label: String,
        /// Position of the first definition.
        first: Position,
    },
    /// Instruction placed outside the assembler's address space.
    #[error("Address space [{min},{max}] overflow! Instruction can not be placed at address {address} (0x{address:x}).")]
    AddressSpaceOverflow {
        /// Requested address.
        address: i64,
        /// Lowest address.
        min: i64,
        /// Highest address.
        max: i64,
    },
    /// Two instructions or data blocks claim the same cell.
    #[error("Overlapping code at address {address} (0x{address:x})!")]
    OverlappingCode {
        /// First doubly-claimed address.
        address: i64,
    },
    /// Resolved fields could not be packed into the encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Error raised by any assembler phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerError {
    /// Kind of error.
    pub kind: AssemblerErrorKind,
    /// Position of the offending token, when known.
    pub location: Option<Position>,
    /// Text of the offending token, when known.
    pub token: Option<String>,
}

impl AssemblerError {
    /// Creates an error without location.
    #[must_use]
    pub const fn new(kind: AssemblerErrorKind) -> Self {
        Self {
            kind,
            location: None,
            token: None,
        }
    }

    /// Creates an error at `position`.
    #[must_use]
    pub const fn at(kind: AssemblerErrorKind, position: Position) -> Self {
        Self {
            kind,
            location: Some(position),
            token: None,
        }
    }

    /// Creates an error located at `token`, carrying its text.
    #[must_use]
    pub fn at_token(kind: AssemblerErrorKind, token: &Token) -> Self {
        Self::at(kind, token.position).with_token(token.text.clone())
    }

    /// Attaches the offending token text.
    #[must_use]
    pub fn with_token(mut self, text: impl Into<String>) -> Self {
        self.token = Some(text.into());
        self
    }

    /// Formats the error for a diagnostic stream.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(position) => write!(f, "{position}: error: {}", self.kind),
            None => write!(f, "error: {}", self.kind),
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<AssemblerErrorKind> for AssemblerError {
    fn from(kind: AssemblerErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_error_formats_with_position() {
        let err = AssemblerError::at(
            AssemblerErrorKind::OutOfRange {
                name: "Address".to_string(),
                value: 257,
                min: 0,
                max: 255,
            },
            Position { line: 2, column: 7 },
        );
        assert_eq!(
            err.format_for_stderr(),
            "2:7: error: Address 257 is not in the valid range [0,255]!"
        );
    }

    #[test]
    fn unlocated_error_omits_position() {
        let err = AssemblerError::new(AssemblerErrorKind::OverlappingCode { address: 16 });
        assert_eq!(err.to_string(), "error: Overlapping code at address 16 (0x10)!");
    }

    #[test]
    fn label_messages_quote_the_name() {
        let kind = AssemblerErrorKind::UndefinedLabel {
            label: "loop".to_string(),
        };
        assert_eq!(kind.to_string(), "Label 'loop' is not defined!");
    }
}
