//! Two-pass assembler for the RISC-V subset and the TOY/S-TOY teaching ISA.
//!
//! Instruction encodings come from the `simulator-core` ISA tables, so the
//! assembler and the simulator always agree on the machine-code layout.

/// Top-level assembler pipeline.
pub mod assembler;
/// Assembler directives (`.org`, `.word`, `ORG`, `DUP`, `DW`).
pub mod directive;
/// Encoding pass and memory image layout.
pub mod encoder;
/// Structured assembler error types.
pub mod errors;
/// Dialect-aware tokenizer.
pub mod lexer;
/// Instruction-format argument grammars, operand resolution and encoding.
pub mod mnemonic;
/// Token-pattern combinators and the line grammar.
pub mod parser;
/// Symbol table and operand range checks.
pub mod symbols;

pub use assembler::{Assembler, AssemblerConfig, Assembly, ListingEntry};
pub use directive::Directive;
pub use errors::{AssemblerError, AssemblerErrorKind};
pub use lexer::{tokenize, Position, Separator, Syntax, Token, TokenKind};
pub use mnemonic::{AsmDescription, AsmInstruction, Operands};
pub use parser::{Captures, LineParser, ParsedLine, Pattern};
pub use symbols::{Context, OperandRange, Symbol, SymbolTable};

