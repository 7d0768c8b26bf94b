//! Tokenizer for line-oriented assembly source.
//!
//! The lexer is configured by a [`Syntax`] describing the comment character,
//! the register grammar and which punctuation is meaningful for the ISA.
//! Comments and newlines are kept as tokens because the line grammar relies
//! on them; every stream ends with exactly one [`TokenKind::Eof`].

use std::fmt;

use simulator_core::isa::{riscv, toy};

use crate::errors::{AssemblerError, AssemblerErrorKind};

/// Token classes produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// Comment up to the end of the line.
    Comment,
    /// Decimal or hexadecimal literal with optional sign.
    Integer,
    /// `(`
    LBracket,
    /// `)`
    RBracket,
    /// Line break.
    Newline,
    /// Register name accepted by the ISA's register grammar.
    Register,
    /// Identifier: mnemonic, directive or label.
    Word,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Colon => "Colon",
            Self::Comma => "Comma",
            Self::Comment => "Comment",
            Self::Integer => "Integer",
            Self::LBracket => "Opening Bracket",
            Self::RBracket => "Closing Bracket",
            Self::Newline => "Newline",
            Self::Register => "Register",
            Self::Word => "Word",
            Self::Eof => "EOF",
        })
    }
}

/// 1-indexed source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number.
    pub line: usize,
    /// Column number, counted in characters.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token class.
    pub kind: TokenKind,
    /// Source text as written.
    pub text: String,
    /// Literal value for integers, register index for registers, else 0.
    pub value: i64,
    /// Position of the first character.
    pub position: Position,
}

/// How instruction arguments are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Arguments must be separated by `,`.
    Comma,
    /// Arguments may be separated by `,` or by whitespace only.
    OptionalComma,
}

/// Lexical and line-grammar settings of one assembly dialect.
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    /// Character starting a line comment.
    pub comment: char,
    /// Whether `(` and `)` are tokens.
    pub brackets: bool,
    /// Whether labels are terminated by `:`; otherwise a leading word is a label.
    pub label_colon: bool,
    /// Argument separator.
    pub separator: Separator,
    /// Register grammar returning the register index.
    pub register: fn(&str) -> Option<u8>,
}

impl Syntax {
    /// RISC-V: `#` comments, `label:`, comma-separated arguments, `imm(rs1)`.
    #[must_use]
    pub const fn riscv() -> Self {
        Self {
            comment: '#',
            brackets: true,
            label_colon: true,
            separator: Separator::Comma,
            register: riscv::register_index,
        }
    }

    /// TOY: `;` comments, leading-word labels, optional commas.
    #[must_use]
    pub const fn toy() -> Self {
        Self {
            comment: ';',
            brackets: false,
            label_colon: false,
            separator: Separator::OptionalComma,
            register: toy::register_index,
        }
    }
}

const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '.'
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Lazy token stream over a source string.
///
/// Cloning the lexer restarts scanning from the clone's position.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    syntax: Syntax,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer at the start of `source`.
    #[must_use]
    pub const fn new(source: &'a str, syntax: Syntax) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            syntax,
            finished: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, accept: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
    }

    fn token(&self, kind: TokenKind, start: usize, position: Position, value: i64) -> Token {
        Token {
            kind,
            text: self.source[start..self.offset].to_string(),
            value,
            position,
        }
    }

    fn integer(&mut self, start: usize, position: Position) -> Result<Token, AssemblerError> {
        let negative = self.peek() == Some('-');
        if negative {
            self.bump();
        }
        let hex = self.peek() == Some('0') && matches!(self.peek_second(), Some('x' | 'X'));
        if hex {
            self.bump();
            self.bump();
        }
        let digits_start = self.offset;
        self.bump_while(is_identifier_char);
        let digits = &self.source[digits_start..self.offset];
        let radix = if hex { 16 } else { 10 };
        let magnitude = i64::from_str_radix(digits, radix).map_err(|_| {
            AssemblerError::at(
                AssemblerErrorKind::InvalidInteger {
                    text: self.source[start..self.offset].to_string(),
                },
                position,
            )
        })?;
        let value = if negative { -magnitude } else { magnitude };
        Ok(self.token(TokenKind::Integer, start, position, value))
    }

    fn scan(&mut self) -> Option<Result<Token, AssemblerError>> {
        self.bump_while(|c| c == ' ' || c == '\t' || c == '\r');
        let start = self.offset;
        let position = Position {
            line: self.line,
            column: self.column,
        };
        let Some(c) = self.peek() else {
            if self.finished {
                return None;
            }
            self.finished = true;
            return Some(Ok(self.token(TokenKind::Eof, start, position, 0)));
        };

        let single = |kind| Some(kind);
        let punctuation = match c {
            '\n' => single(TokenKind::Newline),
            ',' => single(TokenKind::Comma),
            ':' if self.syntax.label_colon => single(TokenKind::Colon),
            '(' if self.syntax.brackets => single(TokenKind::LBracket),
            ')' if self.syntax.brackets => single(TokenKind::RBracket),
            _ => None,
        };
        if let Some(kind) = punctuation {
            self.bump();
            return Some(Ok(self.token(kind, start, position, 0)));
        }

        if c == self.syntax.comment {
            self.bump_while(|c| c != '\n');
            return Some(Ok(self.token(TokenKind::Comment, start, position, 0)));
        }

        if c.is_ascii_digit() || (c == '-' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
            return Some(self.integer(start, position));
        }

        if is_identifier_start(c) {
            self.bump_while(is_identifier_char);
            let text = &self.source[start..self.offset];
            let token = match (self.syntax.register)(text) {
                Some(index) => self.token(TokenKind::Register, start, position, i64::from(index)),
                None => self.token(TokenKind::Word, start, position, 0),
            };
            return Some(Ok(token));
        }

        self.bump();
        Some(Err(AssemblerError::at(
            AssemblerErrorKind::UnexpectedCharacter { character: c },
            position,
        )))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, AssemblerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan()
    }
}

/// Tokenizes `source` completely.
///
/// # Errors
///
/// Returns the first lexical error.
pub fn tokenize(source: &str, syntax: Syntax) -> Result<Vec<Token>, AssemblerError> {
    Lexer::new(source, syntax).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn kinds(source: &str, syntax: Syntax) -> Vec<TokenKind> {
        tokenize(source, syntax)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn riscv_load_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("loop: LW x1, -4(sp) # load\n", Syntax::riscv()),
            [Word, Colon, Word, Register, Comma, Integer, LBracket, Register, RBracket, Comment, Newline, Eof]
        );
    }

    #[test]
    fn integer_values_and_register_indices() {
        let tokens = tokenize("ADDI x5, a0, -0x10", Syntax::riscv()).unwrap();
        assert_eq!(tokens[1].value, 5);
        assert_eq!(tokens[3].value, 10);
        assert_eq!(tokens[5].value, -16);
        assert_eq!(tokens[5].text, "-0x10");
    }

    #[test]
    fn toy_registers_are_hex_digits() {
        let tokens = tokenize("LOOP ADD RA r2 R3 ; sum", Syntax::toy()).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[2].kind, TokenKind::Register);
        assert_eq!(tokens[2].value, 10);
        assert_eq!(tokens[3].value, 2);
        assert_eq!(tokens[5].kind, TokenKind::Comment);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("HLT\n  ADD R1 R2 R3", Syntax::toy()).unwrap();
        assert_eq!(tokens[2].position, Position { line: 2, column: 3 });
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn punctuation_outside_the_dialect_is_rejected() {
        let err = tokenize("LOOP: HLT", Syntax::toy()).unwrap_err();
        assert_eq!(
            err.kind,
            AssemblerErrorKind::UnexpectedCharacter { character: ':' }
        );
        assert_eq!(err.location, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn malformed_integer_is_rejected() {
        let err = tokenize(".word 12ab", Syntax::riscv()).unwrap_err();
        assert_eq!(
            err.kind,
            AssemblerErrorKind::InvalidInteger {
                text: "12ab".to_string()
            }
        );
    }

    #[test]
    fn lexer_is_restartable() {
        let mut lexer = Lexer::new("ADD x1, x2, x3", Syntax::riscv());
        lexer.next();
        let restarted: Vec<_> = lexer.clone().collect();
        assert_eq!(restarted, lexer.collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn hex_and_decimal_literals_agree(value in -(1_i64 << 40)..(1_i64 << 40)) {
            let sign = if value < 0 { "-" } else { "" };
            let source = format!("{value} {sign}0x{:X}", value.unsigned_abs());
            let tokens = tokenize(&source, Syntax::riscv()).unwrap();
            prop_assert_eq!(tokens[0].value, value);
            prop_assert_eq!(tokens[1].value, value);
        }
    }
}
