//! Token-pattern combinators and the line grammar built from them.
//!
//! A [`Pattern`] consumes tokens from a slice and records named captures.
//! Matching is greedy without backtracking: alternatives are tried in order
//! and the first success wins, repetitions consume as many matches as they
//! can. When a pattern fails, the failure that reached furthest into the
//! token stream is reported, merged with every other failure at the same
//! token.

use std::collections::BTreeMap;
use std::ops::{Add, BitOr};

use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::lexer::{Separator, Syntax, Token, TokenKind};

/// Capture name of a line's label.
pub const LABEL: &str = "_label";
/// Capture name of a line's mnemonic.
pub const MNEMONIC: &str = "_mnemonic";
/// Token kinds accepted where a label is expected.
pub const LABEL_KINDS: [TokenKind; 2] = [TokenKind::Word, TokenKind::Register];

/// Composable token pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches nothing and always succeeds.
    Empty,
    /// Consumes one token whose kind is listed and, when `values` is set,
    /// whose text equals one of the values ignoring case.
    Match {
        /// Accepted token kinds.
        kinds: Vec<TokenKind>,
        /// Accepted token texts.
        values: Option<Vec<String>>,
        /// Capture name for the consumed token.
        name: Option<&'static str>,
    },
    /// Matches each pattern in turn; later captures overwrite earlier ones.
    Sequence(Vec<Pattern>),
    /// Tries each pattern from the same start; the first success wins.
    Alternatives(Vec<Pattern>),
    /// Greedily matches `pattern` between `min` and `max` times.
    Repetition {
        /// Repeated pattern.
        pattern: Box<Pattern>,
        /// Required matches.
        min: usize,
        /// Match limit, unbounded when `None`.
        max: Option<usize>,
    },
}

impl Pattern {
    /// Matches a single token of `kind`.
    #[must_use]
    pub fn token(kind: TokenKind) -> Self {
        Self::any_of(&[kind])
    }

    /// Matches a single token of `kind` and captures it as `name`.
    #[must_use]
    pub fn capture(kind: TokenKind, name: &'static str) -> Self {
        Self::Match {
            kinds: vec![kind],
            values: None,
            name: Some(name),
        }
    }

    /// Matches a single token of any of `kinds`.
    #[must_use]
    pub fn any_of(kinds: &[TokenKind]) -> Self {
        Self::Match {
            kinds: kinds.to_vec(),
            values: None,
            name: None,
        }
    }

    /// Matches a single token of any of `kinds` and captures it as `name`.
    #[must_use]
    pub fn capture_any(kinds: &[TokenKind], name: &'static str) -> Self {
        Self::Match {
            kinds: kinds.to_vec(),
            values: None,
            name: Some(name),
        }
    }

    /// Matches a token of one of `kinds` whose text is one of `values`.
    #[must_use]
    pub fn keyword(kinds: &[TokenKind], values: &[&str], name: Option<&'static str>) -> Self {
        Self::Match {
            kinds: kinds.to_vec(),
            values: Some(values.iter().map(|v| (*v).to_string()).collect()),
            name,
        }
    }

    /// Matches `pattern` zero or one time.
    #[must_use]
    pub fn optional(pattern: Self) -> Self {
        match pattern {
            Self::Empty => Self::Empty,
            repeated @ Self::Repetition {
                min: 0,
                max: Some(1),
                ..
            } => repeated,
            other => Self::repeat(other, 0, Some(1)),
        }
    }

    /// Matches `pattern` between `min` and `max` times.
    #[must_use]
    pub fn repeat(pattern: Self, min: usize, max: Option<usize>) -> Self {
        Self::Repetition {
            pattern: Box::new(pattern),
            min,
            max,
        }
    }

    /// Sequence of `patterns`, collapsing trivial cases.
    #[must_use]
    pub fn sequence(patterns: impl IntoIterator<Item = Self>) -> Self {
        let mut parts = Vec::new();
        for pattern in patterns {
            match pattern {
                Self::Empty => {}
                Self::Sequence(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Self::Empty,
            1 => parts.pop().unwrap_or(Self::Empty),
            _ => Self::Sequence(parts),
        }
    }

    /// Alternatives of `patterns`, collapsing trivial cases.
    #[must_use]
    pub fn alternatives(patterns: impl IntoIterator<Item = Self>) -> Self {
        let mut parts: Vec<Self> = patterns.into_iter().collect();
        match parts.len() {
            0 => Self::Empty,
            1 => parts.pop().unwrap_or(Self::Empty),
            _ => Self::Alternatives(parts),
        }
    }

    /// Interleaves `arguments` with `separator`.
    #[must_use]
    pub fn arguments(arguments: Vec<Self>, separator: Separator) -> Self {
        let mut parts = Vec::with_capacity(arguments.len() * 2);
        for (index, argument) in arguments.into_iter().enumerate() {
            if index > 0 {
                parts.push(separator_pattern(separator));
            }
            parts.push(argument);
        }
        Self::sequence(parts)
    }

    /// Matches the pattern against `tokens` starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns the furthest-reaching failure.
    pub fn parse(&self, tokens: &[Token], index: usize) -> Result<Matched, ParseFailure> {
        match self {
            Self::Empty => Ok(Matched::empty(index)),
            Self::Match {
                kinds,
                values,
                name,
            } => {
                let Some(token) = token_at(tokens, index) else {
                    return Err(ParseFailure::kinds(index, kinds));
                };
                if !kinds.contains(&token.kind) {
                    return Err(ParseFailure::kinds(index, kinds));
                }
                if let Some(values) = values {
                    if !values.iter().any(|v| v.eq_ignore_ascii_case(&token.text)) {
                        return Err(ParseFailure::values(index, values));
                    }
                }
                let mut matched = Matched::empty(index + 1);
                if let Some(name) = *name {
                    matched.captures.insert(name, token.clone());
                }
                Ok(matched)
            }
            Self::Sequence(patterns) => {
                let mut matched = Matched::empty(index);
                let mut failures = Vec::new();
                for pattern in patterns {
                    match pattern.parse(tokens, matched.next) {
                        Ok(step) => {
                            failures.extend(step.muted);
                            matched.next = step.next;
                            matched.captures.overwrite(step.captures);
                        }
                        Err(failure) => {
                            failures.push(failure);
                            return Err(ParseFailure::furthest(failures)
                                .unwrap_or_else(|| ParseFailure::at(index)));
                        }
                    }
                }
                Ok(matched)
            }
            Self::Alternatives(patterns) => {
                let mut failures = Vec::new();
                for pattern in patterns {
                    match pattern.parse(tokens, index) {
                        Ok(matched) => return Ok(matched),
                        Err(failure) => failures.push(failure),
                    }
                }
                ParseFailure::furthest(failures).map_or_else(|| Ok(Matched::empty(index)), Err)
            }
            Self::Repetition { pattern, min, max } => {
                let mut results = Vec::new();
                let mut next = index;
                let mut last_failure = None;
                loop {
                    match pattern.parse(tokens, next) {
                        Ok(matched) => {
                            let progressed = matched.next != next;
                            next = matched.next;
                            last_failure.clone_from(&matched.muted);
                            results.push(matched);
                            if !progressed || max.is_some_and(|max| results.len() >= max) {
                                break;
                            }
                        }
                        Err(failure) => {
                            last_failure = Some(failure);
                            break;
                        }
                    }
                }
                if results.len() < *min {
                    return Err(last_failure.unwrap_or_else(|| ParseFailure::at(next)));
                }
                if results.len() == 1 && *max == Some(1) {
                    let mut single = results.pop().unwrap_or_else(|| Matched::empty(next));
                    single.muted = last_failure;
                    return Ok(single);
                }
                let mut captures = Captures::default();
                for result in results {
                    captures.append_as_lists(result.captures);
                }
                Ok(Matched {
                    next,
                    captures,
                    muted: last_failure,
                })
            }
        }
    }
}

impl Add for Pattern {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::sequence([self, rhs])
    }
}

impl BitOr for Pattern {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        let mut parts = match self {
            Self::Alternatives(parts) => parts,
            other => vec![other],
        };
        parts.push(rhs);
        Self::alternatives(parts)
    }
}

fn separator_pattern(separator: Separator) -> Pattern {
    match separator {
        Separator::Comma => Pattern::token(TokenKind::Comma),
        Separator::OptionalComma => Pattern::optional(Pattern::token(TokenKind::Comma)),
    }
}

/// Token at `index`, or the final token once the stream is exhausted.
fn token_at(tokens: &[Token], index: usize) -> Option<&Token> {
    tokens.get(index).or_else(|| tokens.last())
}

/// Tokens captured under one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Captured once.
    Single(Token),
    /// Captured inside a repetition.
    List(Vec<Token>),
}

impl Capture {
    /// All captured tokens in source order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        match self {
            Self::Single(token) => std::slice::from_ref(token),
            Self::List(tokens) => tokens,
        }
    }

    fn into_tokens(self) -> Vec<Token> {
        match self {
            Self::Single(token) => vec![token],
            Self::List(tokens) => tokens,
        }
    }
}

/// Named captures of a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    entries: BTreeMap<&'static str, Capture>,
}

impl Captures {
    /// Capture stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Capture> {
        self.entries.get(name)
    }

    /// Token captured once under `name`.
    #[must_use]
    pub fn token(&self, name: &str) -> Option<&Token> {
        match self.entries.get(name)? {
            Capture::Single(token) => Some(token),
            Capture::List(_) => None,
        }
    }

    /// Every token captured under `name`, empty when absent.
    #[must_use]
    pub fn tokens(&self, name: &str) -> &[Token] {
        self.entries.get(name).map_or(&[], Capture::tokens)
    }

    /// Returns `true` when `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Capture names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Removes and returns the single token captured under `name`.
    pub fn take(&mut self, name: &str) -> Option<Token> {
        match self.entries.remove(name)? {
            Capture::Single(token) => Some(token),
            Capture::List(tokens) => tokens.into_iter().next(),
        }
    }

    fn insert(&mut self, name: &'static str, token: Token) {
        self.entries.insert(name, Capture::Single(token));
    }

    fn overwrite(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    fn append_as_lists(&mut self, other: Self) {
        for (name, capture) in other.entries {
            let mut list = self
                .entries
                .remove(name)
                .map_or_else(Vec::new, Capture::into_tokens);
            list.extend(capture.into_tokens());
            self.entries.insert(name, Capture::List(list));
        }
    }
}

/// Successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    /// Index of the first unconsumed token.
    pub next: usize,
    /// Named captures.
    pub captures: Captures,
    /// Failure swallowed by an optional or repeated sub-pattern.
    pub muted: Option<ParseFailure>,
}

impl Matched {
    fn empty(next: usize) -> Self {
        Self {
            next,
            captures: Captures::default(),
            muted: None,
        }
    }
}

/// Failed match with the expectations at the failing token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Index of the token that did not match.
    pub index: usize,
    /// Token kinds that would have matched.
    pub expected_kinds: Vec<TokenKind>,
    /// Token texts that would have matched.
    pub expected_values: Vec<String>,
}

impl ParseFailure {
    const fn at(index: usize) -> Self {
        Self {
            index,
            expected_kinds: Vec::new(),
            expected_values: Vec::new(),
        }
    }

    fn kinds(index: usize, kinds: &[TokenKind]) -> Self {
        Self {
            expected_kinds: kinds.to_vec(),
            ..Self::at(index)
        }
    }

    fn values(index: usize, values: &[String]) -> Self {
        Self {
            expected_values: values.to_vec(),
            ..Self::at(index)
        }
    }

    /// Keeps the failures at the furthest token and merges their expectations.
    #[must_use]
    pub fn furthest(failures: Vec<Self>) -> Option<Self> {
        let index = failures.iter().map(|f| f.index).max()?;
        let mut merged = Self::at(index);
        for failure in failures.into_iter().filter(|f| f.index == index) {
            for kind in failure.expected_kinds {
                if !merged.expected_kinds.contains(&kind) {
                    merged.expected_kinds.push(kind);
                }
            }
            for value in failure.expected_values {
                if !merged.expected_values.contains(&value) {
                    merged.expected_values.push(value);
                }
            }
        }
        Some(merged)
    }

    /// Renders the expectation against the token actually found.
    ///
    /// Value expectations take precedence over kind expectations.
    #[must_use]
    pub fn message(&self, found: Option<&Token>) -> String {
        if !self.expected_values.is_empty() {
            let mut values: Vec<String> = self
                .expected_values
                .iter()
                .map(|value| format!("'{value}'"))
                .collect();
            values.sort();
            let found = found.map_or("", |token| token.text.as_str());
            return format!("Expected {} but found '{found}'!", join_choices(&values));
        }
        let mut kinds: Vec<String> = self.expected_kinds.iter().map(ToString::to_string).collect();
        kinds.sort();
        let found = found.map_or_else(|| TokenKind::Eof.to_string(), |token| token.kind.to_string());
        format!("Expected {} but found {found} instead!", join_choices(&kinds))
    }

    /// Converts the failure into a located syntax error.
    #[must_use]
    pub fn into_error(self, tokens: &[Token]) -> AssemblerError {
        let found = token_at(tokens, self.index);
        let error = AssemblerError::new(AssemblerErrorKind::Syntax {
            message: self.message(found),
        });
        match found {
            Some(token) => AssemblerError {
                location: Some(token.position),
                ..error
            }
            .with_token(token.text.clone()),
            None => error,
        }
    }
}

fn join_choices(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

/// One parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Label bound at the start of the line.
    pub label: Option<Token>,
    /// Mnemonic or directive token.
    pub mnemonic: Option<Token>,
    /// Argument captures.
    pub arguments: Captures,
}

/// Grammar of a whole line for a fixed set of mnemonics:
///
/// ```text
/// (label sep? mnemonic args)? comment? (newline | eof)
/// ```
///
/// A label-only line is accepted when the dialect terminates labels with `:`.
#[derive(Debug, Clone)]
pub struct LineParser {
    pattern: Pattern,
}

impl LineParser {
    /// Builds the line grammar from `(mnemonic, argument patterns)` pairs.
    #[must_use]
    pub fn new(
        syntax: Syntax,
        mnemonics: impl IntoIterator<Item = (&'static str, Vec<Pattern>)>,
    ) -> Self {
        let instruction = Pattern::alternatives(mnemonics.into_iter().map(|(mnemonic, args)| {
            Pattern::keyword(&[TokenKind::Word], &[mnemonic], Some(MNEMONIC))
                + Pattern::arguments(args, syntax.separator)
        }));
        let empty_line = Pattern::optional(Pattern::token(TokenKind::Comment))
            + Pattern::any_of(&[TokenKind::Newline, TokenKind::Eof]);
        let without_label = instruction + empty_line.clone();

        let mut with_label = Pattern::capture_any(&LABEL_KINDS, LABEL);
        if syntax.label_colon {
            with_label = with_label + Pattern::token(TokenKind::Colon);
        }
        let with_label = with_label + without_label.clone();

        let mut pattern = empty_line.clone() | without_label | with_label;
        if syntax.label_colon {
            pattern = pattern
                | (Pattern::capture_any(&LABEL_KINDS, LABEL)
                    + Pattern::token(TokenKind::Colon)
                    + empty_line);
        }
        Self { pattern }
    }

    /// Parses the line starting at `index`; returns it with the index of the next line.
    ///
    /// # Errors
    ///
    /// Returns a syntax error located at the furthest token reached.
    pub fn parse_line(
        &self,
        tokens: &[Token],
        index: usize,
    ) -> Result<(ParsedLine, usize), AssemblerError> {
        let matched = self
            .pattern
            .parse(tokens, index)
            .map_err(|failure| failure.into_error(tokens))?;
        let mut arguments = matched.captures;
        let line = ParsedLine {
            label: arguments.take(LABEL),
            mnemonic: arguments.take(MNEMONIC),
            arguments,
        };
        Ok((line, matched.next))
    }

    /// Parses every line of a token stream ending in [`TokenKind::Eof`].
    ///
    /// # Errors
    ///
    /// Returns the first syntax error.
    pub fn parse_all(&self, tokens: &[Token]) -> Result<Vec<ParsedLine>, AssemblerError> {
        let mut lines = Vec::new();
        let mut index = 0;
        while token_at(tokens, index).is_some_and(|token| token.kind != TokenKind::Eof) {
            let (line, next) = self.parse_line(tokens, index)?;
            index = next;
            lines.push(line);
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::lexer::tokenize;

    fn riscv(source: &str) -> Vec<Token> {
        tokenize(source, Syntax::riscv()).unwrap()
    }

    fn register(name: &'static str) -> Pattern {
        Pattern::capture(TokenKind::Register, name)
    }

    #[test]
    fn sequence_captures_named_tokens() {
        let tokens = riscv("x1, x2");
        let pattern = register("rd") + Pattern::token(TokenKind::Comma) + register("rs1");
        let matched = pattern.parse(&tokens, 0).unwrap();
        assert_eq!(matched.next, 3);
        assert_eq!(matched.captures.token("rd").map(|t| t.value), Some(1));
        assert_eq!(matched.captures.token("rs1").map(|t| t.value), Some(2));
    }

    #[test]
    fn first_successful_alternative_wins() {
        let tokens = riscv("x5");
        let pattern = Pattern::capture_any(&[TokenKind::Word, TokenKind::Register], "label")
            | register("reg");
        let matched = pattern.parse(&tokens, 0).unwrap();
        assert!(matched.captures.contains("label"));
        assert!(!matched.captures.contains("reg"));
    }

    #[test]
    fn optional_keeps_single_capture() {
        let tokens = riscv("5");
        let pattern = Pattern::optional(Pattern::capture(TokenKind::Integer, "imm"));
        let matched = pattern.parse(&tokens, 0).unwrap();
        assert!(matches!(matched.captures.get("imm"), Some(Capture::Single(_))));
    }

    #[test]
    fn repetition_collects_lists() {
        let tokens = riscv("1, 2, 3");
        let element = Pattern::token(TokenKind::Comma) + Pattern::capture(TokenKind::Integer, "tail");
        let pattern = Pattern::capture(TokenKind::Integer, "head") + Pattern::repeat(element, 0, None);
        let matched = pattern.parse(&tokens, 0).unwrap();
        let tail: Vec<i64> = matched.captures.tokens("tail").iter().map(|t| t.value).collect();
        assert_eq!(tail, [2, 3]);
        assert_eq!(matched.next, 5);
    }

    #[test]
    fn repetition_below_minimum_fails() {
        let tokens = riscv("x1");
        let pattern = Pattern::repeat(Pattern::token(TokenKind::Integer), 1, None);
        let failure = pattern.parse(&tokens, 0).unwrap_err();
        assert_eq!(failure.expected_kinds, [TokenKind::Integer]);
    }

    #[test]
    fn furthest_failure_is_reported() {
        let tokens = riscv("x1, x2 x3");
        let short = register("a") + Pattern::token(TokenKind::Integer);
        let long = register("a")
            + Pattern::token(TokenKind::Comma)
            + register("b")
            + Pattern::token(TokenKind::Comma);
        let failure = (short | long).parse(&tokens, 0).unwrap_err();
        assert_eq!(failure.index, 3);
        assert_eq!(failure.expected_kinds, [TokenKind::Comma]);
    }

    #[test]
    fn muted_optional_failure_joins_the_report() {
        let tokens = riscv("x1 x2");
        let pattern = register("a")
            + Pattern::optional(Pattern::token(TokenKind::Integer))
            + Pattern::token(TokenKind::Comma);
        let failure = pattern.parse(&tokens, 0).unwrap_err();
        assert_eq!(failure.index, 1);
        let message = failure.message(tokens.get(1));
        assert_eq!(message, "Expected Comma or Integer but found Register instead!");
    }

    #[rstest]
    #[case(&["'ADD'"], "'ADD'")]
    #[case(&["'ADD'", "'SUB'"], "'ADD' or 'SUB'")]
    #[case(&["'ADD'", "'OR'", "'SUB'"], "'ADD', 'OR', or 'SUB'")]
    fn choices_join_like_prose(#[case] items: &[&str], #[case] expected: &str) {
        let items: Vec<String> = items.iter().map(|s| (*s).to_string()).collect();
        assert_eq!(join_choices(&items), expected);
    }

    #[test]
    fn keyword_mismatch_reports_values() {
        let tokens = riscv("FOO x1");
        let pattern = Pattern::keyword(&[TokenKind::Word], &["ADD"], Some(MNEMONIC))
            | Pattern::keyword(&[TokenKind::Word], &["SUB"], Some(MNEMONIC));
        let err = pattern.parse(&tokens, 0).unwrap_err().into_error(&tokens);
        assert_eq!(
            err.kind,
            AssemblerErrorKind::Syntax {
                message: "Expected 'ADD' or 'SUB' but found 'FOO'!".to_string()
            }
        );
        assert_eq!(err.token.as_deref(), Some("FOO"));
    }

    fn riscv_lines() -> LineParser {
        LineParser::new(
            Syntax::riscv(),
            [
                ("ADD", vec![register("rd"), register("rs1"), register("rs2")]),
                ("EBREAK", Vec::new()),
            ],
        )
    }

    #[test]
    fn line_parser_splits_label_mnemonic_and_arguments() {
        let tokens = riscv("start: add x1, x2, x3 # sum\n\nebreak");
        let lines = riscv_lines().parse_all(&tokens).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].label.as_ref().map(|t| t.text.as_str()), Some("start"));
        assert_eq!(lines[0].mnemonic.as_ref().map(|t| t.text.as_str()), Some("add"));
        assert_eq!(lines[0].arguments.token("rs2").map(|t| t.value), Some(3));
        assert!(lines[1].mnemonic.is_none());
        assert_eq!(lines[2].mnemonic.as_ref().map(|t| t.text.as_str()), Some("ebreak"));
    }

    #[test]
    fn label_only_line_needs_colon_dialect() {
        let tokens = riscv("done:\n");
        let lines = riscv_lines().parse_all(&tokens).unwrap();
        assert_eq!(lines[0].label.as_ref().map(|t| t.text.as_str()), Some("done"));
        assert!(lines[0].mnemonic.is_none());
    }

    #[test]
    fn missing_separator_is_a_syntax_error() {
        let tokens = riscv("ADD x1 x2, x3");
        let err = riscv_lines().parse_all(&tokens).unwrap_err();
        assert_eq!(
            err.kind,
            AssemblerErrorKind::Syntax {
                message: "Expected Comma but found Register instead!".to_string()
            }
        );
        assert_eq!(err.location.map(|p| p.column), Some(8));
    }

    #[test]
    fn toy_lines_accept_optional_commas_and_leading_labels() {
        let parser = LineParser::new(
            Syntax::toy(),
            [("ADD", vec![register("rd"), register("rs"), register("rt")])],
        );
        let tokens = tokenize("LOOP ADD R1, R2 R3", Syntax::toy()).unwrap();
        let lines = parser.parse_all(&tokens).unwrap();
        assert_eq!(lines[0].label.as_ref().map(|t| t.text.as_str()), Some("LOOP"));
        assert_eq!(lines[0].arguments.token("rt").map(|t| t.value), Some(3));
    }
}
