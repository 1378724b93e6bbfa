//! Parse and grammar-construction errors.

use std::fmt;
use std::ops::Range;

use crate::lexer::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    Internal,
    Io,
    UnexpectedEof,
    UnexpectedChar,
    UnexpectedToken,
    InvalidToken,
}

/// One lexical or syntactic error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Offending text for unexpected input, the message otherwise.
    pub message: String,
    /// Descriptions of the tokens that would have been accepted.
    pub expected: Vec<String>,
    pub position: Position,
    pub span: Range<usize>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
        span: Range<usize>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: Vec::new(),
            position,
            span,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    /// Message without the position prefix.
    pub fn description(&self) -> String {
        let mut out = match self.kind {
            ParseErrorKind::Internal => format!("internal error: {}", self.message),
            ParseErrorKind::Io => format!("input error: {}", self.message),
            ParseErrorKind::UnexpectedEof => "unexpected end of input".to_string(),
            ParseErrorKind::UnexpectedChar => format!("unexpected character '{}'", self.message),
            ParseErrorKind::UnexpectedToken => format!("unexpected token \"{}\"", self.message),
            ParseErrorKind::InvalidToken => self.message.clone(),
        };
        match self.expected.as_slice() {
            [] => {}
            [only] => out.push_str(&format!(", expected {only}")),
            many => out.push_str(&format!(", expected one of {}", many.join(", "))),
        }
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.description())
    }
}

impl std::error::Error for ParseError {}

/// Errors of one parse, in the order they were found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseLog {
    errors: Vec<ParseError>,
}

impl ParseLog {
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }
}

impl fmt::Display for ParseLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseLog {}

impl From<ParseError> for ParseLog {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrammarErrorKind {
    InvalidParser,
    InvalidToken,
    InvalidProduction,
    InfiniteLoop,
    InherentAmbiguity,
}

/// Grammar rejected while being built or prepared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    /// Name of the offending token or production pattern.
    pub pattern: String,
    pub detail: String,
}

impl GrammarError {
    pub fn new(kind: GrammarErrorKind, pattern: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d) = (&self.pattern, &self.detail);
        match self.kind {
            GrammarErrorKind::InvalidParser => write!(f, "invalid parser: {d}"),
            GrammarErrorKind::InvalidToken => write!(f, "invalid token `{p}`: {d}"),
            GrammarErrorKind::InvalidProduction => write!(f, "invalid production `{p}`: {d}"),
            GrammarErrorKind::InfiniteLoop => write!(f, "infinite loop in production `{p}`"),
            GrammarErrorKind::InherentAmbiguity => {
                write!(f, "inherent ambiguity in production `{p}`: {d}")
            }
        }
    }
}

impl std::error::Error for GrammarError {}
