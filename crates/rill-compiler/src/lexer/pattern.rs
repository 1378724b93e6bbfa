//! Token pattern definitions.

use std::fmt;

/// Token pattern identity. Lower ids win equal-length matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u16);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    /// Literal text.
    Exact,
    Regex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPattern {
    pub id: TokenId,
    pub name: String,
    pub kind: PatternKind,
    pub pattern: String,
    /// Matching this pattern is a lexical error with this message.
    pub error: Option<String>,
    /// Matched tokens are dropped from the parser's input.
    pub ignore: bool,
}

impl TokenPattern {
    pub fn exact(id: TokenId, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, name.into(), PatternKind::Exact, text.into())
    }

    pub fn regex(id: TokenId, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(id, name.into(), PatternKind::Regex, pattern.into())
    }

    fn new(id: TokenId, name: String, kind: PatternKind, pattern: String) -> Self {
        Self {
            id,
            name,
            kind,
            pattern,
            error: None,
            ignore: false,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Human-readable form used in "expected ..." lists.
    pub fn describe(&self) -> String {
        match self.kind {
            PatternKind::Exact => format!("\"{}\"", self.pattern),
            PatternKind::Regex => format!("<{}>", self.name),
        }
    }
}
