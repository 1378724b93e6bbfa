//! Semantic errors and their rendering.
//!
//! Syntax errors come out of the parser as a `ParseLog`; everything the tree
//! builder rejects is a `SemanticError`. Both end up as `Diagnostic`s for the
//! snippet printer.

mod printer;


use std::fmt;
use std::ops::Range;

use crate::grammar::ParseLog;
use crate::lexer::Position;

pub use printer::DiagnosticsPrinter;

/// Semantic error kinds, ordered from literal-level to typing-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemanticErrorKind {
    // Literals
    ConstantOverflow,
    InvalidFormat,

    // Name resolution
    UndefinedIdentifier,
    UndefinedFunction,
    UndefinedMember,
    UndefinedType,
    AmbiguousMatch,
    AccessDenied,

    // Typing
    OperationNotDefined,
    TypeMismatch,
    InvalidExplicitCast,

    // Malformed tree; never produced by well-formed input
    Internal,
}

impl SemanticErrorKind {
    /// Base message, used when no detail is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::ConstantOverflow => "constant value is out of range",
            Self::InvalidFormat => "invalid literal",
            Self::UndefinedIdentifier => "undefined identifier",
            Self::UndefinedFunction => "undefined function",
            Self::UndefinedMember => "undefined member",
            Self::UndefinedType => "undefined type",
            Self::AmbiguousMatch => "ambiguous match",
            Self::AccessDenied => "member is not accessible",
            Self::OperationNotDefined => "operation is not defined",
            Self::TypeMismatch => "type mismatch",
            Self::InvalidExplicitCast => "invalid explicit cast",
            Self::Internal => "internal compiler error",
        }
    }

    /// Template for messages with detail. Contains a `{}` placeholder.
    pub fn custom_message(&self) -> String {
        match self {
            Self::ConstantOverflow => "constant `{}` is out of range".to_string(),
            Self::UndefinedIdentifier => "`{}` is not defined".to_string(),
            Self::UndefinedFunction => "no function named `{}`".to_string(),
            Self::UndefinedType => "`{}` is not a known type".to_string(),
            Self::AccessDenied => "`{}` is not accessible".to_string(),
            Self::OperationNotDefined => "operation {}".to_string(),
            Self::InvalidExplicitCast => "cannot cast {}".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

/// An expression that parsed but does not make sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
    /// Byte range of the offending construct.
    pub span: Range<usize>,
    pub position: Position,
}

impl SemanticError {
    pub fn new(
        kind: SemanticErrorKind,
        detail: Option<&str>,
        span: Range<usize>,
        position: Position,
    ) -> Self {
        Self {
            kind,
            message: kind.message(detail),
            span,
            position,
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

impl std::error::Error for SemanticError {}

/// One renderable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub position: Position,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(e: &SemanticError) -> Self {
        Self {
            message: e.message.clone(),
            span: e.span.clone(),
            position: e.position,
        }
    }
}

/// Ordered diagnostics of one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}

impl From<&ParseLog> for Diagnostics {
    fn from(log: &ParseLog) -> Self {
        Self {
            items: log
                .iter()
                .map(|e| Diagnostic {
                    message: e.description(),
                    span: e.span.clone(),
                    position: e.position,
                })
                .collect(),
        }
    }
}

impl From<&SemanticError> for Diagnostics {
    fn from(e: &SemanticError) -> Self {
        Self {
            items: vec![e.into()],
        }
    }
}
