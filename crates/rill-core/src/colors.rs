//! Terminal coloring for dumps, traces and printed values.
//!
//! Output is painted by role rather than by hue, so the bytecode dump, the
//! VM trace and the CLI agree on what an opcode or a literal looks like.

use std::fmt;

const RESET: &str = "\x1b[0m";

/// What a painted span of output is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paint {
    /// Instruction mnemonics and `call` targets.
    Opcode,
    /// Dump section headers such as `[code]`.
    Section,
    /// String and char literals.
    Text,
    /// Numeric and boolean values.
    Number,
    /// Offsets, stack depth, comments, separators and `null`.
    Muted,
}

impl Paint {
    /// Standard 16-color ANSI codes only.
    fn code(self) -> &'static str {
        match self {
            Paint::Opcode => "\x1b[34m",
            Paint::Section => "\x1b[1;34m",
            Paint::Text => "\x1b[32m",
            Paint::Number => "\x1b[36m",
            Paint::Muted => "\x1b[2m",
        }
    }
}

/// Whether output gets ANSI escapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Colors {
    enabled: bool,
}

impl Colors {
    pub const ON: Self = Self { enabled: true };
    pub const OFF: Self = Self { enabled: false };

    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// `text` wrapped in the escapes for `paint`, or plain when disabled.
    pub fn paint(self, paint: Paint, text: impl fmt::Display) -> String {
        if self.enabled {
            format!("{}{text}{RESET}", paint.code())
        } else {
            text.to_string()
        }
    }
}
