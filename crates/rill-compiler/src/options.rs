//! Compile options.

use rill_bytecode::StringComparison;
use rill_core::PrimitiveKind;

/// Default `#...#` literal format.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d";

/// Format tried when `date_time_format` does not match.
pub const FALLBACK_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Options read while compiling one expression.
///
/// The two separators shape the tokenizer; everything else is consumed by
/// the element layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    pub checked: bool,
    pub string_comparison: StringComparison,
    pub decimal_separator: char,
    pub argument_separator: char,
    pub case_sensitive: bool,
    pub integers_as_doubles: bool,
    /// `Double` or `Single`.
    pub real_literal_type: PrimitiveKind,
    pub date_time_format: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            checked: false,
            string_comparison: StringComparison::Ordinal,
            decimal_separator: '.',
            argument_separator: ',',
            case_sensitive: false,
            integers_as_doubles: false,
            real_literal_type: PrimitiveKind::Double,
            date_time_format: DEFAULT_DATE_TIME_FORMAT.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checked(mut self, value: bool) -> Self {
        self.checked = value;
        self
    }

    pub fn string_comparison(mut self, value: StringComparison) -> Self {
        self.string_comparison = value;
        self
    }

    pub fn decimal_separator(mut self, value: char) -> Self {
        self.decimal_separator = value;
        self
    }

    pub fn argument_separator(mut self, value: char) -> Self {
        self.argument_separator = value;
        self
    }

    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    pub fn integers_as_doubles(mut self, value: bool) -> Self {
        self.integers_as_doubles = value;
        self
    }

    /// Anything but `Single` means `Double`.
    pub fn real_literal_type(mut self, kind: PrimitiveKind) -> Self {
        self.real_literal_type = match kind {
            PrimitiveKind::Single => PrimitiveKind::Single,
            _ => PrimitiveKind::Double,
        };
        self
    }

    pub fn date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    /// Tokenizer-relevant part of the options.
    pub fn separators(&self) -> (char, char) {
        (self.decimal_separator, self.argument_separator)
    }
}
