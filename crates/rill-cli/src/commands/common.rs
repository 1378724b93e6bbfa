//! Input loading, option assembly and variable parsing shared by commands.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use rill::{
    CompileOptions, ExpressionContext, StringComparison, Ty, Value, VariableValues,
};
use rill_compiler::resolve::builtin_type;

/// Errors reported by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read `{path}`: {reason}")]
    Read { path: PathBuf, reason: io::Error },

    #[error("expression cannot be empty")]
    EmptyExpression,

    #[error("invalid variable `{spec}`: {reason}")]
    InvalidVariable { spec: String, reason: String },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("{error}")]
    Rill { error: rill::Error, text: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn rill(error: impl Into<rill::Error>, text: &str) -> Self {
        CliError::Rill {
            error: error.into(),
            text: text.to_string(),
        }
    }

    /// Report for stderr; compile errors come with a source snippet.
    pub fn render(&self) -> String {
        match self {
            CliError::Rill {
                error: rill::Error::Compile(e),
                text,
            } => e.render(text),
            other => format!("error: {other}"),
        }
    }

    /// Process exit code: 1 for bad input, 2 for evaluation failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Rill {
                error: rill::Error::Runtime(_),
                ..
            } => 2,
            _ => 1,
        }
    }
}

/// Expression given inline or as a file path (`-` for stdin).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceInput {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
}

impl SourceInput {
    pub fn load(&self) -> Result<String, CliError> {
        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|reason| CliError::Read {
                        path: path.clone(),
                        reason,
                    })?;
                buf
            }
            (None, Some(path)) => fs::read_to_string(path).map_err(|reason| CliError::Read {
                path: path.clone(),
                reason,
            })?,
            (None, None) => String::new(),
        };
        if text.trim().is_empty() {
            return Err(CliError::EmptyExpression);
        }
        Ok(text)
    }
}

/// Everything that shapes how an expression compiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileInput {
    pub source: SourceInput,
    pub vars: Vec<String>,
    pub checked: bool,
    pub ignore_case_strings: bool,
    pub case_sensitive: bool,
    pub decimal_separator: char,
    pub argument_separator: char,
    pub integers_as_doubles: bool,
    pub result_type: Option<String>,
}

impl CompileInput {
    pub fn options(&self) -> CompileOptions {
        let comparison = if self.ignore_case_strings {
            StringComparison::IgnoreCase
        } else {
            StringComparison::Ordinal
        };
        CompileOptions::new()
            .checked(self.checked)
            .string_comparison(comparison)
            .case_sensitive(self.case_sensitive)
            .decimal_separator(self.decimal_separator)
            .argument_separator(self.argument_separator)
            .integers_as_doubles(self.integers_as_doubles)
    }

    /// Context with declared variables and the values bound to them.
    pub fn prepare(&self) -> Result<(ExpressionContext, VariableValues), CliError> {
        let options = self.options();
        let base = ExpressionContext::new().options(options.clone());
        let mut context = base.clone();
        let mut values = VariableValues::new();

        for spec in &self.vars {
            let var = VariableSpec::parse(spec)?;
            let ty = resolve_type(&base, &var.ty)?;
            if let Some(text) = &var.value {
                let value = parse_value(&base, &options, text, &var.ty, &ty)?;
                values.set(var.name.clone(), value);
            }
            context = context.variable(var.name, ty);
        }

        if let Some(name) = &self.result_type {
            context = context.result_type(resolve_type(&base, name)?);
        }
        Ok((context, values))
    }
}

/// `NAME:TYPE` or `NAME:TYPE=VALUE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    pub ty: String,
    pub value: Option<String>,
}

impl VariableSpec {
    pub fn parse(spec: &str) -> Result<Self, CliError> {
        let invalid = |reason: &str| CliError::InvalidVariable {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };
        let (decl, value) = match spec.split_once('=') {
            Some((decl, value)) => (decl, Some(value.to_string())),
            None => (spec, None),
        };
        let (name, ty) = decl
            .split_once(':')
            .ok_or_else(|| invalid("expected NAME:TYPE"))?;
        let (name, ty) = (name.trim(), ty.trim());
        if name.is_empty() {
            return Err(invalid("missing name"));
        }
        if ty.is_empty() {
            return Err(invalid("missing type"));
        }
        Ok(Self {
            name: name.to_string(),
            ty: ty.to_string(),
            value,
        })
    }
}

/// Builtin type name or catalog type, with an optional `[]` suffix.
pub fn resolve_type(context: &ExpressionContext, name: &str) -> Result<Ty, CliError> {
    if let Some(element) = name.strip_suffix("[]") {
        return Ok(Ty::array_of(resolve_type(context, element)?));
    }
    builtin_type(name)
        .or_else(|| context.find_type(name))
        .ok_or_else(|| CliError::UnknownType(name.to_string()))
}

/// Strings bind verbatim; anything else is a literal expression cast to the
/// declared type.
fn parse_value(
    context: &ExpressionContext,
    options: &CompileOptions,
    text: &str,
    ty_name: &str,
    ty: &Ty,
) -> Result<Value, CliError> {
    if *ty == Ty::String {
        return Ok(Value::string(text));
    }
    let source = format!("cast({text}{} {ty_name})", options.argument_separator);
    context
        .compile(&source)
        .and_then(|e| e.evaluate(&VariableValues::new()))
        .map_err(|e| CliError::InvalidVariable {
            spec: format!("{ty_name}={text}"),
            reason: e.to_string(),
        })
}
