//! Dispatch logic: extract params from `ArgMatches` and convert them to
//! command args.

use std::path::PathBuf;

use clap::ArgMatches;
use rill::{CompileOptions, Verbosity};

use super::ColorChoice;
use crate::commands::common::{CompileInput, SourceInput};
use crate::commands::dump::DumpArgs;
use crate::commands::eval::EvalArgs;
use crate::commands::tokens::TokensArgs;
use crate::commands::trace::TraceArgs;
use crate::commands::tree::TreeArgs;

pub struct EvalParams {
    pub input: CompileInput,
    pub json: bool,
    pub max_stack: u32,
    pub color: ColorChoice,
}

impl EvalParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: compile_input(m),
            json: m.get_flag("json"),
            max_stack: max_stack(m),
            color: parse_color(m),
        }
    }
}

impl From<EvalParams> for EvalArgs {
    fn from(p: EvalParams) -> Self {
        Self {
            input: p.input,
            json: p.json,
            max_stack: p.max_stack,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub input: CompileInput,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: compile_input(m),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            input: p.input,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TraceParams {
    pub input: CompileInput,
    pub verbose: u8,
    pub max_stack: u32,
    pub color: ColorChoice,
}

impl TraceParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: compile_input(m),
            verbose: m.get_count("verbose"),
            max_stack: max_stack(m),
            color: parse_color(m),
        }
    }
}

impl From<TraceParams> for TraceArgs {
    fn from(p: TraceParams) -> Self {
        let verbosity = match p.verbose {
            0 => Verbosity::Default,
            _ => Verbosity::Verbose,
        };
        Self {
            input: p.input,
            verbosity,
            max_stack: p.max_stack,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TokensParams {
    pub source: SourceInput,
    pub options: CompileOptions,
}

impl TokensParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            source: source_input(m),
            options: syntax_options(m),
        }
    }
}

impl From<TokensParams> for TokensArgs {
    fn from(p: TokensParams) -> Self {
        Self {
            source: p.source,
            options: p.options,
        }
    }
}

pub struct TreeParams {
    pub source: SourceInput,
    pub options: CompileOptions,
}

impl TreeParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            source: source_input(m),
            options: syntax_options(m),
        }
    }
}

impl From<TreeParams> for TreeArgs {
    fn from(p: TreeParams) -> Self {
        Self {
            source: p.source,
            options: p.options,
        }
    }
}

fn source_input(m: &ArgMatches) -> SourceInput {
    SourceInput {
        text: m.get_one::<String>("expression").cloned(),
        file: m.get_one::<PathBuf>("file").cloned(),
    }
}

fn separators(m: &ArgMatches) -> (char, char) {
    (
        m.get_one::<char>("decimal_separator").copied().unwrap_or('.'),
        m.get_one::<char>("argument_separator").copied().unwrap_or(','),
    )
}

fn syntax_options(m: &ArgMatches) -> CompileOptions {
    let (decimal, argument) = separators(m);
    CompileOptions::new()
        .decimal_separator(decimal)
        .argument_separator(argument)
}

fn compile_input(m: &ArgMatches) -> CompileInput {
    let (decimal_separator, argument_separator) = separators(m);
    CompileInput {
        source: source_input(m),
        vars: m
            .get_many::<String>("var")
            .map(|vs| vs.cloned().collect())
            .unwrap_or_default(),
        checked: m.get_flag("checked"),
        ignore_case_strings: m.get_flag("ignore_case_strings"),
        case_sensitive: m.get_flag("case_sensitive"),
        decimal_separator,
        argument_separator,
        integers_as_doubles: m.get_flag("integers_as_doubles"),
        result_type: m.get_one::<String>("result_type").cloned(),
    }
}

fn max_stack(m: &ArgMatches) -> u32 {
    m.get_one::<u32>("max_stack").copied().unwrap_or(1024)
}

/// Parse --color flag into ColorChoice.
fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
