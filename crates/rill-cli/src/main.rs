mod cli;
mod commands;

use std::process::ExitCode;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{DumpParams, EvalParams, TokensParams, TraceParams, TreeParams, build_cli};
use commands::common::CliError;

static INIT: Once = Once::new();

/// Logs go to stderr. `RILL_LOG` overrides the level picked by `-v`.
fn init_tracing(verbose: u8) {
    INIT.call_once(|| {
        let level = match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let filter =
            EnvFilter::try_from_env("RILL_LOG").unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let result: Result<(), CliError> = match matches.subcommand() {
        Some(("eval", m)) => commands::eval::run(EvalParams::from_matches(m).into()),
        Some(("dump", m)) => commands::dump::run(DumpParams::from_matches(m).into()),
        Some(("trace", m)) => commands::trace::run(TraceParams::from_matches(m).into()),
        Some(("tokens", m)) => commands::tokens::run(TokensParams::from_matches(m).into()),
        Some(("tree", m)) => commands::tree::run(TreeParams::from_matches(m).into()),
        _ => {
            let _ = build_cli().print_help();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render());
            ExitCode::from(err.exit_code())
        }
    }
}
