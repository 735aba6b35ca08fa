//! Logging setup: `tracing` to stderr, filtered by `RUST_LOG` or the
//! verbosity flags.

use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logging(verbosity: u8, quiet: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity, quiet)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_ansi(std::io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

fn default_filter(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbosity {
        0 => "tracksheet=info".to_string(),
        1 => "tracksheet=debug".to_string(),
        2 => "tracksheet=debug,reqwest=debug".to_string(),
        _ => "tracksheet=trace,reqwest=trace".to_string(),
    }
}
