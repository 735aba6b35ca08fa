mod catalog;
mod cli;
mod config;
mod description;
mod error;
mod identity;
mod logging;
mod model;
mod normalize;
mod providers;
mod reconcile;
mod report;
mod sheet;
mod sync;
mod util;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;

    logging::init_logging(invocation.verbosity, invocation.quiet)?;

    cli::run(invocation).await
}
