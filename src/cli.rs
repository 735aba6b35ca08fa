use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::catalog::FieldCatalog;
use crate::config::{self, AppConfig};
use crate::providers::jira::JiraTracker;
use crate::report;
use crate::sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pull,
    Push,
    Report,
    Help,
}

/// Everything taken from the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub command: Option<Command>,
    pub config: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub limit: Option<usize>,
    pub verbosity: u8,
    pub quiet: bool,
}

pub fn parse_command(word: &str) -> Option<Command> {
    match word.trim().to_lowercase().as_str() {
        "pull" | "fetch" => Some(Command::Pull),
        "push" | "update" => Some(Command::Push),
        "report" => Some(Command::Report),
        "help" | "-h" | "--help" => Some(Command::Help),
        _ => None,
    }
}

/// Parse arguments (without the program name).
///
/// Supported forms:
///   tracksheet pull -f issues.csv
///   tracksheet push --config ./tracksheet.toml -v
///   tracksheet report -n 20
///   tracksheet            (prompts for pull or push)
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut invocation = Invocation::default();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-c" | "--config" | "-f" | "--file" | "-n" | "--limit" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("Missing value for {arg}");
                };
                match arg {
                    "-c" | "--config" => invocation.config = Some(PathBuf::from(value)),
                    "-f" | "--file" => invocation.file = Some(PathBuf::from(value)),
                    _ => {
                        invocation.limit = Some(
                            value
                                .parse()
                                .with_context(|| format!("Invalid number for {arg}: {value}"))?,
                        )
                    }
                }
            }
            "-q" | "--quiet" => invocation.quiet = true,
            "-v" | "--verbose" => invocation.verbosity += 1,
            "-vv" => invocation.verbosity += 2,
            _ => {
                let Some(command) = parse_command(arg) else {
                    bail!("Unknown argument '{arg}'. Run `tracksheet help` for usage.");
                };
                if invocation.command.is_some() {
                    bail!("Only one command per run");
                }
                invocation.command = Some(command);
            }
        }
        i += 1;
    }

    Ok(invocation)
}

/// Ask on stdin which direction to run.
pub fn prompt_command<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Command> {
    write!(
        output,
        "Choose an action: type 'pull' to fetch issues into the sheet or 'push' to update issues from it: "
    )?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    match parse_command(&line) {
        Some(command @ (Command::Pull | Command::Push)) => Ok(command),
        _ => bail!("Invalid choice '{}'. Please type 'pull' or 'push'.", line.trim()),
    }
}

pub async fn run(invocation: Invocation) -> Result<()> {
    let command = match invocation.command {
        Some(command) => command,
        None => prompt_command(io::stdin().lock(), io::stdout())?,
    };
    if command == Command::Help {
        print_help();
        return Ok(());
    }

    let config = config::load_config(invocation.config.as_deref())?;
    let file = invocation
        .file
        .clone()
        .unwrap_or_else(|| config.sync.file.clone());

    match command {
        Command::Pull => handle_pull(&config, &file).await,
        Command::Push => handle_push(&config, &file).await,
        Command::Report => handle_report(&config, invocation.limit.unwrap_or(20)),
        Command::Help => Ok(()),
    }
}

async fn handle_pull(config: &AppConfig, file: &Path) -> Result<()> {
    let tracker = JiraTracker::new(config.jira()?, config.sync.page_size)?;
    let catalog = FieldCatalog::from_config(&config.sync);
    let count = sync::pull(&tracker, &catalog, &config.sync.jql, file).await?;
    println!("Exported {count} issues to {}", file.display());
    Ok(())
}

async fn handle_push(config: &AppConfig, file: &Path) -> Result<()> {
    let tracker = JiraTracker::new(config.jira()?, config.sync.page_size)?;
    let catalog = FieldCatalog::from_config(&config.sync);
    let result = sync::push(&tracker, &catalog, file, config.sync.concurrency).await?;

    let report_path = config.report_path();
    if let Err(e) = report::append_batch(&report_path, &result) {
        tracing::warn!(path = %report_path.display(), error = %e, "could not write push report");
    }

    println!("{}", result.counts());
    for report in &result.reports {
        if let Some(detail) = report.outcome.detail() {
            println!(
                "  row {:>4}  {:<14} {:<28} {detail}",
                report.row,
                report.key.as_deref().unwrap_or("-"),
                report.outcome.kind()
            );
        }
    }
    Ok(())
}

fn handle_report(config: &AppConfig, limit: usize) -> Result<()> {
    let path = config.report_path();
    let events = report::read_events(&path, Some(limit));
    if events.is_empty() {
        println!("No pushes recorded in {}", path.display());
        return Ok(());
    }
    for event in events {
        println!(
            "{}  row {:>4}  {:<14} {:<28} {}",
            event.timestamp,
            event.row,
            event.key.as_deref().unwrap_or("-"),
            event.outcome,
            event.detail.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn print_help() {
    println!("tracksheet — sync Jira issues with a CSV sheet\n");
    println!("USAGE:");
    println!("  tracksheet                Ask whether to pull or push");
    println!("  tracksheet pull           Export matching issues to the sheet (alias: fetch)");
    println!("  tracksheet push           Update issues from the edited sheet (alias: update)");
    println!("  tracksheet report         Show recent push outcomes");
    println!();
    println!("OPTIONS:");
    println!("  -c, --config <path>  Config file (default ~/.tracksheet/config.toml)");
    println!("  -f, --file <path>    Sheet to write or read (default from config)");
    println!("  -n, --limit <n>      Entries shown by `report` (default 20)");
    println!("  -v, --verbose        More logging (repeatable)");
    println!("  -q, --quiet          Errors only");
}
