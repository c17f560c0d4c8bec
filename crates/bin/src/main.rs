mod cli;
mod output;
mod script;

use std::fs;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ScriptArgs};
use output::OutputFormat;
use script::{Event, Script};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replay output stays machine readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("ripple=info".parse()?))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(args) => replay(&args, cli.format),
        Commands::Check(args) => check(&args, cli.format),
    }
}

fn load(args: &ScriptArgs) -> anyhow::Result<Script> {
    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read {}", args.script.display()))?;
    Script::parse(&source).with_context(|| format!("failed to parse {}", args.script.display()))
}

fn replay(args: &ScriptArgs, format: OutputFormat) -> anyhow::Result<()> {
    let script = load(args)?;
    script.validate()?;
    let events = script.run();
    tracing::debug!(steps = script.steps.len(), events = events.len(), "Replay finished");

    for event in &events {
        println!("{}", output::render(event, format)?);
    }

    let failed = events
        .iter()
        .filter(|event| matches!(event, Event::Error { .. }))
        .count();
    if failed > 0 {
        tracing::warn!(failed, "Some steps were rejected");
    }
    Ok(())
}

fn check(args: &ScriptArgs, format: OutputFormat) -> anyhow::Result<()> {
    let script = load(args)?;
    script.validate()?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "valid": true, "steps": script.steps.len() })
        ),
        OutputFormat::Human => println!("{}: {} steps OK", args.script.display(), script.steps.len()),
    }
    Ok(())
}
