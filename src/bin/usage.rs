//! envbind usage CLI
//!
//! Lists declared environment variables and checks the live environment
//! against them.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use envbind::{EnvRegistry, EnvbindConfig, OutputFormat, UsageEntry};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envbind-usage")]
#[command(about = "Describe and check environment variables declared in envbind.toml")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every declared variable, sorted by name
    Usage,

    /// Parse the current environment and print the resolved values
    Check,

    /// Write a starter config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "envbind.toml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config,
        json,
        command,
    } = cli;

    if let Commands::Init { output, force } = command {
        return init(&output, force);
    }

    let cfg = EnvbindConfig::load_from(config.as_deref()).context("loading configuration")?;
    let format = if json { OutputFormat::Json } else { cfg.output.format };

    let mut registry = EnvRegistry::new();
    let targets = cfg.declare(&mut registry)?;

    if let Commands::Usage = command {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&registry.usage_entries())?);
            }
            OutputFormat::Text => {
                if registry.is_empty() {
                    println!("No environment variables declared.");
                }
                registry.usage(|entry| print_entry(entry, cfg.output.show_kinds));
            }
        }
        return Ok(());
    }

    registry.parse()?;

    match format {
        OutputFormat::Json => {
            let resolved: serde_json::Map<_, _> = targets
                .iter()
                .map(|(name, target)| (name.clone(), json!(target.current())))
                .collect();
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        OutputFormat::Text => {
            for (name, target) in &targets {
                println!("{}={}", name, target.current());
            }
        }
    }

    Ok(())
}

fn init(output: &str, force: bool) -> anyhow::Result<()> {
    if std::path::Path::new(output).exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output);
    }
    EnvbindConfig::sample()
        .save(output)
        .with_context(|| format!("writing {}", output))?;
    println!("Wrote {}", output);
    Ok(())
}

fn print_entry(entry: &UsageEntry<'_>, show_kinds: bool) {
    let mut tags = Vec::new();
    if show_kinds {
        tags.push(entry.kind.to_string());
    }
    if entry.required {
        tags.push("required".to_string());
    }

    if tags.is_empty() {
        println!("{}", entry.name);
    } else {
        println!("{} ({})", entry.name, tags.join(", "));
    }

    if entry.description.is_empty() {
        println!("    [default: {}]", entry.default);
    } else {
        println!("    {} [default: {}]", entry.description, entry.default);
    }
}
