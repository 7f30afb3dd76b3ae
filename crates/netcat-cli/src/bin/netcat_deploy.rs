//! `netcat-deploy` — push one or more configuration snippets to a fleet.

use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use netcat_cli::cli_args::{CommonArgs, SelectorArgs};
use netcat_cli::inventory::{load_inventory, require_non_empty, to_selector_inventory};
use netcat_cli::snippet::load_snippet;
use netcat_cli::workflows::deploy;
use netcat_core::{init_logging, resolve_selector};

#[derive(Parser, Debug)]
#[command(name = "netcat-deploy", about = "Deploy configuration snippets to a device fleet")]
struct Cli {
    #[command(flatten)]
    selector: SelectorArgs,

    #[command(flatten)]
    common: CommonArgs,

    /// One or more snippet files, applied in order to every selected device.
    #[arg(required = true, num_args = 1..)]
    snippets: Vec<String>,

    /// Skip the interactive confirmation before deploying.
    #[arg(long = "no-confirm")]
    no_confirm: bool,

    /// Load and exit config mode without committing.
    #[arg(long = "no-commit")]
    no_commit: bool,
}

fn confirm(devices: &[String], snippet_paths: &[String]) -> Result<bool> {
    println!("About to deploy {} snippet file(s) to {} device(s):", snippet_paths.len(), devices.len());
    for path in snippet_paths {
        println!("  - {path}");
    }
    for device in devices {
        println!("    {device}");
    }
    print!("Proceed? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.common.log_level(), None).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    cli.common.apply();

    let records = load_inventory(&cli.common.inventory)?;
    let selector_inventory = to_selector_inventory(&records);
    let selector = cli.selector.to_selector()?;
    let devices = require_non_empty(
        resolve_selector(&selector, &selector_inventory),
        &format!("{:?}", selector),
    )?;

    let snippets: Result<Vec<String>> = cli.snippets.iter().map(load_snippet).collect();
    let snippets = snippets?;
    if snippets.is_empty() {
        bail!("no snippet content to deploy");
    }

    if !cli.no_confirm && !confirm(&devices, &cli.snippets)? {
        println!("aborted");
        return Ok(());
    }

    info!(target: "netcat_deploy", "deploying to {} device(s)", devices.len());
    let result = deploy::run(&records, devices, snippets, cli.no_commit);

    info!(
        target: "netcat_deploy",
        "deploy complete: {} succeeded, {} failed",
        result.successful.len(),
        result.failed.len()
    );
    if !result.failed.is_empty() {
        eprintln!("failed devices: {}", result.failed.join(", "));
    }
    Ok(())
}
