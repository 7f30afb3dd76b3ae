//! `netcat-upgrade` — Palo Alto software download and (optionally) upgrade.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use netcat_cli::cli_args::{CommonArgs, SelectorArgs};
use netcat_cli::inventory::{load_inventory, require_non_empty, to_selector_inventory};
use netcat_cli::workflows::upgrade;
use netcat_core::{init_logging, resolve_selector};

#[derive(Parser, Debug)]
#[command(name = "netcat-upgrade", about = "Download (and optionally install) Palo Alto software")]
struct Cli {
    #[command(flatten)]
    selector: SelectorArgs,

    #[command(flatten)]
    common: CommonArgs,

    /// Target software version, e.g. "10.2.4".
    version: String,

    /// Also install the downloaded version and reboot. Without this flag,
    /// only the download step runs.
    #[arg(long)]
    upgrade: bool,
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

    info!(
        target: "netcat_upgrade",
        "{} version {} on {} device(s)",
        if cli.upgrade { "installing" } else { "downloading" },
        cli.version,
        devices.len()
    );
    let result = upgrade::run(&records, devices, cli.version, cli.upgrade);

    info!(
        target: "netcat_upgrade",
        "upgrade workflow complete: {} succeeded, {} failed",
        result.successful.len(),
        result.failed.len()
    );
    if !result.failed.is_empty() {
        eprintln!("failed devices: {}", result.failed.join(", "));
    }
    Ok(())
}
