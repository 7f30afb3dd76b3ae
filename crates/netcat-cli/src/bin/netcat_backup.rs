//! `netcat-backup` — periodic configuration backup with change detection.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use netcat_cli::cli_args::{CommonArgs, SelectorArgs};
use netcat_cli::inventory::{load_inventory, require_non_empty, to_selector_inventory};
use netcat_cli::status::build_job_status;
use netcat_cli::storage_factory::open_storage;
use netcat_cli::workflows::backup;
use netcat_core::{init_logging, resolve_selector};
use netcat_storage::{StorageDocument, Table};

#[derive(Parser, Debug)]
#[command(name = "netcat-backup", about = "Back up configuration from a device fleet")]
struct Cli {
    #[command(flatten)]
    selector: SelectorArgs,

    #[command(flatten)]
    common: CommonArgs,

    /// Write the backup even if no configuration change was detected.
    #[arg(short = 'F', long = "force-backup")]
    force_backup: bool,

    /// Capture and compare, but write nothing to storage.
    #[arg(short = 'T', long = "test-run")]
    test_run: bool,
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

    let snapshot_timestamp = netcat_core::util::unix_timestamp_now();
    let storage = open_storage().context("opening storage backend")?;

    info!(target: "netcat_backup", "starting backup of {} device(s)", devices.len());
    let result = backup::run(
        &records,
        devices,
        storage.clone(),
        snapshot_timestamp,
        cli.force_backup,
        cli.test_run,
    );

    if !cli.test_run {
        let device_types = records.iter().map(|r| (r.name.clone(), r.device_type)).collect();
        let status = build_job_status(&result, &device_types, snapshot_timestamp);
        storage.write(Table::Status, StorageDocument::Status(status))?;
    }

    info!(
        target: "netcat_backup",
        "backup complete: {} succeeded, {} failed",
        result.successful.len(),
        result.failed.len()
    );
    Ok(())
}
