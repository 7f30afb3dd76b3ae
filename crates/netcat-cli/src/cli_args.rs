//! Shared `clap` argument groups used by every workflow driver.

use anyhow::{Context, Result};
use clap::Args;

use netcat_core::{DeviceType, Selector};

/// The operator's device selection: exactly one of all / group / explicit
/// names / regex, per spec.md §6.
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("selector").required(true).args(["all", "group", "devices", "regexp"])))]
pub struct SelectorArgs {
    /// Select every device in the inventory.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Select every device of one type (e.g. cisco_router, paloalto).
    #[arg(short = 'g', long, value_name = "DEVICE_TYPE")]
    pub group: Option<String>,

    /// Select one or more devices by exact name.
    #[arg(short = 'd', long = "device", value_name = "NAME", num_args = 1..)]
    pub devices: Vec<String>,

    /// Select every device whose name matches this regular expression.
    #[arg(short = 'r', long)]
    pub regexp: Option<String>,
}

impl SelectorArgs {
    pub fn to_selector(&self) -> Result<Selector> {
        if self.all {
            return Ok(Selector::All);
        }
        if let Some(group) = &self.group {
            let device_type: DeviceType = group
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("parsing -g/--group")?;
            return Ok(Selector::Group(device_type));
        }
        if !self.devices.is_empty() {
            return Ok(Selector::Devices(self.devices.clone()));
        }
        if let Some(pattern) = &self.regexp {
            return Ok(Selector::Regex(pattern.clone()));
        }
        unreachable!("clap's ArgGroup guarantees exactly one selector is present")
    }
}

/// Flags common to every workflow driver.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the inventory file (`device_info_list.json`).
    #[arg(long, default_value = "device_info_list.json")]
    pub inventory: String,

    /// Run with verbose (debug-level) logging.
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Process devices sequentially on one thread instead of fanning out.
    #[arg(short = 'S', long = "single-process")]
    pub single_process: bool,
}

impl CommonArgs {
    pub fn apply(&self) {
        if self.single_process {
            netcat_core::settings::set_single_process_mode(true);
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
