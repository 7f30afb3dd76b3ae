//! `make-device-info-list` — inventory-generator driver.
//!
//! Builds `device_info_list.json` from credential files and a device name
//! list, inferring each device's type from its naming convention. DNS
//! zone-transfer discovery (how the original located device names) is out
//! of scope; this driver takes the resulting name list as a plain text
//! file instead, one name per line (see DESIGN.md).

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use netcat_cli::inventory::read_credentials;
use netcat_core::DeviceType;

#[derive(Parser, Debug)]
#[command(name = "make-device-info-list", about = "Generate device_info_list.json from a device name list")]
struct Cli {
    /// Plain text file, one device name per line.
    #[arg(long, default_value = "devices.txt")]
    devices: String,

    /// Cisco credential file (two lines: username, password).
    #[arg(long, default_value = "login_cisco.txt")]
    login_cisco: String,

    /// F5 credential file (two lines: username, password).
    #[arg(long, default_value = "login_f5.txt")]
    login_f5: String,

    /// Username Palo Alto devices authenticate with (key-based auth; see
    /// DESIGN.md for why Palo Alto has no credential file of its own).
    #[arg(long, default_value = "admin")]
    paloalto_username: String,

    /// Where to write the generated inventory.
    #[arg(long, default_value = "device_info_list.json")]
    output: String,
}

#[derive(Debug, Serialize)]
struct InventoryRecord {
    device_name: String,
    device_type: String,
    auth: String,
    username: String,
    password: String,
}

/// Infer a device's platform from naming-convention substrings in its name.
/// Checked most-specific-first so e.g. `asa-mc` doesn't fall through to the
/// plain `asa` branch.
fn infer_device_type(name: &str) -> DeviceType {
    let lower = name.to_lowercase();
    if lower.contains("fw") {
        DeviceType::PaloAlto
    } else if lower.contains("lb") {
        DeviceType::F5
    } else if lower.contains("asa-mc") || lower.contains("asamc") {
        DeviceType::CiscoAsaMc
    } else if lower.contains("asa") {
        DeviceType::CiscoAsa
    } else if lower.contains("nx") {
        DeviceType::CiscoNexus
    } else if lower.contains("sw") {
        DeviceType::CiscoSwitch
    } else {
        DeviceType::CiscoRouter
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (cisco_user, cisco_pass) =
        read_credentials(&cli.login_cisco).context("reading Cisco credential file")?;
    let (f5_user, f5_pass) = read_credentials(&cli.login_f5).context("reading F5 credential file")?;

    let raw = fs::read_to_string(&cli.devices).with_context(|| format!("reading device list {}", cli.devices))?;
    let names: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut records = Vec::with_capacity(names.len());
    for name in names {
        let device_type = infer_device_type(name);
        let record = match device_type {
            DeviceType::F5 => InventoryRecord {
                device_name: name.to_string(),
                device_type: device_type.to_string(),
                auth: "password".to_string(),
                username: f5_user.clone(),
                password: f5_pass.clone(),
            },
            DeviceType::PaloAlto => InventoryRecord {
                device_name: name.to_string(),
                device_type: device_type.to_string(),
                auth: "rsa".to_string(),
                username: cli.paloalto_username.clone(),
                password: String::new(),
            },
            _ => InventoryRecord {
                device_name: name.to_string(),
                device_type: device_type.to_string(),
                auth: "password".to_string(),
                username: cisco_user.clone(),
                password: cisco_pass.clone(),
            },
        };
        records.push(record);
    }

    let json = serde_json::to_string_pretty(&records)?;
    fs::write(&cli.output, json).with_context(|| format!("writing {}", cli.output))?;
    info!(target: "make_device_info_list", "wrote {} device record(s) to {}", records.len(), cli.output);
    Ok(())
}
