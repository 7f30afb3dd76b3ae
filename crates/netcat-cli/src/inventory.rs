//! Inventory file loading (`device_info_list.json`) and credential file
//! loading (`login_cisco.txt`, `login_f5.txt`), per spec.md §6.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use netcat_core::{AuthMode, DeviceType, InventoryEntry};

/// One record of the static, job-scoped fleet inventory: everything a
/// driver needs to open and authenticate a CLI session to a device,
/// resolved from `device_info_list.json`.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub name: String,
    pub device_type: DeviceType,
    pub auth_mode: AuthMode,
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    device_name: String,
    device_type: String,
    auth: String,
    username: String,
    #[serde(default)]
    password: String,
}

/// Parse `device_info_list.json` into the fleet's device records. Any
/// record with an unrecognized `device_type`/`auth` fails preflight — a
/// `ConfigurationFault` in spec terms, reported to the operator before any
/// worker is spawned.
pub fn load_inventory(path: impl AsRef<Path>) -> Result<Vec<DeviceRecord>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("reading inventory file {}", path.display()))?;
    let records: Vec<RawRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing inventory file {}", path.display()))?;

    records
        .into_iter()
        .map(|r| {
            let device_type = r
                .device_type
                .parse::<DeviceType>()
                .map_err(|e| anyhow::anyhow!("{} (device {})", e, r.device_name))?;
            let auth_mode = parse_auth(&r.auth)
                .map_err(|e| anyhow::anyhow!("{} (device {})", e, r.device_name))?;
            let password = if r.password.is_empty() { None } else { Some(r.password) };
            Ok(DeviceRecord {
                name: r.device_name,
                device_type,
                auth_mode,
                username: r.username,
                password,
            })
        })
        .collect()
}

fn parse_auth(raw: &str) -> Result<AuthMode, String> {
    match raw.to_lowercase().as_str() {
        "password" => Ok(AuthMode::Password),
        "rsa" => Ok(AuthMode::PublicKey),
        other => Err(format!("unsupported auth mode '{other}'")),
    }
}

/// Project a device record list down to the lighter-weight selector
/// inventory (`name`/`device_type` only).
pub fn to_selector_inventory(records: &[DeviceRecord]) -> Vec<InventoryEntry> {
    records
        .iter()
        .map(|r| InventoryEntry {
            device_name: r.name.clone(),
            device_type: r.device_type,
        })
        .collect()
}

/// Read a two-line credential file (`login_cisco.txt`, `login_f5.txt`):
/// username on line one, password on line two.
pub fn read_credentials(path: impl AsRef<Path>) -> Result<(String, String)> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).with_context(|| format!("reading credential file {}", path.display()))?;
    let mut lines = contents.lines();
    let username = lines
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("credential file {} is missing a username line", path.display()))?;
    let password = lines
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("credential file {} is missing a password line", path.display()))?;
    Ok((username.to_string(), password.to_string()))
}

/// Resolve the final list of device names for a job: run the selector
/// against the inventory, then fail preflight if it resolved to nothing
/// a human-facing selector (not a legitimately-empty regex result) was
/// asked to match.
pub fn require_non_empty(names: Vec<String>, selector_desc: &str) -> Result<Vec<String>> {
    if names.is_empty() {
        bail!("selector '{selector_desc}' matched no devices in the inventory");
    }
    Ok(names)
}
