//! Snippet loading and placeholder substitution for the deploy workflow.
//!
//! Per spec.md §6: snippet files are plain text with optional `#`-comment
//! lines and may reference `{site_name}`, `{site_id}`, `{inet_gw}` —
//! `{site_name}` is the device's own inventory name; `{site_id}`/`{inet_gw}`
//! come from a `SiteIdentityOps` query against the open session, performed
//! only when the snippet actually references them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use netcat_core::CliSession;

use crate::adapters::Adapter;

pub fn load_snippet(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("reading snippet file {}", path.display()))
}

/// Replace `{site_name}` unconditionally, and `{site_id}`/`{inet_gw}` only
/// when the snippet references them — avoiding an unneeded CLI round trip
/// against devices whose snippet doesn't need site identity at all.
pub fn fill_placeholders(
    snippet: &str,
    device_name: &str,
    adapter: &Adapter,
    session: &mut CliSession,
) -> Result<String, netcat_core::NetcatError> {
    let mut filled = snippet.replace("{site_name}", device_name);

    if filled.contains("{site_id}") || filled.contains("{inet_gw}") {
        let ops = adapter.site_identity().ok_or_else(|| {
            netcat_core::NetcatError::ConfigurationFault(format!(
                "snippet for {device_name} references site identity placeholders but this device type has no SiteIdentityOps"
            ))
        })?;

        if filled.contains("{site_id}") {
            let site_id = ops.get_site_id(session)?;
            filled = filled.replace("{site_id}", &site_id);
        }
        if filled.contains("{inet_gw}") {
            let inet_gw = ops.get_inet_gw(session)?;
            filled = filled.replace("{inet_gw}", &inet_gw);
        }
    }

    Ok(filled)
}
