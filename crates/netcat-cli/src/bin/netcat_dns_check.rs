//! `netcat-dns-check` — thin driver that health-checks a list of external
//! DNS servers and records the result in the shared status table.
//!
//! Out of core scope per spec.md §1/§7.11: this binary owns its own tiny
//! DNS query, rather than pulling a resolver crate into the engine for one
//! driver's sake.

use std::fs;
use std::net::UdpSocket;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use netcat_cli::cli_args::CommonArgs;
use netcat_cli::storage_factory::open_storage;
use netcat_core::{init_logging, util::unix_timestamp_now, DeviceOutcome, JobStatus};
use netcat_storage::{StorageDocument, Table};

#[derive(Parser, Debug)]
#[command(name = "netcat-dns-check", about = "Health-check external DNS servers")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Path to the DNS server inventory (`dns_info_list.json`).
    #[arg(long, default_value = "dns_info_list.json")]
    dns_inventory: String,

    /// Hostname resolved against every server as the liveness probe.
    #[arg(long, default_value = "www.example.com")]
    probe_name: String,
}

#[derive(Debug, Deserialize)]
struct DnsServerEntry {
    description: String,
    ip_address: String,
}

/// Build a minimal DNS query: one header, one question (`probe_name`, type
/// A, class IN).
fn build_query(id: u16, probe_name: &str) -> Vec<u8> {
    let mut packet = Vec::with_capacity(32);
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&[0x01, 0x00]); // flags: recursion desired
    packet.extend_from_slice(&[0x00, 0x01]); // qdcount = 1
    packet.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]); // an/ns/ar counts

    for label in probe_name.split('.') {
        packet.push(label.len() as u8);
        packet.extend_from_slice(label.as_bytes());
    }
    packet.push(0x00); // root label
    packet.extend_from_slice(&[0x00, 0x01]); // qtype A
    packet.extend_from_slice(&[0x00, 0x01]); // qclass IN
    packet
}

/// Send the query over UDP/53 and check the response carries a matching
/// transaction id and a successful (`RCODE == 0`) reply.
fn check_server(server_ip: &str, probe_name: &str, timeout: Duration) -> Result<bool> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("binding probe socket")?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_write_timeout(Some(timeout))?;

    let id = (unix_timestamp_now() & 0xFFFF) as u16;
    let query = build_query(id, probe_name);
    socket
        .send_to(&query, (server_ip, 53))
        .with_context(|| format!("sending probe to {server_ip}"))?;

    let mut buf = [0u8; 512];
    let (len, _) = socket
        .recv_from(&mut buf)
        .with_context(|| format!("awaiting probe reply from {server_ip}"))?;
    if len < 12 {
        return Ok(false);
    }

    let response_id = u16::from_be_bytes([buf[0], buf[1]]);
    let flags = u16::from_be_bytes([buf[2], buf[3]]);
    let is_response = flags & 0x8000 != 0;
    let rcode = flags & 0x000F;

    Ok(response_id == id && is_response && rcode == 0)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.common.log_level(), None).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let raw = fs::read_to_string(&cli.dns_inventory)
        .with_context(|| format!("reading DNS inventory {}", cli.dns_inventory))?;
    let servers: Vec<DnsServerEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing DNS inventory {}", cli.dns_inventory))?;

    let snapshot_timestamp = unix_timestamp_now();
    let mut status = JobStatus::new(snapshot_timestamp);
    status.snapshot_name = "dns_status".to_string();

    for server in &servers {
        let healthy = match check_server(&server.ip_address, &cli.probe_name, Duration::from_secs(5)) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(target: "netcat_dns_check", "probe of {} ({}) failed: {}", server.description, server.ip_address, e);
                false
            }
        };
        info!(target: "netcat_dns_check", "{} ({}): {}", server.description, server.ip_address, if healthy { "healthy" } else { "unhealthy" });
        status.device_info_dict.insert(
            server.description.clone(),
            DeviceOutcome {
                device_type: "dns_server".to_string(),
                successful: healthy,
                failed: !healthy,
            },
        );
    }

    let storage = open_storage().context("opening storage backend")?;
    storage.write(Table::Status, StorageDocument::Status(status))?;

    Ok(())
}
