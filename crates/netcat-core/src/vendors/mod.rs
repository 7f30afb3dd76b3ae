//! Vendor Adapters: per-family prompt regexes, command catalogs and
//! vendor-specific operations.
//!
//! Modeled as a capability set (spec.md §9 "Dynamic dispatch"): every
//! adapter implements the core `VendorAdapter` trait; optional operations
//! (`CiscoRouterOps`, `PaloAltoOps`) are separate traits an adapter may also
//! implement, queried at runtime via `as_any()` downcasting rather than
//! baked into one universal interface — the same delegation shape the
//! teacher uses between `ciscodevicebase.rs` and its per-platform device
//! structs.

pub mod cisco;
pub mod f5;
pub mod paloalto;

use std::any::Any;
use std::time::Duration;

use crate::error::NetcatError;
use crate::output_format::OutputFormat;
use crate::session::CliSession;

/// Capabilities every vendor adapter provides: addressing (prompt/password
/// regexes), the command catalog, and terminal hardening.
pub trait VendorAdapter: Any {
    /// Session prompt regex, anchored to this device's own (upper-cased)
    /// name so it never matches another device's prompt.
    fn cli_prompt_pattern(&self, device_name: &str) -> String;

    fn password_prompt_pattern(&self) -> String;

    fn output_formats(&self) -> Vec<OutputFormat>;

    /// Suppress paging, widen the terminal, disable confirmation prompts —
    /// whatever this platform needs before automated command capture is
    /// safe.
    fn harden(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError>;

    fn as_any(&self) -> &dyn Any;
}

/// Deploy a configuration snippet, committing (or staging, for `noCommit`)
/// the result. Optional capability — only platforms with an editable
/// running configuration implement it.
pub trait DeploySnippet {
    fn deploy_snippet(
        &self,
        session: &mut CliSession,
        device_name: &str,
        snippet: &str,
        no_commit: bool,
    ) -> Result<(), NetcatError>;
}

/// Save the current running configuration to local device storage under a
/// timestamped name.
pub trait CreateSnapshot {
    fn create_snapshot(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError>;
}

/// Telemetry queries used to fill snippet placeholders (`{site_id}`,
/// `{inet_gw}`) — implemented by Cisco routers and Palo Alto, the two
/// platform families whose drivers expose this in the original system.
pub trait SiteIdentityOps {
    fn get_site_id(&self, session: &mut CliSession) -> Result<String, NetcatError>;
    fn get_inet_gw(&self, session: &mut CliSession) -> Result<String, NetcatError>;
}

/// Palo Alto-only lifecycle operations: HA validation, commit serialization,
/// and software download/upgrade.
pub trait PaloAltoOps {
    fn validate_ha_state(
        &self,
        session: &mut CliSession,
        device_name: &str,
        snippet: &str,
        timeout: Duration,
    ) -> Result<String, NetcatError>;

    fn clear_commit_in_progress(&self, session: &mut CliSession) -> Result<(), NetcatError>;

    fn download_software(&self, session: &mut CliSession, version: &str) -> Result<(), NetcatError>;

    fn upgrade_software(&self, session: &mut CliSession, version: &str) -> Result<(), NetcatError>;
}

/// Send each non-blank, non-comment line of a snippet, ignoring `#`-prefixed
/// comment lines — the shared body of every Cisco-family and Palo Alto
/// `deploySnippet`.
pub(crate) fn non_comment_lines(snippet: &str) -> impl Iterator<Item = &str> {
    snippet
        .split('\n')
        .filter(|line| !line.is_empty() && !line.trim_start().starts_with('#'))
}
