//! Palo Alto firewall adapter.
//!
//! Grounded on `netcat_cli_pa.py`'s `OUTPUT_FORMATS_PALOALTO` catalog and
//! `PACliAccess`: HA-aware prompt, HA state validation, commit-in-progress
//! serialization, the commit flow with its HA-sync retry branch, and the
//! software download/upgrade retry loops.

use std::any::Any;
use std::thread::sleep;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::error::NetcatError;
use crate::output_format::OutputFormat;
use crate::session::CliSession;
use crate::settings::{get_retry_attempts, get_timeout, TimeoutKind};

use super::{non_comment_lines, CreateSnapshot, DeploySnippet, PaloAltoOps, SiteIdentityOps, VendorAdapter};

pub struct PaloAltoAdapter {
    username: String,
}

impl PaloAltoAdapter {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Prompt matching any HA role, or a single specific role when `role`
    /// is given.
    fn prompt_for_role(&self, device_name: &str, role: Option<&str>) -> String {
        let role_alt = role.unwrap_or("active-primary|active-secondary|active|passive|non-functional|suspended|");
        format!(
            r"{}@{}\(?({})\)?[#>] ",
            regex::escape(&self.username),
            device_name.to_uppercase(),
            role_alt
        )
    }
}

impl VendorAdapter for PaloAltoAdapter {
    fn cli_prompt_pattern(&self, device_name: &str) -> String {
        self.prompt_for_role(device_name, None)
    }

    fn password_prompt_pattern(&self) -> String {
        r"Password: ".to_string()
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        vec![
            OutputFormat {
                format_name: "backup_set".to_string(),
                pre_commands: vec!["set cli config-output-format set".to_string(), "configure".to_string()],
                commands: vec!["show".to_string()],
                post_commands: vec!["exit".to_string()],
                output_start: 1,
                output_end: -2,
            },
            OutputFormat {
                format_name: "backup_xml".to_string(),
                pre_commands: vec!["set cli config-output-format xml".to_string(), "configure".to_string()],
                commands: vec!["show".to_string()],
                post_commands: vec!["exit".to_string()],
                output_start: 1,
                output_end: -2,
            },
            OutputFormat {
                format_name: "backup_running".to_string(),
                pre_commands: vec![],
                commands: vec!["show config running".to_string()],
                post_commands: vec![],
                output_start: 2,
                output_end: -2,
            },
            OutputFormat {
                format_name: "info".to_string(),
                pre_commands: vec![],
                commands: vec![
                    "show clock".to_string(),
                    "show system info".to_string(),
                    "show high-availability all".to_string(),
                    "show routing protocol bgp summary".to_string(),
                    "show interface all".to_string(),
                    "show arp all".to_string(),
                    "show dhcp server lease interface all".to_string(),
                ],
                post_commands: vec![],
                output_start: 2,
                output_end: -2,
            },
        ]
    }

    fn harden(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        info!(target: "vendors::paloalto", "configuring initial cli setup for {}", device_name);
        let prompt = self.cli_prompt_pattern(device_name);
        session.send("set cli scripting-mode on", &prompt)?;
        session.send("set cli terminal width 500", &prompt)?;
        session.send("set cli terminal height 500", &prompt)?;
        session.send("set cli pager off", &prompt)?;
        session.send("set cli confirmation-prompt off", &prompt)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PaloAltoAdapter {
    fn enter_config_mode(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        let prompt = self.cli_prompt_pattern(device_name);
        session.send("configure", &prompt)?;
        Ok(())
    }

    fn exit_config_mode(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        let prompt = self.cli_prompt_pattern(device_name);
        session.send("exit", &prompt)?;
        Ok(())
    }

    /// Send the `commit` command and wait for either the base prompt or the
    /// "synchronize the peers" HA question, recursing through the sync path
    /// on that branch exactly as the original driver does.
    fn send_commit_command(&self, session: &mut CliSession, device_name: &str) -> Result<String, NetcatError> {
        info!(target: "vendors::paloalto", "configuration commit started on {}", device_name);

        let base_prompt = self.cli_prompt_pattern(device_name);
        let sync_question = r"Please synchronize the peers by running 'request high-availability sync-to-remote running-config' first\.\r\nWould you like to proceed with commit\? \(y or n\)";
        let combined = format!("(?:{base_prompt})|(?:{sync_question})");

        let output = session.send_with_timeout("commit", &combined, get_timeout(TimeoutKind::Commit))?;

        if Regex::new(sync_question)?.is_match(&output) {
            warn!(target: "vendors::paloalto", "need to synchronize configuration to the other node on {}", device_name);
            session.send("n", &base_prompt)?;
            self.exit_config_mode(session, device_name)?;
            session.send(
                "request high-availability sync-to-remote running-config",
                &base_prompt,
            )?;
            sleep(Duration::from_secs(120));
            info!(target: "vendors::paloalto", "restarting commit on {}", device_name);
            self.enter_config_mode(session, device_name)?;
            return self.send_commit_command(session, device_name);
        }

        Ok(output)
    }
}

impl PaloAltoOps for PaloAltoAdapter {
    fn validate_ha_state(
        &self,
        session: &mut CliSession,
        device_name: &str,
        snippet: &str,
        timeout: Duration,
    ) -> Result<String, NetcatError> {
        let expected_ha_state = snippet
            .lines()
            .find_map(|line| line.strip_prefix("# Expected HA state: "))
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "active".to_string());

        info!(target: "vendors::paloalto", "expected HA state for {}: '{}'", device_name, expected_ha_state);

        session.write_raw("\n")?;
        let role_prompt = self.prompt_for_role(device_name, Some(&expected_ha_state));
        let any_prompt = self.cli_prompt_pattern(device_name);
        let combined = format!("(?:{role_prompt})|(?:{any_prompt})");

        let output = session.expect(&combined, timeout)?;
        if Regex::new(&role_prompt)?.is_match(&output) {
            Ok(output)
        } else {
            Err(NetcatError::ProtocolFault(format!(
                "HA state in cli prompt for {device_name} is not '{expected_ha_state}'"
            )))
        }
    }

    fn clear_commit_in_progress(&self, session: &mut CliSession) -> Result<(), NetcatError> {
        info!(target: "vendors::paloalto", "checking for any other commit in progress");
        let prompt = self.cli_prompt_pattern(session.host());
        let re = Regex::new(r"^[^ ]+ [^ ]+ +[^ ]+ +\d+ +Commit +ACT .*$")?;
        let attempts = get_retry_attempts(TimeoutKind::CommitInProgressClear);
        let interval = get_timeout(TimeoutKind::CommitInProgressClear);

        for _ in 0..attempts {
            let output = session.send("show jobs processed", &prompt)?;
            if output.lines().any(|line| re.is_match(line)) {
                warn!(target: "vendors::paloalto", "another commit in progress, waiting 30s");
                sleep(interval);
                continue;
            }
            info!(target: "vendors::paloalto", "no other commit in progress");
            return Ok(());
        }

        Err(NetcatError::Busy("another commit in progress takes over 3 minutes".into()))
    }

    fn download_software(&self, session: &mut CliSession, version: &str) -> Result<(), NetcatError> {
        let parts: Vec<&str> = version.split('.').collect();
        let (major, minor, patch) = match parts.as_slice() {
            [maj, min, pat] => (*maj, *min, *pat),
            _ => {
                return Err(NetcatError::ConfigurationFault(format!(
                    "malformed software version: {version}"
                )))
            }
        };

        let mut dependencies = vec![format!("{major}.0.0")];
        if minor != "0" {
            dependencies.push(format!("{major}.{minor}.0"));
        }
        if patch != "0" {
            dependencies.push(format!("{major}.{minor}.{patch}"));
        }

        let prompt = self.cli_prompt_pattern(session.host());

        info!(target: "vendors::paloalto", "refreshing available software versions");
        let available = session.send_with_timeout(
            "request system software check",
            &prompt,
            get_timeout(TimeoutKind::SoftwareCheck),
        )?;
        if available.to_lowercase().contains("server error") {
            return Err(NetcatError::ProtocolFault(
                "server error while refreshing software versions".into(),
            ));
        }

        for dependency in &dependencies {
            for attempt in 0..3 {
                info!(target: "vendors::paloalto", "attempting to download software version {}", dependency);

                let mut command_output = String::new();
                let mut started = false;
                for _ in 0..30 {
                    command_output = session.send(
                        &format!("request system software download version {dependency}"),
                        &prompt,
                    )?;
                    let lower = command_output.to_lowercase();
                    if lower.contains("server error") {
                        if lower.contains("another download is in progress") {
                            info!(target: "vendors::paloalto", "another download in progress, waiting...");
                            sleep(Duration::from_secs(10));
                            continue;
                        }
                        return Err(NetcatError::ProtocolFault(format!(
                            "server error downloading {dependency}"
                        )));
                    }
                    started = true;
                    break;
                }
                if !started {
                    return Err(NetcatError::Busy(
                        "another download in progress for over 5 minutes".into(),
                    ));
                }

                let job_id = Regex::new(r"^Download job enqueued with jobid (\d+)$")?
                    .captures(&command_output)
                    .map(|c| c[1].to_string())
                    .unwrap_or_default();

                sleep(Duration::from_secs(5));

                if poll_job_until_terminal(session, &prompt, &job_id, "Downld")? {
                    info!(target: "vendors::paloalto", "download of version {} completed", dependency);
                    break;
                }

                warn!(target: "vendors::paloalto", "download of version {} failed (attempt {})", dependency, attempt + 1);
                if attempt == 2 {
                    return Err(NetcatError::ProtocolFault(format!(
                        "failed three attempts to download version {dependency}"
                    )));
                }
            }
        }

        info!(target: "vendors::paloalto", "download of all required software versions completed");
        Ok(())
    }

    fn upgrade_software(&self, session: &mut CliSession, version: &str) -> Result<(), NetcatError> {
        let prompt = self.cli_prompt_pattern(session.host());
        let mut job_id = String::new();

        'attempts: for attempt in 0..3 {
            let mut command_output = String::new();
            let mut started = false;
            for _ in 0..30 {
                command_output =
                    session.send(&format!("request system software install version {version}"), &prompt)?;
                let lower = command_output.to_lowercase();
                if lower.contains("server error") {
                    if lower.contains("install is in progress")
                        || lower.contains("pending jobs in the commit task queue")
                        || lower.contains("commit is in progress")
                    {
                        sleep(Duration::from_secs(10));
                        continue;
                    }
                    return Err(NetcatError::ProtocolFault(format!(
                        "server error installing version {version}"
                    )));
                }
                started = true;
                break;
            }
            if !started {
                return Err(NetcatError::Busy(
                    "another installation in progress for over 5 minutes".into(),
                ));
            }

            job_id = Regex::new(r"^Software install job enqueued with jobid (\d+)\.\s*.*$")?
                .captures(&command_output)
                .map(|c| c[1].to_string())
                .unwrap_or_default();

            info!(target: "vendors::paloalto", "installation of {} started with job id '{}'", version, job_id);
            sleep(Duration::from_secs(5));

            if poll_job_until_terminal(session, &prompt, &job_id, "SWInstall")? {
                info!(target: "vendors::paloalto", "installation of version {} completed", version);
                break 'attempts;
            }

            warn!(target: "vendors::paloalto", "installation of version {} failed (attempt {})", version, attempt + 1);
            if attempt == 2 {
                return Err(NetcatError::ProtocolFault(format!(
                    "failed three attempts to install version {version}"
                )));
            }
        }
        let _ = job_id;

        let (interval, attempts) = (
            get_timeout(TimeoutKind::HaStabilization),
            get_retry_attempts(TimeoutKind::HaStabilization),
        );
        let state_re = Regex::new(r"^\s+State:\s+(\S+).*$")?;

        for _ in 0..attempts {
            let output = session.send("show high-availability all", &prompt)?;
            let states: Vec<String> = output
                .lines()
                .filter_map(|l| state_re.captures(l).map(|c| c[1].to_string()))
                .collect();
            if states.len() < 2 {
                return Err(NetcatError::ProtocolFault(format!(
                    "cannot properly read firewalls HA state: {states:?}"
                )));
            }
            if states[..2].iter().all(|s| s == "active" || s == "passive") {
                info!(target: "vendors::paloalto", "firewall HA states look okay: {:?}", states);
                break;
            }
            info!(target: "vendors::paloalto", "firewall HA states not okay yet: {:?}, waiting", states);
            sleep(interval);
        }

        info!(target: "vendors::paloalto", "rebooting system");
        session.send_with_timeout(
            "request restart system",
            "The system is going down for reboot NOW!",
            get_timeout(TimeoutKind::RebootBanner),
        )?;
        Ok(())
    }
}

/// Poll `show jobs id <job_id>` every 5s while the job is active/queued,
/// with a 20s extra wait at 99% progress; returns whether it finished `OK`.
fn poll_job_until_terminal(
    session: &mut CliSession,
    prompt: &str,
    job_id: &str,
    job_kind: &str,
) -> Result<bool, NetcatError> {
    let state_re = Regex::new(&format!(
        r"^\S+\s+\S+\s+(?:\S+\s+)?\d+\s+{job_kind}\s+(\S+)\s+\S+\s+\S+\s*$"
    ))?;
    let progress_re = Regex::new(&format!(r"^\S+\s+\S+\s+\S+\s+\d+\s+{job_kind}\s+\S+\s+\S+\s+(\S+)\s*$"))?;
    let done_re = Regex::new(&format!(
        r"^\S+\s+\S+\s+\S+\s+{job_id}\s+{job_kind}\s+FIN\s+(\S+)\s+\S+\s*$"
    ))?;

    loop {
        let output = session.send(&format!("show jobs id {job_id}"), prompt)?;
        let state = output.lines().find_map(|l| state_re.captures(l).map(|c| c[1].to_string()));

        match state.as_deref() {
            Some("ACT") | Some("QUEUED") => {
                let progress = output
                    .lines()
                    .find_map(|l| progress_re.captures(l).map(|c| c[1].to_string()))
                    .unwrap_or_default();
                if progress == "99%" {
                    sleep(Duration::from_secs(20));
                } else {
                    sleep(Duration::from_secs(5));
                }
            }
            _ => {
                return Ok(output.lines().any(|l| {
                    done_re
                        .captures(l)
                        .map(|c| &c[1] == "OK")
                        .unwrap_or(false)
                }));
            }
        }
    }
}

impl DeploySnippet for PaloAltoAdapter {
    fn deploy_snippet(
        &self,
        session: &mut CliSession,
        device_name: &str,
        snippet: &str,
        no_commit: bool,
    ) -> Result<(), NetcatError> {
        self.validate_ha_state(session, device_name, snippet, Duration::from_secs(30))?;
        self.clear_commit_in_progress(session)?;

        info!(target: "vendors::paloalto", "configuration deployment started for {}", device_name);
        self.enter_config_mode(session, device_name)?;

        let prompt = self.cli_prompt_pattern(device_name);
        for line in non_comment_lines(snippet) {
            info!(target: "vendors::paloalto", "deploying line '{}'", line);
            session.send(line, &prompt)?;
        }

        info!(target: "vendors::paloalto", "configuration deployment finished for {}", device_name);
        self.exit_config_mode(session, device_name)?;

        if no_commit {
            warn!(target: "vendors::paloalto", "configuration loaded but not committed (no-commit requested) on {}", device_name);
            return Ok(());
        }

        self.clear_commit_in_progress(session)?;
        self.enter_config_mode(session, device_name)?;
        let command_output = self.send_commit_command(session, device_name)?;

        let commit_lines: Vec<&str> = command_output.lines().collect();
        let commit_body = if commit_lines.len() > 5 {
            &commit_lines[3..commit_lines.len() - 2]
        } else {
            &commit_lines[..]
        };

        let has_error = commit_body.iter().any(|l| l.to_lowercase().contains("error"));
        for line in commit_body {
            info!(target: "vendors::paloalto", "commit output: {}", line);
        }
        info!(target: "vendors::paloalto", "configuration commit finished for {}", device_name);

        if has_error {
            session.send("revert config", &prompt)?;
            return Err(NetcatError::CommitValidationError(format!(
                "commit validation error detected on {device_name}, reverted to previous configuration"
            )));
        }

        self.exit_config_mode(session, device_name)?;
        Ok(())
    }
}

impl CreateSnapshot for PaloAltoAdapter {
    fn create_snapshot(&self, session: &mut CliSession, device_name: &str) -> Result<(), NetcatError> {
        let config_name = crate::util::timestamp_tag("netcat");
        info!(target: "vendors::paloalto", "saving configuration snapshot '{}' on {}", config_name, device_name);
        self.enter_config_mode(session, device_name)?;
        let prompt = self.cli_prompt_pattern(device_name);
        session.send(&format!("save config to {config_name}"), &prompt)?;
        self.exit_config_mode(session, device_name)?;
        Ok(())
    }
}

impl SiteIdentityOps for PaloAltoAdapter {
    fn get_site_id(&self, session: &mut CliSession) -> Result<String, NetcatError> {
        let prompt = self.cli_prompt_pattern(session.host());
        let output = session.send("show routing protocol bgp summary", &prompt)?;
        let re = Regex::new(r"^ +router id: +\d+\.(\d+)\.\d+\.\d+$")?;
        output
            .lines()
            .find_map(|l| re.captures(l).map(|c| c[1].to_string()))
            .ok_or_else(|| {
                NetcatError::ProtocolFault(
                    "cannot detect site id in 'show routing protocol bgp summary' output".into(),
                )
            })
    }

    fn get_inet_gw(&self, session: &mut CliSession) -> Result<String, NetcatError> {
        let prompt = self.cli_prompt_pattern(session.host());
        self.enter_config_mode(session, session.host())?;
        let output = session.send(
            "show network virtual-router VR_GLOBAL routing-table ip static-route SR_DEFAULT nexthop",
            &prompt,
        )?;
        self.exit_config_mode(session, session.host())?;

        let re = Regex::new(r"^.+ (\d+\.\d+\.\d+\.\d+)$")?;
        output
            .lines()
            .find_map(|l| re.captures(l).map(|c| c[1].to_string()))
            .ok_or_else(|| {
                NetcatError::ProtocolFault(
                    "cannot find default route nexthop in static route table".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_for_role_matches_expected_suffix_only() {
        let adapter = PaloAltoAdapter::new("admin");
        let pattern = adapter.prompt_for_role("fw1", Some("active"));
        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("admin@FW1(active)# "));
        assert!(!re.is_match("admin@FW1(passive)# "));
    }

    #[test]
    fn generic_prompt_matches_any_ha_role() {
        let adapter = PaloAltoAdapter::new("admin");
        let re = Regex::new(&adapter.cli_prompt_pattern("fw1")).unwrap();
        for role in ["active-primary", "active-secondary", "active", "passive", "non-functional", "suspended", ""] {
            let sample = format!("admin@FW1({role})# ");
            assert!(re.is_match(&sample), "expected match for role {role}");
        }
    }
}
