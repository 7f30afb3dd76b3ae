//! CLI Session state machine: a single authenticated interactive shell over
//! SSH, driving one device for the lifetime of one snapshot/deploy job.
//!
//! Grounded on the teacher's `base_connection.rs::connect()` for the
//! TCP/ssh2/PTY/shell setup sequence, generalized for:
//! - the two auth modes the fleet actually uses (password, public key),
//! - the original Python driver's password retry (one retry after a 5s
//!   backoff, rather than `ssh2`'s single-shot `userauth_password`), and
//! - a "first contact" host-key policy: trust-on-first-use per host for the
//!   lifetime of the process, since `ssh2` exposes no persistent known-hosts
//!   store wiring in this crate's dependency stack.

use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::Mutex;
use std::time::Duration;

use lazy_static::lazy_static;
use ssh2::Session as SshSession;
use tracing::{debug, info, warn};

use crate::config::NetcatConfig;
use crate::device::AuthMode;
use crate::error::NetcatError;
use crate::prompt_expecter::PromptExpecter;
use crate::settings::{get_timeout, TimeoutKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Authing,
    Open,
    Closed,
    Failed,
}

lazy_static! {
    /// Host key fingerprint last observed for each host, this process. A
    /// mismatch on a previously-seen host is escalated as a
    /// `HostKeyFault`; first contact for a host is accepted and recorded,
    /// never prompting interactively.
    static ref SEEN_HOST_KEYS: Mutex<HashMap<String, String>> = Mutex::new(HashMap::new());
}

/// An open interactive CLI session to one device.
pub struct CliSession {
    config: NetcatConfig,
    state: SessionState,
    expecter: Option<PromptExpecter>,
    pub base_prompt: Option<String>,
}

impl CliSession {
    pub fn new(config: NetcatConfig) -> Self {
        Self {
            config,
            state: SessionState::Init,
            expecter: None,
            base_prompt: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Connect, authenticate and start an interactive shell, landing on the
    /// device's unprivileged or privileged prompt (vendor adapters decide
    /// what to do from there).
    pub fn open(&mut self) -> Result<(), NetcatError> {
        self.state = SessionState::Authing;

        let addr = format!("{}:{}", self.config.host, self.config.default_port);
        debug!(target: "session", "connecting to {}", addr);

        let tcp = TcpStream::connect(&addr).map_err(|e| {
            self.state = SessionState::Failed;
            NetcatError::Io(e)
        })?;
        tcp.set_read_timeout(Some(self.config.login_timeout))
            .map_err(NetcatError::Io)?;
        tcp.set_write_timeout(Some(self.config.login_timeout))
            .map_err(NetcatError::Io)?;

        let mut session = SshSession::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        self.check_host_key(&session)?;
        self.authenticate(&session)?;

        let mut channel = session.channel_session()?;
        channel.request_pty("xterm", None, None)?;
        channel.shell()?;
        session.set_keepalive(true, 60);
        session.set_blocking(false);

        let mut expecter = PromptExpecter::new(channel).with_ansi_stripping(true);
        expecter.drain(Duration::from_millis(500));

        self.expecter = Some(expecter);
        self.state = SessionState::Open;
        info!(target: "session", "session open for {}", self.config.host);
        Ok(())
    }

    fn check_host_key(&self, session: &SshSession) -> Result<(), NetcatError> {
        let (key, _key_type) = session.host_key().ok_or_else(|| {
            NetcatError::host_key_fault(&self.config.host, "server offered no host key")
        })?;
        let fingerprint = format!("{key:x?}");

        let mut seen = SEEN_HOST_KEYS.lock().expect("host key map poisoned");
        match seen.get(&self.config.host) {
            None => {
                seen.insert(self.config.host.clone(), fingerprint);
                debug!(target: "session", "recorded host key for {} (first contact)", self.config.host);
                Ok(())
            }
            Some(previous) if previous == &fingerprint => Ok(()),
            Some(_) => Err(NetcatError::host_key_fault(
                &self.config.host,
                "host key changed since first contact this session",
            )),
        }
    }

    /// Authenticate, reproducing the original driver's one-retry-after-5s
    /// behavior for password auth (public key auth is single-shot: a key
    /// either works or the agent/file is misconfigured, retrying buys
    /// nothing).
    fn authenticate(&self, session: &SshSession) -> Result<(), NetcatError> {
        match self.config.auth_mode {
            AuthMode::Password => {
                let password = self.config.password.as_deref().ok_or_else(|| {
                    NetcatError::ConfigurationFault(format!(
                        "no password configured for {}",
                        self.config.host
                    ))
                })?;

                match session.userauth_password(&self.config.username, password) {
                    Ok(()) => Ok(()),
                    Err(first_err) => {
                        warn!(
                            target: "session",
                            "password auth failed for {}@{}, retrying once in 5s: {}",
                            self.config.username, self.config.host, first_err
                        );
                        std::thread::sleep(Duration::from_secs(5));
                        session
                            .userauth_password(&self.config.username, password)
                            .map_err(|_| {
                                NetcatError::auth_failure(&self.config.host, &self.config.username)
                            })
                    }
                }
            }
            AuthMode::PublicKey => {
                session
                    .userauth_agent(&self.config.username)
                    .map_err(|_| NetcatError::auth_failure(&self.config.host, &self.config.username))
            }
        }
    }

    /// Send a command and read the reply up to the current base prompt
    /// (or an explicit pattern, for multi-step prompts like enable/commit).
    pub fn send(&mut self, command: &str, pattern: &str) -> Result<String, NetcatError> {
        self.send_with_timeout(command, pattern, get_timeout(TimeoutKind::Command))
    }

    pub fn send_with_timeout(
        &mut self,
        command: &str,
        pattern: &str,
        timeout: Duration,
    ) -> Result<String, NetcatError> {
        let expecter = self.expecter_mut()?;
        expecter.command(command, pattern, timeout)
    }

    /// Low-level: write raw data without a trailing newline (used for
    /// single-character responses like a y/n confirmation prompt).
    pub fn write_raw(&mut self, data: &str) -> Result<(), NetcatError> {
        self.expecter_mut()?.write_raw(data)
    }

    pub fn expect(&mut self, pattern: &str, timeout: Duration) -> Result<String, NetcatError> {
        self.expecter_mut()?.expect(pattern, timeout)
    }

    fn expecter_mut(&mut self) -> Result<&mut PromptExpecter, NetcatError> {
        if self.state != SessionState::Open {
            return Err(NetcatError::ProtocolFault(format!(
                "session for {} is not open (state: {:?})",
                self.config.host, self.state
            )));
        }
        self.expecter
            .as_mut()
            .ok_or_else(|| NetcatError::ProtocolFault("session has no active channel".into()))
    }

    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.expecter = None;
        self.state = SessionState::Closed;
        debug!(target: "session", "session closed for {}", self.config.host);
    }
}

impl Drop for CliSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_in_init_state() {
        let session = CliSession::new(NetcatConfig::default());
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn commands_before_open_are_rejected() {
        let mut session = CliSession::new(NetcatConfig::default());
        let result = session.send("show version", "#");
        assert!(result.is_err());
    }
}
