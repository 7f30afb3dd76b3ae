use thiserror::Error;

/// Error taxonomy for the Device Interaction Engine.
///
/// Every variant maps to one of the fault kinds a worker can hit while
/// driving a device's CLI session; see the Fleet Runner for how these are
/// caught at the worker boundary and converted into a quiet per-device
/// failure.
#[derive(Error, Debug)]
pub enum NetcatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("authentication failed for {username}@{host}")]
    AuthFailure { host: String, username: String },

    #[error("connection refused by {host}")]
    Refused { host: String },

    #[error("timed out while {action} (after {timeout_secs}s)")]
    Timeout { action: String, timeout_secs: u64 },

    #[error("end of stream while {0}: child process exited")]
    EndOfStream(String),

    #[error("host key fault on {host}: {detail}")]
    HostKeyFault { host: String, detail: String },

    #[error("protocol fault: {0}")]
    ProtocolFault(String),

    #[error("device busy: {0}")]
    Busy(String),

    #[error("commit validation failed, reverted on device: {0}")]
    CommitValidationError(String),

    #[error("storage throttled after {attempts} attempts")]
    ThrottlingRetryable { attempts: u32 },

    #[error("configuration fault: {0}")]
    ConfigurationFault(String),
}

impl NetcatError {
    pub fn timeout(action: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            action: action.into(),
            timeout_secs,
        }
    }

    pub fn auth_failure(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self::AuthFailure {
            host: host.into(),
            username: username.into(),
        }
    }

    pub fn host_key_fault(host: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::HostKeyFault {
            host: host.into(),
            detail: detail.into(),
        }
    }

    /// Whether this fault is fatal to the device's worker only (the common
    /// case) as opposed to a preflight fault that should abort the job
    /// before any worker is spawned.
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::ConfigurationFault(_))
    }
}
