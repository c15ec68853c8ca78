//! Platform command strategies for port lookup and process termination.
//!
//! Each strategy wraps the OS tooling for one platform family: `lsof` and
//! `kill` on POSIX systems, `netstat` and `taskkill` on Windows. Both
//! strategies compile on every target so their parsers can be exercised
//! against captured fixtures anywhere; the active one is picked once at
//! startup.

mod posix;
mod windows;

pub use posix::PosixCommands;
pub use windows::WindowsCommands;

use crate::error::{Error, Result};
use crate::models::ProcessRecord;

/// Platform capability for inspecting and terminating port occupants.
pub trait PortCommands: Send + Sync {
    /// List the processes currently bound to `port`.
    ///
    /// An empty result means nothing is bound; only an abnormal tool
    /// invocation is an error.
    fn lookup(
        &self,
        port: u16,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessRecord>>> + Send;

    /// Forcefully terminate one process. An `Err` marks the PID as failed
    /// in the batch outcome; it never aborts sibling attempts.
    fn kill(&self, pid: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// The literal command an operator would run to terminate `pid` by hand.
    fn kill_hint(&self, pid: &str) -> String;
}

/// Runtime-selected platform strategy.
#[derive(Debug, Clone)]
pub enum PlatformCommands {
    Posix(PosixCommands),
    Windows(WindowsCommands),
}

impl PlatformCommands {
    /// Select the strategy for the platform this process runs on.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows(WindowsCommands::new())
        } else {
            Self::Posix(PosixCommands::new())
        }
    }
}

impl PortCommands for PlatformCommands {
    async fn lookup(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        match self {
            Self::Posix(commands) => commands.lookup(port).await,
            Self::Windows(commands) => commands.lookup(port).await,
        }
    }

    async fn kill(&self, pid: &str) -> Result<()> {
        match self {
            Self::Posix(commands) => commands.kill(pid).await,
            Self::Windows(commands) => commands.kill(pid).await,
        }
    }

    fn kill_hint(&self, pid: &str) -> String {
        match self {
            Self::Posix(commands) => commands.kill_hint(pid),
            Self::Windows(commands) => commands.kill_hint(pid),
        }
    }
}

/// Reject PID strings that are not plain decimal tokens before they reach
/// a shell command line.
pub(crate) fn validate_pid(pid: &str) -> Result<()> {
    if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::KillFailed {
            pid: pid.to_string(),
            reason: "not a valid pid token".to_string(),
        });
    }
    Ok(())
}
