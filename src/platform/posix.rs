//! POSIX command strategy using lsof and kill.

use std::collections::HashSet;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use super::{validate_pid, PortCommands};
use crate::error::{Error, Result};
use crate::models::ProcessRecord;

/// POSIX (macOS, Linux) lookup and termination strategy.
#[derive(Debug, Clone, Default)]
pub struct PosixCommands;

/// Classify lsof stderr after a nonzero exit.
///
/// lsof exits 1 both for "nothing matched the filter" and alongside benign
/// `lsof: WARNING: can't stat() ...` noise (fuse mounts, containers). Only
/// non-warning diagnostics mark a real invocation failure.
fn lookup_failure_reason(stderr: &str) -> Option<String> {
    let diagnostics: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                // warnings arrive as a tagged line plus a continuation line
                && !line.contains("WARNING:")
                && !line.contains("Output information may be incomplete")
        })
        .collect();

    if diagnostics.is_empty() {
        None
    } else {
        Some(diagnostics.join("; "))
    }
}

impl PosixCommands {
    pub fn new() -> Self {
        Self
    }

    /// Parse lsof output into process records.
    ///
    /// Expected lsof output format:
    /// ```text
    /// COMMAND  PID USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
    /// node    4321  bob   23u  IPv6 0x6e5ad6d53f4a92b3      0t0  TCP *:8080 (LISTEN)
    /// ```
    ///
    /// Column layout: COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME.
    /// The header row and any line without a numeric PID column are dropped;
    /// columns past the PID are optional and default to absent.
    fn parse_lsof_output(&self, output: &str) -> Vec<ProcessRecord> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 2 {
                continue;
            }

            // The header carries "PID" here; anything non-numeric is discarded.
            let pid = components[1];
            if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            // lsof reports one row per socket; IPv4 and IPv6 rows for the
            // same process collapse into one record.
            if !seen.insert(pid.to_string()) {
                continue;
            }

            // Unescape the command name the way lsof encodes it
            let name = components
                .first()
                .map(|c| c.replace("\\x20", " ").replace("\\x2f", "/"));
            let user = components.get(2).map(|c| c.to_string());
            // NODE column: TCP or UDP
            let protocol = components.get(7).map(|c| c.to_string());

            records.push(ProcessRecord {
                pid: pid.to_string(),
                name,
                user,
                protocol,
            });
        }

        records
    }
}

impl PortCommands for PosixCommands {
    /// Look up port occupants.
    ///
    /// Executes: `lsof -i :<port> -P -n`
    ///
    /// Flags explained:
    /// - -i :port: Select sockets bound to the port, TCP or UDP
    /// - -P: Show port numbers (don't resolve to service names)
    /// - -n: Show IP addresses (don't resolve to hostnames)
    async fn lookup(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        debug!(port, "running lsof");

        let output = Command::new("lsof")
            .args(["-i", &format!(":{}", port), "-P", "-n"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::LookupFailed(format!("Failed to run lsof: {}", e)))?;

        // lsof exits nonzero when nothing matches its filter; that is an
        // empty result, not a failure. Only non-warning stderr diagnostics are.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if let Some(reason) = lookup_failure_reason(&stderr) {
                return Err(Error::LookupFailed(reason));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.parse_lsof_output(&stdout))
    }

    /// Force kill one process.
    ///
    /// Executes: `kill -9 <pid>` (SIGKILL, unconditional).
    async fn kill(&self, pid: &str) -> Result<()> {
        validate_pid(pid)?;
        debug!(pid, "sending SIGKILL");

        let output = Command::new("kill").args(["-9", pid]).output().await?;

        if output.status.success() {
            debug!(pid, "SIGKILL delivered");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let reason = if stderr.is_empty() {
            format!("kill exited with {}", output.status)
        } else {
            stderr
        };
        warn!(pid, reason = %reason, "kill -9 failed");

        Err(Error::KillFailed {
            pid: pid.to_string(),
            reason,
        })
    }

    fn kill_hint(&self, pid: &str) -> String {
        format!("kill -9 {}", pid)
    }
}
