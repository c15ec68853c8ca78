//! Windows command strategy using netstat and taskkill.

use std::collections::HashSet;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use super::{validate_pid, PortCommands};
use crate::error::{Error, Result};
use crate::models::ProcessRecord;

/// Windows lookup and termination strategy.
#[derive(Debug, Clone, Default)]
pub struct WindowsCommands;

impl WindowsCommands {
    pub fn new() -> Self {
        Self
    }

    /// Parse `netstat -ano` output, keeping TCP rows in LISTENING state
    /// whose local address port equals `port`.
    ///
    /// Example output:
    /// ```text
    /// Active Connections
    ///
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       4321
    ///   TCP    [::]:445               [::]:0                 LISTENING       4
    /// ```
    ///
    /// netstat carries no process name or owner, so those fields stay absent.
    fn parse_netstat_output(&self, port: u16, output: &str) -> Vec<ProcessRecord> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for line in output.lines() {
            let line = line.trim();

            // Skip empty lines and headers
            if line.is_empty() || line.starts_with("Active") || line.starts_with("Proto") {
                continue;
            }

            // Expected format: Proto, Local Address, Foreign Address, State, PID
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                continue;
            }

            if !parts[0].eq_ignore_ascii_case("TCP") {
                continue;
            }

            if parts[3] != "LISTENING" {
                continue;
            }

            let Some(local_port) = Self::local_port(parts[1]) else {
                continue;
            };
            if local_port != port {
                continue;
            }

            let pid = parts[4];
            if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            // IPv4 and IPv6 rows for the same process collapse into one record
            if !seen.insert(pid.to_string()) {
                continue;
            }

            records.push(ProcessRecord {
                pid: pid.to_string(),
                name: None,
                user: None,
                protocol: Some(parts[0].to_string()),
            });
        }

        records
    }

    /// Extract the port from "0.0.0.0:8080" or "[::]:8080".
    fn local_port(addr: &str) -> Option<u16> {
        let colon = addr.rfind(':')?;
        addr[colon + 1..].parse().ok()
    }
}

impl PortCommands for WindowsCommands {
    /// Look up port occupants.
    ///
    /// Executes: `netstat -ano` and filters the connection table to rows
    /// listening on the target port.
    async fn lookup(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        debug!(port, "running netstat");

        let output = Command::new("netstat")
            .arg("-ano")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::LookupFailed(format!("Failed to run netstat: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("netstat exited with {}", output.status)
            } else {
                stderr
            };
            return Err(Error::LookupFailed(reason));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.parse_netstat_output(port, &stdout))
    }

    /// Force kill one process and its child tree.
    ///
    /// Executes: `taskkill /PID <pid> /T /F`
    async fn kill(&self, pid: &str) -> Result<()> {
        validate_pid(pid)?;
        debug!(pid, "running taskkill /T /F");

        let output = Command::new("taskkill")
            .args(["/PID", pid, "/T", "/F"])
            .output()
            .await?;

        if output.status.success() {
            debug!(pid, "taskkill succeeded");
            return Ok(());
        }

        // taskkill writes some diagnostics to stdout
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reason = format!("{} {}", stdout.trim(), stderr.trim())
            .trim()
            .to_string();
        warn!(pid, reason = %reason, "taskkill failed");

        Err(Error::KillFailed {
            pid: pid.to_string(),
            reason,
        })
    }

    fn kill_hint(&self, pid: &str) -> String {
        format!("taskkill /PID {} /T /F", pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       4321
  TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       77
  TCP    [::]:8080              [::]:0                 LISTENING       4321
  TCP    127.0.0.1:8080         127.0.0.1:54998        ESTABLISHED     4321
  UDP    0.0.0.0:8080           *:*                                    900
"#;

    #[test]
    fn test_parse_filters_port_and_state() {
        let commands = WindowsCommands::new();

        let records = commands.parse_netstat_output(8080, FIXTURE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, "4321");
        assert_eq!(records[0].protocol.as_deref(), Some("TCP"));
        assert_eq!(records[0].name, None);
        assert_eq!(records[0].user, None);
    }

    #[test]
    fn test_parse_other_port() {
        let commands = WindowsCommands::new();

        let records = commands.parse_netstat_output(3000, FIXTURE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, "77");
    }

    #[test]
    fn test_parse_unoccupied_port() {
        let commands = WindowsCommands::new();
        assert!(commands.parse_netstat_output(9999, FIXTURE).is_empty());
        assert!(commands.parse_netstat_output(9999, "").is_empty());
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let commands = WindowsCommands::new();

        let output = r#"
  TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING
  TCP    no-port-here           0.0.0.0:0              LISTENING       4321
  TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       pid?
"#;
        assert!(commands.parse_netstat_output(8080, output).is_empty());
    }

    #[test]
    fn test_local_port() {
        assert_eq!(WindowsCommands::local_port("0.0.0.0:8080"), Some(8080));
        assert_eq!(WindowsCommands::local_port("[::]:445"), Some(445));
        assert_eq!(WindowsCommands::local_port("[::1]:3000"), Some(3000));
        assert_eq!(WindowsCommands::local_port("garbage"), None);
    }

    #[test]
    fn test_kill_hint() {
        let commands = WindowsCommands::new();
        assert_eq!(commands.kill_hint("4321"), "taskkill /PID 4321 /T /F");
    }

    #[tokio::test]
    async fn test_kill_rejects_malformed_pid() {
        let commands = WindowsCommands::new();
        let result = commands.kill("").await;
        assert!(matches!(result, Err(Error::KillFailed { .. })));
    }
}
