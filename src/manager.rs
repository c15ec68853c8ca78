//! Port cleanup orchestration.
//!
//! `PortProcessManager` ties the pieces together: classify the port, look up
//! its occupants, fan out concurrent termination attempts, and assemble the
//! plain-text response the embedding dispatcher renders.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{ProcessRecord, SystemPortStatus, TerminationOutcome, ToolResponse};
use crate::platform::{PlatformCommands, PortCommands};
use crate::protected::ProtectedPorts;

/// Service for discovering and terminating the processes bound to a port.
///
/// Generic over the platform command strategy so tests can inject a mock;
/// production code uses [`PortProcessManager::new`] which selects the
/// strategy for the current platform.
pub struct PortProcessManager<P: PortCommands + 'static = PlatformCommands> {
    commands: Arc<P>,
    protected: ProtectedPorts,
}

impl PortProcessManager<PlatformCommands> {
    /// Create a manager for the current platform with the default
    /// protected-port table.
    pub fn new() -> Self {
        Self::with_commands(PlatformCommands::current())
    }
}

impl Default for PortProcessManager<PlatformCommands> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PortCommands + 'static> PortProcessManager<P> {
    /// Create a manager with an injected command strategy.
    pub fn with_commands(commands: P) -> Self {
        Self {
            commands: Arc::new(commands),
            protected: ProtectedPorts::for_current_platform(),
        }
    }

    /// Replace the protected-port table.
    pub fn with_protected_ports(mut self, protected: ProtectedPorts) -> Self {
        self.protected = protected;
        self
    }

    // The dispatcher validates the range before calling in; port 0 is the
    // one value a u16 still lets through.
    fn validate(port: u16) -> Result<()> {
        if port == 0 {
            return Err(Error::InvalidPort(0));
        }
        Ok(())
    }

    /// List the processes currently bound to `port`.
    pub async fn lookup(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        Self::validate(port)?;
        self.commands.lookup(port).await
    }

    /// Classify `port` against the protected-port table. For a protected
    /// port the current occupants are attached best-effort: a failed lookup
    /// here degrades to an empty occupant list rather than an error.
    pub async fn classify(&self, port: u16) -> Result<SystemPortStatus> {
        Self::validate(port)?;

        if !self.protected.is_protected(port) {
            return Ok(SystemPortStatus::unprotected());
        }

        let occupants = match self.commands.lookup(port).await {
            Ok(records) => records,
            Err(err) => {
                warn!(port, error = %err, "occupant lookup failed on protected port");
                Vec::new()
            }
        };
        Ok(SystemPortStatus::protected_with(occupants))
    }

    /// Forcefully terminate every PID in the batch.
    ///
    /// Attempts are spawned concurrently and joined before the outcome is
    /// assembled; one failure never aborts or skips the others. The outcome
    /// partitions exactly the requested set into `killed` and `failed`.
    pub async fn terminate(&self, pids: &[String]) -> TerminationOutcome {
        let mut handles = Vec::with_capacity(pids.len());
        for pid in pids {
            let commands = Arc::clone(&self.commands);
            let task_pid = pid.clone();
            let handle = tokio::spawn(async move {
                match commands.kill(&task_pid).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(pid = %task_pid, error = %err, "termination attempt failed");
                        false
                    }
                }
            });
            handles.push((pid.clone(), handle));
        }

        let mut outcome = TerminationOutcome::default();
        for (pid, handle) in handles {
            match handle.await {
                Ok(true) => {
                    outcome.killed.insert(pid);
                }
                // A panicked attempt counts as failed for its PID
                _ => {
                    outcome.failed.insert(pid);
                }
            }
        }
        outcome
    }

    /// Clean up `port`: refuse with a warning when it is protected,
    /// report "not occupied" when nothing is bound, otherwise terminate
    /// every occupant and report the per-PID outcome.
    pub async fn clean(&self, port: u16) -> Result<ToolResponse> {
        Self::validate(port)?;

        let status = self.classify(port).await?;
        if status.is_protected {
            return Ok(self.protected_warning(port, &status.occupants));
        }

        let occupants = self.commands.lookup(port).await?;
        if occupants.is_empty() {
            return Ok(ToolResponse::text(vec![format!(
                "port {} not occupied",
                port
            )]));
        }

        let pids: Vec<String> = occupants.iter().map(|r| r.pid.clone()).collect();
        debug!(port, count = pids.len(), "terminating port occupants");
        let outcome = self.terminate(&pids).await;
        Ok(Self::termination_response(port, &outcome))
    }

    /// Inspect `port` without terminating anything.
    pub async fn scan(&self, port: u16) -> Result<ToolResponse> {
        Self::validate(port)?;

        let occupants = self.commands.lookup(port).await?;
        if occupants.is_empty() {
            return Ok(ToolResponse::text(vec![format!(
                "port {} not occupied",
                port
            )]));
        }

        let mut segments = vec![format!(
            "port {} is occupied by {} process(es)",
            port,
            occupants.len()
        )];
        segments.extend(occupants.iter().map(|r| r.to_string()));
        Ok(ToolResponse::text(segments))
    }

    fn protected_warning(&self, port: u16, occupants: &[ProcessRecord]) -> ToolResponse {
        let mut segments = vec![format!(
            "port {} is a protected system port; refusing to terminate automatically",
            port
        )];

        if occupants.is_empty() {
            segments.push("no occupants could be determined".to_string());
        }
        for record in occupants {
            segments.push(record.to_string());
            segments.push(format!(
                "to terminate manually, run: {}",
                self.commands.kill_hint(&record.pid)
            ));
        }

        ToolResponse::text(segments)
    }

    fn termination_response(port: u16, outcome: &TerminationOutcome) -> ToolResponse {
        let mut segments = vec![format!(
            "port {}: killed {} of {} process(es)",
            port,
            outcome.killed.len(),
            outcome.len()
        )];
        for pid in &outcome.killed {
            segments.push(format!("killed pid {}", pid));
        }
        for pid in &outcome.failed {
            segments.push(format!("failed to kill pid {}", pid));
        }

        ToolResponse {
            text: segments,
            // Partial success is still success; only a fully failed batch
            // flips the error flag.
            is_error: outcome.all_failed(),
        }
    }
}
