//! Data model for port occupants, classification and termination outcomes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One process found occupying a port.
///
/// Only the PID is guaranteed; the remaining fields depend on what the
/// platform inspection tool reports and are absent when its output does
/// not carry the corresponding column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process ID as reported by the OS tool. Always a non-empty decimal token.
    pub pid: String,

    /// Process/command name, when reported.
    pub name: Option<String>,

    /// Owning user name, when reported.
    pub user: Option<String>,

    /// Transport/protocol tag as reported by the tool (e.g. "TCP").
    pub protocol: Option<String>,
}

impl ProcessRecord {
    /// Create a record with just a PID; optional fields start absent.
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            name: None,
            user: None,
            protocol: None,
        }
    }
}

impl std::fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {}", self.pid)?;

        let mut details = Vec::new();
        if let Some(name) = &self.name {
            details.push(name.clone());
        }
        if let Some(user) = &self.user {
            details.push(format!("user {}", user));
        }
        if let Some(protocol) = &self.protocol {
            details.push(protocol.clone());
        }

        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

/// Classification result for one port number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPortStatus {
    /// Whether the port is a well-known/system-reserved port that must not
    /// be cleaned up automatically.
    pub is_protected: bool,

    /// Current occupants, attached best-effort when the port is protected.
    pub occupants: Vec<ProcessRecord>,
}

impl SystemPortStatus {
    /// An unprotected port; occupants are not attached on this path.
    pub fn unprotected() -> Self {
        Self {
            is_protected: false,
            occupants: Vec::new(),
        }
    }

    /// A protected port with its current occupants.
    pub fn protected_with(occupants: Vec<ProcessRecord>) -> Self {
        Self {
            is_protected: true,
            occupants,
        }
    }
}

/// Result of a batch termination attempt.
///
/// `killed` and `failed` are disjoint and together contain exactly the
/// requested PID set. Sets rather than sequences: concurrent attempts
/// complete in no particular order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationOutcome {
    /// PIDs whose termination command succeeded.
    pub killed: BTreeSet<String>,

    /// PIDs whose termination command failed or could not be invoked.
    pub failed: BTreeSet<String>,
}

impl TerminationOutcome {
    /// True when at least one termination was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.killed.is_empty() && !self.failed.is_empty()
    }

    /// Total number of PIDs accounted for.
    pub fn len(&self) -> usize {
        self.killed.len() + self.failed.len()
    }

    /// True when no termination was attempted.
    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.failed.is_empty()
    }
}

/// Dispatcher-facing payload: one or more text segments plus an error flag.
///
/// The embedding dispatcher renders this directly; the crate never exposes
/// structured occupant data on this surface, only plain text lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    /// Plain-text segments, in display order.
    pub text: Vec<String>,

    /// Set when the request as a whole failed. Partial termination success
    /// leaves this clear.
    pub is_error: bool,
}

impl ToolResponse {
    /// A successful response from text segments.
    pub fn text(segments: Vec<String>) -> Self {
        Self {
            text: segments,
            is_error: false,
        }
    }

    /// An error response with a single diagnostic segment.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: vec![message.into()],
            is_error: true,
        }
    }

    /// Render a core error as an error payload, for dispatchers that must
    /// never crash on a failed request.
    pub fn from_error(err: &Error) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_display_full() {
        let record = ProcessRecord {
            pid: "4321".to_string(),
            name: Some("node".to_string()),
            user: Some("bob".to_string()),
            protocol: Some("TCP".to_string()),
        };
        assert_eq!(record.to_string(), "pid 4321 (node, user bob, TCP)");
    }

    #[test]
    fn test_record_display_pid_only() {
        let record = ProcessRecord::new("77");
        assert_eq!(record.to_string(), "pid 77");
    }

    #[test]
    fn test_outcome_partition_helpers() {
        let mut outcome = TerminationOutcome::default();
        assert!(outcome.is_empty());
        assert!(!outcome.all_failed());

        outcome.failed.insert("1".to_string());
        assert!(outcome.all_failed());

        outcome.killed.insert("2".to_string());
        assert!(!outcome.all_failed());
        assert_eq!(outcome.len(), 2);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = ToolResponse::error("boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["text"][0], "boom");
    }

    #[test]
    fn test_response_from_error() {
        let response = ToolResponse::from_error(&Error::LookupFailed("lsof blew up".to_string()));
        assert!(response.is_error);
        assert!(response.text[0].contains("lsof blew up"));
    }

    #[test]
    fn test_status_wire_shape() {
        let status = SystemPortStatus::protected_with(vec![ProcessRecord::new("100")]);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["isProtected"], true);
        assert_eq!(value["occupants"][0]["pid"], "100");
    }
}
