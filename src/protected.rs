//! Protected system port table.
//!
//! Ports below 1024 plus a small platform-specific set of well-known service
//! ports are excluded from automatic termination. The table is built once at
//! startup and never mutated afterwards.

use std::collections::HashSet;

/// Upper bound (exclusive) of the conventionally reserved port range.
const WELL_KNOWN_LIMIT: u16 = 1024;

/// macOS service ports above the well-known range: Apple Remote Desktop,
/// NFS, Screen Sharing.
const MACOS_SYSTEM_PORTS: &[u16] = &[2049, 3283, 5900];

/// Windows service ports above the well-known range: RDP, WinRM (HTTP/HTTPS),
/// SMB over NetBIOS session fallback.
const WINDOWS_SYSTEM_PORTS: &[u16] = &[3389, 5985, 5986];

/// Linux service ports above the well-known range: NFS, X11.
const LINUX_SYSTEM_PORTS: &[u16] = &[2049, 6000];

/// Immutable classifier for system-reserved ports.
///
/// A port is protected iff it is below [`WELL_KNOWN_LIMIT`] or a member of
/// the supplementary set the table was built with.
#[derive(Debug, Clone)]
pub struct ProtectedPorts {
    supplementary: HashSet<u16>,
}

impl ProtectedPorts {
    /// Build the table for the current platform.
    pub fn for_current_platform() -> Self {
        let supplementary = if cfg!(target_os = "windows") {
            WINDOWS_SYSTEM_PORTS
        } else if cfg!(target_os = "macos") {
            MACOS_SYSTEM_PORTS
        } else {
            LINUX_SYSTEM_PORTS
        };

        Self::with_supplementary(supplementary.iter().copied())
    }

    /// Build a table with an explicit supplementary set. Intended for tests
    /// and embedders with their own notion of untouchable ports.
    pub fn with_supplementary(ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            supplementary: ports.into_iter().collect(),
        }
    }

    /// Whether the port must not be cleaned up automatically.
    pub fn is_protected(&self, port: u16) -> bool {
        port < WELL_KNOWN_LIMIT || self.supplementary.contains(&port)
    }
}

impl Default for ProtectedPorts {
    fn default() -> Self {
        Self::for_current_platform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_ports_are_protected() {
        let table = ProtectedPorts::for_current_platform();
        assert!(table.is_protected(22));
        assert!(table.is_protected(80));
        assert!(table.is_protected(443));
        assert!(table.is_protected(1023));
    }

    #[test]
    fn test_high_ports_are_not_protected() {
        let table = ProtectedPorts::for_current_platform();
        assert!(!table.is_protected(8080));
        assert!(!table.is_protected(54321));
        assert!(!table.is_protected(65535));
    }

    #[test]
    fn test_supplementary_override() {
        let table = ProtectedPorts::with_supplementary([8080]);
        assert!(table.is_protected(8080));
        assert!(table.is_protected(22)); // well-known range always applies
        assert!(!table.is_protected(3000));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_rdp_is_protected_on_windows() {
        let table = ProtectedPorts::for_current_platform();
        assert!(table.is_protected(3389));
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_screen_sharing_is_protected_on_macos() {
        let table = ProtectedPorts::for_current_platform();
        assert!(table.is_protected(5900));
    }
}
