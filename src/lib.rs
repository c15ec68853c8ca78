//! Portsweep - free up a network port by killing whatever holds it
//!
//! This library provides platform-agnostic APIs for:
//! - Looking up the processes bound to a given port
//! - Classifying ports as protected system ports
//! - Force-killing processes by PID, concurrently, with per-PID outcomes
//! - Assembling plain-text responses for an embedding request dispatcher
//!
//! # Platform Support
//! - POSIX (macOS, Linux): uses `lsof` for lookup and `kill -9` for termination
//! - Windows: uses `netstat -ano` for lookup and `taskkill /T /F` for termination
//!
//! The platform strategy is selected once at startup; both strategies compile
//! everywhere so their output parsers can be tested from captured fixtures.

pub mod error;
pub mod manager;
pub mod models;
pub mod platform;
pub mod protected;

// Re-export main types
pub use error::{Error, Result};
pub use manager::PortProcessManager;
pub use models::{ProcessRecord, SystemPortStatus, TerminationOutcome, ToolResponse};
pub use platform::{PlatformCommands, PortCommands};
pub use protected::ProtectedPorts;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
