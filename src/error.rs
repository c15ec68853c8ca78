//! Error types for the portsweep library.

use thiserror::Error;

/// Result type alias for portsweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during port lookup and process termination.
#[derive(Error, Debug)]
pub enum Error {
    /// Port number outside the valid range.
    #[error("Invalid port {0}: must be between 1 and 65535")]
    InvalidPort(u32),

    /// The port inspection command failed abnormally (distinct from
    /// "nothing is bound to the port", which is an empty result).
    #[error("Port lookup failed: {0}")]
    LookupFailed(String),

    /// Failed to kill a single process. Collected per PID, never aborts
    /// the rest of a termination batch.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other runtime fault during orchestration.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPort(0);
        assert!(err.to_string().contains('0'));

        let err = Error::LookupFailed("lsof: not found".to_string());
        assert!(err.to_string().contains("lsof"));

        let err = Error::KillFailed {
            pid: "4321".to_string(),
            reason: "No such process".to_string(),
        };
        assert!(err.to_string().contains("4321"));
        assert!(err.to_string().contains("No such process"));
    }
}
