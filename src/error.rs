//! # Check Error Types
//!
//! Structured errors for every failure path of a check run. Connection-level
//! variants abort the run; per-tube variants are isolated to the tube that
//! produced them.

use thiserror::Error;

/// Errors raised while talking to the queue server or preparing a check
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error("Connection error: {address}: {message}")]
    Connection { address: String, message: String },

    #[error("Connection timed out: {address} after {timeout_seconds}s")]
    Timeout {
        address: String,
        timeout_seconds: u64,
    },

    #[error("Failed to list tubes: {message}")]
    ListTubes { message: String },

    #[error("Failed to select tube {tube}: {message}")]
    SelectTube { tube: String, message: String },

    #[error("Failed to peek ready job in tube {tube}: {message}")]
    Peek { tube: String, message: String },

    #[error("Failed to read stats for job {job_id}: {message}")]
    StatsFetch { job_id: u64, message: String },

    #[error("Job {job_id} disappeared before its stats could be read")]
    JobVanished { job_id: u64 },

    #[error("Protocol error: {operation}: {message}")]
    Protocol { operation: String, message: String },

    #[error("Invalid tube selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid threshold {threshold:?}: {reason}")]
    InvalidThreshold { threshold: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CheckError {
    /// Create a connection error
    pub fn connection(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a connect timeout error
    pub fn timeout(address: impl Into<String>, timeout_seconds: u64) -> Self {
        Self::Timeout {
            address: address.into(),
            timeout_seconds,
        }
    }

    /// Create a list-tubes error
    pub fn list_tubes(message: impl Into<String>) -> Self {
        Self::ListTubes {
            message: message.into(),
        }
    }

    /// Create a select-tube error
    pub fn select_tube(tube: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SelectTube {
            tube: tube.into(),
            message: message.into(),
        }
    }

    /// Create a peek error
    pub fn peek(tube: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Peek {
            tube: tube.into(),
            message: message.into(),
        }
    }

    /// Create a stats fetch error
    pub fn stats_fetch(job_id: u64, message: impl Into<String>) -> Self {
        Self::StatsFetch {
            job_id,
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid threshold error
    pub fn invalid_threshold(threshold: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidThreshold {
            threshold: threshold.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the failure is the benign peek/stats race with another consumer
    pub fn is_reserve_race(&self) -> bool {
        matches!(self, Self::JobVanished { .. })
    }

    /// True when no tube can be checked after this error
    ///
    /// A protocol error means the reply stream is out of sync, so the
    /// connection is as unusable as a closed one.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::Timeout { .. }
                | Self::ListTubes { .. }
                | Self::Protocol { .. }
        )
    }
}

/// Result type alias for check operations
pub type CheckResult<T> = Result<T, CheckError>;
