//! # Check Constants
//!
//! Status levels, job lifecycle states, and the operational defaults shared by
//! the probe, the aggregator, and the command line entry point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short name printed at the start of every plugin output line
pub const PLUGIN_SHORT_NAME: &str = "BEANSTALKD";

/// Defaults used when the command line leaves a setting unspecified
pub mod system {
    use std::time::Duration;

    /// Port beanstalkd listens on out of the box
    pub const DEFAULT_PORT: u16 = 11300;

    /// Attempts the freshness probe makes before giving up on a contended tube
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Connect timeout matching the usual plugin framework default
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Unit attached to every age metric
    pub const AGE_UNIT: &str = "s";

    /// Separator between per-tube messages in the overall message
    pub const MESSAGE_SEPARATOR: &str = ", ";

    /// Largest reply body accepted from the server; beanstalkd's own job size
    /// limit defaults to 64 KiB
    pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
}

/// Monitoring status levels
///
/// Declaration order is severity order, so the derived `Ord` picks the worst
/// status with `max`. UNKNOWN outranks CRITICAL because the check itself could
/// not complete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "WARNING",
            CheckStatus::Critical => "CRITICAL",
            CheckStatus::Unknown => "UNKNOWN",
        }
    }

    /// Process exit code under the four-level plugin convention
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckStatus::Ok => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Critical => 2,
            CheckStatus::Unknown => 3,
        }
    }

    /// Return whichever of the two statuses is more severe
    pub fn worst(self, other: CheckStatus) -> CheckStatus {
        self.max(other)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job as reported by `stats-job`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Ready,
    Reserved,
    Delayed,
    Buried,
    #[serde(other)]
    Unrecognized,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Ready => "ready",
            JobState::Reserved => "reserved",
            JobState::Delayed => "delayed",
            JobState::Buried => "buried",
            JobState::Unrecognized => "unrecognized",
        }
    }

    /// A reserved job is held by a consumer and its age no longer describes the queue
    pub fn is_reserved(&self) -> bool {
        matches!(self, JobState::Reserved)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
