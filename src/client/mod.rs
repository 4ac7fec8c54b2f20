//! # Queue Client
//!
//! The four queue operations a check depends on, plus the beanstalkd
//! implementation of them.
//!
//! Every method takes `&mut self`: a connection has exactly one active tube and
//! at most one outstanding request, so the select/peek/stats sequence for a
//! tube can never interleave with another tube's.

pub mod beanstalk;

pub use beanstalk::BeanstalkClient;

use crate::constants::JobState;
use crate::error::CheckResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A job returned by `peek-ready`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub body: Vec<u8>,
}

impl Job {
    pub fn new(id: u64, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

/// Result of peeking the oldest ready job
///
/// Kept separate from the error path so an empty tube can never be mistaken
/// for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeekReady {
    Found(Job),
    Empty,
}

/// Statistics reported by `stats-job`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobStats {
    pub id: u64,
    #[serde(default)]
    pub tube: String,
    pub state: JobState,
    /// Seconds since the job was put
    pub age: f64,
    #[serde(default)]
    pub pri: u64,
    #[serde(default)]
    pub delay: u64,
    #[serde(default)]
    pub ttr: u64,
    #[serde(default)]
    pub time_left: u64,
    #[serde(default)]
    pub reserves: u64,
    #[serde(default)]
    pub timeouts: u64,
    #[serde(default)]
    pub releases: u64,
    #[serde(default)]
    pub buries: u64,
    #[serde(default)]
    pub kicks: u64,
}

impl JobStats {
    /// Minimal stats for a job in `state` that has waited `age` seconds
    pub fn new(id: u64, state: JobState, age: f64) -> Self {
        Self {
            id,
            tube: String::new(),
            state,
            age,
            pri: 0,
            delay: 0,
            ttr: 0,
            time_left: 0,
            reserves: 0,
            timeouts: 0,
            releases: 0,
            buries: 0,
            kicks: 0,
        }
    }
}

/// Operations the freshness check needs from a queue server
#[async_trait]
pub trait QueueClient: Send {
    /// Names of every tube that currently exists
    async fn list_tubes(&mut self) -> CheckResult<Vec<String>>;

    /// Make `tube` the active tube on this connection
    async fn use_tube(&mut self, tube: &str) -> CheckResult<()>;

    /// Peek the oldest ready job in the active tube
    async fn peek_ready(&mut self) -> CheckResult<PeekReady>;

    /// Read the statistics of a job
    ///
    /// Returns [`crate::error::CheckError::JobVanished`] when the job no longer
    /// exists.
    async fn stats_job(&mut self, job_id: u64) -> CheckResult<JobStats>;
}
