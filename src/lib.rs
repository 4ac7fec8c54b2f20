#![allow(clippy::doc_markdown)] // Allow technical terms like beanstalkd, perfdata in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Beanstalk Check
//!
//! Monitoring check that reports how long the oldest ready job in each
//! beanstalkd tube has been waiting.
//!
//! ## Overview
//!
//! One run resolves which tubes to inspect, probes each selected tube for the
//! age of its oldest ready job, and folds the per-tube results into a single
//! OK/WARNING/CRITICAL/UNKNOWN status with perfdata.
//!
//! ## Module Organization
//!
//! - [`selection`] - `--tube` selector parsing and tube set resolution
//! - [`probe`] - Oldest-ready-job age probe with bounded reserve-race retries
//! - [`status`] - Threshold evaluation and result aggregation
//! - [`threshold`] - Monitoring range syntax
//! - [`client`] - Queue client trait and the beanstalkd protocol client
//! - [`check`] - Orchestration of a full run
//! - [`config`] - Server address and run settings
//! - [`diagnostics`] - Injected progress/trace event sink
//! - [`error`] - Structured error handling
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beanstalk_check::{run_check, CheckConfig, ServerAddress, ThresholdSpec, TracingSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let address = ServerAddress::resolve("localhost", None)?;
//! let config = CheckConfig::new(address)
//!     .with_thresholds(ThresholdSpec::parse(Some("60"), Some("300"))?);
//!
//! let overall = run_check(&config, &TracingSink).await;
//! println!("{}", overall.render());
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod client;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod probe;
pub mod selection;
pub mod status;
pub mod threshold;

pub use check::{check_tubes, run_check};
pub use client::{BeanstalkClient, Job, JobStats, PeekReady, QueueClient};
pub use config::{CheckConfig, ServerAddress};
pub use constants::{system, CheckStatus, JobState, PLUGIN_SHORT_NAME};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, NullSink, RecordingSink, TracingSink};
pub use error::{CheckError, CheckResult};
pub use probe::{FreshnessProbe, ProbeOutcome};
pub use selection::{resolve, SelectorToken, TubeSetResolver};
pub use status::{evaluate, fold, Metric, OverallResult, StatusAggregator, TubeCheckResult};
pub use threshold::{ThresholdRange, ThresholdSpec};
