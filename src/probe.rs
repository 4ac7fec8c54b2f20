//! # Freshness Probe
//!
//! Measures how long the oldest ready job in a tube has been waiting.
//!
//! Between `peek-ready` and `stats-job` another consumer may reserve (and even
//! delete) the peeked job. That race is expected under load, so the probe
//! retries it a bounded number of times instead of reporting a failure. Any
//! other failure ends the probe for that tube immediately.

use crate::client::{PeekReady, QueueClient};
use crate::constants::system;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::CheckError;
use std::fmt;
use tracing::debug;

/// Result of probing one tube
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Oldest ready job has waited `seconds`
    Age { tube: String, seconds: f64 },
    /// No ready job in the tube
    Empty { tube: String },
    /// The tube could not be probed
    Failed { tube: String, cause: CheckError },
}

impl ProbeOutcome {
    pub fn tube(&self) -> &str {
        match self {
            ProbeOutcome::Age { tube, .. }
            | ProbeOutcome::Empty { tube }
            | ProbeOutcome::Failed { tube, .. } => tube,
        }
    }

    /// Age to evaluate against thresholds; an empty tube counts as zero
    pub fn age(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Age { seconds, .. } => Some(*seconds),
            ProbeOutcome::Empty { .. } => Some(0.0),
            ProbeOutcome::Failed { .. } => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Age { tube, seconds } => write!(f, "{tube}: age {seconds}s"),
            ProbeOutcome::Empty { tube } => write!(f, "{tube}: no ready jobs"),
            ProbeOutcome::Failed { tube, cause } => write!(f, "{tube}: failed: {cause}"),
        }
    }
}

/// Probe with a bounded reserve-race retry budget
#[derive(Debug, Clone, Copy)]
pub struct FreshnessProbe {
    max_attempts: u32,
}

impl Default for FreshnessProbe {
    fn default() -> Self {
        Self::new(system::DEFAULT_MAX_ATTEMPTS)
    }
}

impl FreshnessProbe {
    /// `max_attempts` below one is raised to one
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Select `tube` and read the age of its oldest ready job
    ///
    /// When every attempt loses the reserve race the tube is reported with
    /// age 0 and a [`DiagnosticEvent::RetriesExhausted`] event is recorded.
    pub async fn probe<C>(
        &self,
        client: &mut C,
        tube: &str,
        sink: &dyn DiagnosticSink,
    ) -> ProbeOutcome
    where
        C: QueueClient + ?Sized,
    {
        sink.record(DiagnosticEvent::ProbeStarted {
            tube: tube.to_string(),
        });

        let outcome = self.probe_inner(client, tube, sink).await;

        sink.record(DiagnosticEvent::ProbeFinished {
            tube: tube.to_string(),
            summary: outcome.to_string(),
        });
        outcome
    }

    async fn probe_inner<C>(
        &self,
        client: &mut C,
        tube: &str,
        sink: &dyn DiagnosticSink,
    ) -> ProbeOutcome
    where
        C: QueueClient + ?Sized,
    {
        let failed = |cause: CheckError| ProbeOutcome::Failed {
            tube: tube.to_string(),
            cause,
        };

        if let Err(cause) = client.use_tube(tube).await {
            return failed(cause);
        }

        for attempt in 1..=self.max_attempts {
            let job = match client.peek_ready().await {
                Ok(PeekReady::Found(job)) => job,
                Ok(PeekReady::Empty) => {
                    return ProbeOutcome::Empty {
                        tube: tube.to_string(),
                    }
                }
                Err(cause) => return failed(cause),
            };
            debug!(
                tube = %tube,
                job_id = job.id,
                body_bytes = job.body.len(),
                "👀 Peeked oldest ready job"
            );

            match client.stats_job(job.id).await {
                Ok(stats) if !stats.state.is_reserved() => {
                    return ProbeOutcome::Age {
                        tube: tube.to_string(),
                        seconds: stats.age,
                    };
                }
                Ok(_) => {}
                Err(cause) if cause.is_reserve_race() => {}
                Err(cause) => return failed(cause),
            }

            sink.record(DiagnosticEvent::ReserveRace {
                tube: tube.to_string(),
                job_id: job.id,
                attempt,
            });
        }

        sink.record(DiagnosticEvent::RetriesExhausted {
            tube: tube.to_string(),
            attempts: self.max_attempts,
        });
        ProbeOutcome::Age {
            tube: tube.to_string(),
            seconds: 0.0,
        }
    }
}
