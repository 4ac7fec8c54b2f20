//! # Diagnostics
//!
//! Progress and trace events emitted by the resolver, the probe, and the run
//! orchestration. The core never writes output itself; callers inject a
//! [`DiagnosticSink`] and decide where events go.

use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Events reported while a check runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Tube names reported by the server
    TubesListed { tubes: Vec<String> },
    /// Tubes left after applying the selectors
    TubesResolved { tubes: Vec<String> },
    /// A tube is about to be probed
    ProbeStarted { tube: String },
    /// The peeked job was reserved before its stats could be read
    ReserveRace {
        tube: String,
        job_id: u64,
        attempt: u32,
    },
    /// Every attempt lost the reserve race
    RetriesExhausted { tube: String, attempts: u32 },
    /// Probe completed with the given summary
    ProbeFinished { tube: String, summary: String },
}

/// Destination for diagnostic events
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::TubesListed { tubes } => {
                debug!(count = tubes.len(), tubes = ?tubes, "📋 Tubes listed by server");
            }
            DiagnosticEvent::TubesResolved { tubes } => {
                info!(count = tubes.len(), tubes = ?tubes, "🎯 Tubes selected for checking");
            }
            DiagnosticEvent::ProbeStarted { tube } => {
                debug!(tube = %tube, "🔍 Probing tube");
            }
            DiagnosticEvent::ReserveRace {
                tube,
                job_id,
                attempt,
            } => {
                debug!(
                    tube = %tube,
                    job_id = job_id,
                    attempt = attempt,
                    "🔁 Job reserved between peek and stats, retrying"
                );
            }
            DiagnosticEvent::RetriesExhausted { tube, attempts } => {
                warn!(
                    tube = %tube,
                    attempts = attempts,
                    "⚠️ Reserve race persisted for every attempt, reporting age 0"
                );
            }
            DiagnosticEvent::ProbeFinished { tube, summary } => {
                debug!(tube = %tube, summary = %summary, "✅ Probe finished");
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Keeps events in memory for later inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
