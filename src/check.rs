//! # Check Run
//!
//! Ties the pieces together for one run: connect, list tubes, resolve the
//! selection, probe every selected tube in turn, and fold the results.
//!
//! Connection-level failures abort the run with CRITICAL. Failures confined to
//! one tube become UNKNOWN for that tube and the remaining tubes are still
//! probed.

use crate::client::{BeanstalkClient, QueueClient};
use crate::config::CheckConfig;
use crate::constants::CheckStatus;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::logging::{log_error, log_probe_operation};
use crate::probe::{FreshnessProbe, ProbeOutcome};
use crate::selection::TubeSetResolver;
use crate::status::{OverallResult, StatusAggregator};
use std::collections::BTreeSet;
use tracing::debug;

/// Connect to the configured server and run the check
pub async fn run_check(config: &CheckConfig, sink: &dyn DiagnosticSink) -> OverallResult {
    debug!(config = %config.snapshot(), "🔧 Starting check run");

    let mut client = match BeanstalkClient::connect(&config.address, config.connect_timeout).await
    {
        Ok(client) => client,
        Err(err) => {
            let address = config.address.to_string();
            log_error("check", "connect", &err.to_string(), Some(address.as_str()));
            return OverallResult::aborted(CheckStatus::Critical, err.to_string());
        }
    };

    check_tubes(&mut client, config, sink).await
}

/// Run the check over an established connection
pub async fn check_tubes<C>(
    client: &mut C,
    config: &CheckConfig,
    sink: &dyn DiagnosticSink,
) -> OverallResult
where
    C: QueueClient + ?Sized,
{
    let existing: BTreeSet<String> = match client.list_tubes().await {
        Ok(tubes) => tubes.into_iter().collect(),
        Err(err) => {
            log_error("check", "list_tubes", &err.to_string(), None);
            return OverallResult::aborted(CheckStatus::Critical, err.to_string());
        }
    };
    sink.record(DiagnosticEvent::TubesListed {
        tubes: existing.iter().cloned().collect(),
    });

    let selected = TubeSetResolver::new(config.selectors.clone()).resolve(&existing, sink);

    let probe = FreshnessProbe::new(config.max_attempts);
    let mut aggregator = StatusAggregator::new(config.thresholds.clone());

    for tube in &selected {
        let outcome = probe.probe(&mut *client, tube, sink).await;
        if let ProbeOutcome::Failed { cause, .. } = &outcome {
            if cause.is_fatal() {
                log_error("check", "probe", &cause.to_string(), Some(tube.as_str()));
                return OverallResult::aborted(CheckStatus::Critical, cause.to_string());
            }
        }
        let status = aggregator.record(&outcome);
        log_probe_operation(tube, outcome.age(), status, None);
    }

    aggregator.finish()
}
