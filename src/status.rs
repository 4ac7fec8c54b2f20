//! # Status Aggregation
//!
//! Classifies each probed tube against the thresholds and folds the per-tube
//! results into one overall check result with plugin output and perfdata.

use crate::constants::{system, CheckStatus, PLUGIN_SHORT_NAME};
use crate::probe::ProbeOutcome;
use crate::threshold::{ThresholdRange, ThresholdSpec};
use serde::Serialize;
use std::fmt;

/// One perfdata entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub warning: Option<ThresholdRange>,
    pub critical: Option<ThresholdRange>,
}

impl Metric {
    /// Age metric for a tube, annotated with the active thresholds
    pub fn age(tube: &str, seconds: f64, thresholds: &ThresholdSpec) -> Self {
        Self {
            label: tube.to_string(),
            value: seconds,
            unit: system::AGE_UNIT.to_string(),
            warning: thresholds.warning.clone(),
            critical: thresholds.critical.clone(),
        }
    }

    fn quoted_label(&self) -> String {
        if self.label.contains(|c: char| matches!(c, ' ' | '=' | '\'')) {
            format!("'{}'", self.label.replace('\'', "''"))
        } else {
            self.label.clone()
        }
    }
}

/// Formats as `label=value<unit>;warn;crit;min;`
impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = |r: &Option<ThresholdRange>| {
            r.as_ref().map(ToString::to_string).unwrap_or_default()
        };
        write!(
            f,
            "{}={}{};{};{};0;",
            self.quoted_label(),
            self.value,
            self.unit,
            range(&self.warning),
            range(&self.critical)
        )
    }
}

/// Evaluation of a single tube
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TubeCheckResult {
    pub tube: String,
    pub age: Option<f64>,
    pub status: CheckStatus,
    pub message: String,
    pub metric: Option<Metric>,
}

/// Classify one probe outcome
pub fn evaluate(outcome: &ProbeOutcome, thresholds: &ThresholdSpec) -> TubeCheckResult {
    match outcome {
        ProbeOutcome::Failed { tube, cause } => TubeCheckResult {
            tube: tube.clone(),
            age: None,
            status: CheckStatus::Unknown,
            message: cause.to_string(),
            metric: None,
        },
        ProbeOutcome::Age { tube, seconds } => aged(tube, *seconds, thresholds),
        ProbeOutcome::Empty { tube } => aged(tube, 0.0, thresholds),
    }
}

fn aged(tube: &str, seconds: f64, thresholds: &ThresholdSpec) -> TubeCheckResult {
    TubeCheckResult {
        tube: tube.to_string(),
        age: Some(seconds),
        status: thresholds.classify(seconds),
        message: format!("tube {tube} is {seconds} seconds old"),
        metric: Some(Metric::age(tube, seconds, thresholds)),
    }
}

/// Final result of a check run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallResult {
    pub status: CheckStatus,
    pub message: String,
    pub metrics: Vec<Metric>,
    pub results: Vec<TubeCheckResult>,
}

impl OverallResult {
    /// Result for a run that stopped before any tube was probed
    pub fn aborted(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            metrics: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Single plugin output line: `NAME STATUS - message | perfdata`
    pub fn render(&self) -> String {
        let mut line = format!("{PLUGIN_SHORT_NAME} {}", self.status);
        if !self.message.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.message);
        }
        if !self.metrics.is_empty() {
            let perfdata: Vec<String> = self.metrics.iter().map(ToString::to_string).collect();
            line.push_str(" | ");
            line.push_str(&perfdata.join(" "));
        }
        line
    }
}

/// Fold per-tube results into one overall result
///
/// No results at all is a deliberate OK with an empty message: explicitly
/// excluding every tube is a valid configuration.
pub fn fold(results: Vec<TubeCheckResult>) -> OverallResult {
    let status = results
        .iter()
        .map(|r| r.status)
        .fold(CheckStatus::Ok, CheckStatus::worst);
    let message = results
        .iter()
        .map(|r| r.message.as_str())
        .collect::<Vec<_>>()
        .join(system::MESSAGE_SEPARATOR);
    let metrics = results.iter().filter_map(|r| r.metric.clone()).collect();

    OverallResult {
        status,
        message,
        metrics,
        results,
    }
}

/// Accumulates tube results under one threshold spec
#[derive(Debug, Clone, Default)]
pub struct StatusAggregator {
    thresholds: ThresholdSpec,
    results: Vec<TubeCheckResult>,
}

impl StatusAggregator {
    pub fn new(thresholds: ThresholdSpec) -> Self {
        Self {
            thresholds,
            results: Vec::new(),
        }
    }

    /// Evaluate and keep one outcome, returning its status
    pub fn record(&mut self, outcome: &ProbeOutcome) -> CheckStatus {
        let result = evaluate(outcome, &self.thresholds);
        let status = result.status;
        self.results.push(result);
        status
    }

    pub fn results(&self) -> &[TubeCheckResult] {
        &self.results
    }

    pub fn finish(self) -> OverallResult {
        fold(self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckError;

    fn result_with(status: CheckStatus, message: &str) -> TubeCheckResult {
        TubeCheckResult {
            tube: message.to_string(),
            age: Some(0.0),
            status,
            message: message.to_string(),
            metric: None,
        }
    }

    fn thresholds(warning: &str, critical: &str) -> ThresholdSpec {
        ThresholdSpec::parse(Some(warning), Some(critical)).unwrap()
    }

    #[test]
    fn test_evaluate_age_against_thresholds() {
        let spec = thresholds("10", "30");
        let outcome = ProbeOutcome::Age {
            tube: "jobs".to_string(),
            seconds: 40.0,
        };
        let result = evaluate(&outcome, &spec);

        assert_eq!(result.status, CheckStatus::Critical);
        assert_eq!(result.message, "tube jobs is 40 seconds old");
        assert_eq!(result.age, Some(40.0));
        let metric = result.metric.unwrap();
        assert_eq!(metric.to_string(), "jobs=40s;10;30;0;");
    }

    #[test]
    fn test_evaluate_empty_as_zero() {
        let outcome = ProbeOutcome::Empty {
            tube: "idle".to_string(),
        };
        let result = evaluate(&outcome, &thresholds("10", "30"));
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "tube idle is 0 seconds old");
    }

    #[test]
    fn test_evaluate_empty_with_degenerate_zero_threshold() {
        // "1:" alerts on anything below one second, including an empty tube
        let spec = ThresholdSpec::parse(None, Some("1:")).unwrap();
        let outcome = ProbeOutcome::Empty {
            tube: "idle".to_string(),
        };
        assert_eq!(evaluate(&outcome, &spec).status, CheckStatus::Critical);
    }

    #[test]
    fn test_evaluate_failed_is_unknown_without_metric() {
        let outcome = ProbeOutcome::Failed {
            tube: "jobs".to_string(),
            cause: CheckError::select_tube("jobs", "BAD_FORMAT"),
        };
        let result = evaluate(&outcome, &ThresholdSpec::default());
        assert_eq!(result.status, CheckStatus::Unknown);
        assert!(result.message.contains("BAD_FORMAT"));
        assert!(result.metric.is_none());
        assert!(result.age.is_none());
    }

    #[test]
    fn test_fold_dominance() {
        let fold_of = |statuses: &[CheckStatus]| {
            fold(statuses.iter().map(|s| result_with(*s, "t")).collect()).status
        };
        assert_eq!(
            fold_of(&[CheckStatus::Ok, CheckStatus::Warning]),
            CheckStatus::Warning
        );
        assert_eq!(
            fold_of(&[CheckStatus::Warning, CheckStatus::Critical]),
            CheckStatus::Critical
        );
        assert_eq!(
            fold_of(&[CheckStatus::Critical, CheckStatus::Unknown]),
            CheckStatus::Unknown
        );
    }

    #[test]
    fn test_fold_empty_is_vacuous_ok() {
        let overall = fold(Vec::new());
        assert_eq!(overall.status, CheckStatus::Ok);
        assert_eq!(overall.message, "");
        assert!(overall.metrics.is_empty());
        assert_eq!(overall.render(), "BEANSTALKD OK");
    }

    #[test]
    fn test_fold_joins_messages_in_order() {
        let overall = fold(vec![
            result_with(CheckStatus::Ok, "first"),
            result_with(CheckStatus::Ok, "second"),
        ]);
        assert_eq!(overall.message, "first, second");
    }

    #[test]
    fn test_aggregator_render_with_perfdata() {
        let mut aggregator = StatusAggregator::new(thresholds("10", "30"));
        aggregator.record(&ProbeOutcome::Age {
            tube: "alerts".to_string(),
            seconds: 5.0,
        });
        let status = aggregator.record(&ProbeOutcome::Age {
            tube: "jobs".to_string(),
            seconds: 12.5,
        });
        assert_eq!(status, CheckStatus::Warning);
        assert_eq!(aggregator.results().len(), 2);

        let overall = aggregator.finish();
        assert_eq!(
            overall.render(),
            "BEANSTALKD WARNING - tube alerts is 5 seconds old, tube jobs is 12.5 seconds old \
             | alerts=5s;10;30;0; jobs=12.5s;10;30;0;"
        );
    }

    #[test]
    fn test_metric_label_quoting() {
        let metric = Metric::age("it's a=tube", 1.0, &ThresholdSpec::default());
        assert_eq!(metric.to_string(), "'it''s a=tube'=1s;;;0;");
    }

    #[test]
    fn test_aborted_result_renders_message() {
        let overall = OverallResult::aborted(CheckStatus::Critical, "Connection error: refused");
        assert_eq!(
            overall.render(),
            "BEANSTALKD CRITICAL - Connection error: refused"
        );
    }
}
