//! # Threshold Ranges
//!
//! Parses the standard monitoring range syntax and classifies measured values.
//!
//! | Range      | Breached when            |
//! |------------|--------------------------|
//! | `10`       | `< 0` or `> 10`          |
//! | `10:`      | `< 10`                   |
//! | `~:10`     | `> 10`                   |
//! | `10:20`    | `< 10` or `> 20`         |
//! | `@10:20`   | `>= 10` and `<= 20`      |

use crate::constants::CheckStatus;
use crate::error::{CheckError, CheckResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A parsed threshold range
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRange {
    start: f64,
    end: f64,
    inside: bool,
    raw: String,
}

impl ThresholdRange {
    /// Parse a range expression
    pub fn parse(raw: &str) -> CheckResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CheckError::invalid_threshold(raw, "range is empty"));
        }

        let (inside, body) = match trimmed.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (start, end) = match body.split_once(':') {
            Some((start, end)) => {
                let start = match start {
                    "" => 0.0,
                    "~" => f64::NEG_INFINITY,
                    value => parse_bound(raw, value)?,
                };
                let end = match end {
                    "" => f64::INFINITY,
                    value => parse_bound(raw, value)?,
                };
                (start, end)
            }
            None => (0.0, parse_bound(raw, body)?),
        };

        if start > end {
            return Err(CheckError::invalid_threshold(
                raw,
                format!("start {start} is greater than end {end}"),
            ));
        }

        Ok(Self {
            start,
            end,
            inside,
            raw: trimmed.to_string(),
        })
    }

    /// Check whether `value` falls into the alerting side of this range
    pub fn breached_by(&self, value: f64) -> bool {
        let within = value >= self.start && value <= self.end;
        if self.inside {
            within
        } else {
            !within
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_bound(raw: &str, value: &str) -> CheckResult<f64> {
    let bound: f64 = value
        .parse()
        .map_err(|_| CheckError::invalid_threshold(raw, format!("{value:?} is not a number")))?;
    if bound.is_nan() {
        return Err(CheckError::invalid_threshold(raw, "NaN is not a valid bound"));
    }
    Ok(bound)
}

impl FromStr for ThresholdRange {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ThresholdRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Warning and critical ranges for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdSpec {
    pub warning: Option<ThresholdRange>,
    pub critical: Option<ThresholdRange>,
}

impl ThresholdSpec {
    /// Parse optional warning and critical expressions
    pub fn parse(warning: Option<&str>, critical: Option<&str>) -> CheckResult<Self> {
        Ok(Self {
            warning: warning.map(ThresholdRange::parse).transpose()?,
            critical: critical.map(ThresholdRange::parse).transpose()?,
        })
    }

    /// Classify a measured value, critical taking precedence over warning
    pub fn classify(&self, value: f64) -> CheckStatus {
        if self.critical.as_ref().is_some_and(|r| r.breached_by(value)) {
            CheckStatus::Critical
        } else if self.warning.as_ref().is_some_and(|r| r.breached_by(value)) {
            CheckStatus::Warning
        } else {
            CheckStatus::Ok
        }
    }
}
