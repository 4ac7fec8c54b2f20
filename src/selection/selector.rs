//! Selector tokens
//!
//! Grammar: an optional leading `!` negates the token, an optional `~` (after
//! the `!` when both are present) turns the remainder into a regular
//! expression. Anything else is a literal tube name.

use crate::error::{CheckError, CheckResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const NEGATE_PREFIX: char = '!';
const PATTERN_PREFIX: char = '~';

/// One user-supplied tube filter
#[derive(Debug, Clone)]
pub struct SelectorToken {
    pub pattern: String,
    pub is_pattern: bool,
    pub negate: bool,
    regex: Option<Regex>,
}

impl SelectorToken {
    /// Include the tube with exactly this name
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            pattern: name.into(),
            is_pattern: false,
            negate: false,
            regex: None,
        }
    }

    /// Include every tube whose name matches `expression` anywhere
    pub fn pattern(expression: impl Into<String>) -> CheckResult<Self> {
        let pattern = expression.into();
        let regex = Regex::new(&pattern)
            .map_err(|e| CheckError::invalid_selector(&pattern, e.to_string()))?;
        Ok(Self {
            pattern,
            is_pattern: true,
            negate: false,
            regex: Some(regex),
        })
    }

    /// Turn an include into an exclude
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Parse one `--tube` argument
    pub fn parse(token: &str) -> CheckResult<Self> {
        let (negate, rest) = match token.strip_prefix(NEGATE_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let selector = match rest.strip_prefix(PATTERN_PREFIX) {
            Some(expression) => {
                if expression.is_empty() {
                    return Err(CheckError::invalid_selector(token, "pattern body is empty"));
                }
                Self::pattern(expression)?
            }
            None => {
                if rest.is_empty() {
                    return Err(CheckError::invalid_selector(token, "tube name is empty"));
                }
                Self::literal(rest)
            }
        };

        Ok(if negate { selector.negated() } else { selector })
    }

    /// Tubes from `universe` this token applies to
    pub fn matches(&self, universe: &BTreeSet<String>) -> BTreeSet<String> {
        match &self.regex {
            Some(regex) => universe
                .iter()
                .filter(|tube| regex.is_match(tube))
                .cloned()
                .collect(),
            // Literal names missing from the server never reach the output
            None => universe
                .get(&self.pattern)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

impl PartialEq for SelectorToken {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.is_pattern == other.is_pattern
            && self.negate == other.negate
    }
}

impl Eq for SelectorToken {}

impl FromStr for SelectorToken {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "{NEGATE_PREFIX}")?;
        }
        if self.is_pattern {
            write!(f, "{PATTERN_PREFIX}")?;
        }
        f.write_str(&self.pattern)
    }
}
