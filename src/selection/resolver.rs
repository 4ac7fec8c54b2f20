//! Tube set resolution
//!
//! The selector list is applied as an ordered fold. The starting set depends on
//! the first token: a leading exclusion starts from every tube, a leading
//! inclusion starts from nothing. Each token then removes or adds the tubes it
//! matches, so later tokens override earlier ones for the same name. Matches
//! are always computed against the server's full listing.

use super::selector::SelectorToken;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use std::collections::BTreeSet;

/// Resolve the set of tubes to check
pub fn resolve(existing: &BTreeSet<String>, selectors: &[SelectorToken]) -> BTreeSet<String> {
    let Some(first) = selectors.first() else {
        return existing.clone();
    };

    let seed = if first.negate {
        existing.clone()
    } else {
        BTreeSet::new()
    };

    selectors
        .iter()
        .fold(seed, |current, token| apply(current, token, existing))
}

fn apply(
    current: BTreeSet<String>,
    token: &SelectorToken,
    existing: &BTreeSet<String>,
) -> BTreeSet<String> {
    let matched = token.matches(existing);
    if token.negate {
        current.difference(&matched).cloned().collect()
    } else {
        current.union(&matched).cloned().collect()
    }
}

/// Resolver bound to a selector list, reporting its result to a sink
#[derive(Debug, Clone, Default)]
pub struct TubeSetResolver {
    selectors: Vec<SelectorToken>,
}

impl TubeSetResolver {
    pub fn new(selectors: Vec<SelectorToken>) -> Self {
        Self { selectors }
    }

    pub fn resolve(
        &self,
        existing: &BTreeSet<String>,
        sink: &dyn DiagnosticSink,
    ) -> BTreeSet<String> {
        let resolved = resolve(existing, &self.selectors);
        sink.record(DiagnosticEvent::TubesResolved {
            tubes: resolved.iter().cloned().collect(),
        });
        resolved
    }
}
