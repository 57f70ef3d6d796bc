//! Exclusion-pattern filter over finding locations.
//!
//! Patterns are globs where `*` is the only wildcard; every other
//! character matches literally. A finding whose location matches any
//! pattern is dropped after mapping and before merge — dropped findings
//! are not counted anywhere.

use regex::Regex;

use crate::models::finding::Finding;

/// Compiled exclusion patterns from a policy.
#[derive(Debug)]
pub struct ExclusionFilter {
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    pub fn new(patterns: &[String]) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| match compile(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::warn!(pattern, error = %err, "skipping invalid exclusion pattern");
                    None
                }
            })
            .collect();
        Self { patterns: compiled }
    }

    /// Whether a location matches any exclusion pattern. An empty
    /// pattern list excludes nothing.
    pub fn is_excluded(&self, location: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(location))
    }

    /// Drop excluded findings, preserving order of the rest.
    pub fn apply(&self, findings: Vec<Finding>) -> Vec<Finding> {
        findings
            .into_iter()
            .filter(|f| !self.is_excluded(&f.location))
            .collect()
    }
}

/// Translate a glob into an anchored regex: escape everything, then turn
/// each literal `*` into `.*`.
fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{escaped}$"))
}
