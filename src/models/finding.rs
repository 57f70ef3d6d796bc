//! Normalized finding model with the canonical severity scale and
//! OWASP Top 10 category codes shared across all tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::policy::ToolKind;

/// Canonical 5-level severity every tool-native scale is mapped into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Numeric weight for ordering findings most-severe first.
    pub fn weight(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Info => 0,
        }
    }
}

/// Triage status of a finding. Transitions are user-driven and validated
/// by the lifecycle service; scans always create findings as `Open`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Open,
    Triaged,
    AcceptedRisk,
    Fixed,
    FalsePositive,
}

/// OWASP Top 10 (2021) category codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwaspCategory {
    A01,
    A02,
    A03,
    A04,
    A05,
    A06,
    A07,
    A08,
    A09,
    A10,
}

/// One normalized vulnerability record produced by a single tool run.
///
/// Immutable after creation except for user-driven `status` edits through
/// the finding API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    pub title: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub tool: ToolKind,
    pub target_id: Uuid,
    /// URL, `file:line`, or `package@version` depending on the tool.
    pub location: String,
    /// Deduplicated; legitimately empty when no mapping rule matches.
    pub owasp_tags: Vec<OwaspCategory>,
    pub first_seen: DateTime<Utc>,
    pub description: String,
    pub recommendation: Option<String>,
    /// Stable identity over `tool:target:title:location`, used to drop
    /// exact duplicates when merging a job's results.
    pub fingerprint: String,
    /// Original tool payload, kept opaque for audit and debugging.
    pub raw: serde_json::Value,
}
