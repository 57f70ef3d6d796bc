//! Scan job model: one execution instance tying a target, a policy, and
//! the resulting findings together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::finding::{Finding, Severity};
use crate::models::policy::ToolKind;

/// Job lifecycle status. `Completed`, `Failed`, and `Cancelled` are
/// terminal; the job store refuses any transition out of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A recorded per-tool failure. Tool errors never fail the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub tool: ToolKind,
    pub message: String,
}

/// Finding counts by canonical severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl SeveritySummary {
    /// Tally findings per canonical severity.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts: HashMap<Severity, usize> = HashMap::new();
        for f in findings {
            *counts.entry(f.severity).or_insert(0) += 1;
        }
        Self {
            critical: counts.get(&Severity::Critical).copied().unwrap_or(0),
            high: counts.get(&Severity::High).copied().unwrap_or(0),
            medium: counts.get(&Severity::Medium).copied().unwrap_or(0),
            low: counts.get(&Severity::Low).copied().unwrap_or(0),
            info: counts.get(&Severity::Info).copied().unwrap_or(0),
            total: findings.len(),
        }
    }
}

/// One scan execution instance. Mutated only by the orchestrator through
/// the job store; read-only to every other component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    pub target_id: Uuid,
    pub policy_id: Uuid,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Tools actually resolved for this run, in policy order.
    pub tools: Vec<ToolKind>,
    pub findings: Vec<Finding>,
    pub summary: SeveritySummary,
    pub errors: Vec<ToolError>,
    /// Set only when the orchestration itself failed (status `failed`);
    /// individual tool errors go to `errors` instead.
    pub failure_reason: Option<String>,
    /// Count of tool executions that have settled, for coarse progress.
    pub tools_completed: usize,
    /// Advisory cancellation flag; in-flight tool calls are not aborted.
    pub cancel_requested: bool,
}

impl ScanJob {
    pub fn new(target_id: Uuid, policy_id: Uuid, tools: Vec<ToolKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_id,
            policy_id,
            status: JobStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            tools,
            findings: Vec::new(),
            summary: SeveritySummary::default(),
            errors: Vec::new(),
            failure_reason: None,
            tools_completed: 0,
            cancel_requested: false,
        }
    }
}

/// Coarse progress view for polling clients. Synthetic where the
/// underlying tools expose no fine-grained progress.
#[derive(Debug, Clone, Serialize)]
pub struct JobProgress {
    /// 0-100.
    pub progress: u8,
    pub phase: String,
    pub urls_discovered: usize,
    pub rules_completed: usize,
    pub message: String,
}

impl JobProgress {
    /// Derive a progress view from a job record.
    pub fn from_job(job: &ScanJob) -> Self {
        let (progress, phase, message) = match job.status {
            JobStatus::Queued => (0, "queued", "Scan accepted".to_string()),
            JobStatus::Running => {
                let total = job.tools.len().max(1);
                // 5% for startup, the rest split across tools.
                let pct = 5 + (job.tools_completed * 90 / total) as u8;
                (
                    pct,
                    "running",
                    format!("{}/{} tools finished", job.tools_completed, total),
                )
            }
            JobStatus::Completed => (100, "completed", "Scan completed".to_string()),
            JobStatus::Failed => (100, "failed", "Scan failed".to_string()),
            JobStatus::Cancelled => (100, "cancelled", "Scan cancelled".to_string()),
        };
        Self {
            progress,
            phase: phase.to_string(),
            urls_discovered: job
                .findings
                .iter()
                .filter(|f| f.tool == ToolKind::WebScan)
                .map(|f| f.location.as_str())
                .collect::<std::collections::HashSet<_>>()
                .len(),
            rules_completed: job.tools_completed,
            message,
        }
    }
}
