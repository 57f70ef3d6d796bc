//! Scan orchestration state machine.
//!
//! Drives one scan job: validates the submission, resolves the target
//! and policy, creates the job record, then fans out to every allowed
//! tool adapter concurrently. Adapters fail individually — one tool's
//! error is recorded on the job and never aborts its siblings or the
//! job itself. `failed` is reserved for orchestration-level problems
//! (e.g. the policy disappeared between submission and execution).

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::ToolOutcome;
use crate::errors::AppError;
use crate::mapping;
use crate::models::job::{JobStatus, ScanJob, SeveritySummary, ToolError};
use crate::models::policy::{ScanMode, ScanPolicy, ToolKind};
use crate::services::exclusion::ExclusionFilter;
use crate::store::JobCompletion;
use crate::AppState;

/// Scan submission request. Both consent booleans are a mandatory
/// safety gate: the scan is rejected and no job is created unless the
/// caller affirms both.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target_id: Uuid,
    pub policy_id: Uuid,
    #[serde(default)]
    pub consent_accepted: bool,
    #[serde(default)]
    pub ownership_attested: bool,
    /// Free-form record of what the caller believed was in scope at
    /// submission time; stored nowhere, echoed into the log.
    #[serde(default)]
    pub scope_snapshot: Option<serde_json::Value>,
}

/// Accepted-scan response returned before any tool executes.
#[derive(Debug, Serialize)]
pub struct ScanAccepted {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub estimated_duration_secs: u64,
    pub tools: Vec<ToolKind>,
}

/// Cancel response.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Accept a scan request: validate, create the job record, and spawn
/// the execution body. Returns to the caller before any tool runs.
pub fn submit(state: &AppState, request: &ScanRequest) -> Result<ScanAccepted, AppError> {
    if !request.consent_accepted || !request.ownership_attested {
        return Err(AppError::Validation(
            "consent_accepted and ownership_attested must both be true".to_string(),
        ));
    }

    let target = state
        .targets
        .get(request.target_id)
        .ok_or_else(|| AppError::NotFound(format!("Target {} not found", request.target_id)))?;
    let policy = state
        .policies
        .get(request.policy_id)
        .ok_or_else(|| AppError::NotFound(format!("Policy {} not found", request.policy_id)))?;

    let job = ScanJob::new(target.id, policy.id, policy.allowed_tools.clone());
    let job_id = job.id;
    let tools = job.tools.clone();
    state.jobs.insert(job);

    tracing::info!(
        %job_id,
        target = %target.name,
        policy = %policy.name,
        scope = ?request.scope_snapshot,
        "scan accepted"
    );

    let spawn_state = state.clone();
    tokio::spawn(async move {
        execute(spawn_state, job_id).await;
    });

    Ok(ScanAccepted {
        job_id,
        status: JobStatus::Running,
        estimated_duration_secs: estimate_duration(&policy),
        tools,
    })
}

/// Rough duration estimate surfaced to polling clients.
fn estimate_duration(policy: &ScanPolicy) -> u64 {
    let per_tool = 30 * policy.allowed_tools.len() as u64;
    let web_scan_extra = if policy.allowed_tools.contains(&ToolKind::WebScan) {
        match policy.scan_mode {
            ScanMode::Active => 1930,
            ScanMode::Passive => 130,
        }
    } else {
        0
    };
    per_tool + web_scan_extra
}

/// The asynchronous execution body for one job. Public so tests can
/// drive it to completion without going through `tokio::spawn`.
pub async fn execute(state: AppState, job_id: Uuid) {
    let Some(job) = state.jobs.get(job_id) else {
        tracing::error!(%job_id, "job vanished before execution");
        return;
    };

    // Re-resolve: the stores may have changed between submission and
    // execution. Losing either reference here is an orchestration-level
    // failure, not a tool failure.
    let (target, policy) = match (
        state.targets.get(job.target_id),
        state.policies.get(job.policy_id),
    ) {
        (Some(target), Some(policy)) => (target, policy),
        (target, _) => {
            let missing = if target.is_none() { "target" } else { "policy" };
            tracing::error!(%job_id, missing, "scan reference resolution failed");
            state.jobs.finish(
                job_id,
                JobCompletion {
                    status: JobStatus::Failed,
                    findings: vec![],
                    summary: SeveritySummary::default(),
                    errors: vec![],
                    failure_reason: Some(format!("could not resolve {missing}")),
                },
            );
            return;
        }
    };

    let filter = ExclusionFilter::new(&policy.exclusions);

    // Launch every allowed tool concurrently; await all of them with
    // individual-failure isolation.
    let runs = job.tools.iter().map(|&kind| {
        let adapter = state.adapters.get(kind);
        let target = target.clone();
        let policy = policy.clone();
        let jobs = state.jobs.clone();
        async move {
            let outcome = match adapter {
                Some(adapter) => adapter.execute(&target, &policy).await,
                None => {
                    ToolOutcome::Failed(crate::adapters::AdapterError::Transport(
                        "no adapter registered for this tool".to_string(),
                    ))
                }
            };
            jobs.record_tool_settled(job_id);
            (kind, outcome)
        }
    });
    let outcomes = join_all(runs).await;

    // Merge: map, filter, dedup by fingerprint. Order within one tool's
    // results is preserved; cross-tool order is unspecified.
    let mut findings = Vec::new();
    let mut errors = Vec::new();
    let mut seen_fingerprints = HashSet::new();

    for (kind, outcome) in outcomes {
        match outcome {
            ToolOutcome::Completed(raw_results) => {
                let mut kept = 0usize;
                for raw in &raw_results {
                    let finding = mapping::normalize(raw, target.id);
                    if filter.is_excluded(&finding.location) {
                        continue;
                    }
                    if seen_fingerprints.insert(finding.fingerprint.clone()) {
                        findings.push(finding);
                        kept += 1;
                    }
                }
                tracing::info!(%job_id, tool = %kind, raw = raw_results.len(), kept, "tool completed");
            }
            ToolOutcome::NotApplicable => {
                tracing::debug!(%job_id, tool = %kind, "tool not applicable");
            }
            ToolOutcome::Failed(err) => {
                tracing::warn!(%job_id, tool = %kind, error = %err, "tool failed");
                errors.push(ToolError {
                    tool: kind,
                    message: err.to_string(),
                });
            }
        }
    }

    let summary = SeveritySummary::from_findings(&findings);
    let status = if state.jobs.is_cancel_requested(job_id) {
        JobStatus::Cancelled
    } else {
        JobStatus::Completed
    };

    let finished = state.jobs.finish(
        job_id,
        JobCompletion {
            status,
            findings,
            summary,
            errors,
            failure_reason: None,
        },
    );
    if finished {
        tracing::info!(%job_id, ?status, "scan finished");
    }
}

/// Request cancellation of a job. Advisory: in-flight tool calls keep
/// running; the job reaches `cancelled` once they unwind.
pub fn cancel(state: &AppState, job_id: Uuid) -> Result<CancelResponse, AppError> {
    if state.jobs.get(job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    Ok(CancelResponse {
        cancelled: state.jobs.request_cancel(job_id),
    })
}
