//! Finding query and status transitions over the job store.

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::finding::{Finding, FindingStatus, Severity};
use crate::models::policy::ToolKind;
use crate::services::lifecycle;
use crate::store::JobStore;

/// Filters for listing findings across all retained jobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindingFilters {
    pub severity: Option<Severity>,
    pub status: Option<FindingStatus>,
    pub tool: Option<ToolKind>,
    pub target_id: Option<Uuid>,
}

impl FindingFilters {
    fn matches(&self, finding: &Finding) -> bool {
        self.severity.map_or(true, |s| finding.severity == s)
            && self.status.map_or(true, |s| finding.status == s)
            && self.tool.map_or(true, |t| finding.tool == t)
            && self.target_id.map_or(true, |t| finding.target_id == t)
    }
}

/// List findings matching the filters, most severe first.
pub fn query(jobs: &JobStore, filters: &FindingFilters) -> Vec<Finding> {
    let mut findings: Vec<Finding> = jobs
        .list()
        .into_iter()
        .flat_map(|job| job.findings)
        .filter(|f| filters.matches(f))
        .collect();
    findings.sort_by(|a, b| {
        b.severity
            .weight()
            .cmp(&a.severity.weight())
            .then(a.first_seen.cmp(&b.first_seen))
    });
    findings
}

/// Request body for a finding status update.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: FindingStatus,
    pub justification: Option<String>,
}

/// Apply a user-driven status transition after lifecycle validation.
pub fn update_status(
    jobs: &JobStore,
    finding_id: Uuid,
    request: &StatusUpdateRequest,
) -> Result<Finding, AppError> {
    let current = jobs
        .get_finding(finding_id)
        .ok_or_else(|| AppError::NotFound(format!("Finding {finding_id} not found")))?;

    lifecycle::validate_transition(
        current.status,
        request.status,
        request.justification.as_deref(),
    )?;

    jobs.update_finding(finding_id, |f| f.status = request.status)
        .ok_or_else(|| AppError::Internal("finding disappeared during update".to_string()))
}
