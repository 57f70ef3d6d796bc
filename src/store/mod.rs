//! In-memory stores for targets, policies, and jobs.
//!
//! Each store is an explicit object constructed once per process and
//! injected through `AppState`. Records are updated whole under a write
//! lock, so a concurrent reader never observes a partially-written job
//! (e.g. a completed status with a summary that is still being filled).
//! Locks are never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::models::job::{JobStatus, ScanJob, SeveritySummary, ToolError};
use crate::models::policy::ScanPolicy;
use crate::models::target::ScanTarget;

/// Store for scan targets.
#[derive(Debug, Clone, Default)]
pub struct TargetStore {
    inner: Arc<RwLock<HashMap<Uuid, ScanTarget>>>,
}

impl TargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, target: ScanTarget) {
        self.inner
            .write()
            .expect("target store lock poisoned")
            .insert(target.id, target);
    }

    pub fn get(&self, id: Uuid) -> Option<ScanTarget> {
        self.inner
            .read()
            .expect("target store lock poisoned")
            .get(&id)
            .cloned()
    }

    pub fn list(&self) -> Vec<ScanTarget> {
        let mut targets: Vec<_> = self
            .inner
            .read()
            .expect("target store lock poisoned")
            .values()
            .cloned()
            .collect();
        targets.sort_by_key(|t| t.created_at);
        targets
    }

    /// Replace fields on an existing target. Returns the updated record,
    /// or `None` when the id is unknown.
    pub fn update(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut ScanTarget),
    ) -> Option<ScanTarget> {
        let mut guard = self.inner.write().expect("target store lock poisoned");
        let target = guard.get_mut(&id)?;
        apply(target);
        Some(target.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.inner
            .write()
            .expect("target store lock poisoned")
            .remove(&id)
            .is_some()
    }
}

/// Store for scan policies.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    inner: Arc<RwLock<HashMap<Uuid, ScanPolicy>>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, policy: ScanPolicy) {
        self.inner
            .write()
            .expect("policy store lock poisoned")
            .insert(policy.id, policy);
    }

    pub fn get(&self, id: Uuid) -> Option<ScanPolicy> {
        self.inner
            .read()
            .expect("policy store lock poisoned")
            .get(&id)
            .cloned()
    }

    pub fn list(&self) -> Vec<ScanPolicy> {
        let mut policies: Vec<_> = self
            .inner
            .read()
            .expect("policy store lock poisoned")
            .values()
            .cloned()
            .collect();
        policies.sort_by_key(|p| p.created_at);
        policies
    }

    pub fn update(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut ScanPolicy),
    ) -> Option<ScanPolicy> {
        let mut guard = self.inner.write().expect("policy store lock poisoned");
        let policy = guard.get_mut(&id)?;
        apply(policy);
        Some(policy.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.inner
            .write()
            .expect("policy store lock poisoned")
            .remove(&id)
            .is_some()
    }
}

/// Terminal state written to a job in one atomic update.
#[derive(Debug)]
pub struct JobCompletion {
    pub status: JobStatus,
    pub findings: Vec<crate::models::finding::Finding>,
    pub summary: SeveritySummary,
    pub errors: Vec<ToolError>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default)]
struct JobStoreInner {
    jobs: HashMap<Uuid, ScanJob>,
    /// Insertion order, oldest first, for retention eviction.
    order: VecDeque<Uuid>,
}

/// Store for scan jobs with bounded retention.
///
/// Job ids are generated once per scan request and never reused. Once a
/// job reaches a terminal status, no further state change is accepted.
#[derive(Debug, Clone)]
pub struct JobStore {
    inner: Arc<RwLock<JobStoreInner>>,
    max_jobs: usize,
}

impl JobStore {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(JobStoreInner::default())),
            max_jobs: max_jobs.max(1),
        }
    }

    /// Insert a new job, evicting the oldest terminal job when the
    /// retention cap is exceeded. Running jobs are never evicted.
    pub fn insert(&self, job: ScanJob) {
        let mut guard = self.inner.write().expect("job store lock poisoned");
        let id = job.id;
        guard.jobs.insert(id, job);
        guard.order.push_back(id);

        if guard.jobs.len() > self.max_jobs {
            let evict = guard
                .order
                .iter()
                .copied()
                .find(|id| {
                    guard
                        .jobs
                        .get(id)
                        .is_some_and(|j| j.status.is_terminal())
                });
            if let Some(victim) = evict {
                guard.jobs.remove(&victim);
                guard.order.retain(|id| *id != victim);
                tracing::debug!(job_id = %victim, "evicted terminal job past retention cap");
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<ScanJob> {
        self.inner
            .read()
            .expect("job store lock poisoned")
            .jobs
            .get(&id)
            .cloned()
    }

    pub fn list(&self) -> Vec<ScanJob> {
        let guard = self.inner.read().expect("job store lock poisoned");
        guard
            .order
            .iter()
            .filter_map(|id| guard.jobs.get(id).cloned())
            .collect()
    }

    /// Record that one tool execution settled, for coarse progress.
    pub fn record_tool_settled(&self, id: Uuid) {
        let mut guard = self.inner.write().expect("job store lock poisoned");
        if let Some(job) = guard.jobs.get_mut(&id) {
            if !job.status.is_terminal() {
                job.tools_completed += 1;
            }
        }
    }

    /// Write the terminal state in one atomic update. Refused (returns
    /// `false`) when the job is unknown or already terminal — terminal
    /// status is monotonic.
    pub fn finish(&self, id: Uuid, completion: JobCompletion) -> bool {
        debug_assert!(completion.status.is_terminal());
        let mut guard = self.inner.write().expect("job store lock poisoned");
        let Some(job) = guard.jobs.get_mut(&id) else {
            return false;
        };
        if job.status.is_terminal() {
            return false;
        }
        job.status = completion.status;
        job.findings = completion.findings;
        job.summary = completion.summary;
        job.errors = completion.errors;
        job.failure_reason = completion.failure_reason;
        job.finished_at = Some(Utc::now());
        true
    }

    /// Look up a finding by id across all jobs.
    pub fn get_finding(&self, finding_id: Uuid) -> Option<crate::models::finding::Finding> {
        let guard = self.inner.read().expect("job store lock poisoned");
        guard
            .jobs
            .values()
            .flat_map(|job| job.findings.iter())
            .find(|f| f.id == finding_id)
            .cloned()
    }

    /// Apply a user-driven edit to one finding. Finding status edits are
    /// the one sanctioned mutation after a job reaches a terminal state.
    pub fn update_finding(
        &self,
        finding_id: Uuid,
        apply: impl FnOnce(&mut crate::models::finding::Finding),
    ) -> Option<crate::models::finding::Finding> {
        let mut guard = self.inner.write().expect("job store lock poisoned");
        let finding = guard
            .jobs
            .values_mut()
            .flat_map(|job| job.findings.iter_mut())
            .find(|f| f.id == finding_id)?;
        apply(finding);
        Some(finding.clone())
    }

    /// Request cancellation of a running job. Advisory: in-flight tool
    /// calls are not interrupted. Returns whether the request was
    /// accepted (the job exists and is not yet terminal).
    pub fn request_cancel(&self, id: Uuid) -> bool {
        let mut guard = self.inner.write().expect("job store lock poisoned");
        match guard.jobs.get_mut(&id) {
            Some(job) if !job.status.is_terminal() => {
                job.cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_cancel_requested(&self, id: Uuid) -> bool {
        self.inner
            .read()
            .expect("job store lock poisoned")
            .jobs
            .get(&id)
            .is_some_and(|j| j.cancel_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::ToolKind;

    fn job() -> ScanJob {
        ScanJob::new(Uuid::new_v4(), Uuid::new_v4(), vec![ToolKind::Dependency])
    }

    fn completion(status: JobStatus) -> JobCompletion {
        JobCompletion {
            status,
            findings: vec![],
            summary: SeveritySummary::default(),
            errors: vec![],
            failure_reason: None,
        }
    }

    #[test]
    fn insert_and_get() {
        let store = JobStore::new(10);
        let j = job();
        let id = j.id;
        store.insert(j);
        assert_eq!(store.get(id).unwrap().status, JobStatus::Running);
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn finish_is_atomic_and_terminal() {
        let store = JobStore::new(10);
        let j = job();
        let id = j.id;
        store.insert(j);

        assert!(store.finish(id, completion(JobStatus::Completed)));
        let done = store.get(id).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.finished_at.is_some());

        // Terminal status is monotonic: a second finish is refused.
        assert!(!store.finish(id, completion(JobStatus::Failed)));
        assert_eq!(store.get(id).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn cancel_only_accepted_before_terminal() {
        let store = JobStore::new(10);
        let j = job();
        let id = j.id;
        store.insert(j);

        assert!(store.request_cancel(id));
        assert!(store.is_cancel_requested(id));

        store.finish(id, completion(JobStatus::Cancelled));
        assert!(!store.request_cancel(id));
    }

    #[test]
    fn cancel_unknown_job_rejected() {
        let store = JobStore::new(10);
        assert!(!store.request_cancel(Uuid::new_v4()));
    }

    #[test]
    fn retention_evicts_oldest_terminal_only() {
        let store = JobStore::new(2);

        let first = job();
        let first_id = first.id;
        store.insert(first);
        store.finish(first_id, completion(JobStatus::Completed));

        let second = job();
        let second_id = second.id;
        store.insert(second); // still running

        let third = job();
        let third_id = third.id;
        store.insert(third);

        // Cap is 2: the oldest terminal job (first) is gone, the running
        // one survives.
        assert!(store.get(first_id).is_none());
        assert!(store.get(second_id).is_some());
        assert!(store.get(third_id).is_some());
    }

    #[test]
    fn retention_never_evicts_running_jobs() {
        let store = JobStore::new(1);
        let a = job();
        let a_id = a.id;
        store.insert(a);
        let b = job();
        let b_id = b.id;
        store.insert(b);

        // Both running, nothing is evicted even past the cap.
        assert!(store.get(a_id).is_some());
        assert!(store.get(b_id).is_some());
    }

    #[test]
    fn tool_settled_increments_until_terminal() {
        let store = JobStore::new(10);
        let j = job();
        let id = j.id;
        store.insert(j);

        store.record_tool_settled(id);
        store.record_tool_settled(id);
        assert_eq!(store.get(id).unwrap().tools_completed, 2);

        store.finish(id, completion(JobStatus::Completed));
        store.record_tool_settled(id);
        assert_eq!(store.get(id).unwrap().tools_completed, 2);
    }

    #[test]
    fn target_store_crud() {
        let store = TargetStore::new();
        let target = ScanTarget {
            id: Uuid::new_v4(),
            name: "api".to_string(),
            identifiers: vec![],
            created_at: Utc::now(),
        };
        let id = target.id;
        store.insert(target);

        let updated = store.update(id, |t| t.name = "api-v2".to_string()).unwrap();
        assert_eq!(updated.name, "api-v2");
        assert_eq!(store.list().len(), 1);
        assert!(store.remove(id));
        assert!(!store.remove(id));
    }
}
