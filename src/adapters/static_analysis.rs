//! Static analysis service adapter.
//!
//! Submits a scan-by-repository request, polls for completion under the
//! analysis poll policy, then fetches the finding list. Requires an API
//! key; without one the adapter is disabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::adapters::{AdapterError, PollPolicy, RawToolResult, ToolAdapter, ToolOutcome};
use crate::models::policy::{ScanPolicy, ToolKind};
use crate::models::target::{IdentifierKind, ScanTarget};

/// One static-analysis finding. `repository` is attached by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFinding {
    pub check_id: String,
    pub path: String,
    #[serde(default)]
    pub line: u32,
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cwe_ids: Vec<u32>,
    #[serde(default)]
    pub repository: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    repository: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FindingsResponse {
    #[serde(default)]
    findings: Vec<StaticFinding>,
}

pub struct StaticAnalysisAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    poll: PollPolicy,
}

impl StaticAnalysisAdapter {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
            poll: PollPolicy::analysis(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn analyze(&self, key: &str, repository: &str) -> Result<Vec<RawToolResult>, AdapterError> {
        let submitted: SubmitResponse = self
            .client
            .post(format!("{}/api/v1/scans", self.base_url))
            .bearer_auth(key)
            .json(&SubmitRequest { repository })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!(scan_id = %submitted.id, repository, "analysis submitted");

        let started = Instant::now();
        loop {
            if started.elapsed() > self.poll.deadline {
                return Err(AdapterError::Timeout {
                    phase: "analysis",
                    waited_secs: self.poll.deadline.as_secs(),
                });
            }

            let status: StatusResponse = self
                .client
                .get(format!("{}/api/v1/scans/{}", self.base_url, submitted.id))
                .bearer_auth(key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match status.status.as_str() {
                "complete" => break,
                "failed" => {
                    return Err(AdapterError::Transport(
                        "analysis service reported scan failure".to_string(),
                    ))
                }
                _ => tokio::time::sleep(self.poll.interval).await,
            }
        }

        let findings: FindingsResponse = self
            .client
            .get(format!(
                "{}/api/v1/scans/{}/findings",
                self.base_url, submitted.id
            ))
            .bearer_auth(key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(findings
            .findings
            .into_iter()
            .map(|mut finding| {
                finding.repository = repository.to_string();
                RawToolResult::StaticAnalysis(finding)
            })
            .collect())
    }
}

#[async_trait]
impl ToolAdapter for StaticAnalysisAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::StaticAnalysis
    }

    async fn execute(&self, target: &ScanTarget, _policy: &ScanPolicy) -> ToolOutcome {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!("static analysis API key not configured, skipping");
            return ToolOutcome::NotApplicable;
        };
        let repositories = target.identifiers_of(IdentifierKind::Repository);
        if repositories.is_empty() {
            return ToolOutcome::NotApplicable;
        }

        let mut results = Vec::new();
        for repository in repositories {
            match self.analyze(key, repository).await {
                Ok(findings) => results.extend(findings),
                Err(err) => return ToolOutcome::Failed(err),
            }
        }
        ToolOutcome::Completed(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn finding_deserializes_service_shape() {
        let finding: StaticFinding = serde_json::from_str(
            r#"{
                "check_id": "rust.lang.security.sqli",
                "path": "src/db.rs",
                "line": 42,
                "severity": "ERROR",
                "message": "String-built SQL query",
                "cwe_ids": [89]
            }"#,
        )
        .unwrap();
        assert_eq!(finding.check_id, "rust.lang.security.sqli");
        assert_eq!(finding.line, 42);
        assert_eq!(finding.cwe_ids, vec![89]);
    }

    #[test]
    fn finding_without_cwes_defaults_empty() {
        let finding: StaticFinding = serde_json::from_str(
            r#"{"check_id": "style.todo", "path": "src/lib.rs", "severity": "INFO"}"#,
        )
        .unwrap();
        assert!(finding.cwe_ids.is_empty());
        assert_eq!(finding.line, 0);
    }

    #[tokio::test]
    async fn missing_api_key_disables_adapter() {
        let adapter = StaticAnalysisAdapter::new(
            reqwest::Client::new(),
            "http://localhost:9999".to_string(),
            None,
        );
        let target = ScanTarget {
            id: Uuid::new_v4(),
            name: "repo".to_string(),
            identifiers: vec![crate::models::target::TargetIdentifier {
                kind: IdentifierKind::Repository,
                value: "acme/storefront".to_string(),
            }],
            created_at: Utc::now(),
        };
        let policy = ScanPolicy {
            id: Uuid::new_v4(),
            name: "p".to_string(),
            allowed_tools: vec![ToolKind::StaticAnalysis],
            max_req_per_min: 60,
            spider_depth: 5,
            exclusions: vec![],
            scan_mode: Default::default(),
            created_at: Utc::now(),
        };
        let outcome = adapter.execute(&target, &policy).await;
        assert!(matches!(outcome, ToolOutcome::NotApplicable));
    }
}
