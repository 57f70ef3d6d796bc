//! Source-host security advisory adapter (GitHub-style REST API).
//!
//! Read-only: one query per declared `owner/repo` identifier, no
//! polling. Requires an access token; without one the adapter is
//! disabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::{AdapterError, RawToolResult, ToolAdapter, ToolOutcome};
use crate::models::policy::{ScanPolicy, ToolKind};
use crate::models::target::{IdentifierKind, ScanTarget};

/// One published security advisory. `repository` is attached by the
/// adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub ghsa_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub cve_id: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub repository: String,
}

pub struct AdvisoryAdapter {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AdvisoryAdapter {
    pub fn new(client: reqwest::Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    async fn fetch_advisories(
        &self,
        token: &str,
        repository: &str,
    ) -> Result<Vec<RawToolResult>, AdapterError> {
        let advisories: Vec<AdvisoryRecord> = self
            .client
            .get(format!(
                "{}/repos/{}/security-advisories",
                self.base_url, repository
            ))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, "scanforge")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(advisories
            .into_iter()
            .map(|mut advisory| {
                advisory.repository = repository.to_string();
                RawToolResult::Advisory(advisory)
            })
            .collect())
    }
}

#[async_trait]
impl ToolAdapter for AdvisoryAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Advisory
    }

    async fn execute(&self, target: &ScanTarget, _policy: &ScanPolicy) -> ToolOutcome {
        let Some(token) = self.token.as_deref() else {
            tracing::debug!("source host token not configured, skipping");
            return ToolOutcome::NotApplicable;
        };

        // Only `owner/repo` identifiers address the source-host API.
        let repositories: Vec<&str> = target
            .identifiers_of(IdentifierKind::Repository)
            .into_iter()
            .filter(|r| r.split('/').count() == 2)
            .collect();
        if repositories.is_empty() {
            return ToolOutcome::NotApplicable;
        }

        let mut results = Vec::new();
        for repository in repositories {
            match self.fetch_advisories(token, repository).await {
                Ok(records) => results.extend(records),
                Err(err) => return ToolOutcome::Failed(err),
            }
        }
        ToolOutcome::Completed(results)
    }
}
