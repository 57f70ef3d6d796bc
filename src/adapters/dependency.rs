//! Dependency vulnerability database adapter (OSV-style query API).
//!
//! Single-shot query per declared package identifier; no polling. The
//! database needs no credential, so this adapter is always enabled and
//! only skips targets without package identifiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::{AdapterError, RawToolResult, ToolAdapter, ToolOutcome};
use crate::models::policy::{ScanPolicy, ToolKind};
use crate::models::target::{IdentifierKind, ScanTarget};

/// One scored severity entry on a vulnerability record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsvSeverity {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: String,
}

/// One vulnerability affecting a declared package. `package` is the
/// queried `name@version` identifier, attached by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyVuln {
    pub id: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub severity: Vec<OsvSeverity>,
}

impl DependencyVuln {
    /// Highest numeric score across all severity entries; entries whose
    /// score does not parse as a number are ignored.
    pub fn max_score(&self) -> Option<f64> {
        self.severity
            .iter()
            .filter_map(|s| s.score.trim().parse::<f64>().ok())
            .fold(None, |max, score| match max {
                Some(m) if m >= score => Some(m),
                _ => Some(score),
            })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    vulns: Vec<DependencyVuln>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    package: PackageRef<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct PackageRef<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

pub struct DependencyAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl DependencyAdapter {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn query_package(
        &self,
        identifier: &str,
    ) -> Result<Vec<RawToolResult>, AdapterError> {
        // Scoped names keep their leading `@`: `@scope/name@1.0.0`
        // splits on the last separator.
        let Some((name, version)) = identifier.rsplit_once('@').filter(|(n, _)| !n.is_empty())
        else {
            tracing::warn!(identifier, "skipping malformed package identifier");
            return Ok(vec![]);
        };

        let response: QueryResponse = self
            .client
            .post(format!("{}/v1/query", self.base_url))
            .json(&QueryRequest {
                package: PackageRef {
                    name,
                    ecosystem: "npm",
                },
                version,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .vulns
            .into_iter()
            .map(|mut vuln| {
                vuln.package = identifier.to_string();
                RawToolResult::Dependency(vuln)
            })
            .collect())
    }
}

#[async_trait]
impl ToolAdapter for DependencyAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Dependency
    }

    async fn execute(&self, target: &ScanTarget, _policy: &ScanPolicy) -> ToolOutcome {
        let packages = target.identifiers_of(IdentifierKind::Npm);
        if packages.is_empty() {
            return ToolOutcome::NotApplicable;
        }

        let mut results = Vec::new();
        for package in packages {
            match self.query_package(package).await {
                Ok(vulns) => results.extend(vulns),
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
    fn max_score_picks_highest() {
        let vuln = DependencyVuln {
            id: "GHSA-a".to_string(),
            package: "lodash@4.17.20".to_string(),
            summary: String::new(),
            details: String::new(),
            severity: vec![
                OsvSeverity {
                    kind: "CVSS_V2".to_string(),
                    score: "6.8".to_string(),
                },
                OsvSeverity {
                    kind: "CVSS_V3".to_string(),
                    score: "9.1".to_string(),
                },
            ],
        };
        assert_eq!(vuln.max_score(), Some(9.1));
    }

    #[test]
    fn max_score_ignores_unparsable_entries() {
        let vuln = DependencyVuln {
            id: "GHSA-b".to_string(),
            package: String::new(),
            summary: String::new(),
            details: String::new(),
            severity: vec![
                OsvSeverity {
                    kind: "CVSS_V3".to_string(),
                    score: "CVSS:3.1/AV:N".to_string(),
                },
                OsvSeverity {
                    kind: "CVSS_V3".to_string(),
                    score: "5.0".to_string(),
                },
            ],
        };
        assert_eq!(vuln.max_score(), Some(5.0));
    }

    #[test]
    fn max_score_none_when_no_entries() {
        let vuln = DependencyVuln {
            id: "GHSA-c".to_string(),
            package: String::new(),
            summary: String::new(),
            details: String::new(),
            severity: vec![],
        };
        assert_eq!(vuln.max_score(), None);
    }

    #[test]
    fn query_response_deserializes_osv_shape() {
        let response: QueryResponse = serde_json::from_str(
            r#"{
                "vulns": [{
                    "id": "GHSA-35jh-r3h4-6jhm",
                    "summary": "Command injection in lodash",
                    "severity": [{"type": "CVSS_V3", "score": "7.2"}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(response.vulns.len(), 1);
        assert_eq!(response.vulns[0].id, "GHSA-35jh-r3h4-6jhm");
    }

    #[test]
    fn empty_response_body_means_no_vulns() {
        let response: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.vulns.is_empty());
    }

    #[tokio::test]
    async fn target_without_packages_is_not_applicable() {
        let adapter = DependencyAdapter::new(
            reqwest::Client::new(),
            "http://localhost:9999".to_string(),
        );
        let target = ScanTarget {
            id: Uuid::new_v4(),
            name: "web-only".to_string(),
            identifiers: vec![],
            created_at: Utc::now(),
        };
        let policy = ScanPolicy {
            id: Uuid::new_v4(),
            name: "p".to_string(),
            allowed_tools: vec![ToolKind::Dependency],
            max_req_per_min: 60,
            spider_depth: 5,
            exclusions: vec![],
            scan_mode: Default::default(),
            created_at: Utc::now(),
        };
        let outcome = adapter.execute(&target, &policy).await;
        assert!(matches!(outcome, ToolOutcome::NotApplicable));
    }

    #[test]
    fn scoped_package_name_splits_on_last_at() {
        let identifier = "@angular/core@14.2.0";
        let (name, version) = identifier.rsplit_once('@').unwrap();
        assert_eq!(name, "@angular/core");
        assert_eq!(version, "14.2.0");
    }
}
