//! Container image scanner adapter (Trivy-style server API).
//!
//! Single-shot scan-by-reference call per declared image identifier.
//! The scanner's native severity vocabulary is a fixed 5-word enum that
//! the mapper translates one-to-one onto the canonical scale.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::{AdapterError, RawToolResult, ToolAdapter, ToolOutcome};
use crate::models::policy::{ScanPolicy, ToolKind};
use crate::models::target::{IdentifierKind, ScanTarget};

/// One vulnerability in a scanned image layer. Field names follow the
/// scanner's report format; `image` is attached by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerVuln {
    #[serde(rename = "VulnerabilityID")]
    pub id: String,
    #[serde(rename = "PkgName")]
    pub package: String,
    #[serde(rename = "InstalledVersion", default)]
    pub installed_version: String,
    #[serde(rename = "Severity", default)]
    pub severity: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "FixedVersion", default)]
    pub fixed_version: Option<String>,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct ScanReport {
    #[serde(rename = "Results", default)]
    results: Vec<ResultGroup>,
}

#[derive(Debug, Deserialize)]
struct ResultGroup {
    #[serde(rename = "Vulnerabilities", default)]
    vulnerabilities: Vec<ContainerVuln>,
}

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    image: &'a str,
}

pub struct ContainerAdapter {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ContainerAdapter {
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    async fn scan_image(
        &self,
        base: &str,
        image: &str,
    ) -> Result<Vec<RawToolResult>, AdapterError> {
        let report: ScanReport = self
            .client
            .post(format!("{base}/scan"))
            .json(&ScanRequest { image })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(report
            .results
            .into_iter()
            .flat_map(|group| group.vulnerabilities)
            .map(|mut vuln| {
                vuln.image = image.to_string();
                RawToolResult::Container(vuln)
            })
            .collect())
    }
}

#[async_trait]
impl ToolAdapter for ContainerAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Container
    }

    async fn execute(&self, target: &ScanTarget, _policy: &ScanPolicy) -> ToolOutcome {
        let Some(base) = self.base_url.as_deref() else {
            tracing::debug!("container scanner not configured, skipping");
            return ToolOutcome::NotApplicable;
        };
        let images = target.identifiers_of(IdentifierKind::Container);
        if images.is_empty() {
            return ToolOutcome::NotApplicable;
        }

        let mut results = Vec::new();
        for image in images {
            match self.scan_image(base, image).await {
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
    fn report_deserializes_scanner_shape() {
        let report: ScanReport = serde_json::from_str(
            r#"{
                "Results": [{
                    "Vulnerabilities": [{
                        "VulnerabilityID": "CVE-2023-12345",
                        "PkgName": "openssl",
                        "InstalledVersion": "1.1.1k",
                        "FixedVersion": "1.1.1l",
                        "Severity": "HIGH",
                        "Title": "Buffer overflow in openssl",
                        "Description": "A buffer overflow..."
                    }]
                }]
            }"#,
        )
        .unwrap();
        let vulns: Vec<_> = report
            .results
            .into_iter()
            .flat_map(|g| g.vulnerabilities)
            .collect();
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].id, "CVE-2023-12345");
        assert_eq!(vulns[0].severity, "HIGH");
        assert_eq!(vulns[0].fixed_version.as_deref(), Some("1.1.1l"));
    }

    #[test]
    fn empty_report_yields_no_vulns() {
        let report: ScanReport = serde_json::from_str(r#"{"Results": []}"#).unwrap();
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_adapter_is_not_applicable() {
        let adapter = ContainerAdapter::new(reqwest::Client::new(), None);
        let target = ScanTarget {
            id: Uuid::new_v4(),
            name: "img".to_string(),
            identifiers: vec![crate::models::target::TargetIdentifier {
                kind: IdentifierKind::Container,
                value: "registry.example.com/app:1.0".to_string(),
            }],
            created_at: Utc::now(),
        };
        let policy = ScanPolicy {
            id: Uuid::new_v4(),
            name: "p".to_string(),
            allowed_tools: vec![ToolKind::Container],
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
