//! Severity normalization and OWASP taxonomy mapping.
//!
//! Pure transformation layer invoked once per raw tool result. Given
//! identical input it always produces identical severity and tag
//! output: no randomness, no external state. Unrecognized native
//! severity vocabulary never crashes the pipeline — it falls back to
//! `medium`.

pub mod owasp;

use chrono::Utc;
use uuid::Uuid;

use crate::adapters::{
    AdvisoryRecord, ContainerVuln, DependencyVuln, RawToolResult, StaticFinding, WebScanAlert,
};
use crate::models::finding::{Finding, FindingStatus, OwaspCategory, Severity};
use crate::models::policy::ToolKind;
use crate::services::fingerprint;

/// Normalize one raw tool result into a canonical finding.
pub fn normalize(raw: &RawToolResult, target_id: Uuid) -> Finding {
    let (tool, title, location, severity, tags, description, recommendation) = match raw {
        RawToolResult::WebScan(alert) => web_scan_fields(alert),
        RawToolResult::Dependency(vuln) => dependency_fields(vuln),
        RawToolResult::Container(vuln) => container_fields(vuln),
        RawToolResult::StaticAnalysis(finding) => static_fields(finding),
        RawToolResult::Advisory(advisory) => advisory_fields(advisory),
    };

    Finding {
        id: Uuid::new_v4(),
        fingerprint: fingerprint::compute(tool, target_id, &title, &location),
        title,
        severity,
        status: FindingStatus::Open,
        tool,
        target_id,
        location,
        owasp_tags: tags,
        first_seen: Utc::now(),
        description,
        recommendation,
        raw: serde_json::to_value(raw).unwrap_or(serde_json::Value::Null),
    }
}

type MappedFields = (
    ToolKind,
    String,
    String,
    Severity,
    Vec<OwaspCategory>,
    String,
    Option<String>,
);

fn web_scan_fields(alert: &WebScanAlert) -> MappedFields {
    let tags = owasp::classify(
        parse_numeric_id(&alert.cweid),
        parse_numeric_id(&alert.wascid),
        &alert.alert,
    );
    (
        ToolKind::WebScan,
        alert.alert.clone(),
        alert.url.clone(),
        web_severity(&alert.risk),
        tags,
        alert.description.clone(),
        non_empty(&alert.solution),
    )
}

fn dependency_fields(vuln: &DependencyVuln) -> MappedFields {
    let title = if vuln.summary.is_empty() {
        vuln.id.clone()
    } else {
        vuln.summary.clone()
    };
    (
        ToolKind::Dependency,
        title,
        vuln.package.clone(),
        dependency_severity(vuln.max_score()),
        vec![OwaspCategory::A06],
        vuln.details.clone(),
        None,
    )
}

fn container_fields(vuln: &ContainerVuln) -> MappedFields {
    let title = if vuln.title.is_empty() {
        vuln.id.clone()
    } else {
        vuln.title.clone()
    };
    let recommendation = vuln
        .fixed_version
        .as_deref()
        .map(|fixed| format!("Upgrade {} to {fixed}", vuln.package));
    (
        ToolKind::Container,
        title,
        format!("{}@{}", vuln.package, vuln.installed_version),
        container_severity(&vuln.severity),
        vec![OwaspCategory::A06],
        vuln.description.clone(),
        recommendation,
    )
}

fn static_fields(finding: &StaticFinding) -> MappedFields {
    (
        ToolKind::StaticAnalysis,
        finding.check_id.clone(),
        format!("{}:{}", finding.path, finding.line),
        static_severity(&finding.severity),
        owasp::classify_cwes(&finding.cwe_ids),
        finding.message.clone(),
        None,
    )
}

fn advisory_fields(advisory: &AdvisoryRecord) -> MappedFields {
    let title = if advisory.summary.is_empty() {
        advisory.ghsa_id.clone()
    } else {
        advisory.summary.clone()
    };
    (
        ToolKind::Advisory,
        title,
        advisory.repository.clone(),
        advisory_severity(&advisory.severity),
        vec![OwaspCategory::A06, OwaspCategory::A08],
        advisory.description.clone(),
        None,
    )
}

/// Parse the scanner's string-typed numeric ids. `"-1"`, the empty
/// string, and non-numeric input all mean "not classified".
fn parse_numeric_id(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn web_severity(risk: &str) -> Severity {
    match risk {
        "High" => Severity::High,
        "Medium" => Severity::Medium,
        "Low" => Severity::Low,
        "Informational" => Severity::Info,
        _ => Severity::Medium,
    }
}

/// Bucket the highest numeric score: >= 9 critical, >= 7 high,
/// >= 4 medium, below that low. No parsable score at all falls back to
/// the unknown-input default.
fn dependency_severity(max_score: Option<f64>) -> Severity {
    match max_score {
        Some(score) if score >= 9.0 => Severity::Critical,
        Some(score) if score >= 7.0 => Severity::High,
        Some(score) if score >= 4.0 => Severity::Medium,
        Some(_) => Severity::Low,
        None => Severity::Medium,
    }
}

fn container_severity(severity: &str) -> Severity {
    match severity {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        "LOW" => Severity::Low,
        "UNKNOWN" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn static_severity(severity: &str) -> Severity {
    match severity {
        "ERROR" => Severity::High,
        "WARNING" => Severity::Medium,
        "INFO" => Severity::Low,
        _ => Severity::Medium,
    }
}

fn advisory_severity(severity: &str) -> Severity {
    match severity.to_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "moderate" => Severity::Medium,
        "low" => Severity::Low,
        _ => Severity::Medium,
    }
}
