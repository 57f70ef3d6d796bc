//! Scan policy model: a named configuration bundle referenced by id from
//! each scan job and never mutated mid-scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The external tools this system can drive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebScan,
    Dependency,
    Container,
    StaticAnalysis,
    Advisory,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::WebScan,
        ToolKind::Dependency,
        ToolKind::Container,
        ToolKind::StaticAnalysis,
        ToolKind::Advisory,
    ];
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebScan => write!(f, "web_scan"),
            Self::Dependency => write!(f, "dependency"),
            Self::Container => write!(f, "container"),
            Self::StaticAnalysis => write!(f, "static_analysis"),
            Self::Advisory => write!(f, "advisory"),
        }
    }
}

/// Scan intrusiveness mode. `Passive` limits the web scanner to discovery
/// and observation; `Active` additionally sends attack payloads and must
/// be requested explicitly on the policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Passive,
    Active,
}

/// A named scan configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPolicy {
    pub id: Uuid,
    pub name: String,
    pub allowed_tools: Vec<ToolKind>,
    /// Advisory request ceiling, enforced by adapters that support it.
    pub max_req_per_min: u32,
    pub spider_depth: u32,
    /// URL glob patterns; findings at matching locations are dropped.
    /// Applied to reported findings only, not to scan traffic.
    pub exclusions: Vec<String>,
    pub scan_mode: ScanMode,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicy {
    pub name: String,
    pub allowed_tools: Vec<ToolKind>,
    #[serde(default = "default_max_req_per_min")]
    pub max_req_per_min: u32,
    #[serde(default = "default_spider_depth")]
    pub spider_depth: u32,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub scan_mode: ScanMode,
}

fn default_max_req_per_min() -> u32 {
    60
}

fn default_spider_depth() -> u32 {
    5
}

/// Request body for replacing a policy's mutable fields.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdatePolicy {
    pub name: Option<String>,
    pub allowed_tools: Option<Vec<ToolKind>>,
    pub max_req_per_min: Option<u32>,
    pub spider_depth: Option<u32>,
    pub exclusions: Option<Vec<String>>,
    pub scan_mode: Option<ScanMode>,
}
