//! Tool adapters for the external scanners this system drives.
//!
//! Each adapter isolates one tool's wire protocol behind the
//! `ToolAdapter` trait, producing raw tool results for the mapping
//! layer. Adapters distinguish three outcomes explicitly: the tool ran
//! (possibly finding nothing), the tool does not apply to this target,
//! or the tool genuinely failed. "Found nothing" and "not applicable"
//! are never errors.

pub mod advisory;
pub mod container;
pub mod dependency;
pub mod static_analysis;
pub mod web_scan;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::models::policy::{ScanPolicy, ToolKind};
use crate::models::target::ScanTarget;

pub use advisory::{AdvisoryAdapter, AdvisoryRecord};
pub use container::{ContainerAdapter, ContainerVuln};
pub use dependency::{DependencyAdapter, DependencyVuln};
pub use static_analysis::{StaticAnalysisAdapter, StaticFinding};
pub use web_scan::{WebScanAdapter, WebScanAlert};

/// Failure inside one tool adapter. Recorded on the job as a per-tool
/// error; never escalates to job-level failure.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication failure: {0}")]
    Auth(String),

    #[error("{phase} phase did not finish within {waited_secs}s")]
    Timeout { phase: &'static str, waited_secs: u64 },
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        let is_auth = err
            .status()
            .is_some_and(|s| s == reqwest::StatusCode::UNAUTHORIZED || s == reqwest::StatusCode::FORBIDDEN);
        if is_auth {
            Self::Auth(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Raw result from one tool run, tagged per tool. The original payload
/// travels with the canonical finding as an opaque attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum RawToolResult {
    WebScan(WebScanAlert),
    Dependency(DependencyVuln),
    Container(ContainerVuln),
    StaticAnalysis(StaticFinding),
    Advisory(AdvisoryRecord),
}

/// The three-way result of one adapter execution.
#[derive(Debug)]
pub enum ToolOutcome {
    /// The tool ran; the list may legitimately be empty.
    Completed(Vec<RawToolResult>),
    /// The target carries no identifier this tool consumes, or the
    /// adapter is disabled by missing configuration.
    NotApplicable,
    /// Genuine transport/auth/timeout failure.
    Failed(AdapterError),
}

/// Uniform adapter contract. Implementations must preserve the order of
/// results as returned by the tool.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn kind(&self) -> ToolKind;

    async fn execute(&self, target: &ScanTarget, policy: &ScanPolicy) -> ToolOutcome;
}

/// Explicit polling discipline for multi-phase adapters: fixed interval,
/// hard wall-clock deadline per phase.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Web-scanner discovery phase: 5s interval, 2 minute ceiling.
    pub fn spider() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(120))
    }

    /// Web-scanner active-test phase: 5s interval, 30 minute ceiling.
    pub fn active_scan() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(1800))
    }

    /// Static-analysis result phase: 10s interval, 10 minute ceiling.
    pub fn analysis() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(600))
    }
}

/// Sliding-window rate limiter over a one-minute horizon. Advisory
/// ceiling from the policy; adapters call `acquire` before each
/// outbound request.
#[derive(Debug)]
pub struct RateLimiter {
    limit_per_minute: usize,
    requests: VecDeque<Instant>,
}

impl RateLimiter {
    const WINDOW: Duration = Duration::from_secs(60);

    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute: (limit_per_minute as usize).max(1),
            requests: VecDeque::new(),
        }
    }

    /// Wait until a request slot is available, then claim it.
    pub async fn acquire(&mut self) {
        loop {
            let now = Instant::now();
            while let Some(front) = self.requests.front() {
                if now.duration_since(*front) > Self::WINDOW {
                    self.requests.pop_front();
                } else {
                    break;
                }
            }
            if self.requests.len() < self.limit_per_minute {
                self.requests.push_back(now);
                return;
            }
            // Window is full: sleep until the oldest entry expires.
            let Some(&oldest) = self.requests.front() else {
                continue;
            };
            tokio::time::sleep_until(oldest + Self::WINDOW).await;
        }
    }
}

/// The adapter set resolved from process configuration, shared by all
/// scan jobs. Adapters with missing credentials are constructed in a
/// disabled state and report `NotApplicable` on every run.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<ToolKind, Arc<dyn ToolAdapter>>,
}

impl AdapterRegistry {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to construct HTTP client");

        let adapters: Vec<Arc<dyn ToolAdapter>> = vec![
            Arc::new(WebScanAdapter::new(
                client.clone(),
                config.web_scanner_base_url.clone(),
                config.web_scanner_api_key.clone(),
            )),
            Arc::new(DependencyAdapter::new(
                client.clone(),
                config.osv_base_url.clone(),
            )),
            Arc::new(ContainerAdapter::new(
                client.clone(),
                config.container_scanner_base_url.clone(),
            )),
            Arc::new(StaticAnalysisAdapter::new(
                client.clone(),
                config.static_analysis_base_url.clone(),
                config.static_analysis_api_key.clone(),
            )),
            Arc::new(AdvisoryAdapter::new(
                client,
                config.source_host_base_url.clone(),
                config.source_host_token.clone(),
            )),
        ];
        Self::from_adapters(adapters)
    }

    /// Build a registry from arbitrary adapters (tests inject fakes).
    pub fn from_adapters(adapters: Vec<Arc<dyn ToolAdapter>>) -> Self {
        Self {
            adapters: adapters.into_iter().map(|a| (a.kind(), a)).collect(),
        }
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(&kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_error_from_reqwest_status() {
        // reqwest errors without a status are transport failures.
        let transport = AdapterError::Transport("connection refused".to_string());
        assert!(transport.to_string().contains("transport"));
    }

    #[test]
    fn timeout_error_message_names_phase() {
        let err = AdapterError::Timeout {
            phase: "spider",
            waited_secs: 120,
        };
        assert_eq!(err.to_string(), "spider phase did not finish within 120s");
    }

    #[test]
    fn poll_policy_defaults() {
        assert_eq!(PollPolicy::spider().deadline, Duration::from_secs(120));
        assert_eq!(PollPolicy::active_scan().deadline, Duration::from_secs(1800));
        assert_eq!(PollPolicy::analysis().interval, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_allows_burst_up_to_limit() {
        let mut limiter = RateLimiter::new(3);
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_delays_past_limit() {
        let mut limiter = RateLimiter::new(2);
        let started = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        // Third request must wait for the window to roll.
        limiter.acquire().await;
        assert!(started.elapsed() > Duration::from_secs(59));
    }

    #[test]
    fn raw_tool_result_is_tagged() {
        let raw = RawToolResult::Dependency(DependencyVuln {
            id: "GHSA-xxxx".to_string(),
            package: "lodash@4.17.20".to_string(),
            summary: "Prototype pollution".to_string(),
            details: String::new(),
            severity: vec![],
        });
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["tool"], "dependency");
        assert_eq!(json["package"], "lodash@4.17.20");
    }
}
