//! Web application scanner adapter (ZAP-style JSON API).
//!
//! The only multi-phase, stateful adapter: it drives a discovery
//! ("spider") phase, then either waits out a passive settle period or —
//! when the policy explicitly allows active scanning — runs an
//! active-test phase, and finally fetches the accumulated alert list.
//! Every phase polls on a fixed interval under a hard wall-clock
//! deadline; overrunning a deadline is an adapter failure, not a silent
//! partial result.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::adapters::{
    AdapterError, PollPolicy, RateLimiter, RawToolResult, ToolAdapter, ToolOutcome,
};
use crate::models::policy::{ScanMode, ScanPolicy, ToolKind};
use crate::models::target::{IdentifierKind, ScanTarget};

/// One alert from the web scanner, forwarded verbatim to the mapper.
/// The scanner reports numeric ids (`cweid`, `wascid`) as strings, with
/// `"-1"` or the empty string meaning "not classified".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebScanAlert {
    pub alert: String,
    pub risk: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub cweid: String,
    #[serde(default)]
    pub wascid: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Deserialize)]
struct StartScanResponse {
    scan: String,
}

#[derive(Debug, Deserialize)]
struct ScanStatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    alerts: Vec<WebScanAlert>,
}

pub struct WebScanAdapter {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
    spider_poll: PollPolicy,
    active_poll: PollPolicy,
    passive_settle: Duration,
}

impl WebScanAdapter {
    pub fn new(client: reqwest::Client, base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
            spider_poll: PollPolicy::spider(),
            active_poll: PollPolicy::active_scan(),
            passive_settle: Duration::from_secs(10),
        }
    }

    /// Override the per-phase polling discipline (tests use short
    /// intervals and deadlines).
    pub fn with_poll_policies(
        mut self,
        spider: PollPolicy,
        active: PollPolicy,
        passive_settle: Duration,
    ) -> Self {
        self.spider_poll = spider;
        self.active_poll = active;
        self.passive_settle = passive_settle;
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.api_key {
            Some(key) => request.header("X-ZAP-API-Key", key),
            None => request,
        }
    }

    async fn run(
        &self,
        base: &str,
        target_url: &str,
        policy: &ScanPolicy,
    ) -> Result<Vec<RawToolResult>, AdapterError> {
        let mut limiter = RateLimiter::new(policy.max_req_per_min);

        // Phase 1: discovery.
        limiter.acquire().await;
        let depth = policy.spider_depth.to_string();
        let spider: StartScanResponse = self
            .get(&format!("{base}/JSON/spider/action/scan"))
            .query(&[("url", target_url), ("maxDepth", depth.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!(scan_id = %spider.scan, url = %target_url, "spider started");

        self.poll_until_complete(
            &format!("{base}/JSON/spider/view/status"),
            &spider.scan,
            self.spider_poll,
            "spider",
            &mut limiter,
        )
        .await?;

        // Phase 2: active test when the policy allows it; otherwise let
        // passive analysis settle over the traffic the spider observed.
        if policy.scan_mode == ScanMode::Active {
            limiter.acquire().await;
            let ascan: StartScanResponse = self
                .get(&format!("{base}/JSON/ascan/action/scan"))
                .query(&[("url", target_url)])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            tracing::debug!(scan_id = %ascan.scan, "active scan started");

            self.poll_until_complete(
                &format!("{base}/JSON/ascan/view/status"),
                &ascan.scan,
                self.active_poll,
                "active scan",
                &mut limiter,
            )
            .await?;
        } else {
            tokio::time::sleep(self.passive_settle).await;
        }

        // Phase 3: fetch accumulated alerts in one call.
        limiter.acquire().await;
        let alerts: AlertsResponse = self
            .get(&format!("{base}/JSON/core/view/alerts"))
            .query(&[("baseurl", target_url)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(alerts
            .alerts
            .into_iter()
            .map(RawToolResult::WebScan)
            .collect())
    }

    /// Poll a status endpoint until it reports 100%, on a fixed interval
    /// under a hard deadline.
    async fn poll_until_complete(
        &self,
        status_url: &str,
        scan_id: &str,
        poll: PollPolicy,
        phase: &'static str,
        limiter: &mut RateLimiter,
    ) -> Result<(), AdapterError> {
        let started = Instant::now();
        loop {
            if started.elapsed() > poll.deadline {
                return Err(AdapterError::Timeout {
                    phase,
                    waited_secs: poll.deadline.as_secs(),
                });
            }

            limiter.acquire().await;
            let status: ScanStatusResponse = self
                .get(status_url)
                .query(&[("scanId", scan_id)])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let percent: u32 = status.status.parse().unwrap_or(0);
            if percent >= 100 {
                return Ok(());
            }
            tracing::trace!(phase, percent, "waiting on scanner");
            tokio::time::sleep(poll.interval).await;
        }
    }
}

#[async_trait]
impl ToolAdapter for WebScanAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::WebScan
    }

    async fn execute(&self, target: &ScanTarget, policy: &ScanPolicy) -> ToolOutcome {
        let Some(base) = self.base_url.as_deref() else {
            tracing::debug!("web scanner not configured, skipping");
            return ToolOutcome::NotApplicable;
        };
        let Some(url) = target.first_identifier(IdentifierKind::Url) else {
            return ToolOutcome::NotApplicable;
        };

        match self.run(base, url, policy).await {
            Ok(results) => ToolOutcome::Completed(results),
            Err(err) => ToolOutcome::Failed(err),
        }
    }
}
