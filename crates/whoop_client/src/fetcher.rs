//! Cursor-paginated export of a WHOOP collection into a [`RecordSink`].
//!
//! A run starts without a cursor, follows `next_token` until the server stops
//! returning one, and pauses whenever the advertised request quota runs low.

use crate::retry::RetryPolicy;
use crate::sink::RecordSink;
use crate::{WhoopError, response_snippet};
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const CURSOR_QUERY_PARAM: &str = "nextToken";

/// Fixed-delay throttle keyed off the remaining-requests header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub low_water_mark: u64,
    pub cool_down: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            low_water_mark: 25,
            cool_down: Duration::from_secs(5),
        }
    }
}

impl ThrottlePolicy {
    /// An unknown quota never triggers a pause.
    pub fn should_pause(&self, remaining: Option<u64>) -> bool {
        matches!(remaining, Some(r) if r < self.low_water_mark)
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchReport {
    pub resource_path: String,
    pub pages: usize,
    pub records: usize,
    pub throttle_pauses: usize,
}

/// A run that stopped early. Records already delivered stay in the sink.
#[derive(Debug, Error)]
#[error("fetch of {resource_path} aborted after {pages} page(s) and {records} record(s): {source}")]
pub struct FetchFailure {
    pub resource_path: String,
    pub pages: usize,
    pub records: usize,
    #[source]
    pub source: WhoopError,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    records: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    next_token: Option<String>,
}

/// Anything but a non-empty string ends pagination.
fn deserialize_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RATE_LIMIT_REMAINING_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Cursor {
    Initial,
    Continuation(String),
    Terminal,
}

impl Cursor {
    fn after(next_token: Option<String>) -> Self {
        next_token.map_or(Cursor::Terminal, Cursor::Continuation)
    }
}

#[derive(Clone, Debug)]
pub struct PageFetcher {
    base_url: String,
    client: reqwest::Client,
    throttle: ThrottlePolicy,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            throttle: ThrottlePolicy::default(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottlePolicy) -> Self {
        self.throttle = throttle;
        self
    }

    /// Retry transient page failures. Off by default.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Drain every page of `resource_path` into `sink`, in server order.
    pub async fn fetch<K>(
        &self,
        resource_path: &str,
        access_token: &SecretString,
        sink: &mut K,
    ) -> Result<FetchReport, FetchFailure>
    where
        K: RecordSink + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, resource_path.trim_start_matches('/'));
        let mut report = FetchReport {
            resource_path: resource_path.to_string(),
            pages: 0,
            records: 0,
            throttle_pauses: 0,
        };
        let mut cursor = Cursor::Initial;

        while cursor != Cursor::Terminal {
            let next = match &cursor {
                Cursor::Continuation(c) => Some(c.as_str()),
                _ => None,
            };
            let (page, remaining) = match self.fetch_page(&url, next, access_token).await {
                Ok(p) => p,
                Err(source) => return Err(report.fail(source)),
            };
            report.pages += 1;

            let records = page.records.unwrap_or_default();
            tracing::debug!(
                resource = resource_path,
                page = report.pages,
                records = records.len(),
                ?remaining,
                "page received"
            );
            for record in &records {
                if let Err(source) = sink.append(record) {
                    return Err(report.fail(source));
                }
                report.records += 1;
            }
            if let Err(source) = sink.flush() {
                return Err(report.fail(source));
            }
            metrics::counter!("whoop_records_total", "resource" => resource_path.to_string())
                .increment(records.len() as u64);

            cursor = Cursor::after(page.next_token);
            if cursor != Cursor::Terminal && self.throttle.should_pause(remaining) {
                tracing::info!(
                    resource = resource_path,
                    ?remaining,
                    cool_down = ?self.throttle.cool_down,
                    "rate limit low; pausing"
                );
                metrics::counter!("whoop_throttle_pauses_total").increment(1);
                tokio::time::sleep(self.throttle.cool_down).await;
                report.throttle_pauses += 1;
            }
        }

        tracing::info!(
            resource = resource_path,
            pages = report.pages,
            records = report.records,
            "resource drained"
        );
        Ok(report)
    }

    async fn fetch_page(
        &self,
        url: &str,
        cursor: Option<&str>,
        access_token: &SecretString,
    ) -> Result<(Page, Option<u64>), WhoopError> {
        self.retry
            .retry_async_if(
                || self.request_page(url, cursor, access_token),
                WhoopError::is_transient,
            )
            .await
    }

    async fn request_page(
        &self,
        url: &str,
        cursor: Option<&str>,
        access_token: &SecretString,
    ) -> Result<(Page, Option<u64>), WhoopError> {
        let mut request = self.client.get(url).bearer_auth(access_token.expose_secret());
        if let Some(cursor) = cursor {
            request = request.query(&[(CURSOR_QUERY_PARAM, cursor)]);
        }
        tracing::debug!(url, cursor, "requesting page");
        metrics::counter!("whoop_api_requests_total").increment(1);

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let (status, body) = response_snippet(resp).await;
            tracing::error!(url, status, %body, "page request failed");
            return Err(WhoopError::from_status(status, body));
        }
        let remaining = rate_limit_remaining(resp.headers());
        let body = resp.bytes().await?;
        let page: Page = serde_json::from_slice(&body)?;
        Ok((page, remaining))
    }
}

impl FetchReport {
    fn fail(self, source: WhoopError) -> FetchFailure {
        FetchFailure {
            resource_path: self.resource_path,
            pages: self.pages,
            records: self.records,
            source,
        }
    }
}
