use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info_span, warn, Instrument};

/// How a failed exchange with the stats host should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    /// The host asked us to slow down, optionally saying for how long.
    Throttled(Option<Duration>),
    NonRetryable,
}

/// Classify a non-success response. The stats host answers bursts with 429
/// and sheds load with 503, both sometimes carrying `Retry-After`.
pub fn classify_response(status: StatusCode, headers: &HeaderMap) -> RetryDisposition {
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            let hint = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            RetryDisposition::Throttled(hint)
        }
        StatusCode::REQUEST_TIMEOUT => RetryDisposition::Retryable,
        s if s.is_server_error() => RetryDisposition::Retryable,
        _ => RetryDisposition::NonRetryable,
    }
}

/// `Retry-After` as delta seconds or an HTTP date. Dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    // The host stalls or drops clients it considers too eager.
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on a server-requested `Retry-After` wait.
    pub max_throttle_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            max_throttle_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let shift = u32::try_from(attempt_index).unwrap_or(u32::MAX);
        let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Wait before retry number `attempt_index`, or `None` when the request should fail now.
    /// A throttled response waits at least the exponential delay, longer if the host asks.
    pub fn retry_delay(
        &self,
        disposition: RetryDisposition,
        attempt_index: usize,
    ) -> Option<Duration> {
        if attempt_index >= self.max_retries {
            return None;
        }
        let backoff = self.delay_for_attempt(attempt_index);
        match disposition {
            RetryDisposition::NonRetryable => None,
            RetryDisposition::Retryable => Some(backoff),
            RetryDisposition::Throttled(None) => Some(backoff),
            RetryDisposition::Throttled(Some(hint)) => {
                Some(hint.min(self.max_throttle_delay).max(backoff))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub global_concurrency: usize,
    pub backoff: BackoffPolicy,
    /// Sent with every request; the stats host rejects requests without a referer.
    pub default_headers: Vec<(String, String)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: None,
            global_concurrency: 16,
            backoff: BackoffPolicy::default(),
            default_headers: vec![
                ("Referer".to_string(), "https://www.nba.com/".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub final_url: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("fetcher is shutting down")]
    Closed,
}

/// Shared HTTP client with a global in-flight cap and retry with capped backoff.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    global_limit: Arc<Semaphore>,
    backoff: BackoffPolicy,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name {name}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header {name}"))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .default_headers(headers);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;

        Ok(Self {
            client,
            global_limit: Arc::new(Semaphore::new(config.global_concurrency.max(1))),
            backoff: config.backoff,
        })
    }

    pub async fn fetch_bytes(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<FetchedResponse, FetchError> {
        let _permit = self
            .global_limit
            .acquire()
            .await
            .map_err(|_| FetchError::Closed)?;

        let span = info_span!("http_fetch", url);
        self.fetch_with_retries(url, query).instrument(span).await
    }

    async fn fetch_with_retries(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<FetchedResponse, FetchError> {
        let mut attempt = 0;
        loop {
            let (disposition, error) = match self.client.get(url).query(query).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();

                    if status.is_success() {
                        match resp.bytes().await {
                            Ok(body) => {
                                let body = body.to_vec();
                                debug!(%status, bytes = body.len(), "fetched");
                                return Ok(FetchedResponse {
                                    status,
                                    final_url,
                                    body,
                                });
                            }
                            Err(err) => (classify_reqwest_error(&err), FetchError::Request(err)),
                        }
                    } else {
                        (
                            classify_response(status, resp.headers()),
                            FetchError::HttpStatus {
                                status: status.as_u16(),
                                url: final_url,
                            },
                        )
                    }
                }
                Err(err) => (classify_reqwest_error(&err), FetchError::Request(err)),
            };

            let Some(delay) = self.backoff.retry_delay(disposition, attempt) else {
                return Err(error);
            };
            if let RetryDisposition::Throttled(hint) = disposition {
                warn!(attempt, ?hint, ?delay, error = %error, "stats host throttled request");
            } else {
                debug!(attempt, ?delay, error = %error, "retrying request");
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            max_throttle_delay: Duration::from_secs(30),
        }
    }

    fn retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn backoff_logic_is_exponential_and_capped() {
        let policy = policy();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(64), Duration::from_millis(350));
    }

    #[test]
    fn rate_limits_and_load_shedding_are_throttled() {
        assert_eq!(
            classify_response(StatusCode::TOO_MANY_REQUESTS, &retry_after("7")),
            RetryDisposition::Throttled(Some(Duration::from_secs(7)))
        );
        assert_eq!(
            classify_response(StatusCode::SERVICE_UNAVAILABLE, &HeaderMap::new()),
            RetryDisposition::Throttled(None)
        );
        assert_eq!(
            classify_response(StatusCode::TOO_MANY_REQUESTS, &retry_after("soon")),
            RetryDisposition::Throttled(None)
        );
    }

    #[test]
    fn other_statuses_keep_plain_classification() {
        let none = HeaderMap::new();
        assert_eq!(classify_response(StatusCode::BAD_GATEWAY, &none), RetryDisposition::Retryable);
        assert_eq!(
            classify_response(StatusCode::GATEWAY_TIMEOUT, &retry_after("9")),
            RetryDisposition::Retryable
        );
        assert_eq!(classify_response(StatusCode::NOT_FOUND, &none), RetryDisposition::NonRetryable);
        assert_eq!(classify_response(StatusCode::BAD_REQUEST, &none), RetryDisposition::NonRetryable);
    }

    #[test]
    fn retry_after_accepts_seconds_and_dates() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:28:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_retry_after(" 120 ", now), Some(Duration::from_secs(120)));
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:45 GMT", now),
            Some(Duration::from_secs(45))
        );
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", now),
            Some(Duration::ZERO)
        );
        assert_eq!(parse_retry_after("-3", now), None);
    }

    #[test]
    fn throttled_waits_honor_the_hint_within_bounds() {
        let policy = policy();
        let hinted = |secs| RetryDisposition::Throttled(Some(Duration::from_secs(secs)));

        assert_eq!(policy.retry_delay(hinted(7), 0), Some(Duration::from_secs(7)));
        assert_eq!(policy.retry_delay(hinted(600), 1), Some(Duration::from_secs(30)));
        assert_eq!(policy.retry_delay(hinted(0), 1), Some(Duration::from_millis(200)));
        assert_eq!(
            policy.retry_delay(RetryDisposition::Throttled(None), 2),
            Some(Duration::from_millis(350))
        );
    }

    #[test]
    fn retries_stop_at_the_budget_or_on_client_errors() {
        let policy = policy();
        assert_eq!(policy.retry_delay(RetryDisposition::Retryable, 4), Some(Duration::from_millis(350)));
        assert_eq!(policy.retry_delay(RetryDisposition::Retryable, 5), None);
        assert_eq!(policy.retry_delay(RetryDisposition::Throttled(None), 5), None);
        assert_eq!(policy.retry_delay(RetryDisposition::NonRetryable, 0), None);
    }

    #[test]
    fn invalid_default_headers_are_rejected() {
        let config = HttpClientConfig {
            default_headers: vec![("bad header".to_string(), "x".to_string())],
            ..Default::default()
        };
        assert!(HttpFetcher::new(config).is_err());
        assert!(HttpFetcher::new(HttpClientConfig::default()).is_ok());
    }
}
