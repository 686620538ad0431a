//! Outbound HTTP plumbing shared by the geocoding and weather providers
//!
//! Builds clients with timeouts and optional transient-failure retries, maps
//! upstream status codes onto [`PlannerError`], and provides the sliding
//! window rate limiter used for providers with a usage policy.

use crate::{PlannerError, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Build an outbound client with the given user agent, timeout and retry budget
pub fn build_client(
    user_agent: &str,
    timeout_seconds: u32,
    max_retries: u32,
) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(user_agent)
        .build()
        .map_err(|e| PlannerError::config(format!("Failed to create HTTP client: {e}")))?;

    let mut builder = ClientBuilder::new(client);
    if max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// GET `url` and decode the JSON body, mapping every failure to [`PlannerError::Api`]
#[instrument(skip(client), level = "debug")]
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    provider: &str,
    url: &str,
) -> Result<T> {
    let start_time = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        warn!("{provider} request failed: {e}");
        PlannerError::api(format!("{provider} request failed: {e}"))
    })?;

    let status = response.status();
    debug!(
        "{provider} responded {status} in {:.3}s",
        start_time.elapsed().as_secs_f64()
    );

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        warn!("{provider} rate limit exceeded (HTTP 429), retry after {retry_after}s");
        return Err(PlannerError::api(format!(
            "{provider} rate limit exceeded, retry after {retry_after}s"
        )));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{provider} returned {status}: {body}");
        return Err(PlannerError::api(format!(
            "{provider} returned {status}: {body}"
        )));
    }

    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {provider} response: {e}");
        PlannerError::api(format!("Invalid response from {provider}: {e}"))
    })
}

/// Sliding one-minute window of request timestamps
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per minute
    max_requests_per_minute: u32,
    /// Minimum spacing between two admitted requests
    min_interval: Duration,
    /// Request timestamps within the current window, oldest first
    request_times: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute: max_requests_per_minute.max(1),
            min_interval: Duration::ZERO,
            request_times: VecDeque::new(),
        }
    }

    /// Also keep at least `min_interval` between consecutive requests
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    fn interval_wait(&self) -> Duration {
        self.request_times
            .back()
            .map_or(Duration::ZERO, |latest| {
                self.min_interval.saturating_sub(latest.elapsed())
            })
    }

    /// Check if a request is allowed and record it
    pub fn allow_request(&mut self) -> bool {
        self.cleanup_old_requests();

        if self.request_times.len() >= self.max_requests_per_minute as usize
            || !self.interval_wait().is_zero()
        {
            false
        } else {
            self.request_times.push_back(Instant::now());
            true
        }
    }

    /// Get time until next request is allowed
    pub fn time_until_next_request(&mut self) -> Duration {
        self.cleanup_old_requests();

        let interval_wait = self.interval_wait();
        if self.request_times.len() < self.max_requests_per_minute as usize {
            return interval_wait;
        }
        let window_wait = self
            .request_times
            .front()
            .map_or(Duration::ZERO, |oldest| {
                RATE_WINDOW.saturating_sub(oldest.elapsed())
            });
        window_wait.max(interval_wait)
    }

    fn cleanup_old_requests(&mut self) {
        while let Some(oldest) = self.request_times.front() {
            if oldest.elapsed() >= RATE_WINDOW {
                self.request_times.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Async wrapper that waits for a free slot instead of rejecting
#[derive(Debug)]
pub struct Throttle {
    limiter: Mutex<RateLimiter>,
}

impl Throttle {
    pub fn new(max_requests_per_minute: u32, min_interval: Duration) -> Self {
        Self {
            limiter: Mutex::new(
                RateLimiter::new(max_requests_per_minute).with_min_interval(min_interval),
            ),
        }
    }

    /// Wait until the limiter admits one more request
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut limiter = self.limiter.lock().await;
                if limiter.allow_request() {
                    return;
                }
                limiter.time_until_next_request()
            };
            debug!(
                "Rate limit reached, waiting {:.1}s",
                wait_time.as_secs_f64()
            );
            tokio::time::sleep(wait_time.max(Duration::from_millis(10))).await;
        }
    }
}
