//! HTTP client with throttling and retry logic for mako.co.il
//!
//! Every outbound request, retries included, waits a base delay plus
//! random jitter first so the site's rate limiting never kicks in.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{MakoError, Result};

const BASE_URL: &str = "https://www.mako.co.il";
const ENTITLEMENT_URL: &str =
    "https://mass.mako.co.il/ClicksStatistics/entitlementsServicesV2.jsp?et=egt";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,he;q=0.8";
const REFERER: &str = "https://www.mako.co.il/mako-vod-index";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root used for the index page and the playlist endpoint
    pub base_url: String,
    /// Entitlement (ticket) endpoint
    pub entitlement_url: String,
    /// Fixed part of the pre-request delay (default: 1.5s)
    pub request_delay: Duration,
    /// Upper bound of the random part of the pre-request delay (default: 1s)
    pub request_jitter: Duration,
    /// Request timeout (default: 10s)
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors (default: 3)
    pub max_retries: u32,
    /// First retry backoff, doubled per attempt (default: 1s)
    pub retry_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            entitlement_url: ENTITLEMENT_URL.to_string(),
            request_delay: Duration::from_millis(1500),
            request_jitter: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Mandatory pause before each request
///
/// Holding the lock while sleeping serializes callers, so spacing stays
/// global even if requests are issued from several tasks.
pub struct Throttle {
    delay: Duration,
    jitter: Duration,
    gate: Mutex<()>,
}

impl Throttle {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self {
            delay,
            jitter,
            gate: Mutex::new(()),
        }
    }

    /// Wait out the delay for the next request
    pub async fn acquire(&self) {
        let _gate = self.gate.lock().await;
        let wait = self.next_wait();
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    /// Base delay plus a uniform sample from `0..=jitter`
    pub fn next_wait(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.delay, self.delay + self.jitter)
    }
}

/// HTTP client wrapper with throttling and retry logic
///
/// Sends the browser-like header set the site expects and keeps cookies
/// between requests.
pub struct MakoClient {
    client: reqwest::Client,
    throttle: Throttle,
    max_retries: u32,
    retry_backoff: Duration,
    base_url: String,
    entitlement_url: String,
}

impl MakoClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .default_headers(default_headers())
            .build()
            .map_err(MakoError::HttpError)?;

        Ok(Self {
            client,
            throttle: Throttle::new(config.request_delay, config.request_jitter),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            entitlement_url: config.entitlement_url,
        })
    }

    /// Site root without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn entitlement_url(&self) -> &str {
        &self.entitlement_url
    }

    /// GET `url` and return the response body
    ///
    /// # Errors
    /// - `HttpError` - Network errors, after retries for transient ones
    /// - `HttpStatus` - Non-success status
    /// - `RateLimited` - Server returned 429 after all retries exhausted
    pub async fn get(&self, url: &str) -> Result<String> {
        self.send_with_retry(Method::GET, url, None).await
    }

    /// POST a plain-text body to `url` and return the response body
    pub async fn post_text(&self, url: &str, body: &str) -> Result<String> {
        self.send_with_retry(Method::POST, url, Some(body)).await
    }

    async fn send_with_retry(&self, method: Method, url: &str, body: Option<&str>) -> Result<String> {
        let mut attempt = 0;

        loop {
            self.throttle.acquire().await;
            debug!(%method, url, attempt, "fetching");

            match self.send_once(&method, url, body).await {
                Ok(text) => return Ok(text),
                Err(e) if Self::is_retryable(&e) && attempt < self.max_retries => {
                    let backoff = self.retry_backoff * (1u32 << attempt);
                    warn!(url, attempt, error = %e, "transient failure, retrying");
                    if !backoff.is_zero() {
                        sleep(backoff).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, method: &Method, url: &str, body: Option<&str>) -> Result<String> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
                .body(body.to_string());
        }

        let response = request.send().await.map_err(MakoError::HttpError)?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MakoError::RateLimited);
        }
        if !status.is_success() {
            return Err(MakoError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(MakoError::HttpError)
    }

    /// Check if an error is worth another attempt
    fn is_retryable(error: &MakoError) -> bool {
        match error {
            MakoError::RateLimited => true,
            MakoError::HttpStatus { status, .. } => *status >= 500,
            MakoError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
    headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}
