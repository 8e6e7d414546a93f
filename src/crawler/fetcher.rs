//! HTTP fetching with concurrency bounds, retry, and politeness delays

use crate::config::{CrawlerConfig, RetryConfig, UserAgentConfig};
use crate::{AuditError, FetchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

/// A successfully fetched response body with timing metadata
#[derive(Debug)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
    pub elapsed: Duration,
    pub content_type: Option<String>,
}

/// Bounded-concurrency HTTP fetcher
///
/// Concurrency is limited twice: a global semaphore caps total in-flight
/// requests, and a per-host semaphore caps simultaneous connections to any
/// single host. Timeouts and transport errors are retried with exponential
/// backoff; HTTP error statuses are returned to the caller as-is since the
/// response still carries auditable information.
pub struct Fetcher {
    client: reqwest::Client,
    global_limit: Arc<Semaphore>,
    host_limits: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_host_limit: usize,
    retry: RetryConfig,
    request_delay: Duration,
    bytes_transferred: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Fetcher {
    pub fn new(crawler: &CrawlerConfig, retry: RetryConfig, user_agent: &UserAgentConfig) -> Result<Self, AuditError> {
        let client = build_http_client(crawler, user_agent)?;
        Ok(Self {
            client,
            global_limit: Arc::new(Semaphore::new(crawler.max_concurrent_requests)),
            host_limits: Mutex::new(HashMap::new()),
            per_host_limit: crawler.max_per_host_connections,
            retry,
            request_delay: Duration::from_millis(crawler.request_delay_ms),
            bytes_transferred: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    /// The shared HTTP client, for callers that issue their own requests
    /// (robots.txt, sitemaps) outside the politeness machinery
    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// Fetches one URL, holding both concurrency permits for the duration
    ///
    /// `extra_delay` is the robots.txt Crawl-delay for the host, if any; the
    /// effective politeness pause is the larger of it and the configured
    /// request delay, applied after the response while permits are still
    /// held so the host-level rate is actually honored.
    pub async fn fetch(&self, url: &Url, extra_delay: Option<f64>) -> Result<FetchedPage, FetchError> {
        let host = url.host_str().unwrap_or_default().to_string();
        let host_limit = self.host_semaphore(&host);

        // Acquire global first, then per-host. Both semaphores live as long
        // as the fetcher, so acquisition cannot fail.
        let _global = match self.global_limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "fetcher shut down".to_string(),
                })
            }
        };
        let _host = match host_limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "fetcher shut down".to_string(),
                })
            }
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = self.fetch_with_retry(url).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        // Politeness pause while still holding permits
        let delay = match extra_delay {
            Some(secs) => self.request_delay.max(Duration::from_secs_f64(secs)),
            None => self.request_delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        result
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.retry.max_retries => {
                    let backoff =
                        Duration::from_millis(self.retry.base_delay_ms * 2u64.pow(attempt));
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        let elapsed = start.elapsed();
        self.bytes_transferred
            .fetch_add(body.len() as u64, Ordering::Relaxed);

        debug!(
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "fetched"
        );

        Ok(FetchedPage {
            body,
            status,
            elapsed,
            content_type,
        })
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut limits = self
            .host_limits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            limits
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit))),
        )
    }

    /// Total response bytes received so far
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneously in-flight requests observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn classify_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Builds the HTTP client shared by the fetcher and the robots gate
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<reqwest::Client, AuditError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(max_retries: u32) -> Fetcher {
        let mut config = Config::default();
        config.crawler.request_delay_ms = 0;
        config.retry.max_retries = max_retries;
        config.retry.base_delay_ms = 1;
        Fetcher::new(&config.crawler, config.retry.clone(), &config.user_agent).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(0);
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let page = fetcher.fetch(&url, None).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>hello</html>");
        assert_eq!(fetcher.bytes_transferred(), page.body.len() as u64);
    }

    #[tokio::test]
    async fn test_http_error_status_is_not_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(2);
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let page = fetcher.fetch(&url, None).await.unwrap();

        // 404 is a valid audit result, not a retryable failure
        assert_eq!(page.status, 404);
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_retries() {
        let fetcher = test_fetcher(1);
        // Port is from the dynamic range and nothing is listening
        let url = Url::parse("http://127.0.0.1:49151/").unwrap();
        let result = fetcher.fetch(&url, None).await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_content_type_captured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html></html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let fetcher = test_fetcher(0);
        let url = Url::parse(&format!("{}/doc", server.uri())).unwrap();
        let page = fetcher.fetch(&url, None).await.unwrap();
        assert_eq!(
            page.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
    }
}
