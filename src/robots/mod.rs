//! Robots.txt fetching and per-origin caching
//!
//! Each origin's robots.txt is fetched at most once per audit and the parsed
//! result memoized. A missing or unreadable robots.txt fails open: every URL
//! on that origin is treated as allowed.

mod parser;

pub use parser::ParsedRobots;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Gate that answers "may we fetch this URL?" per the site's robots.txt
pub struct RobotsGate {
    client: reqwest::Client,
    user_agent: String,
    cache: Mutex<HashMap<String, Arc<ParsedRobots>>>,
}

impl RobotsGate {
    pub fn new(client: reqwest::Client, user_agent: String) -> Self {
        Self {
            client,
            user_agent,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether `url` may be fetched
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let robots = self.robots_for(url).await;
        robots.is_allowed(url.as_str(), &self.user_agent)
    }

    /// Crawl-delay (seconds) declared for our user agent on this origin
    pub async fn crawl_delay(&self, url: &Url) -> Option<f64> {
        let robots = self.robots_for(url).await;
        robots.crawl_delay(&self.user_agent)
    }

    /// Sitemap URLs declared in this origin's robots.txt
    pub async fn sitemaps(&self, url: &Url) -> Vec<String> {
        let robots = self.robots_for(url).await;
        robots.sitemaps()
    }

    /// Forgets every memoized policy
    ///
    /// Called at the start of each crawl session: robots.txt can change
    /// between sessions, so the memo must not outlive one.
    pub async fn reset(&self) {
        self.cache.lock().await.clear();
    }

    /// Returns the parsed robots.txt for the URL's origin, fetching it once
    ///
    /// The lock is released during the fetch so a slow origin cannot stall
    /// lookups for other origins. If two workers race on the same fresh
    /// origin, the first policy inserted wins.
    async fn robots_for(&self, url: &Url) -> Arc<ParsedRobots> {
        let origin = url.origin().ascii_serialization();

        if let Some(robots) = self.cache.lock().await.get(&origin) {
            return Arc::clone(robots);
        }

        let fetched = Arc::new(self.fetch_robots(&origin).await);
        let mut cache = self.cache.lock().await;
        Arc::clone(cache.entry(origin).or_insert(fetched))
    }

    async fn fetch_robots(&self, origin: &str) -> ParsedRobots {
        let robots_url = format!("{}/robots.txt", origin);
        debug!(url = %robots_url, "fetching robots.txt");

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => ParsedRobots::from_content(&body),
                Err(e) => {
                    warn!(url = %robots_url, error = %e, "failed to read robots.txt body, allowing all");
                    ParsedRobots::allow_all()
                }
            },
            Ok(response) => {
                debug!(url = %robots_url, status = %response.status(), "no usable robots.txt, allowing all");
                ParsedRobots::allow_all()
            }
            Err(e) => {
                debug!(url = %robots_url, error = %e, "robots.txt fetch failed, allowing all");
                ParsedRobots::allow_all()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_robots(server: &MockServer, body: &str, delay: Option<Duration>) {
        let mut response = ResponseTemplate::new(200).set_body_string(body);
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn gate() -> Arc<RobotsGate> {
        let client = reqwest::Client::builder().build().unwrap();
        Arc::new(RobotsGate::new(client, "sitelens".to_string()))
    }

    #[tokio::test]
    async fn test_slow_origin_does_not_stall_other_lookups() {
        let slow = MockServer::start().await;
        let fast = MockServer::start().await;
        mount_robots(
            &slow,
            "User-agent: *\nDisallow: /private",
            Some(Duration::from_secs(2)),
        )
        .await;
        mount_robots(&fast, "User-agent: *\nAllow: /", None).await;

        let gate = gate();
        let slow_url = Url::parse(&format!("{}/page", slow.uri())).unwrap();
        let fast_url = Url::parse(&format!("{}/page", fast.uri())).unwrap();

        let slow_lookup = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.is_allowed(&slow_url).await })
        };
        tokio::task::yield_now().await; // slow fetch is now in flight

        let started = Instant::now();
        assert!(gate.is_allowed(&fast_url).await);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "fast-origin lookup was stalled behind the slow origin"
        );
        assert!(slow_lookup.await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_forgets_memoized_policies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"),
            )
            .expect(2) // one fetch per session, not one per gate lifetime
            .mount(&server)
            .await;

        let gate = gate();
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();

        assert!(!gate.is_allowed(&url).await);
        assert!(!gate.is_allowed(&url).await); // memoized, no second fetch
        gate.reset().await;
        assert!(!gate.is_allowed(&url).await); // refetched after reset
    }
}
