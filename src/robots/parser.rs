//! Robots.txt parsing, backed by the robotstxt crate

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one origin
///
/// Wraps the raw file content; permission checks are matched on demand.
/// Empty content (or the explicit allow-all constructor) permits everything,
/// which is the fail-open default when robots.txt cannot be fetched.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Permissive policy used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks whether a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Sitemap URLs declared in this robots.txt
    pub fn sitemaps(&self) -> Vec<String> {
        self.content
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                let (key, value) = trimmed.split_once(':')?;
                if key.trim().eq_ignore_ascii_case("sitemap") {
                    let value = value.trim();
                    (!value.is_empty()).then(|| value.to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Crawl-delay (seconds) for the given user agent, if declared
    ///
    /// Prefers a group naming the agent over the `*` wildcard group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let mut current_agents: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;
        let normalized_agent = user_agent.to_lowercase();

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim();

                match key.as_str() {
                    "user-agent" => current_agents.push(value.to_lowercase()),
                    "crawl-delay" => {
                        if let Ok(delay) = value.parse::<f64>() {
                            if current_agents
                                .iter()
                                .any(|ua| ua == "*" || normalized_agent.contains(ua.as_str()))
                            {
                                if current_agents.iter().any(|ua| ua == "*") {
                                    wildcard_delay = Some(delay);
                                } else {
                                    agent_delay = Some(delay);
                                }
                            }
                        }
                        current_agents.clear();
                    }
                    _ => {}
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("https://example.com/admin", "TestBot"));
    }

    #[test]
    fn test_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("https://example.com/page", "TestBot"));
    }

    #[test]
    fn test_disallow_specific_path() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed("https://example.com/page", "TestBot"));
        assert!(!robots.is_allowed("https://example.com/admin", "TestBot"));
        assert!(!robots.is_allowed("https://example.com/admin/users", "TestBot"));
    }

    #[test]
    fn test_specific_user_agent() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("https://example.com/page", "GoodBot"));
        assert!(!robots.is_allowed("https://example.com/page", "BadBot"));
    }

    #[test]
    fn test_empty_content_allows_everything() {
        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allowed("https://example.com/anything", "TestBot"));
    }

    #[test]
    fn test_sitemap_directives() {
        let content = "User-agent: *\nDisallow:\nSitemap: https://example.com/sitemap.xml\nsitemap: https://example.com/news.xml";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(
            robots.sitemaps(),
            vec![
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/news.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10");
        assert_eq!(robots.crawl_delay("AnyBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_prefers_specific_agent() {
        let content = "User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_decimal() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 2.5");
        assert_eq!(robots.crawl_delay("TestBot"), Some(2.5));
    }

    #[test]
    fn test_no_crawl_delay() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }
}
