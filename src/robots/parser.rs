//! Robots.txt directive extraction
//!
//! Uses the robotstxt crate's parse callbacks to collect the three things
//! discovery needs: sitemap hints, the crawl delay and disallowed prefixes.

use robotstxt::{parse_robotstxt, RobotsParseHandler};
use serde::{Deserialize, Serialize};

/// Directives relevant to one crawler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotsDirectives {
    /// Sitemap URLs in file order, without duplicates
    pub sitemap_urls: Vec<String>,
    /// Crawl delay in seconds from the first applicable group that sets one
    pub crawl_delay: Option<f64>,
    /// Disallowed path prefixes in file order, without duplicates
    pub disallowed_paths: Vec<String>,
}

impl RobotsDirectives {
    /// True if `path` starts with any disallowed prefix
    pub fn is_disallowed(&self, path: &str) -> bool {
        self.disallowed_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Parse callback collecting directives for a single agent
struct DirectiveCollector {
    /// Lowercase product token of our crawler
    agent: String,
    /// Whether the current group applies to us
    applies: bool,
    /// Whether the previous line was a User-agent line
    in_agent_lines: bool,
    directives: RobotsDirectives,
}

impl DirectiveCollector {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.trim().to_lowercase(),
            applies: false,
            in_agent_lines: false,
            directives: RobotsDirectives::default(),
        }
    }

    fn matches_agent(&self, value: &str) -> bool {
        let token = value
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_lowercase();
        token == "*" || (!token.is_empty() && token == self.agent)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

impl RobotsParseHandler for DirectiveCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        let matched = self.matches_agent(user_agent);
        // Consecutive User-agent lines form one group
        self.applies = if self.in_agent_lines {
            self.applies || matched
        } else {
            matched
        };
        self.in_agent_lines = true;
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.in_agent_lines = false;
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.in_agent_lines = false;
        let value = value.trim();
        if self.applies && !value.is_empty() {
            push_unique(&mut self.directives.disallowed_paths, value);
        }
    }

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            push_unique(&mut self.directives.sitemap_urls, value);
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        self.in_agent_lines = false;
        if !self.applies
            || !action.eq_ignore_ascii_case("crawl-delay")
            || self.directives.crawl_delay.is_some()
        {
            return;
        }

        match value.trim().parse::<f64>() {
            Ok(delay) if delay.is_finite() && delay >= 0.0 => {
                self.directives.crawl_delay = Some(delay);
            }
            _ => tracing::debug!("Ignoring malformed Crawl-delay value: {}", value),
        }
    }
}

/// Extracts the directives that apply to `agent` from robots.txt content
///
/// # Arguments
///
/// * `content` - Raw robots.txt body
/// * `agent` - The crawler's product token (e.g. "SiteDigestBot")
///
/// # Returns
///
/// Sitemap lines regardless of group; Disallow and Crawl-delay only from
/// groups naming `*` or `agent`. Malformed lines are ignored.
pub fn parse_directives(content: &str, agent: &str) -> RobotsDirectives {
    let mut collector = DirectiveCollector::new(agent);
    parse_robotstxt(content, &mut collector);
    collector.directives
}
