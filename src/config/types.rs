use serde::Deserialize;

/// Default crawler product token, also used as the robots.txt agent name
pub const DEFAULT_CRAWLER_NAME: &str = "SiteDigestBot";

/// Default User-Agent header sent with every request
pub const DEFAULT_USER_AGENT: &str = "SiteDigestBot/1.0 (+https://github.com/site-digest/site-digest)";

/// Main configuration structure for Site-Digest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub browser: BrowserConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub rules: RulesConfig,
}

/// Discovery limits and politeness
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of pages to discover
    #[serde(rename = "max-urls")]
    pub max_urls: usize,

    /// Maximum link depth expanded from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum delay between requests (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Whether robots.txt disallow rules and crawl delay are honored
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_urls: 50,
            max_depth: 2,
            crawl_delay_ms: 300,
            timeout_seconds: 30,
            respect_robots_txt: true,
        }
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether client-side-rendered pages are re-rendered in a browser
    pub enabled: bool,

    pub headless: bool,

    #[serde(rename = "block-images")]
    pub block_images: bool,

    #[serde(rename = "block-fonts")]
    pub block_fonts: bool,

    #[serde(rename = "viewport-width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height")]
    pub viewport_height: u32,

    /// User agent for the browser; the HTTP user agent when unset
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            block_images: true,
            block_fonts: true,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: None,
        }
    }
}

/// HTTP client identity and concurrency
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Concurrent plain HTTP fetches
    pub concurrency: usize,

    /// Concurrent browser renders
    #[serde(rename = "render-concurrency")]
    pub render_concurrency: usize,

    /// Agent token matched against robots.txt User-agent lines
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            render_concurrency: 3,
            crawler_name: DEFAULT_CRAWLER_NAME.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Persistent cache location
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path to an SQLite cache file; no caching when unset
    pub path: Option<String>,
}

/// Overrides for the built-in extraction rule sets
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    #[serde(rename = "cta-phrases")]
    pub cta_phrases: Option<Vec<String>>,

    #[serde(rename = "soft-404-signals")]
    pub soft_404_signals: Option<Vec<String>>,

    #[serde(rename = "skip-extensions")]
    pub skip_extensions: Option<Vec<String>>,

    #[serde(rename = "skip-path-patterns")]
    pub skip_path_patterns: Option<Vec<String>>,
}
