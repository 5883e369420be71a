//! Extraction rule sets
//!
//! Phrase lists, selectors and path filters used by the extraction and
//! discovery components. The built-in sets target English sites; the
//! phrase and path lists can be replaced from the `[rules]` config section.

use crate::config::RulesConfig;
use crate::ConfigError;
use regex::Regex;

const CTA_PHRASES: &[&str] = &[
    "get started",
    "get started free",
    "start free trial",
    "start your free trial",
    "try it free",
    "try for free",
    "try it now",
    "sign up",
    "sign up free",
    "sign up now",
    "sign in",
    "log in",
    "book a demo",
    "request a demo",
    "schedule a demo",
    "get a demo",
    "watch demo",
    "contact sales",
    "talk to sales",
    "contact us",
    "learn more",
    "read more",
    "see pricing",
    "view pricing",
    "buy now",
    "download now",
    "subscribe",
    "join now",
    "start now",
];

const SOFT_404_SIGNALS: &[&str] = &[
    "page not found",
    "404 not found",
    "404 error",
    "not found",
    "page doesn't exist",
    "page does not exist",
    "nothing here",
    "this page isn't available",
    "this page could not be found",
    "we couldn't find",
    "no longer available",
    "has been removed",
    "does not exist",
    "access denied",
    "403 forbidden",
    "you don't have permission",
    "just a moment",
    "error 404",
    "error 403",
    "error 500",
    "internal server error",
    "service unavailable",
];

const SKIP_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "pdf", "zip", "tar", "gz", "mp3", "mp4",
    "avi", "mov", "woff", "woff2", "ttf", "eot", "css", "js", "xml", "rss", "atom",
];

const SKIP_PATH_PATTERNS: &[&str] = &[
    "login", "signin", "signup", "register", "logout", "admin", "cart", "checkout", "account",
    "password", "oauth",
];

const NOISE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    "form",
    "[role='navigation']",
    "[role='banner']",
    "[role='contentinfo']",
    ".nav",
    ".navbar",
    ".header",
    ".footer",
    ".sidebar",
    ".cookie-banner",
    ".cookie-consent",
    "#cookie-banner",
    "#cookie-consent",
    ".popup",
    ".modal",
    ".ad",
    ".ads",
    ".advertisement",
    ".cta",
    ".call-to-action",
    ".testimonial",
    ".testimonials",
    ".logo-grid",
    ".logo-cloud",
    ".customer-logos",
];

const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    ".content",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".page-content",
    "#content",
    "#main-content",
];

const SOCIAL_PROOF_PREFIXES: &[&str] = &[
    "trusted by",
    "used by",
    "loved by",
    "backed by",
    "as seen in",
    "as featured in",
];

/// Longest plain line still treated as a social-proof strip
const SOCIAL_PROOF_MAX_CHARS: usize = 60;

const SPA_ROOT_IDS: &[&str] = &["root", "app"];

const SSR_ROOT_IDS: &[&str] = &["__next"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.trim().to_lowercase()).collect()
}

/// Immutable rule data shared by the extraction and discovery components
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    cta_phrases: Vec<String>,
    soft_404_signals: Vec<String>,
    social_proof_prefixes: Vec<String>,
    noise_selectors: Vec<String>,
    content_selectors: Vec<String>,
    spa_root_ids: Vec<String>,
    ssr_root_ids: Vec<String>,
    skip_extension_re: Regex,
    skip_path_re: Regex,
    logo_line_re: Regex,
    markdown_link_re: Regex,
}

impl ExtractionRules {
    /// Builds rules from explicit phrase and path lists
    ///
    /// Phrases and signals are matched case-insensitively. Extensions are
    /// given without the leading dot.
    pub fn new(
        cta_phrases: &[String],
        soft_404_signals: &[String],
        skip_extensions: &[String],
        skip_path_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        let skip_extension_re = compile_alternation(
            r"(?i)\.(?:{})$",
            skip_extensions.iter().map(|e| e.trim_start_matches('.')),
        )?;
        let skip_path_re =
            compile_alternation(r"(?i)(?:{})", skip_path_patterns.iter().map(String::as_str))?;

        Ok(Self {
            cta_phrases: lowered(cta_phrases),
            soft_404_signals: lowered(soft_404_signals),
            social_proof_prefixes: owned(SOCIAL_PROOF_PREFIXES),
            noise_selectors: owned(NOISE_SELECTORS),
            content_selectors: owned(CONTENT_SELECTORS),
            spa_root_ids: owned(SPA_ROOT_IDS),
            ssr_root_ids: owned(SSR_ROOT_IDS),
            skip_extension_re,
            skip_path_re,
            logo_line_re: compile(r"(?i)^[\p{L}\p{N} .,&'’-]{1,60}\s+logo$")?,
            markdown_link_re: compile(r"\[([^\]]*)\]\(([^)]*)\)")?,
        })
    }

    /// The built-in English rule sets
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(
            &owned(CTA_PHRASES),
            &owned(SOFT_404_SIGNALS),
            &owned(SKIP_EXTENSIONS),
            &owned(SKIP_PATH_PATTERNS),
        )
    }

    /// Built-in rule sets with any lists from `[rules]` substituted
    pub fn from_config(config: &RulesConfig) -> Result<Self, ConfigError> {
        let pick = |custom: &Option<Vec<String>>, fallback: &[&str]| {
            custom.clone().unwrap_or_else(|| owned(fallback))
        };

        Self::new(
            &pick(&config.cta_phrases, CTA_PHRASES),
            &pick(&config.soft_404_signals, SOFT_404_SIGNALS),
            &pick(&config.skip_extensions, SKIP_EXTENSIONS),
            &pick(&config.skip_path_patterns, SKIP_PATH_PATTERNS),
        )
    }

    pub fn noise_selectors(&self) -> &[String] {
        &self.noise_selectors
    }

    pub fn content_selectors(&self) -> &[String] {
        &self.content_selectors
    }

    pub fn spa_root_ids(&self) -> &[String] {
        &self.spa_root_ids
    }

    pub fn ssr_root_ids(&self) -> &[String] {
        &self.ssr_root_ids
    }

    pub(crate) fn markdown_link_re(&self) -> &Regex {
        &self.markdown_link_re
    }

    /// True if the text, ignoring case, emphasis and a trailing period or
    /// arrow, is exactly a call-to-action phrase
    pub fn is_cta(&self, text: &str) -> bool {
        let cleaned = text
            .trim()
            .trim_matches(|c: char| c == '*' || c == '_')
            .trim_end_matches(|c: char| c == '.' || c == '→' || c == '>' || c.is_whitespace())
            .trim()
            .to_lowercase();
        !cleaned.is_empty() && self.cta_phrases.iter().any(|p| *p == cleaned)
    }

    /// True for a short line naming a logo, e.g. "Acme logo"
    pub fn is_logo_line(&self, line: &str) -> bool {
        self.logo_line_re.is_match(line.trim())
    }

    /// True for a social-proof line such as "Trusted by Acme, Globex"
    ///
    /// Only headings and short lines without closing punctuation qualify,
    /// so prose that happens to start with "Used by" is kept.
    pub fn is_social_proof(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let is_heading = trimmed.starts_with('#');
        let text = trimmed.trim_start_matches('#').trim().to_lowercase();

        if !is_heading
            && (text.chars().count() > SOCIAL_PROOF_MAX_CHARS
                || text.ends_with(|c: char| matches!(c, '.' | '!' | '?' | ':' | ';' | '…')))
        {
            return false;
        }

        self.social_proof_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }

    /// Returns the first soft-404 signal found in any of the given fields
    pub fn soft_404_signal(&self, fields: &[&str]) -> Option<&str> {
        let haystack = fields
            .iter()
            .map(|f| f.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");
        self.soft_404_signals
            .iter()
            .find(|signal| haystack.contains(signal.as_str()))
            .map(String::as_str)
    }

    /// True if a URL path points at a static asset or feed
    pub fn has_skip_extension(&self, path: &str) -> bool {
        self.skip_extension_re.is_match(path)
    }

    /// True if a URL path looks like an account or commerce flow
    pub fn has_skip_path(&self, path: &str) -> bool {
        self.skip_path_re.is_match(path)
    }
}

/// Compiles `template` with `{}` replaced by the escaped alternatives;
/// an empty list yields a pattern that never matches
fn compile_alternation<'a>(
    template: &str,
    items: impl Iterator<Item = &'a str>,
) -> Result<Regex, ConfigError> {
    let alternatives = items
        .map(|item| regex::escape(item.trim()))
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>();

    if alternatives.is_empty() {
        return compile(r"[^\s\S]");
    }

    compile(&template.replace("{}", &alternatives.join("|")))
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExtractionRules {
        ExtractionRules::builtin().unwrap()
    }

    #[test]
    fn test_cta_exact_match() {
        let rules = rules();
        assert!(rules.is_cta("Get started"));
        assert!(rules.is_cta("  BOOK A DEMO "));
        assert!(rules.is_cta("**Learn more.**"));
        assert!(rules.is_cta("Learn more →"));
        assert!(!rules.is_cta("Learn more about our pricing model"));
        assert!(!rules.is_cta(""));
    }

    #[test]
    fn test_logo_line() {
        let rules = rules();
        assert!(rules.is_logo_line("Acme logo"));
        assert!(rules.is_logo_line("Globex Corp. Logo"));
        assert!(!rules.is_logo_line("We redesigned our logo last spring to match the brand"));
        assert!(!rules.is_logo_line("logo"));
    }

    #[test]
    fn test_social_proof() {
        let rules = rules();
        assert!(rules.is_social_proof("## Trusted by Acme, Globex"));
        assert!(rules.is_social_proof("Used by 10,000 teams"));
        assert!(!rules.is_social_proof("Our customers trusted by default"));
    }

    #[test]
    fn test_social_proof_keeps_prose() {
        let rules = rules();
        assert!(!rules.is_social_proof("Used by the scheduler, this flag decides when jobs retry."));
        assert!(!rules.is_social_proof(
            "Backed by a replicated log, every write survives the loss of any single node in the cluster"
        ));
        assert!(rules.is_social_proof("### Backed by a replicated log, every write survives the loss of a node"));
    }

    #[test]
    fn test_soft_404_signal() {
        let rules = rules();
        assert_eq!(
            rules.soft_404_signal(&["404 Not Found", ""]),
            Some("404 not found")
        );
        assert_eq!(
            rules.soft_404_signal(&["Pricing", "Plans for every team"]),
            None
        );
        assert_eq!(
            rules.soft_404_signal(&["", "Just a moment..."]),
            Some("just a moment")
        );
    }

    #[test]
    fn test_skip_extension() {
        let rules = rules();
        assert!(rules.has_skip_extension("/files/report.PDF"));
        assert!(rules.has_skip_extension("/static/app.js"));
        assert!(rules.has_skip_extension("/feed.xml"));
        assert!(!rules.has_skip_extension("/docs/json-guide"));
        assert!(!rules.has_skip_extension("/blog/css-tricks"));
    }

    #[test]
    fn test_skip_path() {
        let rules = rules();
        assert!(rules.has_skip_path("/login"));
        assert!(rules.has_skip_path("/users/Account/settings"));
        assert!(rules.has_skip_path("/shop/checkout"));
        assert!(!rules.has_skip_path("/pricing"));
    }

    #[test]
    fn test_config_overrides() {
        let config = RulesConfig {
            cta_phrases: Some(vec!["Jetzt starten".to_string()]),
            skip_extensions: Some(vec![".docx".to_string()]),
            ..RulesConfig::default()
        };
        let rules = ExtractionRules::from_config(&config).unwrap();

        assert!(rules.is_cta("jetzt starten"));
        assert!(!rules.is_cta("get started"));
        assert!(rules.has_skip_extension("/a/b.docx"));
        assert!(!rules.has_skip_extension("/a/b.pdf"));
        assert!(rules.has_skip_path("/login"));
    }
}
