use crate::config::types::{BrowserConfig, Config, CrawlConfig, FetchConfig, RulesConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_browser_config(&config.browser)?;
    validate_fetch_config(&config.fetch)?;
    validate_rules_config(&config.rules)?;
    Ok(())
}

fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Validates crawl limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    check_range("max-urls", config.max_urls, 1, 100)?;
    check_range("max-depth", config.max_depth, 1, 3)?;
    check_range("timeout-seconds", config.timeout_seconds, 5, 60)?;
    Ok(())
}

/// Validates browser settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-empty, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "browser user-agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates HTTP identity and pool sizes
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    check_range("concurrency", config.concurrency, 1, 50)?;
    check_range("render-concurrency", config.render_concurrency, 1, 10)?;

    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Rejects blank entries in rule overrides
fn validate_rules_config(config: &RulesConfig) -> Result<(), ConfigError> {
    let lists = [
        ("cta-phrases", &config.cta_phrases),
        ("soft-404-signals", &config.soft_404_signals),
        ("skip-extensions", &config.skip_extensions),
        ("skip-path-patterns", &config.skip_path_patterns),
    ];

    for (name, list) in lists {
        if let Some(entries) = list {
            if entries.iter().any(|entry| entry.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{} cannot contain blank entries",
                    name
                )));
            }
        }
    }

    Ok(())
}
