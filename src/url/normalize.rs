use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Drop the fragment
/// 3. Strip trailing slashes from the path; an empty path becomes `/`
/// 4. Keep scheme, host, port and query as given
///
/// Applying the function to its own output returns the same URL.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse the URL or unsupported scheme
///
/// # Examples
///
/// ```
/// use site_digest::url::normalize_url;
///
/// let url = normalize_url("https://a.com/x/?q=1#f").unwrap();
/// assert_eq!(url.as_str(), "https://a.com/x?q=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    let trimmed = url.path().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        url.set_path("/");
    } else {
        url.set_path(&trimmed);
    }

    Ok(url)
}

/// Normalizes a URL and returns it as a string, or `None` if it is unusable
pub fn canonical_url(url_str: &str) -> Option<String> {
    normalize_url(url_str).ok().map(String::from)
}
