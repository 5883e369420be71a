use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_digest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a leading `www.` label from a host
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns the host-and-port key two URLs must share to be the same site
///
/// Only an explicit port counts, so `http` and `https` on their default
/// ports share a key.
fn site_key(url: &Url) -> Option<(String, Option<u16>)> {
    let host = extract_domain(url)?;
    Some((strip_www(&host).to_string(), url.port()))
}

/// Checks whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively and without a leading `www.`.
/// The scheme is ignored; an explicit port must match.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (site_key(a), site_key(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
