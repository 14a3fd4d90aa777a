//! URL canonicalization and domain normalization.
//!
//! Every cache key and every candidate list is derived from the normalized
//! domain, so two URLs on the same host always share one entry.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL has no host: {0}")]
    NoHost(String),
}

/// Canonicalize a URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if there is none (`host:port` counts as none)
/// 3. Reject anything but http/https
/// 4. Lowercase the host
/// 5. Remove fragment (#...)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if has_scheme(trimmed) { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether `input` starts with a URL scheme such as `https:` or `mailto:`.
///
/// `example.com:8080/x` and `localhost:3000` are a host and port, not a scheme.
fn has_scheme(input: &str) -> bool {
    if input.contains("://") {
        return true;
    }
    let Some((head, rest)) = input.split_once(':') else {
        return false;
    };

    let scheme_like = head.starts_with(|c: char| c.is_ascii_alphabetic())
        && head.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_like {
        return false;
    }

    let port = rest.split(['/', '?', '#']).next().unwrap_or("");
    let port_like = !port.is_empty() && port.chars().all(|c| c.is_ascii_digit());
    !(port_like && (head.contains('.') || head.eq_ignore_ascii_case("localhost")))
}

/// Extract the normalized domain of a URL: lowercase host, leading `www.` removed.
pub fn normalize_domain(input: &str) -> Result<String, UrlError> {
    let url = canonicalize(input)?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::NoHost(input.trim().to_string()))?;

    let domain = host.strip_prefix("www.").unwrap_or(host);
    if domain.is_empty() {
        return Err(UrlError::NoHost(input.trim().to_string()));
    }

    Ok(domain.to_string())
}

/// Lenient form of [`normalize_domain`] for display-layer callers.
///
/// Absent or malformed input yields `None`; the reason is logged at trace level.
pub fn domain_of(url: Option<&str>) -> Option<String> {
    let url = url?;
    match normalize_domain(url) {
        Ok(domain) => Some(domain),
        Err(e) => {
            tracing::trace!(url, error = %e, "no domain for url");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com/a#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/a");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("chrome://extensions"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_non_web_schemes() {
        assert!(matches!(canonicalize("mailto:someone@example.com"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("javascript:void(0)"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("tel:5551234"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("data:image/png;base64,AAAA"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_host_and_port() {
        let url = canonicalize("example.com:8080/path").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.port(), Some(8080));

        let url = canonicalize("localhost:3000").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_normalize_domain_strips_www_and_case() {
        assert_eq!(normalize_domain("https://WWW.Example.COM/path?q=1").unwrap(), "example.com");
        assert_eq!(normalize_domain("http://www.example.com:8080/").unwrap(), "example.com");
    }

    #[test]
    fn test_normalize_domain_keeps_other_subdomains() {
        assert_eq!(normalize_domain("https://docs.rs/serde").unwrap(), "docs.rs");
        assert_eq!(normalize_domain("https://mail.www.example.com").unwrap(), "mail.www.example.com");
    }

    #[test]
    fn test_normalize_domain_bare_host() {
        assert_eq!(normalize_domain("  www.github.com ").unwrap(), "github.com");
    }

    #[test]
    fn test_normalize_domain_garbage() {
        assert!(normalize_domain("javascript:void(0)").is_err());
        assert!(normalize_domain("https://").is_err());
        assert!(normalize_domain("not a url at all").is_err());
    }

    #[test]
    fn test_domain_of_ignores_userinfo_lookalikes() {
        assert_eq!(domain_of(Some("mailto:someone@example.com")), None);
        assert_eq!(domain_of(Some("https://user:pw@example.com/")), Some("example.com".to_string()));
    }

    #[test]
    fn test_domain_of_absent() {
        assert_eq!(domain_of(None), None);
        assert_eq!(domain_of(Some("")), None);
        assert_eq!(domain_of(Some("https://www.rust-lang.org/learn")), Some("rust-lang.org".to_string()));
    }
}
