//! HTTP icon loader.
//!
//! Plays the part of the rendering layer: it attempts one candidate address
//! and reports whether an image came back.
//!
//! ### Safety Gates
//! - http/https only; `data:` addresses are never fetched
//! - Resolve DNS and validate all A/AAAA answers are public (configurable)
//! - Redirects are followed by hand, max 5, and every hop is checked again
//! - Max body bytes: 1MB (configurable)
//!
//! ### What counts as an icon
//! - 2xx status after redirects
//! - non-empty body within the byte limit
//! - `image/*`, `application/octet-stream`, or no Content-Type at all

pub mod ssrf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode, Url, header};
use std::time::{Duration, Instant};

use favicache_core::AppConfig;

pub use ssrf::{SsrfError, guard_url, validate_ip};

/// Error type for a failed icon load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    #[error("BLOCKED: {0}")]
    Blocked(#[from] SsrfError),

    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    #[error("HTTP_ERROR: {0}")]
    Http(String),

    #[error("FETCH_TOO_LARGE: {0} bytes exceeds {1}")]
    TooLarge(usize, usize),

    #[error("NOT_AN_IMAGE: {0}")]
    NotAnImage(String),
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LoadError::Timeout(err.to_string()) } else { LoadError::Http(err.to_string()) }
    }
}

/// Configuration for the icon loader.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// User agent string (default: "favicache/0.1")
    pub user_agent: String,

    /// Maximum icon body size in bytes (default: 1MB)
    pub max_bytes: usize,

    /// Request timeout (default: 5s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Refuse hosts resolving to private or reserved addresses (default: true)
    pub block_private: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            user_agent: "favicache/0.1".to_string(),
            max_bytes: 1024 * 1024,
            timeout: Duration::from_millis(5000),
            max_redirects: 5,
            block_private: true,
        }
    }
}

impl From<&AppConfig> for LoadConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            block_private: config.block_private,
            ..Self::default()
        }
    }
}

/// A successfully loaded icon.
#[derive(Debug, Clone)]
pub struct LoadedIcon {
    /// The candidate address that was requested
    pub src: String,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Icon bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Something that can attempt to load an icon address.
#[async_trait]
pub trait IconLoader: Send + Sync {
    async fn load(&self, src: &str) -> Result<LoadedIcon, LoadError>;
}

/// reqwest-backed loader with safety checks.
pub struct HttpIconLoader {
    http: Client,
    config: LoadConfig,
}

impl HttpIconLoader {
    /// Create a new loader with the given configuration.
    pub fn new(config: LoadConfig) -> Result<Self, LoadError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| LoadError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Refuse a target the configuration does not allow.
    async fn check_target(&self, url: &Url) -> Result<(), LoadError> {
        if self.config.block_private {
            guard_url(url).await?;
        } else if !matches!(url.scheme(), "http" | "https") {
            return Err(SsrfError::BlockedScheme(url.scheme().to_string()).into());
        }
        Ok(())
    }

    /// GET `url`, following redirects up to `max_redirects`.
    ///
    /// `url` itself must already be checked; each redirect target is checked
    /// before it is requested.
    async fn send_following(&self, mut url: Url) -> Result<Response, LoadError> {
        let mut hops = 0;
        loop {
            let response = self
                .http
                .get(url.as_str())
                .header(header::ACCEPT, "image/avif,image/webp,image/png,image/svg+xml,image/*;q=0.8,*/*;q=0.5")
                .send()
                .await?;

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok(response);
            };

            if hops >= self.config.max_redirects {
                return Err(LoadError::Http(format!("too many redirects (max {})", self.config.max_redirects)));
            }
            let next = url
                .join(location)
                .map_err(|e| LoadError::InvalidUrl(format!("{location}: {e}")))?;

            tracing::trace!(from = %url, to = %next, "following redirect");
            self.check_target(&next).await?;
            url = next;
            hops += 1;
        }
    }
}

#[async_trait]
impl IconLoader for HttpIconLoader {
    async fn load(&self, src: &str) -> Result<LoadedIcon, LoadError> {
        let start = Instant::now();
        let url = Url::parse(src).map_err(|e| LoadError::InvalidUrl(format!("{src}: {e}")))?;

        self.check_target(&url).await?;
        let response = self.send_following(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Http(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response
            .content_length()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            && len > self.config.max_bytes
        {
            return Err(LoadError::TooLarge(len, self.config.max_bytes));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ct) = content_type.as_deref()
            && !is_icon_content_type(ct)
        {
            return Err(LoadError::NotAnImage(ct.to_string()));
        }

        let bytes = response.bytes().await?;

        if bytes.len() > self.config.max_bytes {
            return Err(LoadError::TooLarge(bytes.len(), self.config.max_bytes));
        }
        if bytes.is_empty() {
            return Err(LoadError::NotAnImage("empty body".into()));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(src, final_url = %final_url, fetch_ms, bytes = bytes.len(), "loaded icon");

        Ok(LoadedIcon { src: src.to_string(), final_url, status, content_type, bytes, fetch_ms })
    }
}

fn is_icon_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/octet-stream"
}
