//! Candidate icon addresses for a URL.
//!
//! Generation is pure: the same domain and provider mode always produce the
//! same ordered list, and nothing here touches the network. Every list is
//! non-empty; when no domain can be derived the list is just the placeholder.

use serde::{Deserialize, Serialize};

use crate::domain::domain_of;

/// Icon size requested from third-party icon services.
pub const ICON_SIZE: u32 = 32;

/// Embedded, network-independent fallback icon.
pub const PLACEHOLDER: &str = "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20viewBox%3D%220%200%2032%2032%22%3E%3Crect%20width%3D%2232%22%20height%3D%2232%22%20rx%3D%226%22%20fill%3D%22%23cbd5e1%22%2F%3E%3Ccircle%20cx%3D%2216%22%20cy%3D%2216%22%20r%3D%226%22%20fill%3D%22%2394a3b8%22%2F%3E%3C%2Fsvg%3E";

/// A source of icon addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// The site's own `/favicon.ico` and `/apple-touch-icon.png`.
    Direct,
    Google,
    DuckDuckGo,
    Raycast,
    Placeholder,
}

impl Provider {
    /// Label recorded in the cache for addresses produced by this provider.
    pub fn label(self) -> &'static str {
        match self {
            Provider::Direct => "direct",
            Provider::Google => "google",
            Provider::DuckDuckGo => "duckduckgo",
            Provider::Raycast => "raycast",
            Provider::Placeholder => "placeholder",
        }
    }

    fn addresses(self, domain: &str) -> Vec<String> {
        match self {
            Provider::Direct => {
                vec![format!("https://{domain}/favicon.ico"), format!("https://{domain}/apple-touch-icon.png")]
            }
            Provider::Google => vec![format!("https://www.google.com/s2/favicons?domain={domain}&sz={ICON_SIZE}")],
            Provider::DuckDuckGo => vec![format!("https://icons.duckduckgo.com/ip3/{domain}.ico")],
            Provider::Raycast => vec![format!("https://api.ray.so/favicon?url={domain}&size={ICON_SIZE}")],
            Provider::Placeholder => vec![PLACEHOLDER.to_string()],
        }
    }
}

/// Which icon sources the generator is allowed to propose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    None,
    Direct,
    Google,
    DuckDuckGo,
    Raycast,
    /// Every provider, first-party assets before lookup services.
    #[default]
    Chain,
}

impl ProviderMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(ProviderMode::None),
            "direct" => Some(ProviderMode::Direct),
            "google" => Some(ProviderMode::Google),
            "duckduckgo" => Some(ProviderMode::DuckDuckGo),
            "raycast" => Some(ProviderMode::Raycast),
            "chain" => Some(ProviderMode::Chain),
            _ => None,
        }
    }

    /// Parse a mode name, falling back to [`ProviderMode::Chain`] on anything unrecognized.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderMode::None => "none",
            ProviderMode::Direct => "direct",
            ProviderMode::Google => "google",
            ProviderMode::DuckDuckGo => "duckduckgo",
            ProviderMode::Raycast => "raycast",
            ProviderMode::Chain => "chain",
        }
    }

    /// Providers consulted by this mode, in order.
    pub fn providers(self) -> &'static [Provider] {
        match self {
            ProviderMode::None => &[Provider::Placeholder],
            ProviderMode::Direct => &[Provider::Direct],
            ProviderMode::Google => &[Provider::Google],
            ProviderMode::DuckDuckGo => &[Provider::DuckDuckGo],
            ProviderMode::Raycast => &[Provider::Raycast],
            ProviderMode::Chain => &[Provider::Direct, Provider::Google, Provider::DuckDuckGo, Provider::Raycast],
        }
    }
}

impl std::fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One address to try, with the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Candidate {
    pub provider: Provider,
    pub src: String,
}

impl Candidate {
    fn placeholder() -> Self {
        Self { provider: Provider::Placeholder, src: PLACEHOLDER.to_string() }
    }
}

/// Builds ordered candidate lists for the configured provider mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateGenerator {
    mode: ProviderMode,
}

impl CandidateGenerator {
    pub fn new(mode: ProviderMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ProviderMode {
        self.mode
    }

    /// Ordered candidates for `url`, never empty.
    pub fn candidate_list(&self, url: Option<&str>) -> Vec<Candidate> {
        let Some(domain) = domain_of(url) else {
            return vec![Candidate::placeholder()];
        };

        let list: Vec<Candidate> = self
            .mode
            .providers()
            .iter()
            .flat_map(|&provider| {
                provider
                    .addresses(&domain)
                    .into_iter()
                    .map(move |src| Candidate { provider, src })
            })
            .collect();

        if list.is_empty() { vec![Candidate::placeholder()] } else { list }
    }

    /// Ordered candidate addresses for `url`, never empty.
    pub fn candidates(&self, url: Option<&str>) -> Vec<String> {
        self.candidate_list(url).into_iter().map(|c| c.src).collect()
    }

    /// Provider whose candidate for `url` is exactly `src`.
    pub fn provider_of(&self, url: Option<&str>, src: &str) -> Option<Provider> {
        self.candidate_list(url)
            .into_iter()
            .find(|c| c.src == src)
            .map(|c| c.provider)
    }
}
