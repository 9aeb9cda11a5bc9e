use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for vlr-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "listing")]
    pub listings: Vec<ListingSource>,
    #[serde(default)]
    pub rankings: RankingsConfig,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Site root, e.g. "https://www.vlr.gg"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sustained request rate of the token bucket
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: u32,

    /// Number of requests that may be issued back to back
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Wall-clock budget for one listing walk (seconds)
    #[serde(rename = "walk-timeout-secs")]
    pub walk_timeout_secs: u64,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Whether per-record detail fetches draw from the same token bucket
    #[serde(rename = "rate-limit-detail-fetches", default = "default_true")]
    pub rate_limit_detail_fetches: bool,

    /// Refuse plain-HTTP URLs
    #[serde(rename = "https-only", default = "default_true")]
    pub https_only: bool,
}

impl ScraperConfig {
    pub fn walk_timeout(&self) -> Duration {
        Duration::from_secs(self.walk_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives every artifact
    pub directory: String,

    /// Append `_<YYYY-MM-DD_HH-MM-SS>` to listing artifact names
    #[serde(rename = "timestamp-suffix", default)]
    pub timestamp_suffix: bool,
}

/// Which extractor a listing is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Threads,
    Matches,
    Rankings,
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Threads => "threads",
            Self::Matches => "matches",
            Self::Rankings => "rankings",
        };
        write!(f, "{}", name)
    }
}

/// A crawlable paginated listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListingSource {
    /// Artifact name, e.g. "outputThreads"
    pub name: String,

    /// Path below the base URL, e.g. "threads"
    pub section: String,

    /// Query header appended to the section URL, e.g. "?filter=new"
    #[serde(default)]
    pub query: String,

    pub kind: ListingKind,
}

/// Ranking fan-out configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RankingsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_rankings_section")]
    pub section: String,
}

impl Default for RankingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            section: default_rankings_section(),
        }
    }
}

fn default_burst() -> u32 {
    1
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_rankings_section() -> String {
    "rankings".to_string()
}
