use serde::Deserialize;

/// Identity used when the configured pool is empty or unreadable
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Keywords that mark a link as pointing at a contact, about, careers or team page
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "contact",
    "kontakt",
    "about",
    "über",
    "impressum",
    "job",
    "career",
    "karriere",
    "stellenangebot",
    "jobs",
    "stellen",
    "work with us",
    "join us",
    "team",
    "teammitglied",
    "team member",
    "contact us",
    "kontaktieren sie uns",
    "reach out",
    "reachout",
];

/// Asset suffixes that indicate a filename rather than an address
pub const DEFAULT_BLACKLIST_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Placeholder domains that never hold a real contact address
pub const DEFAULT_BLACKLIST_DOMAINS: &[&str] = &["domain.com", "example.com"];

/// URL fragments identifying tracking/ad-click redirects
pub const DEFAULT_REDIRECT_PATTERNS: &[&str] = &["google.com/aclk", "google.com/url"];

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    pub output: OutputConfig,
    pub listings: ListingsConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of sites crawled at the same time
    #[serde(rename = "max-concurrent-sites", default = "default_concurrency")]
    pub max_concurrent_sites: u32,

    /// Lower bound of the politeness delay (milliseconds)
    #[serde(rename = "min-delay")]
    pub min_delay: u64,

    /// Upper bound of the politeness delay (milliseconds)
    #[serde(rename = "max-delay")]
    pub max_delay: u64,

    /// Page fetch timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Redirect resolution timeout (seconds)
    #[serde(rename = "redirect-timeout", default = "default_redirect_timeout")]
    pub redirect_timeout: u64,

    /// How long in-flight sites may keep running after cancellation (seconds)
    #[serde(rename = "shutdown-grace", default = "default_shutdown_grace")]
    pub shutdown_grace: u64,

    /// Mark a website as tracked even when no email was found on it
    #[serde(rename = "track-even-when-empty", default)]
    pub track_even_when_empty: bool,

    /// Check the raw (unresolved) URL against the tracked set before resolving
    #[serde(rename = "dedup-before-resolve", default)]
    pub dedup_before_resolve: bool,

    /// Accept invalid TLS certificates
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,
}

/// Outbound identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Identity strings to rotate through
    #[serde(default)]
    pub pool: Vec<String>,

    /// Optional file with one identity per line, merged into the pool
    #[serde(rename = "pool-file", default)]
    pub pool_file: Option<String>,

    /// Identity used when the pool is empty
    #[serde(default = "default_user_agent")]
    pub default: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            pool: Vec::new(),
            pool_file: None,
            default: default_user_agent(),
        }
    }
}

/// Relevance keywords and email noise filters
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(rename = "blacklist-extensions", default = "default_blacklist_extensions")]
    pub blacklist_extensions: Vec<String>,

    #[serde(rename = "blacklist-domains", default = "default_blacklist_domains")]
    pub blacklist_domains: Vec<String>,

    #[serde(rename = "redirect-patterns", default = "default_redirect_patterns")]
    pub redirect_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            blacklist_extensions: default_blacklist_extensions(),
            blacklist_domains: default_blacklist_domains(),
            redirect_patterns: default_redirect_patterns(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the tracked websites file
    #[serde(rename = "websites-path")]
    pub websites_path: String,

    /// Path to the tracked emails file
    #[serde(rename = "emails-path")]
    pub emails_path: String,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListingsConfig {
    /// Path to a JSON-lines listing file
    pub path: String,

    /// Number of listings handed out per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_concurrency() -> u32 {
    1
}

fn default_request_timeout() -> u64 {
    30
}

fn default_redirect_timeout() -> u64 {
    10
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_batch_size() -> usize {
    20
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_keywords() -> Vec<String> {
    to_strings(DEFAULT_KEYWORDS)
}

fn default_blacklist_extensions() -> Vec<String> {
    to_strings(DEFAULT_BLACKLIST_EXTENSIONS)
}

fn default_blacklist_domains() -> Vec<String> {
    to_strings(DEFAULT_BLACKLIST_DOMAINS)
}

fn default_redirect_patterns() -> Vec<String> {
    to_strings(DEFAULT_REDIRECT_PATTERNS)
}
