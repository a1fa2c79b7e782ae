//! Crawler module for contact-email discovery
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with bounded waits
//! - HTML anchor enumeration
//! - Relevant-page selection and email extraction
//! - Tracking-redirect resolution
//! - Politeness delays and identity rotation
//! - Per-site crawling and overall harvest coordination

mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod politeness;
mod redirect;
mod relevance;
mod site;

pub use coordinator::{run_harvest, Coordinator};
pub use extractor::EmailExtractor;
pub use fetcher::{
    build_http_client, fetch_with_timeout, is_scannable_content_type, FetchError, HttpFetcher,
    PageFetcher,
};
pub use parser::{extract_anchors, resolve_link, Anchor};
pub use politeness::{IdentityPool, Politeness};
pub use redirect::{
    meta_refresh_target, target_from_query, HttpNavigator, Navigator, RedirectResolver, Resolution,
};
pub use relevance::{RelevanceClassifier, RelevantPage};
pub use site::{SiteCrawler, SiteRecord, SiteReport};
