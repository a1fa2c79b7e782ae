//! State module for tracking per-site crawl progress
//!
//! # Components
//!
//! - `SiteState`: where a single website is in its crawl
//! - `SiteOutcome`: how the crawl of a website ended

mod outcome;
mod site_state;

// Re-export main types
pub use outcome::SiteOutcome;
pub use site_state::SiteState;
