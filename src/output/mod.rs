//! Output module for reporting harvest results
//!
//! This module handles:
//! - Recording run statistics while the harvest progresses
//! - Summarizing the persisted tracked sets
//! - Rendering both to the console

pub mod stats;

pub use stats::{
    load_statistics, print_statistics, print_tracked_statistics, CrawlStatistics,
    TrackedStatistics,
};
