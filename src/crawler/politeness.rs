//! Politeness controls
//!
//! This module handles:
//! - Randomized pauses around every network-facing action
//! - Rotating the outbound identity (user agent) per request
//!
//! Pauses are plain sleeps on the calling task. They never hold a lock, so
//! a pause on one site does not hold up any other site.

use crate::config::{CrawlerConfig, UserAgentConfig, DEFAULT_USER_AGENT};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded random delay between network actions
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    min: Duration,
    max: Duration,
}

impl Politeness {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay),
            Duration::from_millis(config.max_delay),
        )
    }

    /// Picks a delay uniformly from `[min, max]`
    pub fn next_delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(fastrand::u64(min..=max))
    }

    /// Sleeps for a random delay, waking early on cancellation
    ///
    /// # Returns
    ///
    /// `false` if the run was cancelled during (or before) the pause
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let delay = self.next_delay();
        if delay.is_zero() {
            return true;
        }

        tracing::trace!("Politeness pause of {:?}", delay);
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Pool of identity strings rotated per request
#[derive(Debug, Clone)]
pub struct IdentityPool {
    agents: Vec<String>,
    fallback: String,
}

impl IdentityPool {
    pub fn new(agents: Vec<String>, fallback: impl Into<String>) -> Self {
        let fallback = fallback.into();
        let fallback = if fallback.trim().is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            fallback
        };

        Self {
            agents: agents
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            fallback,
        }
    }

    /// Builds the pool from inline entries plus the optional pool file
    ///
    /// An unreadable pool file is logged and ignored; the crawl never fails
    /// for lack of identities.
    pub fn from_config(config: &UserAgentConfig) -> Self {
        let mut agents = config.pool.clone();

        if let Some(path) = &config.pool_file {
            match load_identity_file(Path::new(path)) {
                Ok(from_file) => {
                    tracing::debug!("Loaded {} identities from {}", from_file.len(), path);
                    agents.extend(from_file);
                }
                Err(e) => {
                    tracing::warn!("Identity pool file {} unavailable, using defaults: {}", path, e);
                }
            }
        }

        let pool = Self::new(agents, config.default.clone());
        if pool.agents.is_empty() {
            tracing::warn!("Identity pool is empty, every request uses the default identity");
        }
        pool
    }

    /// Returns the identity for the next request
    pub fn next(&self) -> &str {
        if self.agents.is_empty() {
            return &self.fallback;
        }
        &self.agents[fastrand::usize(..self.agents.len())]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn load_identity_file(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_delay_within_bounds() {
        let politeness = Politeness::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..100 {
            let delay = politeness.next_delay();
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let politeness = Politeness::new(Duration::from_millis(50), Duration::from_millis(5));
        let delay = politeness.next_delay();
        assert!(delay >= Duration::from_millis(5) && delay <= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_pause_returns_false_when_cancelled() {
        let politeness = Politeness::new(Duration::from_secs(60), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!politeness.pause(&cancel).await);
    }

    #[tokio::test]
    async fn test_pause_wakes_on_cancel() {
        let politeness = Politeness::new(Duration::from_secs(60), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        assert!(!politeness.pause(&cancel).await);
    }

    #[tokio::test]
    async fn test_zero_pause_completes() {
        let politeness = Politeness::new(Duration::ZERO, Duration::ZERO);
        assert!(politeness.pause(&CancellationToken::new()).await);
    }

    #[test]
    fn test_empty_pool_uses_fallback() {
        let pool = IdentityPool::new(vec![], "Fallback/1.0");
        assert!(pool.is_empty());
        assert_eq!(pool.next(), "Fallback/1.0");
    }

    #[test]
    fn test_blank_fallback_uses_builtin_default() {
        let pool = IdentityPool::new(vec![], "");
        assert_eq!(pool.next(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_rotation_draws_from_pool() {
        let agents = vec!["A/1".to_string(), "B/2".to_string(), "C/3".to_string()];
        let pool = IdentityPool::new(agents.clone(), "Fallback/1.0");
        for _ in 0..50 {
            let identity = pool.next();
            assert!(agents.iter().any(|a| a == identity));
        }
    }

    #[test]
    fn test_pool_file_merged() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "FileAgent/1.0\n\n  FileAgent/2.0  ").unwrap();
        file.flush().unwrap();

        let config = UserAgentConfig {
            pool: vec!["Inline/1.0".to_string()],
            pool_file: Some(file.path().display().to_string()),
            default: "Fallback/1.0".to_string(),
        };
        let pool = IdentityPool::from_config(&config);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_missing_pool_file_falls_back() {
        let config = UserAgentConfig {
            pool: vec![],
            pool_file: Some("/nonexistent/useragents.txt".to_string()),
            default: "Fallback/1.0".to_string(),
        };
        let pool = IdentityPool::from_config(&config);
        assert_eq!(pool.next(), "Fallback/1.0");
    }
}
