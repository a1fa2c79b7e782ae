//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the main loop that coordinates a harvest run:
//! - Pulling listings from the listing source
//! - Skipping listings without a website or with an already tracked one
//! - Running site crawls on a bounded worker pool
//! - Handling cancellation with a bounded grace period
//! - Flushing the store before returning

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::crawler::redirect::{HttpNavigator, Navigator};
use crate::crawler::site::{SiteCrawler, SiteReport};
use crate::listing::{load_listing_file, ListingBatch, ListingSource};
use crate::output::CrawlStatistics;
use crate::state::SiteOutcome;
use crate::storage::{open_storage, share, SharedStorage, Storage};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// What a site task hands back: the listing name and the crawl result
type SiteTaskOutput = (Option<String>, crate::Result<SiteReport>);

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    crawler: Arc<SiteCrawler>,
    source: Box<dyn ListingSource>,
    cancel: CancellationToken,
    stats: CrawlStatistics,
    failure: Option<HarvestError>,
}

impl Coordinator {
    /// Creates a coordinator with HTTP collaborators and the flat-file store
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `source` - Where listings come from
    /// * `cancel` - Token that stops the run when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The store or HTTP client could not be set up
    pub fn new(
        config: Config,
        source: Box<dyn ListingSource>,
        cancel: CancellationToken,
    ) -> Result<Self, HarvestError> {
        let storage = share(open_storage(&config.output)?);

        let client = build_http_client(
            Duration::from_secs(config.crawler.request_timeout),
            config.crawler.accept_invalid_certs,
        )?;
        let fetcher = Arc::new(HttpFetcher::new(client));
        let navigator = Arc::new(HttpNavigator::new(
            config.filters.redirect_patterns.clone(),
            config.crawler.accept_invalid_certs,
        ));

        Ok(Self::with_collaborators(
            config, source, fetcher, navigator, storage, cancel,
        ))
    }

    /// Creates a coordinator around caller-supplied collaborators
    pub fn with_collaborators(
        config: Config,
        source: Box<dyn ListingSource>,
        fetcher: Arc<dyn PageFetcher>,
        navigator: Arc<dyn Navigator>,
        storage: SharedStorage,
        cancel: CancellationToken,
    ) -> Self {
        let crawler = Arc::new(SiteCrawler::new(&config, fetcher, navigator, storage));
        Self {
            config: Arc::new(config),
            crawler,
            source,
            cancel,
            stats: CrawlStatistics::new(),
            failure: None,
        }
    }

    /// Runs the harvest until the listing source is exhausted or the run is
    /// cancelled
    ///
    /// 1. Pulls the next batch of listings
    /// 2. Reads each listing's website link
    /// 3. Skips listings whose direct link is already tracked
    /// 4. Spawns a site crawl once a worker slot is free
    /// 5. Drains in-flight crawls and flushes the store
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Run finished or was cancelled cleanly
    /// * `Err(HarvestError)` - A store commit or the final flush failed
    pub async fn run(mut self) -> Result<CrawlStatistics, HarvestError> {
        let max_concurrent = self.config.crawler.max_concurrent_sites.max(1) as usize;
        tracing::info!("Starting harvest with {} concurrent sites", max_concurrent);

        let slots = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks: JoinSet<SiteTaskOutput> = JoinSet::new();

        'listings: loop {
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => break,
                batch = self.source.next_batch() => batch,
            };

            let listings = match batch {
                Ok(ListingBatch::Listings(listings)) => listings,
                Ok(ListingBatch::EndOfStream) => {
                    tracing::info!("Listing source exhausted");
                    break;
                }
                Err(e) => {
                    tracing::error!("Listing source failed, stopping: {}", e);
                    self.stats.listing_errors += 1;
                    break;
                }
            };

            for listing in listings {
                if self.cancel.is_cancelled() || self.failure.is_some() {
                    break 'listings;
                }
                self.stats.listings_seen += 1;

                let details = match self.source.details_for(&listing).await {
                    Ok(details) => details,
                    Err(e) => {
                        tracing::warn!("Skipping listing {}: {}", listing.as_str(), e);
                        self.stats.listing_errors += 1;
                        continue;
                    }
                };

                let raw_url = match details.raw_website_url.as_deref().map(str::trim) {
                    Some(url) if !url.is_empty() => url,
                    _ => {
                        tracing::debug!(
                            "Listing {} has no website",
                            details.name.as_deref().unwrap_or(listing.as_str())
                        );
                        self.stats.without_website += 1;
                        continue;
                    }
                };

                let site = self.crawler.site_record(raw_url);
                if site.resolved && self.crawler.is_tracked(&site.homepage_url).await {
                    tracing::debug!("Already tracked: {}", site.homepage_url);
                    self.stats.record_outcome(SiteOutcome::SkippedDuplicate);
                    self.log_progress();
                    continue;
                }

                while let Some(joined) = tasks.try_join_next() {
                    self.record_joined(joined);
                }

                let permit = tokio::select! {
                    _ = self.cancel.cancelled() => break 'listings,
                    permit = slots.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break 'listings,
                    },
                };

                let crawler = Arc::clone(&self.crawler);
                let cancel = self.cancel.clone();
                let name = details.name;
                tasks.spawn(async move {
                    let _permit = permit;
                    let result = crawler.crawl_site(&site, &cancel).await;
                    (name, result)
                });
            }
        }

        self.drain(&mut tasks).await;
        self.finish().await
    }

    /// Waits for in-flight site crawls
    ///
    /// After cancellation the wait is bounded by the shutdown grace period;
    /// whatever is still running then is aborted.
    async fn drain(&mut self, tasks: &mut JoinSet<SiteTaskOutput>) {
        if tasks.is_empty() {
            return;
        }

        if !self.cancel.is_cancelled() {
            while let Some(joined) = tasks.join_next().await {
                self.record_joined(joined);
            }
            return;
        }

        let grace = Duration::from_secs(self.config.crawler.shutdown_grace);
        tracing::info!(
            "Waiting up to {:?} for {} in-flight sites",
            grace,
            tasks.len()
        );

        let waited = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                self.record_joined(joined);
            }
        })
        .await;

        if waited.is_err() {
            tracing::warn!("Abandoning {} sites after grace period", tasks.len());
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
    }

    /// Flushes the store and produces the final statistics
    async fn finish(mut self) -> Result<CrawlStatistics, HarvestError> {
        let flushed = {
            let mut storage = self.crawler.storage().lock().await;
            let flushed = storage.flush();
            self.stats.capture_store(&**storage);
            flushed
        };

        if let Some(e) = self.failure.take() {
            if let Err(flush_err) = flushed {
                tracing::error!("Final flush failed as well: {}", flush_err);
            }
            return Err(e);
        }
        flushed?;

        tracing::info!(
            "Harvest finished: {} sites, {} with emails, {} new emails in {:?}",
            self.stats.sites_done(),
            self.stats.sites_with_emails(),
            self.stats.new_emails,
            self.stats.elapsed()
        );
        Ok(self.stats)
    }

    fn record_joined(&mut self, joined: Result<SiteTaskOutput, JoinError>) {
        match joined {
            Ok((name, Ok(report))) => {
                tracing::info!(
                    "{} [{}]: {} ({} emails, {} new)",
                    name.as_deref().unwrap_or("unnamed listing"),
                    report.website.as_deref().unwrap_or("unknown website"),
                    report.outcome,
                    report.emails.len(),
                    report.new_emails
                );
                self.stats.record(&report);
                self.log_progress();
            }
            Ok((name, Err(e))) => {
                tracing::error!(
                    "Stopping harvest, commit failed for {}: {}",
                    name.as_deref().unwrap_or("unnamed listing"),
                    e
                );
                self.cancel.cancel();
                if self.failure.is_none() {
                    self.failure = Some(e);
                }
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!("Site task panicked: {}", e);
            }
        }
    }

    fn log_progress(&self) {
        let done = self.stats.sites_done();
        if done == 0 || done % 10 != 0 {
            return;
        }

        let elapsed = self.stats.elapsed();
        let rate = done as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            "Progress: {} sites done, {} with emails, {} new emails, {:.2} sites/sec",
            done,
            self.stats.sites_with_emails(),
            self.stats.new_emails,
            rate
        );
    }
}

/// Runs a harvest over the configured listings file
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Token that stops the run when cancelled
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Harvest finished or was cancelled cleanly
/// * `Err(HarvestError)` - Harvest failed with an error
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::load_config;
/// use sumi_harvest::crawler::run_harvest;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_harvest(config, CancellationToken::new()).await?;
/// println!("{} new emails", stats.new_emails);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlStatistics, HarvestError> {
    let source = load_listing_file(Path::new(&config.listings.path), config.listings.batch_size)?;
    Coordinator::new(config, Box::new(source), cancel)?.run().await
}
