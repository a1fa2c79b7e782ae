//! Site crawler - per-website crawl state machine
//!
//! One website is driven through:
//!
//! ```text
//! Start -> HomepageFetched -> EmailsFound -> Done
//!                          -> NeedsRelevantPageScan -> EmailsFound -> Done
//!                                                   -> Done
//! ```
//!
//! Every page-level failure is absorbed here and turned into an empty page.
//! Only store failures escape, since losing a commit silently is not
//! acceptable.

use crate::config::Config;
use crate::crawler::extractor::EmailExtractor;
use crate::crawler::fetcher::{fetch_with_timeout, PageFetcher};
use crate::crawler::politeness::{IdentityPool, Politeness};
use crate::crawler::redirect::{Navigator, RedirectResolver, Resolution};
use crate::crawler::relevance::RelevanceClassifier;
use crate::state::{SiteOutcome, SiteState};
use crate::storage::{commit_with_retry, SharedStorage};
use crate::url::{canonical_url, parse_absolute};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A website taken from a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    /// Website link as given by the listing
    pub homepage_url: String,

    /// False while the link is a tracking redirect awaiting resolution
    pub resolved: bool,
}

/// What happened to one website
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    /// Canonical website URL, if it was known
    pub website: Option<String>,
    pub outcome: SiteOutcome,

    /// Emails found on the page that ended the scan
    pub emails: BTreeSet<String>,

    /// How many of `emails` were not tracked before
    pub new_emails: usize,
    pub pages_fetched: usize,
}

impl SiteReport {
    fn new(website: Option<String>, outcome: SiteOutcome) -> Self {
        Self {
            website,
            outcome,
            emails: BTreeSet::new(),
            new_emails: 0,
            pages_fetched: 0,
        }
    }
}

/// Result of fetching one page on behalf of a site
enum PageFetch {
    Content(String),
    Failed,
    Cancelled,
}

/// Canonical URLs currently being crawled
///
/// A claim is released when its guard drops, on every exit path.
#[derive(Debug, Default)]
struct InFlight {
    sites: Mutex<HashSet<String>>,
}

impl InFlight {
    fn claim(&self, website: &str) -> Option<InFlightClaim<'_>> {
        let mut sites = self.sites.lock().unwrap_or_else(PoisonError::into_inner);
        if sites.insert(website.to_string()) {
            Some(InFlightClaim {
                registry: self,
                website: website.to_string(),
            })
        } else {
            None
        }
    }
}

struct InFlightClaim<'a> {
    registry: &'a InFlight,
    website: String,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.registry
            .sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.website);
    }
}

/// Crawls single websites for contact emails
pub struct SiteCrawler {
    fetcher: Arc<dyn PageFetcher>,
    resolver: RedirectResolver,
    classifier: RelevanceClassifier,
    extractor: EmailExtractor,
    politeness: Politeness,
    identities: IdentityPool,
    storage: SharedStorage,
    request_timeout: Duration,
    track_even_when_empty: bool,
    dedup_before_resolve: bool,
    in_flight: InFlight,
}

impl SiteCrawler {
    /// Creates a site crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl settings, filters and identity pool
    /// * `fetcher` - Page fetch collaborator
    /// * `navigator` - Navigation collaborator for tracking redirects
    /// * `storage` - Shared tracked-set store
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        navigator: Arc<dyn Navigator>,
        storage: SharedStorage,
    ) -> Self {
        let crawler = &config.crawler;
        Self {
            fetcher,
            resolver: RedirectResolver::new(
                config.filters.redirect_patterns.clone(),
                navigator,
                Duration::from_secs(crawler.redirect_timeout),
            ),
            classifier: RelevanceClassifier::from_config(&config.filters),
            extractor: EmailExtractor::from_config(&config.filters),
            politeness: Politeness::from_config(crawler),
            identities: IdentityPool::from_config(&config.user_agent),
            storage,
            request_timeout: Duration::from_secs(crawler.request_timeout),
            track_even_when_empty: crawler.track_even_when_empty,
            dedup_before_resolve: crawler.dedup_before_resolve,
            in_flight: InFlight::default(),
        }
    }

    /// Builds the record for a raw website link
    ///
    /// Classified on the parsed form, the same one `RedirectResolver::resolve`
    /// looks at, so host case cannot make the two disagree.
    pub fn site_record(&self, raw_url: &str) -> SiteRecord {
        let parsed = parse_absolute(raw_url).map(|url| url.to_string());
        let classified = parsed.as_deref().unwrap_or(raw_url);
        SiteRecord {
            homepage_url: raw_url.trim().to_string(),
            resolved: !self.resolver.is_indirect(classified),
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Returns true if the canonical form of `url` is already tracked
    pub async fn is_tracked(&self, url: &str) -> bool {
        self.storage.lock().await.is_website_tracked(url)
    }

    /// Returns true if `raw_url` appears verbatim in the tracked set
    ///
    /// Tracked entries carry no query, so query-style tracking links never
    /// match; stripping it would collapse every ad link onto one key. Only
    /// path-style links such as `https://ads.example/go/cafe` can be skipped.
    async fn is_raw_link_tracked(&self, raw_url: &str) -> bool {
        self.storage
            .lock()
            .await
            .tracked_websites()
            .contains(raw_url.trim())
    }

    /// Crawls one website to completion
    ///
    /// # Returns
    ///
    /// * `Ok(SiteReport)` - The site reached `Done`; page failures are folded
    ///   into the outcome
    /// * `Err(HarvestError)` - A commit failed after all retries
    pub async fn crawl_site(
        &self,
        site: &SiteRecord,
        cancel: &CancellationToken,
    ) -> crate::Result<SiteReport> {
        let mut state = SiteState::Start;

        if !site.resolved
            && self.dedup_before_resolve
            && self.is_raw_link_tracked(&site.homepage_url).await
        {
            tracing::debug!("Raw link {} already tracked", site.homepage_url);
            state.transition(SiteState::Done)?;
            return Ok(SiteReport::new(
                Some(site.homepage_url.clone()),
                SiteOutcome::SkippedDuplicate,
            ));
        }

        let website = match self.resolve(site, cancel).await {
            Some(Resolution::Final(website)) => website,
            Some(Resolution::Unresolved) => {
                state.transition(SiteState::Done)?;
                return Ok(SiteReport::new(None, SiteOutcome::SkippedUnresolved));
            }
            None => {
                state.transition(SiteState::Done)?;
                return Ok(SiteReport::new(None, SiteOutcome::Cancelled));
            }
        };

        let base_url = match parse_absolute(&website) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping unusable website {}: {}", website, e);
                state.transition(SiteState::Done)?;
                return Ok(SiteReport::new(None, SiteOutcome::SkippedUnresolved));
            }
        };

        if self.is_tracked(&website).await {
            tracing::debug!("Website {} already tracked", website);
            state.transition(SiteState::Done)?;
            return Ok(SiteReport::new(Some(website), SiteOutcome::SkippedDuplicate));
        }

        let Some(_claim) = self.in_flight.claim(&website) else {
            tracing::debug!("Website {} is already being crawled", website);
            state.transition(SiteState::Done)?;
            return Ok(SiteReport::new(Some(website), SiteOutcome::SkippedDuplicate));
        };

        // Another crawl may have committed it between the check and the claim
        if self.is_tracked(&website).await {
            tracing::debug!("Website {} was tracked while claiming", website);
            state.transition(SiteState::Done)?;
            return Ok(SiteReport::new(Some(website), SiteOutcome::SkippedDuplicate));
        }

        let mut report = SiteReport::new(Some(website.clone()), SiteOutcome::NoEmails);

        // Homepage
        let homepage = match self.fetch_page(&website, cancel).await {
            PageFetch::Content(content) => {
                report.pages_fetched += 1;
                content
            }
            PageFetch::Failed => String::new(),
            PageFetch::Cancelled => {
                state.transition(SiteState::Done)?;
                report.outcome = SiteOutcome::Cancelled;
                return Ok(report);
            }
        };
        state = state.transition(SiteState::HomepageFetched)?;

        let emails = self.extractor.extract(&homepage);
        if !emails.is_empty() {
            state = state.transition(SiteState::EmailsFound)?;
            self.record_discovery(&website, emails, &mut report).await?;
            state.transition(SiteState::Done)?;
            report.outcome = SiteOutcome::EmailsFoundHomepage;
            return Ok(report);
        }

        // Relevant pages
        state = state.transition(SiteState::NeedsRelevantPageScan)?;
        let pages: Vec<_> = self
            .classifier
            .find_relevant_pages(&homepage, &base_url)
            .into_iter()
            .filter(|page| canonical_url(&page.url) != website)
            .collect();
        tracing::debug!("{} relevant pages on {}", pages.len(), website);

        for page in &pages {
            let content = match self.fetch_page(&page.url, cancel).await {
                PageFetch::Content(content) => content,
                PageFetch::Failed => continue,
                PageFetch::Cancelled => {
                    state.transition(SiteState::Done)?;
                    report.outcome = SiteOutcome::Cancelled;
                    return Ok(report);
                }
            };
            report.pages_fetched += 1;

            let emails = self.extractor.extract(&content);
            if emails.is_empty() {
                continue;
            }

            tracing::debug!(
                "Found {} emails on {} (matched '{}')",
                emails.len(),
                page.url,
                page.matched_keyword
            );
            state = state.transition(SiteState::EmailsFound)?;
            self.record_discovery(&website, emails, &mut report).await?;
            state.transition(SiteState::Done)?;
            report.outcome = SiteOutcome::EmailsFoundRelevant;
            return Ok(report);
        }

        if self.track_even_when_empty {
            commit_with_retry(&self.storage, |s| s.commit_website(&website)).await?;
        }
        state.transition(SiteState::Done)?;
        Ok(report)
    }

    /// Resolves the site's link, pausing first if navigation is needed
    ///
    /// Returns `None` if the run was cancelled.
    async fn resolve(&self, site: &SiteRecord, cancel: &CancellationToken) -> Option<Resolution> {
        let identity = self.identities.next();
        if site.resolved {
            return Some(self.resolver.resolve(&site.homepage_url, identity).await);
        }

        if !self.politeness.pause(cancel).await {
            return None;
        }

        tokio::select! {
            _ = cancel.cancelled() => None,
            resolution = self.resolver.resolve(&site.homepage_url, identity) => Some(resolution),
        }
    }

    /// Fetches a page after a politeness pause, racing cancellation
    async fn fetch_page(&self, url: &str, cancel: &CancellationToken) -> PageFetch {
        if !self.politeness.pause(cancel).await {
            return PageFetch::Cancelled;
        }

        let identity = self.identities.next();
        let fetch = fetch_with_timeout(self.fetcher.as_ref(), url, identity, self.request_timeout);
        let result = tokio::select! {
            _ = cancel.cancelled() => return PageFetch::Cancelled,
            result = fetch => result,
        };

        match result {
            Ok(content) => {
                tracing::trace!("Fetched {} ({} bytes)", url, content.len());
                PageFetch::Content(content)
            }
            Err(e) => {
                tracing::warn!("Treating {} as empty: {}", url, e);
                PageFetch::Failed
            }
        }
    }

    /// Commits emails, then the website that produced them
    async fn record_discovery(
        &self,
        website: &str,
        emails: BTreeSet<String>,
        report: &mut SiteReport,
    ) -> crate::Result<()> {
        report.new_emails = commit_with_retry(&self.storage, |s| s.commit_emails(&emails)).await?;
        commit_with_retry(&self.storage, |s| s.commit_website(website)).await?;
        report.emails = emails;
        Ok(())
    }
}
