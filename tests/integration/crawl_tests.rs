//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! harvest cycle end-to-end: config file, listings file, HTTP fetching,
//! redirect resolution and the tracked-set files on disk.

use std::path::{Path, PathBuf};
use sumi_harvest::config::load_config;
use sumi_harvest::crawler::run_harvest;
use sumi_harvest::output::CrawlStatistics;
use sumi_harvest::SiteOutcome;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scratch directory holding config, listings and tracked-set files
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes listings as JSON lines; `None` means no website
    fn write_listings(&self, listings: &[(&str, Option<String>)]) {
        let lines: Vec<String> = listings
            .iter()
            .map(|(name, website)| match website {
                Some(website) => format!(r#"{{"name": "{}", "website": "{}"}}"#, name, website),
                None => format!(r#"{{"name": "{}"}}"#, name),
            })
            .collect();
        std::fs::write(self.file("listings.jsonl"), lines.join("\n"))
            .expect("Failed to write listings");
    }

    /// Writes a config file and returns its path
    fn write_config(&self, extra_crawler: &str, filters: &str) -> PathBuf {
        let config = format!(
            r#"
[crawler]
max-concurrent-sites = 2
min-delay = 0
max-delay = 0
request-timeout = 5
redirect-timeout = 5
{extra_crawler}

[user-agent]
pool = ["HarvestTest/1.0", "HarvestTest/2.0"]

[filters]
{filters}

[output]
websites-path = "{websites}"
emails-path = "{emails}"

[listings]
path = "{listings}"
batch-size = 2
"#,
            extra_crawler = extra_crawler,
            filters = filters,
            websites = self.file("tracked_websites.txt").display(),
            emails = self.file("tracked_emails.txt").display(),
            listings = self.file("listings.jsonl").display(),
        );
        let path = self.file("harvest.toml");
        std::fs::write(&path, config).expect("Failed to write config");
        path
    }

    fn tracked(&self, name: &str) -> Vec<String> {
        read_lines(&self.file(name))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn harvest(config_path: &Path) -> CrawlStatistics {
    let config = load_config(config_path).expect("Failed to load config");
    run_harvest(config, CancellationToken::new())
        .await
        .expect("Harvest failed")
}

#[tokio::test]
async fn test_harvest_homepage_emails() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/cafe/"))
        .respond_with(html(
            r#"<p>Schreiben Sie uns: <a href="mailto:info@cafe-mitte.de">info@cafe-mitte.de</a></p>
               <img src="/img/logo@2x.png">"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[
        ("Café Mitte", Some(format!("{}/cafe/?utm_source=maps", base_url))),
        ("Kiosk ohne Website", None),
    ]);
    let stats = harvest(&ws.write_config("", "")).await;

    assert_eq!(stats.listings_seen, 2);
    assert_eq!(stats.without_website, 1);
    assert_eq!(stats.count(SiteOutcome::EmailsFoundHomepage), 1);
    assert_eq!(ws.tracked("tracked_emails.txt"), vec!["info@cafe-mitte.de"]);
    assert_eq!(
        ws.tracked("tracked_websites.txt"),
        vec![format!("{}/cafe/", base_url)]
    );
}

#[tokio::test]
async fn test_relevant_page_early_stop() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/laden/"))
        .respond_with(html(
            r#"<a href="/laden/about">About us</a>
               <a href="/laden/kontakt">Kontakt</a>
               <a href="/laden/shop">Shop</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/laden/about"))
        .respond_with(html("Team: hallo@laden.de"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Sorted after /about, never reached
    Mock::given(method("GET"))
        .and(path("/laden/kontakt"))
        .respond_with(html("kontakt@laden.de"))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/laden/shop"))
        .respond_with(html("shop@laden.de"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[("Laden", Some(format!("{}/laden/", base_url)))]);
    let stats = harvest(&ws.write_config("", "")).await;

    assert_eq!(stats.count(SiteOutcome::EmailsFoundRelevant), 1);
    assert_eq!(ws.tracked("tracked_emails.txt"), vec!["hallo@laden.de"]);
}

#[tokio::test]
async fn test_tracking_redirect_resolved() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/aclk"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/baeckerei/?gclid=abc", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/baeckerei/"))
        .respond_with(html("bestellung@baeckerei-schmidt.de"))
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[(
        "Bäckerei Schmidt",
        Some(format!("{}/aclk?sa=l&ai=xyz", base_url)),
    )]);
    let stats = harvest(&ws.write_config("", r#"redirect-patterns = ["/aclk"]"#)).await;

    assert_eq!(stats.count(SiteOutcome::EmailsFoundHomepage), 1);
    assert_eq!(
        ws.tracked("tracked_websites.txt"),
        vec![format!("{}/baeckerei/", base_url)]
    );
}

#[tokio::test]
async fn test_unresolvable_redirect_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The redirect service never lets go
    Mock::given(method("GET"))
        .and(path("/aclk"))
        .respond_with(html("Weiterleitung..."))
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[("Anzeige", Some(format!("{}/aclk?sa=l", base_url)))]);
    let stats = harvest(&ws.write_config("", r#"redirect-patterns = ["/aclk"]"#)).await;

    assert_eq!(stats.count(SiteOutcome::SkippedUnresolved), 1);
    assert!(ws.tracked("tracked_websites.txt").is_empty());
}

#[tokio::test]
async fn test_dedup_across_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/zahnarzt/"))
        .respond_with(html("praxis@zahnarzt-mitte.de"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[("Zahnarzt", Some(format!("{}/zahnarzt/", base_url)))]);
    let config_path = ws.write_config("", "");

    let first = harvest(&config_path).await;
    assert_eq!(first.count(SiteOutcome::EmailsFoundHomepage), 1);
    let websites_after_first = std::fs::read(ws.file("tracked_websites.txt")).unwrap();

    let second = harvest(&config_path).await;
    assert_eq!(second.count(SiteOutcome::SkippedDuplicate), 1);
    assert_eq!(second.new_emails, 0);
    assert_eq!(second.pages_fetched, 0);

    // Unchanged sets are rewritten byte-identically
    let websites_after_second = std::fs::read(ws.file("tracked_websites.txt")).unwrap();
    assert_eq!(websites_after_first, websites_after_second);
}

#[tokio::test]
async fn test_failing_sites_yield_no_emails() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/kaputt/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bild/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("info@bild-studio.de", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[
        ("Kaputt", Some(format!("{}/kaputt/", base_url))),
        ("Bild", Some(format!("{}/bild/", base_url))),
    ]);
    let stats = harvest(&ws.write_config("", "")).await;

    assert_eq!(stats.count(SiteOutcome::NoEmails), 2);
    assert!(ws.tracked("tracked_emails.txt").is_empty());
    assert!(ws.tracked("tracked_websites.txt").is_empty());
}

#[tokio::test]
async fn test_empty_sites_tracked_when_configured() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/leer/"))
        .respond_with(html("<h1>Willkommen</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ws = Workspace::new();
    ws.write_listings(&[("Leer", Some(format!("{}/leer/", base_url)))]);
    let config_path = ws.write_config("track-even-when-empty = true", "");

    let first = harvest(&config_path).await;
    assert_eq!(first.count(SiteOutcome::NoEmails), 1);
    assert_eq!(
        ws.tracked("tracked_websites.txt"),
        vec![format!("{}/leer/", base_url)]
    );

    // Not revisited on the next run
    let second = harvest(&config_path).await;
    assert_eq!(second.count(SiteOutcome::SkippedDuplicate), 1);
}
