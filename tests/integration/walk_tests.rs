//! Integration tests for listing walks
//!
//! These tests use wiremock to serve paginated listing pages and run
//! full walks end-to-end into a scratch output directory.

use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vlr_harvest::config::{
    Config, ListingKind, ListingSource, OutputConfig, RankingsConfig, ScraperConfig,
    UserAgentConfig,
};
use vlr_harvest::crawler::{run_batch, Completion, WalkBudget, Walker};
use vlr_harvest::{CancelReason, ScrapeError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, out_dir: &Path, listings: Vec<ListingSource>) -> Config {
    Config {
        scraper: ScraperConfig {
            base_url: base_url.to_string(),
            requests_per_second: 50,
            burst: 50,
            walk_timeout_secs: 30,
            request_timeout_secs: 5,
            rate_limit_detail_fetches: true,
            https_only: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: out_dir.to_string_lossy().into_owned(),
            timestamp_suffix: false,
        },
        listings,
        rankings: RankingsConfig::default(),
    }
}

fn listing(name: &str, section: &str, kind: ListingKind) -> ListingSource {
    ListingSource {
        name: name.to_string(),
        section: section.to_string(),
        query: String::new(),
        kind,
    }
}

fn thread_item(id: u64) -> String {
    format!(
        r#"<div class="wf-module-item thread mod-color">
            <div class="frag-container" data-thread-id="{id}"><span class="frag-count">{id}</span></div>
            <a class="thread-item-header-title" href="/{id}/thread-{id}">Thread {id}</a>
            <span class="date-full">June 3, 2024 at 9:00 AM</span>
            <span class="date-eta">2h ago</span>
            <span class="post-count">4 posts</span>
        </div>"#
    )
}

fn pagination(last_page: u32) -> String {
    if last_page <= 1 {
        return String::new();
    }
    let links: String = (2..=last_page)
        .map(|n| format!(r#"<a class="btn mod-page" href="?page={n}">{n}</a>"#))
        .collect();
    format!(r#"<div class="action-container-pages"><span class="btn mod-page">1</span>{links}</div>"#)
}

/// Page `page` of a thread listing: page 1 has ids 1-5; every later page
/// repeats the 3 pinned threads followed by 2 new ones
fn threads_page(page: u32, last_page: u32) -> String {
    let ids: Vec<u64> = if page == 1 {
        (1..=5).collect()
    } else {
        let first_new = u64::from(5 + (page - 2) * 2 + 1);
        vec![1, 2, 3, first_new, first_new + 1]
    };
    let items: String = ids.into_iter().map(thread_item).collect();
    format!(
        "<html><body><div class=\"wf-card\">{}</div>{}</body></html>",
        items,
        pagination(last_page)
    )
}

/// Mounts `pages` under `route`; the page-less seed request gets page 1
async fn mount_listing(server: &MockServer, route: &str, pages: &[String]) {
    for (index, body) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("page", (index + 1).to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(server)
            .await;
    }
    // Registered last, so page-specific mocks take precedence
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(pages[0].clone()))
        .mount(server)
        .await;
}

fn read_artifact(path: &Path) -> Vec<Value> {
    let bytes = std::fs::read(path).expect("artifact should exist");
    serde_json::from_slice(&bytes).expect("artifact should be a JSON array")
}

fn ids(records: &[Value]) -> Vec<u64> {
    records.iter().map(|r| r["id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn test_thread_record_count_follows_page_count() {
    for last_page in [1u32, 2, 5] {
        let server = MockServer::start().await;
        let pages: Vec<String> = (1..=last_page).map(|p| threads_page(p, last_page)).collect();
        mount_listing(&server, "/threads", &pages).await;

        let out = TempDir::new().unwrap();
        let threads = listing("outputThreads", "threads", ListingKind::Threads);
        let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
        let walker = Walker::new(&config).unwrap();
        let budget = WalkBudget::from_config(&config.scraper, CancellationToken::new());

        let outcome = walker.walk(&threads, &budget).await.unwrap();

        let expected = 5 + 2 * (last_page as usize - 1);
        assert_eq!(outcome.last_page, last_page);
        assert_eq!(outcome.pages_walked, last_page);
        assert_eq!(outcome.records, expected);
        assert_eq!(outcome.completion, Completion::Complete);
        assert_eq!(read_artifact(&outcome.artifact).len(), expected);
    }
}

#[tokio::test]
async fn test_two_page_threads_keep_page_one_first() {
    let server = MockServer::start().await;
    mount_listing(&server, "/threads", &[threads_page(1, 2), threads_page(2, 2)]).await;

    let out = TempDir::new().unwrap();
    let threads = listing("outputThreads", "threads", ListingKind::Threads);
    let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
    let walker = Walker::new(&config).unwrap();
    let budget = WalkBudget::from_config(&config.scraper, CancellationToken::new());

    let outcome = walker.walk(&threads, &budget).await.unwrap();
    assert_eq!(outcome.artifact, out.path().join("outputThreads.json"));
    assert!(outcome.is_complete());

    let records = read_artifact(&outcome.artifact);
    assert_eq!(ids(&records), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(records[0]["title"], "Thread 1");
    assert_eq!(
        records[0]["url"],
        format!("{}/1/thread-1", server.uri()).as_str()
    );
    assert_eq!(records[0]["comment_count"], 4);

    // Four-space indentation
    let text = std::fs::read_to_string(&outcome.artifact).unwrap();
    assert!(text.starts_with("[\n    {\n        \"id\": 1,"));
}

#[tokio::test]
async fn test_matches_are_completed_from_detail_pages() {
    let server = MockServer::start().await;

    let item = |id: u64, team1: &str, team2: &str| {
        format!(
            r#"<a href="/{id}/match-{id}" class="wf-module-item match-item">
                <div class="match-item-time">5:00 PM</div>
                <div class="match-item-vs">
                    <div class="match-item-vs-team">{team1} <div class="score">13</div></div>
                    <div class="match-item-vs-team">{team2} <div class="score">9</div></div>
                </div>
                <div class="match-item-eta"><div class="ml-eta"></div></div>
                <div class="match-item-event-series">Group Stage–Opening</div>
            </a>"#
        )
    };
    let page = format!(
        "<html><body>{}{}</body></html>",
        item(501, "Fnatic", "Sentinels"),
        item(502, "Team Liquid", "100 Thieves")
    );
    mount_listing(&server, "/matches", &[page]).await;

    for id in [501u64, 502] {
        Mock::given(method("GET"))
            .and(path(format!("/{id}/match-{id}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><body><div class="match-header-date">
                    <div class="moment-tz-convert">Monday, June {id}</div>
                    <div class="moment-tz-convert">5:00 PM CEST</div>
                </div></body></html>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let out = TempDir::new().unwrap();
    let matches = listing("outputMatches", "matches", ListingKind::Matches);
    let config = create_test_config(&server.uri(), out.path(), vec![matches.clone()]);
    let walker = Walker::new(&config).unwrap();
    let budget = WalkBudget::from_config(&config.scraper, CancellationToken::new());

    let outcome = walker.walk(&matches, &budget).await.unwrap();
    let records = read_artifact(&outcome.artifact);

    assert_eq!(outcome.records, 2);
    assert_eq!(records[0]["team1"], "Fnatic");
    assert_eq!(records[0]["team2"], "Sentinels");
    assert_eq!(records[0]["date"], "Monday, June 501 5:00 PM CEST");
    assert_eq!(records[0]["time_until_match"], "Live");
    assert_eq!(records[0]["tournament"], "Group Stage Opening");
    assert_eq!(records[1]["team2"], "100 Thieves");
    assert_eq!(records[1]["date"], "Monday, June 502 5:00 PM CEST");
}

fn match_item(id: u64) -> String {
    format!(
        r#"<a href="/{id}/match-{id}" class="wf-module-item match-item">
            <div class="match-item-time">5:00 PM</div>
            <div class="match-item-vs-team">Team {id}A</div>
            <div class="match-item-vs-team">Team {id}B</div>
            <div class="ml-eta">1h</div>
            <div class="match-item-event-series">Swiss Stage</div>
        </a>"#
    )
}

/// Serves one page of matches `ids` plus a detail page for each
async fn mount_matches(server: &MockServer, ids: &[u64]) {
    let items: String = ids.iter().copied().map(match_item).collect();
    mount_listing(server, "/matches", &[format!("<html><body>{}</body></html>", items)]).await;

    for id in ids {
        Mock::given(method("GET"))
            .and(path(format!("/{id}/match-{id}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div class="moment-tz-convert">Friday, June 7</div></body></html>"#,
            ))
            .mount(server)
            .await;
    }
}

/// Times a 4-match walk at 2 req/s with no burst headroom
async fn timed_match_walk(rate_limit_details: bool) -> (Duration, usize) {
    let server = MockServer::start().await;
    mount_matches(&server, &[11, 12, 13, 14]).await;

    let out = TempDir::new().unwrap();
    let matches = listing("outputMatches", "matches", ListingKind::Matches);
    let mut config = create_test_config(&server.uri(), out.path(), vec![matches.clone()]);
    config.scraper.rate_limit_detail_fetches = rate_limit_details;
    let walker = Walker::new(&config).unwrap();
    let budget = WalkBudget::new(2, 1, Duration::from_secs(30), CancellationToken::new());

    let start = std::time::Instant::now();
    let outcome = walker.walk(&matches, &budget).await.unwrap();
    let elapsed = start.elapsed();

    let records = read_artifact(&outcome.artifact);
    assert!(records.iter().all(|r| r["date"] == "Friday, June 7"));
    (elapsed, outcome.records)
}

#[tokio::test]
async fn test_rate_limited_detail_fetches_take_permits() {
    // seed, page 1 and 4 detail pages: 5 waits of 0.5s after the first permit
    let (elapsed, records) = timed_match_walk(true).await;
    assert_eq!(records, 4);
    assert!(elapsed >= Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_unlimited_detail_fetches_skip_the_bucket() {
    // only the seed and page 1 draw permits: one 0.5s wait
    let (elapsed, records) = timed_match_walk(false).await;
    assert_eq!(records, 4);
    assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_deadline_flushes_completed_pages() {
    let server = MockServer::start().await;
    let last_page = 40;
    let pages: Vec<String> = (1..=last_page).map(|p| threads_page(p, last_page)).collect();
    mount_listing(&server, "/threads", &pages).await;

    let out = TempDir::new().unwrap();
    let threads = listing("outputThreads", "threads", ListingKind::Threads);
    let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
    let walker = Walker::new(&config).unwrap();

    // Seed plus pages 1-2 come from the burst; page 3 at 0.5s, page 4 at 1.0s
    let budget = WalkBudget::new(2, 3, Duration::from_millis(1200), CancellationToken::new());

    let outcome = walker.walk(&threads, &budget).await.unwrap();

    assert_eq!(outcome.last_page, last_page);
    assert_eq!(
        outcome.completion,
        Completion::Partial(CancelReason::Deadline)
    );
    assert!(
        (2..=4).contains(&outcome.pages_walked),
        "walked {} pages",
        outcome.pages_walked
    );

    let expected = 5 + 2 * (outcome.pages_walked as usize - 1);
    assert_eq!(outcome.records, expected);
    assert_eq!(read_artifact(&outcome.artifact).len(), expected);
}

#[tokio::test]
async fn test_cancellation_before_first_page_writes_empty_artifact() {
    let server = MockServer::start().await;
    mount_listing(&server, "/threads", &[threads_page(1, 1)]).await;

    let out = TempDir::new().unwrap();
    let threads = listing("outputThreads", "threads", ListingKind::Threads);
    let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
    let walker = Walker::new(&config).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let budget = WalkBudget::from_config(&config.scraper, cancel);

    let outcome = walker.walk(&threads, &budget).await.unwrap();
    assert_eq!(outcome.completion, Completion::Partial(CancelReason::Signal));
    assert_eq!(outcome.pages_walked, 0);
    assert!(read_artifact(&outcome.artifact).is_empty());
}

#[tokio::test]
async fn test_server_error_fails_walk_without_artifact() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/threads"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(&server, "/threads", &[threads_page(1, 3)]).await;

    let out = TempDir::new().unwrap();
    let threads = listing("outputThreads", "threads", ListingKind::Threads);
    let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
    let walker = Walker::new(&config).unwrap();
    let budget = WalkBudget::from_config(&config.scraper, CancellationToken::new());

    let err = walker.walk(&threads, &budget).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Status { status: 500, .. }));
    assert!(!out.path().join("outputThreads.json").exists());
}

#[tokio::test]
async fn test_malformed_page_fails_walk() {
    let server = MockServer::start().await;
    let broken = r#"<html><body><div class="wf-module-item thread">
        <div class="frag-container" data-thread-id="abc"><span class="frag-count">1</span></div>
    </div></body></html>"#
        .to_string();
    mount_listing(&server, "/threads", &[broken]).await;

    let out = TempDir::new().unwrap();
    let threads = listing("outputThreads", "threads", ListingKind::Threads);
    let config = create_test_config(&server.uri(), out.path(), vec![threads.clone()]);
    let walker = Walker::new(&config).unwrap();
    let budget = WalkBudget::from_config(&config.scraper, CancellationToken::new());

    let err = walker.walk(&threads, &budget).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Extract { .. }));
    assert!(!out.path().join("outputThreads.json").exists());
}

fn rank_item(team: &str, elo: u32) -> String {
    let slug = team.to_lowercase().replace(' ', "-");
    format!(
        r#"<div class="rank-item wf-card">
            <a href="/team/{slug}" class="rank-item-team" data-sort-value="{team}">{team}</a>
            <div class="rank-item-rating" data-sort-value="{elo}">{elo}</div>
        </div>"#
    )
}

#[tokio::test]
async fn test_rankings_fan_out_writes_one_artifact_per_region() {
    let server = MockServer::start().await;

    let root = r#"<html><body><div class="wf-nav">
        <a class="wf-nav-item mod-collapsible" href="/rankings"><span class="normal">World</span></a>
        <a class="wf-nav-item mod-collapsible" href="/rankings/europe"><span class="normal"> Europe </span></a>
        <a class="wf-nav-item mod-collapsible" href="/rankings/north-america"><span class="normal">North America</span></a>
    </div></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/rankings"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(&server)
        .await;

    let regions = [
        ("Europe", vec![("Team Heretics", 1850), ("Fnatic", 1800)]),
        ("North-America", vec![("Sentinels", 1790)]),
    ];
    for (slug, teams) in &regions {
        let items: String = teams.iter().map(|(team, elo)| rank_item(team, *elo)).collect();
        Mock::given(method("GET"))
            .and(path(format!("/rankings/{}", slug).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html><body>{}</body></html>", items)),
            )
            .mount(&server)
            .await;
    }

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), out.path(), vec![]);
    config.rankings.enabled = true;

    let report = run_batch(&config, &[], CancellationToken::new()).await.unwrap();
    assert!(report.is_success());

    let rankings = report.rankings.unwrap().unwrap();
    assert_eq!(rankings.discovered, 2);
    assert_eq!(rankings.completion, Completion::Complete);
    assert_eq!(rankings.total_records(), 3);

    let europe = read_artifact(&out.path().join("ranking/outputEuropeRankings.json"));
    assert_eq!(europe.len(), 2);
    assert_eq!(europe[0]["rank"], 1);
    assert_eq!(europe[0]["team_name"], "Team Heretics");
    assert_eq!(europe[1]["rank"], 2);
    assert_eq!(europe[1]["elo"], 1800);

    let na = read_artifact(&out.path().join("ranking/outputNorth-AmericaRankings.json"));
    assert_eq!(na[0]["region"], "North America");
    assert_eq!(
        na[0]["team_url"],
        format!("{}/team/sentinels", server.uri()).as_str()
    );
}

#[tokio::test]
async fn test_batch_continues_after_failed_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_listing(&server, "/threads", &[threads_page(1, 1)]).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(
        &server.uri(),
        out.path(),
        vec![
            listing("outputBroken", "broken", ListingKind::Threads),
            listing("outputThreads", "threads", ListingKind::Threads),
        ],
    );

    let report = run_batch(&config, &[], CancellationToken::new()).await.unwrap();

    assert_eq!(report.listings.len(), 2);
    assert!(report.listings[0].1.is_err());
    assert_eq!(report.listings[1].1.as_ref().unwrap().records, 5);
    assert!(!report.is_success());
    assert_eq!(report.failures(), 1);
    assert!(!out.path().join("outputBroken.json").exists());
    assert!(out.path().join("outputThreads.json").exists());
}

#[tokio::test]
async fn test_only_filter_selects_listings() {
    let server = MockServer::start().await;
    mount_listing(&server, "/threads", &[threads_page(1, 1)]).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(
        &server.uri(),
        out.path(),
        vec![
            listing("outputThreads", "threads", ListingKind::Threads),
            listing("outputMatches", "matches", ListingKind::Matches),
        ],
    );

    let only = vec!["outputThreads".to_string()];
    let report = run_batch(&config, &only, CancellationToken::new()).await.unwrap();

    assert_eq!(report.listings.len(), 1);
    assert_eq!(report.listings[0].0, "outputThreads");
    assert!(report.is_success());
}

#[tokio::test]
async fn test_cancelled_batch_starts_no_walk() {
    let server = MockServer::start().await;
    mount_listing(&server, "/threads", &[threads_page(1, 1)]).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(
        &server.uri(),
        out.path(),
        vec![listing("outputThreads", "threads", ListingKind::Threads)],
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_batch(&config, &[], cancel).await.unwrap();

    assert!(report.interrupted);
    assert!(report.listings.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
