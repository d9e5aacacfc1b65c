//! Integration tests for the crawler
//!
//! Most tests drive the crawler with an in-memory link graph whose downloader
//! records how many downloads run concurrently against each host. The last
//! tests use wiremock to crawl a real HTTP server end-to-end.

use async_trait::async_trait;
use ripple_crawler::config::UserAgentConfig;
use ripple_crawler::crawler::{CrawlResult, Crawler, Document, Downloader, HttpDownloader};
use ripple_crawler::url::host_of;
use ripple_crawler::CrawlError;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakePage {
    links: Vec<String>,
}

impl Document for FakePage {
    fn extract_links(&self) -> io::Result<Vec<String>> {
        Ok(self.links.clone())
    }
}

#[derive(Default)]
struct Activity {
    running: HashMap<String, usize>,
    peak: HashMap<String, usize>,
    calls: HashMap<String, usize>,
}

/// Downloader over a fixed link graph that tracks per-host concurrency
struct FakeDownloader {
    graph: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    latency: Duration,
    activity: Mutex<Activity>,
}

impl FakeDownloader {
    fn new(edges: &[(&str, Vec<&str>)]) -> Self {
        Self {
            graph: edges
                .iter()
                .map(|(from, to)| (from.to_string(), to.iter().map(|s| s.to_string()).collect()))
                .collect(),
            failing: HashSet::new(),
            latency: Duration::from_millis(5),
            activity: Mutex::new(Activity::default()),
        }
    }

    fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn peak(&self, host: &str) -> usize {
        let activity = self.activity.lock().unwrap();
        activity.peak.get(host).copied().unwrap_or(0)
    }

    fn calls(&self, url: &str) -> usize {
        let activity = self.activity.lock().unwrap();
        activity.calls.get(url).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.activity.lock().unwrap().calls.values().sum()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str) -> io::Result<Arc<dyn Document>> {
        let host = host_of(url)?;
        {
            let mut activity = self.activity.lock().unwrap();
            *activity.calls.entry(url.to_string()).or_insert(0) += 1;
            let running = activity.running.entry(host.clone()).or_insert(0);
            *running += 1;
            let now = *running;
            let peak = activity.peak.entry(host.clone()).or_insert(0);
            *peak = (*peak).max(now);
        }

        tokio::time::sleep(self.latency).await;

        {
            let mut activity = self.activity.lock().unwrap();
            if let Some(running) = activity.running.get_mut(&host) {
                *running -= 1;
            }
        }

        if self.failing.contains(url) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("connection refused: {}", url),
            ));
        }

        Ok(Arc::new(FakePage {
            links: self.graph.get(url).cloned().unwrap_or_default(),
        }))
    }
}

fn sorted(urls: &[String]) -> Vec<String> {
    let mut urls = urls.to_vec();
    urls.sort();
    urls
}

async fn crawl(
    downloader: &Arc<FakeDownloader>,
    downloaders: usize,
    per_host: usize,
    seed: &str,
    depth: u32,
) -> CrawlResult {
    let crawler = Crawler::new(downloader.clone(), downloaders, 2, per_host).unwrap();
    let result = crawler.download(seed, depth).await.unwrap();
    crawler.close().await;
    result
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_seed_without_links() {
    let downloader = Arc::new(FakeDownloader::new(&[]));

    let result = crawl(&downloader, 2, 1, "http://a.com/", 1).await;

    assert_eq!(result.downloaded, vec!["http://a.com/"]);
    assert!(result.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_host_respects_per_host_limit() {
    let downloader = Arc::new(
        FakeDownloader::new(&[(
            "http://a.com/",
            vec!["http://a.com/1", "http://a.com/2", "http://a.com/3"],
        )])
        .with_latency(Duration::from_millis(20)),
    );

    let result = crawl(&downloader, 3, 1, "http://a.com/", 2).await;

    assert_eq!(
        sorted(&result.downloaded),
        vec!["http://a.com/", "http://a.com/1", "http://a.com/2", "http://a.com/3"]
    );
    assert!(result.errors.is_empty());
    assert_eq!(downloader.peak("a.com"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_host_limit_across_many_hosts() {
    let mut links = Vec::new();
    for host in ["a.com", "b.com", "c.com"] {
        for i in 0..8 {
            links.push(format!("http://{}/{}", host, i));
        }
    }
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let downloader = Arc::new(
        FakeDownloader::new(&[("http://seed.com/", link_refs)])
            .with_latency(Duration::from_millis(15)),
    );

    let result = crawl(&downloader, 16, 2, "http://seed.com/", 2).await;

    assert_eq!(result.downloaded.len(), 25);
    for host in ["a.com", "b.com", "c.com"] {
        assert!(downloader.peak(host) <= 2, "{} exceeded per-host limit", host);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_one_never_follows_links() {
    let downloader = Arc::new(FakeDownloader::new(&[("http://a.com/", vec!["http://b.com/"])]));

    let result = crawl(&downloader, 2, 1, "http://a.com/", 1).await;

    assert_eq!(result.downloaded, vec!["http://a.com/"]);
    assert_eq!(downloader.calls("http://b.com/"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_cutoff_downloads_but_does_not_extract() {
    let downloader = Arc::new(FakeDownloader::new(&[
        ("http://a.com/", vec!["http://b.com/"]),
        ("http://b.com/", vec!["http://c.com/"]),
        ("http://c.com/", vec!["http://d.com/"]),
    ]));

    let result = crawl(&downloader, 2, 1, "http://a.com/", 3).await;

    assert_eq!(
        result.downloaded,
        vec!["http://a.com/", "http://b.com/", "http://c.com/"]
    );
    assert_eq!(downloader.calls("http://d.com/"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_download_is_isolated() {
    let downloader = Arc::new(
        FakeDownloader::new(&[("http://a.com/", vec!["http://a.com/b", "http://a.com/c"])])
            .failing_on("http://a.com/b"),
    );

    let result = crawl(&downloader, 2, 2, "http://a.com/", 2).await;

    assert_eq!(
        sorted(&result.downloaded),
        vec!["http://a.com/", "http://a.com/c"]
    );
    assert_eq!(result.errors.len(), 1);
    let err = result.errors.get("http://a.com/b").unwrap();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_do_not_leak_host_slots() {
    // Every child fails; with one slot per host the crawl only finishes if each
    // failure hands its slot on.
    let mut downloader = FakeDownloader::new(&[(
        "http://a.com/",
        vec!["http://a.com/1", "http://a.com/2", "http://a.com/3", "http://a.com/4"],
    )]);
    for i in 1..=4 {
        downloader = downloader.failing_on(&format!("http://a.com/{}", i));
    }
    let downloader = Arc::new(downloader);

    let result = crawl(&downloader, 4, 1, "http://a.com/", 2).await;

    assert_eq!(result.downloaded, vec!["http://a.com/"]);
    assert_eq!(result.errors.len(), 4);
    assert_eq!(downloader.peak("a.com"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycle_is_visited_once() {
    let downloader = Arc::new(FakeDownloader::new(&[
        ("http://a.com/", vec!["http://b.com/"]),
        ("http://b.com/", vec!["http://a.com/"]),
    ]));

    let result = crawl(&downloader, 2, 1, "http://a.com/", 10).await;

    assert_eq!(
        sorted(&result.downloaded),
        vec!["http://a.com/", "http://b.com/"]
    );
    assert_eq!(downloader.calls("http://a.com/"), 1);
    assert_eq!(downloader.calls("http://b.com/"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_diamond_is_downloaded_once_and_complete() {
    // Both branches discover the same page
    let downloader = Arc::new(FakeDownloader::new(&[
        ("http://a.com/", vec!["http://b.com/", "http://c.com/", "http://b.com/"]),
        ("http://b.com/", vec!["http://d.com/", "http://a.com/"]),
        ("http://c.com/", vec!["http://d.com/", "not a url"]),
        ("http://d.com/", vec!["http://e.com/"]),
    ]));

    let result = crawl(&downloader, 4, 1, "http://a.com/", 4).await;

    // a, b, c, d, e plus the malformed link
    assert_eq!(result.attempted(), 6);
    assert_eq!(result.downloaded.len(), 5);
    assert!(result.errors.contains_key("not a url"));
    assert_eq!(downloader.calls("http://d.com/"), 1);
    assert_eq!(downloader.total_calls(), 5);

    let downloaded: HashSet<_> = result.downloaded.iter().collect();
    assert_eq!(downloaded.len(), result.downloaded.len());
    assert!(result.downloaded.iter().all(|u| !result.errors.contains_key(u)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_on_one_crawler_are_independent() {
    let downloader = Arc::new(
        FakeDownloader::new(&[
            ("http://a.com/", vec!["http://a.com/1", "http://a.com/2"]),
            ("http://b.com/", vec!["http://b.com/1"]),
        ])
        .with_latency(Duration::from_millis(10)),
    );
    let crawler = Crawler::new(downloader.clone(), 4, 2, 1).unwrap();

    let (first, second, again) = tokio::join!(
        crawler.download("http://a.com/", 2),
        crawler.download("http://b.com/", 2),
        crawler.download("http://a.com/", 2),
    );

    assert_eq!(first.unwrap().downloaded.len(), 3);
    assert_eq!(second.unwrap().downloaded.len(), 2);
    // Visited sets are per call, so the repeated crawl downloads everything again
    assert_eq!(again.unwrap().downloaded.len(), 3);
    assert_eq!(downloader.calls("http://a.com/1"), 2);

    crawler.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_crawl_leaves_crawler_usable() {
    let mut links = Vec::new();
    for i in 0..20 {
        links.push(format!("http://slow.com/{}", i));
    }
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let downloader = Arc::new(
        FakeDownloader::new(&[("http://slow.com/", link_refs)])
            .with_latency(Duration::from_millis(50)),
    );
    let crawler = Crawler::new(downloader.clone(), 2, 1, 1).unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(80), crawler.download("http://slow.com/", 2))
            .await;
    assert!(abandoned.is_err());

    // Let aborted and in-flight tasks settle
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(downloader.total_calls() < 21);

    let result = crawler.download("http://other.com/", 1).await.unwrap();
    assert_eq!(result.downloaded, vec!["http://other.com/"]);

    crawler.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_during_crawl_yields_no_result() {
    let mut links = Vec::new();
    for i in 0..10 {
        links.push(format!("http://a.com/{}", i));
    }
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let downloader = Arc::new(
        FakeDownloader::new(&[("http://a.com/", link_refs)])
            .with_latency(Duration::from_millis(30)),
    );
    let crawler = Arc::new(Crawler::new(downloader, 1, 1, 1).unwrap());

    let running = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.download("http://a.com/", 2).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    crawler.close().await;

    let result = running.await.unwrap();
    assert!(matches!(result, Err(CrawlError::PoolClosed)));
}

#[tokio::test]
async fn test_http_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    format!(
                        r#"<html><head><title>Home</title></head><body>
                        <a href="{}/page1">Page 1</a>
                        <a href="/page2">Page 2</a>
                        <a href="/missing">Missing</a>
                        </body></html>"#,
                        base_url
                    ),
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><body><a href="/deep">Deep</a></body></html>"#,
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><body><a href="/">Home</a></body></html>"#,
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let downloader = HttpDownloader::new(&UserAgentConfig::default()).unwrap();
    let crawler = Crawler::new(Arc::new(downloader), 4, 2, 2).unwrap();

    let result = crawler
        .download(&format!("{}/", base_url), 2)
        .await
        .expect("crawl should complete");
    crawler.close().await;

    assert_eq!(
        sorted(&result.downloaded),
        sorted(&[
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ])
    );
    let missing = result
        .errors
        .get(&format!("{}/missing", base_url))
        .expect("404 should be recorded");
    assert_eq!(missing.kind(), io::ErrorKind::NotFound);

    // /deep is at depth 3, beyond the limit
    assert!(!result.downloaded.iter().any(|u| u.ends_with("/deep")));
}

#[tokio::test]
async fn test_http_non_html_has_no_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"href": "/elsewhere"}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let downloader = HttpDownloader::new(&UserAgentConfig::default()).unwrap();
    let crawler = Crawler::new(Arc::new(downloader), 1, 1, 1).unwrap();

    let result = crawler
        .download(&format!("{}/data.json", base_url), 3)
        .await
        .unwrap();
    crawler.close().await;

    assert_eq!(result.downloaded, vec![format!("{}/data.json", base_url)]);
    assert!(result.errors.is_empty());
}
