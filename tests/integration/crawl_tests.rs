//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end. The mock server doubles as the
//! configured proxy, so every request travels the proxied path.

use gitfan::config::{parse_config, Config};
use gitfan::crawler::{crawl, Coordinator, ROOT_JOB_ID};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing both the site and the proxy at `server`
fn create_test_config(server: &MockServer, category: &str) -> Config {
    let toml = format!(
        r#"
[search]
keywords = ["python", "html", "parser"]
category = "{}"
base-url = "{}"

[proxy]
proxies = ["{}"]
strategy = "first"

[scheduler]
max-concurrent-jobs = 4
progress-interval-ms = 50

[http]
user-agent = "gitfan-tests/1.0"
connect-timeout-secs = 5
"#,
        category,
        server.uri(),
        server.address()
    );

    parse_config(&toml).expect("Failed to parse test config")
}

fn search_page(keys: &[&str]) -> String {
    let mut page = String::from("<html>\n<body>\n<ul class=\"repo-list\">\n");
    for key in keys {
        page.push_str(&format!(
            "<a class=\"v-align-middle\" data-hydro-click=\"{{&quot;event_type&quot;:&quot;search_result.click&quot;}}\" href=\"{}\">{}</a>\n",
            key,
            key.trim_start_matches('/')
        ));
    }
    page.push_str("</ul>\n</body>\n</html>\n");
    page
}

fn language_page(pairs: &[(&str, &str)]) -> String {
    let mut page = String::from("<ol class=\"repository-lang-stats-numbers\">\n");
    for (name, share) in pairs {
        page.push_str(&format!(
            "<li>\n<span class=\"lang\">{}</span>\n<span class=\"percent\">{}</span>\n</li>\n",
            name, share
        ));
    }
    page.push_str("</ol>\n");
    page
}

async fn mount_search(server: &MockServer, category: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", category))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_collects_language_stats() {
    let server = MockServer::start().await;

    mount_search(
        &server,
        "Repositories",
        search_page(&["/alice/parser", "/bob/scraper"]),
    )
    .await;
    mount_page(
        &server,
        "/alice/parser",
        language_page(&[("Python", "91.3"), ("HTML", "8.7")]),
    )
    .await;
    mount_page(&server, "/bob/scraper", language_page(&[("Go", "100.0")])).await;

    let config = create_test_config(&server, "Repositories");
    let report = crawl(config).await.expect("Crawl failed");

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    assert_eq!(report.entries.len(), 2);

    let alice = &report.entries[0];
    assert_eq!(alice.url, format!("{}/alice/parser", server.uri()));
    assert_eq!(alice.extra.owner, "alice");
    let stats = alice.extra.language_stats.as_ref().unwrap();
    assert_eq!(stats.get("Python"), Some("91.3"));
    assert_eq!(stats.get("HTML"), Some("8.7"));

    let bob = &report.entries[1];
    assert_eq!(bob.extra.owner, "bob");
    assert_eq!(
        bob.extra.language_stats.as_ref().unwrap().get("Go"),
        Some("100.0")
    );

    assert_eq!(report.statistics.jobs_submitted, 3);
    assert_eq!(report.statistics.entries_with_stats, 2);
    assert!(report.finished_at >= report.started_at);

    // Every request went through the proxy and reached the mock
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_failing_repository_is_reported() {
    let server = MockServer::start().await;

    mount_search(
        &server,
        "Repositories",
        search_page(&["/alice/parser", "/bob/broken"]),
    )
    .await;
    mount_page(
        &server,
        "/alice/parser",
        language_page(&[("Python", "100.0")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bob/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&server, "Repositories"))
        .await
        .expect("Crawl failed");

    assert_eq!(report.entries.len(), 2);
    assert!(report.entries[0].extra.language_stats.is_some());
    assert!(report.entries[1].extra.language_stats.is_none());

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.job_id, "/bob/broken");
    assert_eq!(failure.target, format!("{}/bob/broken", server.uri()));
    assert!(failure.message.contains("500"));
}

#[tokio::test]
async fn test_search_without_matches_yields_empty_array() {
    let server = MockServer::start().await;
    mount_search(&server, "Repositories", search_page(&[])).await;

    let report = crawl(create_test_config(&server, "Repositories"))
        .await
        .expect("Crawl failed");

    assert!(report.entries.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.to_json().unwrap(), "[]");
    assert_eq!(report.statistics.jobs_submitted, 1);
}

#[tokio::test]
async fn test_unavailable_search_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&server, "Repositories"))
        .await
        .expect("Crawl failed");

    assert!(report.entries.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].job_id, ROOT_JOB_ID);
    assert!(report.failures[0].message.contains("503"));
}

#[tokio::test]
async fn test_wiki_search_and_json_output() {
    let server = MockServer::start().await;

    mount_search(
        &server,
        "Wikis",
        "<div>\n<a class=\"muted-link \" href=\"/carol/notes\">carol/notes</a>\n</div>\n".to_string(),
    )
    .await;
    mount_page(&server, "/carol/notes", "<p>no languages here</p>\n".to_string()).await;

    let coordinator = Coordinator::new(create_test_config(&server, "Wikis"))
        .expect("Failed to create coordinator");
    assert!(coordinator.search_target().ends_with("&type=Wikis"));

    let report = coordinator.run().await.expect("Crawl failed");

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("result.json");
    report.write_json(&output).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["url"], format!("{}/carol/notes", server.uri()));
    assert_eq!(entries[0]["extra"]["owner"], "carol");
    assert_eq!(entries[0]["extra"]["language_stats"], serde_json::json!({}));
}

#[tokio::test]
async fn test_empty_proxy_list_fails_before_any_request() {
    let server = MockServer::start().await;
    let toml = format!(
        r#"
[search]
keywords = ["python"]
category = "Repositories"
base-url = "{}"

[proxy]
proxies = []
"#,
        server.uri()
    );

    assert!(parse_config(&toml).is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}
