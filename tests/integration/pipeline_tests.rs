//! End-to-end runs of the crawl-to-artifact pipeline

use serde_json::json;
use site_distiller::config::{
    validate, ChunkSettings, Config, CrawlSettings, IndexMode, TransformSettings,
};
use site_distiller::crawler::HttpFetcher;
use site_distiller::pipeline::{Coordinator, RunOutcome};
use site_distiller::transform::ChatTransformer;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers every completion request with the first input line as title and
/// the full input as content
struct EchoCompletion;

impl Respond for EchoCompletion {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let input = body["messages"][1]["content"].as_str().unwrap_or("").to_string();
        let title = input.lines().next().unwrap_or("Untitled").to_string();

        let output = json!({
            "title": title,
            "description": format!("Summary of {}", title),
            "transformedContent": input,
        });

        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": output.to_string() } }
            ]
        }))
    }
}

fn html(heading: &str, text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    format!(
        "<html><head><title>{heading}</title></head><body>\
         <nav>{anchors}</nav><main><h1>{heading}</h1><p>{text}</p></main></body></html>"
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// Three-page docs section with an excluded admin page and an external link
async fn start_site() -> MockServer {
    let site = MockServer::start().await;

    mount_page(
        &site,
        "/docs",
        html(
            "Home",
            "Welcome to the docs.",
            &["/docs/a", "/docs/b", "/docs/admin/secret", "/blog", "https://other.example/docs"],
        ),
    )
    .await;
    mount_page(&site, "/docs/a", html("Alpha", "Alpha content.", &["/docs", "/docs/b"])).await;
    mount_page(&site, "/docs/b", html("Beta", "Beta content.", &["/docs/a#top"])).await;

    Mock::given(method("GET"))
        .and(path("/docs/admin/secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html("Secret", "x", &[]), "text/html"),
        )
        .expect(0)
        .mount(&site)
        .await;

    site
}

async fn start_llm() -> MockServer {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(EchoCompletion)
        .mount(&llm)
        .await;
    llm
}

/// Completion endpoint that rejects the page containing `failing_text`
async fn start_llm_failing_on(failing_text: &str) -> MockServer {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(failing_text))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(EchoCompletion)
        .mount(&llm)
        .await;
    llm
}

fn create_test_config(site: &MockServer, llm: &MockServer, output_root: &Path) -> Config {
    let config = Config {
        start_url: format!("{}/docs/", site.uri()),
        output_root: output_root.to_path_buf(),
        project: Some("site".to_string()),
        exclude: vec!["/admin".to_string()],
        concurrency: 2,
        crawl: CrawlSettings {
            navigation_timeout_secs: 5,
            ..Default::default()
        },
        transform: TransformSettings {
            endpoint: format!("{}/v1", llm.uri()),
            timeout_secs: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    validate(&config).expect("test config should be valid");
    config
}

async fn run(config: Config) -> RunOutcome {
    let fetcher = HttpFetcher::new(&config.crawl).expect("Failed to build fetcher");
    let transformer = ChatTransformer::new(&config.transform, "test-key".to_string())
        .expect("Failed to build transformer");

    Coordinator::new(config, Box::new(fetcher), Box::new(transformer))
        .run()
        .await
        .expect("run should reach finalization")
}

async fn completion_requests(llm: &MockServer) -> usize {
    llm.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("file should exist")
}

fn entry_count(index: &str) -> usize {
    index.matches("\n## ").count()
}

#[tokio::test]
async fn test_three_page_site_is_fully_processed() {
    let site = start_site().await;
    let llm = start_llm().await;
    let out = TempDir::new().unwrap();

    let outcome = run(create_test_config(&site, &llm, out.path())).await;

    assert_eq!(outcome.exit_status(), 0);
    assert_eq!(outcome.report.pages_crawled, 3);
    assert_eq!(outcome.report.tasks.len(), 3);
    assert_eq!(outcome.report.succeeded(), 3);
    assert_eq!(completion_requests(&llm).await, 3);

    let project = out.path().join("site");
    let alpha = read(project.join("a.md"));
    assert!(alpha.starts_with("# Alpha\n\n> Summary of Alpha\n\n"));
    assert!(alpha.contains("Alpha content."));
    assert!(project.join("b.md").exists());
    assert!(project.join("_root.md").exists());

    let index = read(project.join("index.md"));
    assert!(index.starts_with("# site\n\n"));
    assert_eq!(entry_count(&index), 3);
    assert!(index.contains("- path: site/a.md\n- description: Summary of Alpha"));

    // Sorted by path
    let root = index.find("site/_root.md").unwrap();
    let a = index.find("site/a.md").unwrap();
    let b = index.find("site/b.md").unwrap();
    assert!(root < a && a < b);
}

#[tokio::test]
async fn test_rerun_skips_existing_artifacts() {
    let site = start_site().await;
    let llm = start_llm().await;
    let out = TempDir::new().unwrap();

    run(create_test_config(&site, &llm, out.path())).await;
    let index_before = read(out.path().join("site/index.md"));
    let alpha_before = read(out.path().join("site/a.md"));

    let outcome = run(create_test_config(&site, &llm, out.path())).await;

    assert_eq!(outcome.exit_status(), 0);
    assert_eq!(outcome.report.skipped(), 3);
    assert_eq!(outcome.report.succeeded(), 0);
    assert_eq!(outcome.report.index_entries_written, 0);

    // No new transformations, no new index entries
    assert_eq!(completion_requests(&llm).await, 3);
    assert_eq!(read(out.path().join("site/index.md")), index_before);
    assert_eq!(read(out.path().join("site/a.md")), alpha_before);
}

#[tokio::test]
async fn test_failed_task_does_not_affect_siblings() {
    let site = start_site().await;
    let llm = start_llm_failing_on("Beta content").await;
    let out = TempDir::new().unwrap();

    let outcome = run(create_test_config(&site, &llm, out.path())).await;

    assert_eq!(outcome.exit_status(), 0);
    assert_eq!(outcome.report.failed(), 1);
    assert_eq!(outcome.report.succeeded(), 2);

    let failed = outcome
        .report
        .tasks
        .iter()
        .find(|t| t.relative_path == "b.md")
        .unwrap();
    assert!(failed.error.as_deref().unwrap().contains("HTTP 500"));

    let project = out.path().join("site");
    assert!(!project.join("b.md").exists());
    assert!(read(project.join("b.md.error")).contains("model overloaded"));

    // Every processed task contributes exactly one entry
    let index = read(project.join("index.md"));
    assert_eq!(entry_count(&index), 3);
    assert!(index.contains("## b\n\n- path: site/b.md.error\n- description: "));
}

#[tokio::test]
async fn test_incremental_rerun_appends_only_new_entries() {
    let site = start_site().await;
    let out = TempDir::new().unwrap();

    let failing = start_llm_failing_on("Beta content").await;
    run(create_test_config(&site, &failing, out.path())).await;
    let index_before = read(out.path().join("site/index.md"));

    let llm = start_llm().await;
    let outcome = run(create_test_config(&site, &llm, out.path())).await;

    assert_eq!(outcome.report.skipped(), 2);
    assert_eq!(outcome.report.succeeded(), 1);
    assert_eq!(completion_requests(&llm).await, 1);

    let index = read(out.path().join("site/index.md"));
    assert!(index.starts_with(&index_before));
    assert_eq!(entry_count(&index), 4);
    assert!(index.ends_with("- path: site/b.md\n- description: Summary of Beta\n"));
    assert!(!out.path().join("site/b.md.error").exists());
}

#[tokio::test]
async fn test_rebuild_index_lists_every_artifact_once() {
    let site = start_site().await;
    let out = TempDir::new().unwrap();

    let failing = start_llm_failing_on("Beta content").await;
    run(create_test_config(&site, &failing, out.path())).await;

    let llm = start_llm().await;
    let mut config = create_test_config(&site, &llm, out.path());
    config.index_mode = IndexMode::Regenerate;
    let outcome = run(config).await;

    assert_eq!(outcome.report.skipped(), 2);
    assert_eq!(outcome.report.succeeded(), 1);
    assert_eq!(outcome.report.index_entries_written, 3);

    let index = read(out.path().join("site/index.md"));
    assert_eq!(entry_count(&index), 3);
    assert!(!index.contains(".error"));
    assert!(index.contains("## Alpha\n\n- path: site/a.md\n- description: Summary of Alpha"));
}

#[tokio::test]
async fn test_force_regenerates_existing_artifacts() {
    let site = start_site().await;
    let llm = start_llm().await;
    let out = TempDir::new().unwrap();

    run(create_test_config(&site, &llm, out.path())).await;

    let mut config = create_test_config(&site, &llm, out.path());
    config.force = true;
    let outcome = run(config).await;

    assert_eq!(outcome.report.skipped(), 0);
    assert_eq!(outcome.report.succeeded(), 3);
    assert_eq!(completion_requests(&llm).await, 6);
}

#[tokio::test]
async fn test_oversized_page_is_chunked() {
    let site = MockServer::start().await;
    let long_text = "This sentence is part of a long page. ".repeat(30);
    mount_page(&site, "/docs", html("Long", &long_text, &[])).await;

    let llm = start_llm().await;
    let out = TempDir::new().unwrap();

    let mut config = create_test_config(&site, &llm, out.path());
    config.chunking = ChunkSettings {
        threshold: 400,
        lookback: 100,
        overlap: 50,
    };
    let outcome = run(config).await;

    assert_eq!(outcome.report.succeeded(), 1);

    let requests = llm.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let user_input = |i: usize| {
        let body: serde_json::Value = serde_json::from_slice(&requests[i].body).unwrap();
        body["messages"][1]["content"].as_str().unwrap().to_string()
    };
    assert!(!user_input(0).contains("[PREVIOUS CONTEXT - DO NOT REPEAT IN OUTPUT]"));
    assert!(user_input(1).starts_with("[PREVIOUS CONTEXT - DO NOT REPEAT IN OUTPUT]
"));
    assert!(user_input(2).contains("[NEW CONTENT]
"));

    // Title comes from the first chunk only
    let artifact = read(out.path().join("site/_root.md"));
    assert!(artifact.starts_with("# Long\n\n> Summary of Long\n\n"));
}

#[tokio::test]
async fn test_unreachable_page_is_reported_as_error() {
    let site = MockServer::start().await;
    mount_page(&site, "/docs", html("Home", "Start.", &["/docs/gone"])).await;

    let llm = start_llm().await;
    let out = TempDir::new().unwrap();

    let outcome = run(create_test_config(&site, &llm, out.path())).await;

    assert_eq!(outcome.report.pages_crawled, 2);
    assert_eq!(outcome.report.succeeded(), 1);
    assert_eq!(outcome.report.failed(), 1);
    assert_eq!(completion_requests(&llm).await, 1);
    assert!(read(out.path().join("site/gone.md.error")).contains("HTTP 404 while fetching"));

    let gone = outcome
        .report
        .tasks
        .iter()
        .find(|t| t.relative_path == "gone.md")
        .unwrap();
    assert!(gone.error.as_deref().unwrap().starts_with("Fetch error: HTTP 404"));
}
