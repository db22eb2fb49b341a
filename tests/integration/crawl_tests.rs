//! Integration tests for the exporter
//!
//! These tests use wiremock to stand in for a BookStack instance and run
//! full crawls through the real HTTP fetcher.

use bookstack_backup::config::{parse_config, InstanceConfig, TargetConfig};
use bookstack_backup::crawler::{crawl, Coordinator};
use bookstack_backup::BackupError;
use chrono::Local;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_HEADER: &str = "Token test-id:test-secret";

/// Creates an instance pointed at the mock server
fn create_test_instance(base_url: &str, backup: &Path, kind: &str, ids: Vec<u64>) -> InstanceConfig {
    InstanceConfig {
        name: "integration".to_string(),
        base_url: base_url.to_string(),
        token_id: "test-id".to_string(),
        token_secret: "test-secret".to_string(),
        backup_path: backup.to_path_buf(),
        schedule: "0 3 * * *".to_string(),
        request_timeout: 5,
        target: TargetConfig {
            kind: kind.to_string(),
            ids,
        },
    }
}

fn today_dir(backup: &Path) -> PathBuf {
    backup.join(Local::now().format("%Y-%m-%d").to_string())
}

/// Lists every file below `root` relative to it, sorted
fn list_files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).expect("Failed to read dir") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_string_lossy().into_owned());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

async fn mount_listing(server: &MockServer, pages: serde_json::Value) {
    let total = pages.as_array().map(|a| a.len()).unwrap_or(0);
    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .and(header("Authorization", TOKEN_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": pages, "total": total })))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, id: u64, name: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/pages/{}", id)))
        .and(header("Authorization", TOKEN_HEADER))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": id, "name": name, "html": html })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_book_with_two_chapters() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([
            {"id": 1, "name": "Zebra", "book_id": 3, "chapter_id": 1},
            {"id": 2, "name": "apple", "book_id": 3, "chapter_id": 1},
            {"id": 3, "name": "Intro", "book_id": 3, "chapter_id": 2},
            {"id": 4, "name": "Elsewhere", "book_id": 33, "chapter_id": 1}
        ]),
    )
    .await;
    mount_page(&server, 1, "Zebra", "<p>Stripes</p>").await;
    mount_page(&server, 2, "apple", "<h2>Fruit</h2><p>Red</p>").await;
    mount_page(&server, 3, "Intro", "<p>Welcome</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "book", vec![3]);
    let report = crawl(instance).await.expect("Crawl failed");

    let book = today_dir(backup.path()).join("book_3");
    assert_eq!(
        list_files(&book),
        vec!["Kapitel_1/01_apple.md", "Kapitel_1/02_Zebra.md", "Kapitel_2/01_Intro.md"]
    );
    assert_eq!(report.pages_written, 3);

    let apple = fs::read_to_string(book.join("Kapitel_1/01_apple.md")).unwrap();
    assert!(apple.starts_with("# apple\n\n"));
    assert!(apple.contains("Fruit"));
    assert!(apple.contains("Red"));
}

#[tokio::test]
async fn test_shelve_resolves_books_under_same_date() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/shelves/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "Handbooks",
            "books": [{"id": 3, "name": "Ops"}, {"id": 7, "name": "Dev"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        json!([
            {"id": 1, "name": "Runbook", "book_id": 3, "chapter_id": 0},
            {"id": 2, "name": "Setup", "book_id": 7, "chapter_id": 5}
        ]),
    )
    .await;
    mount_page(&server, 1, "Runbook", "<p>steps</p>").await;
    mount_page(&server, 2, "Setup", "<p>install</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "shelve", vec![12]);
    let report = crawl(instance).await.expect("Crawl failed");

    let shelve = today_dir(backup.path()).join("shelve_12");
    assert!(shelve.join("book_3").is_dir());
    assert!(shelve.join("book_7").is_dir());
    assert!(shelve.join("book_3/Kapitel_0/01_Runbook.md").is_file());
    assert!(shelve.join("book_7/Kapitel_5/01_Setup.md").is_file());
    assert_eq!(fs::read_dir(backup.path()).unwrap().count(), 1);
    assert_eq!(report.books, 2);
}

#[tokio::test]
async fn test_failed_page_fetch_renumbers_remaining_pages() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([
            {"id": 1, "name": "Alpha", "book_id": 9, "chapter_id": 4},
            {"id": 2, "name": "Beta", "book_id": 9, "chapter_id": 4},
            {"id": 3, "name": "Gamma", "book_id": 9, "chapter_id": 4}
        ]),
    )
    .await;
    mount_page(&server, 1, "Alpha", "<p>a</p>").await;
    Mock::given(method("GET"))
        .and(path("/api/pages/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 3, "Gamma", "<p>c</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "book", vec![9]);
    let report = crawl(instance).await.expect("Crawl failed");

    let chapter = today_dir(backup.path()).join("book_9/Kapitel_4");
    assert_eq!(list_files(&chapter), vec!["01_Alpha.md", "02_Gamma.md"]);
    assert_eq!(report.pages_failed, 1);
}

#[tokio::test]
async fn test_unparseable_page_detail_is_skipped() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([
            {"id": 1, "name": "Broken", "book_id": 2, "chapter_id": 0},
            {"id": 2, "name": "Fine", "book_id": 2, "chapter_id": 0}
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/pages/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;
    mount_page(&server, 2, "Fine", "<p>ok</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "book", vec![2]);
    crawl(instance).await.expect("Crawl failed");

    let chapter = today_dir(backup.path()).join("book_2/Kapitel_0");
    assert_eq!(list_files(&chapter), vec!["01_Fine.md"]);
}

#[tokio::test]
async fn test_unknown_target_type_does_nothing() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let instance = create_test_instance(&server.uri(), backup.path(), "unknown", vec![1]);
    let result = crawl(instance).await;

    assert!(matches!(result, Err(BackupError::UnsupportedTarget(_))));
    assert_eq!(fs::read_dir(backup.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_page_names_are_sanitized() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([
            {"id": 1, "name": "a/b", "book_id": 1, "chapter_id": 0},
            {"id": 2, "name": "Q: \"why\"", "book_id": 1, "chapter_id": 0},
            {"id": 3, "name": "Übersicht & Maße", "book_id": 1, "chapter_id": 0}
        ]),
    )
    .await;
    mount_page(&server, 1, "a/b", "<p>1</p>").await;
    mount_page(&server, 2, "Q: \"why\"", "<p>2</p>").await;
    mount_page(&server, 3, "Übersicht & Maße", "<p>3</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "book", vec![1]);
    crawl(instance).await.expect("Crawl failed");

    let chapter = today_dir(backup.path()).join("book_1/Kapitel_0");
    assert_eq!(
        list_files(&chapter),
        vec!["01_a_b.md", "02_Q_ _why_.md", "03_Übersicht _ Maße.md"]
    );

    let content = fs::read_to_string(chapter.join("02_Q_ _why_.md")).unwrap();
    assert!(content.starts_with("# Q: \"why\"\n\n"));
}

#[tokio::test]
async fn test_rejected_token_aborts_book() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/pages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthenticated"})))
        .mount(&server)
        .await;

    let instance = create_test_instance(&server.uri(), backup.path(), "book", vec![1, 2]);
    let report = crawl(instance).await.expect("Dispatch should succeed");

    assert_eq!(report.books_failed, 2);
    assert_eq!(report.books, 0);
    assert_eq!(fs::read_dir(backup.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_shelve_continues_with_next_id() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/shelves/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shelves/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"books": [{"id": 5}]})))
        .mount(&server)
        .await;
    mount_listing(&server, json!([{"id": 8, "name": "Only", "book_id": 5, "chapter_id": 0}])).await;
    mount_page(&server, 8, "Only", "<p>x</p>").await;

    let instance = create_test_instance(&server.uri(), backup.path(), "shelve", vec![1, 2]);
    let report = crawl(instance).await.expect("Crawl failed");

    assert_eq!(report.shelves_failed, 1);
    assert!(today_dir(backup.path())
        .join("shelve_2/book_5/Kapitel_0/01_Only.md")
        .is_file());
}

#[tokio::test]
async fn test_second_run_overwrites_same_day_export() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(&server, json!([{"id": 1, "name": "Page", "book_id": 1, "chapter_id": 0}])).await;
    mount_page(&server, 1, "Page", "<p>current</p>").await;

    let instance = Arc::new(create_test_instance(&server.uri(), backup.path(), "book", vec![1]));
    let file = today_dir(backup.path()).join("book_1/Kapitel_0/01_Page.md");
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, "stale content from an earlier run").unwrap();

    let coordinator = Coordinator::new(instance).expect("Failed to build coordinator");
    coordinator.crawl().await.expect("Crawl failed");

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.starts_with("# Page\n\n"));
    assert!(!content.contains("stale"));
}

#[tokio::test]
async fn test_config_file_to_export() {
    let server = MockServer::start().await;
    let backup = TempDir::new().unwrap();

    mount_listing(&server, json!([{"id": 1, "name": "Home", "book_id": 4, "chapter_id": 0}])).await;
    mount_page(&server, 1, "Home", "<p>home</p>").await;

    let toml = format!(
        r#"
[[instances]]
name = "from-file"
base-url = "{}/"
token-id = "test-id"
token-secret = "test-secret"
backup-path = "{}"
schedule = "0 3 * * *"

[instances.target]
type = "book"
ids = [4]
"#,
        server.uri(),
        backup.path().display()
    );
    let config = parse_config(&toml).expect("Config should be valid");
    let instance = config.instances.into_iter().next().unwrap();

    crawl(instance).await.expect("Crawl failed");

    assert!(today_dir(backup.path()).join("book_4/Kapitel_0/01_Home.md").is_file());
}
