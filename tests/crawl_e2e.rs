//! End-to-end crawl tests.
//!
//! These tests use wiremock to serve a small two-page gallery fixture and
//! drive the full crawl loop: extraction, classification, resolution,
//! download and pagination.

use std::collections::BTreeSet;

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use buscrawl::models::Config;
use buscrawl::pipeline::run_crawl;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{body}</body></html>"))
        .insert_header("content-type", "text/html")
}

/// Mount gallery page 1, its detail pages and image bodies.
///
/// Page 1 exposes three candidate links: two detail pages that classify as
/// urban service, one that does not.
async fn mount_page_one(server: &MockServer) {
    // Gallery page 1: fetched once for content and once for pagination.
    Mock::given(method("GET"))
        .and(path("/galeria"))
        .and(query_param("pagina", "1"))
        .respond_with(html(
            r#"<div class="gallery">
                 <a href="/foto/101"><img src="/thumb/101.jpg" width="640" height="480"></a>
                 <a href="/foto/102"><img src="/thumb/102.jpg"></a>
                 <a href="/foto/103"><img src="/thumb/103.jpg"></a>
               </div>
               <div class="pagination"><a href="/galeria?pagina=2">2</a></div>"#,
        ))
        .mount(server)
        .await;

    // Detail 101: urban service, resolved through the main-image heuristic.
    Mock::given(method("GET"))
        .and(path("/foto/101"))
        .respond_with(html(
            r#"<p>Serviço Urbano: A12 - Vila Nova (2024)</p>
               <img class="main-image" src="/img/large/101.jpg">"#,
        ))
        .mount(server)
        .await;

    // Detail 102: urban service, resolved through the og:image metadata.
    Mock::given(method("GET"))
        .and(path("/foto/102"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head>
                         <meta property="og:image" content="/img/102_original.png">
                       </head><body>
                         <p>Serviço Urbano: 72 - Circular Centro (ida)</p>
                       </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    // Detail 103: not an urban service; its candidate must be dropped.
    Mock::given(method("GET"))
        .and(path("/foto/103"))
        .respond_with(html(
            r#"<p>Ônibus rodoviário executivo - Litoral Sul</p>
               <img class="main-image" src="/img/large/103.jpg">"#,
        ))
        .mount(server)
        .await;

    // Image bodies.
    Mock::given(method("GET"))
        .and(path("/img/large/101.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"jpeg-bytes-101".to_vec())
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/102_original.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"png-bytes-102".to_vec())
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;
}

/// Mount gallery page 2: no candidates, links back to page 1, which must be
/// suppressed by the visited set.
async fn mount_page_two(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/galeria"))
        .and(query_param("pagina", "2"))
        .respond_with(html(
            r#"<div class="pagination"><a href="/galeria?pagina=1">1</a></div>"#,
        ))
        .mount(server)
        .await;
}

fn test_config(download_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.download_dir = download_dir.path().to_string_lossy().into_owned();
    config
}

fn downloaded_files(dir: &TempDir) -> BTreeSet<String> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_two_page_crawl_downloads_urban_photos() {
    let server = MockServer::start().await;
    mount_page_one(&server).await;
    mount_page_two(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let start_url = format!("{}/galeria?pagina=1", server.uri());

    let stats = run_crawl(&config, &start_url, None, None)
        .await
        .expect("crawl failed");

    // Both gallery pages were processed; the crawl terminated even though
    // page 2 links back to page 1 (visited-set suppression).
    assert_eq!(stats.pages_processed, 2);

    // The found counter is the raw candidate count, not the download count.
    assert_eq!(stats.images_found, 3);

    // Exactly the two classified candidates were written, numbered in
    // candidate order.
    let files = downloaded_files(&dir);
    assert_eq!(
        files,
        BTreeSet::from([
            "0001_vila_nova.jpg".to_string(),
            "0002_circular_centro.png".to_string(),
        ])
    );

    let first = std::fs::read(dir.path().join("0001_vila_nova.jpg")).unwrap();
    assert_eq!(first, b"jpeg-bytes-101");
    let second = std::fs::read(dir.path().join("0002_circular_centro.png")).unwrap();
    assert_eq!(second, b"png-bytes-102");

    // Page 1 was fetched exactly twice (content + pagination discovery);
    // the link back from page 2 must not have triggered a revisit.
    let requests = server.received_requests().await.unwrap();
    let page_one_hits = requests
        .iter()
        .filter(|r| r.url.path() == "/galeria" && r.url.query() == Some("pagina=1"))
        .count();
    assert_eq!(page_one_hits, 2);
}

#[tokio::test]
async fn test_page_limit_stops_pagination() {
    let server = MockServer::start().await;
    mount_page_one(&server).await;

    // Page 2 must never be requested when the limit is one page.
    Mock::given(method("GET"))
        .and(path("/galeria"))
        .and(query_param("pagina", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let start_url = format!("{}/galeria?pagina=1", server.uri());

    let stats = run_crawl(&config, &start_url, Some(1), None)
        .await
        .expect("crawl failed");

    assert_eq!(stats.pages_processed, 1);
    assert_eq!(downloaded_files(&dir).len(), 2);
}

#[tokio::test]
async fn test_rerun_skips_existing_files() {
    let server = MockServer::start().await;
    mount_page_one(&server).await;
    mount_page_two(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let start_url = format!("{}/galeria?pagina=1", server.uri());

    run_crawl(&config, &start_url, None, None)
        .await
        .expect("first crawl failed");

    // Tamper with a downloaded file; a rerun must skip it, not rewrite it.
    std::fs::write(dir.path().join("0001_vila_nova.jpg"), b"tampered").unwrap();

    run_crawl(&config, &start_url, None, None)
        .await
        .expect("second crawl failed");

    let content = std::fs::read(dir.path().join("0001_vila_nova.jpg")).unwrap();
    assert_eq!(content, b"tampered");
}

#[tokio::test]
async fn test_worker_count_does_not_change_output() {
    let server = MockServer::start().await;
    mount_page_one(&server).await;
    mount_page_two(&server).await;
    let start_url = format!("{}/galeria?pagina=1", server.uri());

    let single = TempDir::new().unwrap();
    run_crawl(&test_config(&single), &start_url, None, Some(1))
        .await
        .expect("single-worker crawl failed");

    let pooled = TempDir::new().unwrap();
    run_crawl(&test_config(&pooled), &start_url, None, Some(16))
        .await
        .expect("pooled crawl failed");

    assert_eq!(downloaded_files(&single), downloaded_files(&pooled));
}
