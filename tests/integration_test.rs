use std::time::Duration;
use site_tree::crawler::{Crawler, CrawlerConfig, UrlNode};
use site_tree::live::{self, SseEnd};
use site_tree::render;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

/// Small site:
/// /            -> /docs, /blog, https://external.com
/// /docs        -> /docs/intro, /
/// /docs/intro  -> javascript:void(0);, mailto
/// /blog        -> 500
async fn mount_site(server: &MockServer) {
    Mock::given(path("/"))
        .respond_with(html(r#"
            <nav>
                <a href="/docs">Docs</a>
                <a href="blog">Blog</a>
                <a href="https://external.com/">External</a>
            </nav>
        "#))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(path("/docs"))
        .respond_with(html(r#"<a href="docs/intro">Intro</a><a href="/">Home</a>"#))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(path("/docs/intro"))
        .respond_with(html(r#"
            <a href="javascript:void(0);">Menu</a>
            <a href="mailto:docs@example.com">Mail</a>
        "#))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(path("/blog"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_small_site() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base = server.uri();

    let crawler = Crawler::new(CrawlerConfig::new().with_request_timeout(5))?;
    let report = crawler.run(&format!("{}/", base), 3).await?;

    let mut docs = UrlNode::new(format!("{}/docs", base));
    docs.links.push(UrlNode::new(format!("{}/docs/intro", base)));
    docs.links.push(UrlNode::new(format!("{}/", base)));
    let expected = UrlNode {
        url: format!("{}/", base),
        links: vec![docs, UrlNode::new(format!("{}/blog", base))],
    };
    assert_eq!(report.root, expected);
    assert_eq!(report.visited, 4);
    assert_eq!(report.stats.pages_fetched, 4);
    assert_eq!(report.stats.pages_failed, 1);
    assert_eq!(report.stats.foreign_links_skipped, 1);

    let printed = render::render_tree(&report.root);
    assert!(printed.contains(&format!("│   ├── {}/docs/intro", base)));

    let json = serde_json::to_string(&report.root)?;
    let reparsed: UrlNode = serde_json::from_str(&json)?;
    assert_eq!(reparsed, report.root);
    Ok(())
}

#[tokio::test]
async fn test_stream_small_site_as_sse() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let crawler = Crawler::new(CrawlerConfig::new().with_request_timeout(5))?;
    let mut live_crawl = crawler.stream(&server.uri(), 3)?;

    let mut out: Vec<u8> = Vec::new();
    let end = live::write_sse(
        &mut out,
        &mut live_crawl.events,
        &live_crawl.tree,
        Duration::from_secs(30),
    )
    .await;
    assert_eq!(end, SseEnd::Finished);
    let report = live_crawl.handle.await?;

    let text = String::from_utf8(out)?;
    let frames: Vec<UrlNode> = text
        .split_terminator("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;

    // one frame per discovered node, each a growing snapshot of the tree
    assert_eq!(frames.len(), report.stats.nodes_discovered);
    assert_eq!(frames.len(), 4);
    assert!(frames.windows(2).all(|w| w[0].len() <= w[1].len()));
    assert_eq!(frames.last(), Some(&report.root));
    Ok(())
}
