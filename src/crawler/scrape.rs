use log2::debug;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::config::ContentTypePolicy;
use super::fetch::Fetcher;
use crate::error::FetchError;

/// Anchor target that navigates nowhere
pub const JAVASCRIPT_VOID: &str = "javascript:void(0);";

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Raw `href` values of every anchor in `document`, in document order
pub fn extract_hrefs(document: &str) -> Vec<String> {
    let document = Html::parse_document(document);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Resolves `href` against the page it was found on.
///
/// The javascript no-op sentinel resolves to an empty string.
pub fn resolve_href(base: &Url, href: &str) -> Result<String, url::ParseError> {
    if href == JAVASCRIPT_VOID {
        return Ok(String::new());
    }
    let href = href.trim_matches(' ');
    base.join(href).map(String::from)
}

fn is_http_like(resolved: &str) -> bool {
    resolved.starts_with("http://") || resolved.starts_with("https://")
}

/// Absolute HTTP(S) links found in `document`, resolved against `page_url`.
pub fn links_from_document(document: &str, page_url: &Url) -> Vec<String> {
    extract_hrefs(document)
        .into_iter()
        .filter_map(|href| match resolve_href(page_url, &href) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                debug!("Dropping unresolvable href {:?} on {}: {}", href, page_url, e);
                None
            }
        })
        .filter(|resolved| is_http_like(resolved))
        .collect()
}

/// Fetches `url` and returns the links on it.
///
/// Anything but a 200 response with an HTML content type is an error.
pub async fn fetch_links(
    fetcher: &dyn Fetcher,
    url: &Url,
    policy: ContentTypePolicy,
) -> Result<Vec<String>, FetchError> {
    let document = fetcher.fetch_document(url).await?;

    if document.status != 200 {
        return Err(FetchError::Status(document.status));
    }
    if !policy.accepts(document.content_type.as_deref()) {
        return Err(FetchError::ContentType(document.content_type));
    }

    Ok(links_from_document(&document.body, url))
}
