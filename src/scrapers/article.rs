//! Article page scraper.
//!
//! Downloads a topic's source page with a browser-like `User-Agent`, joins
//! the text of every `<p>` element and picks the page's lead image.
//!
//! # Image Discovery
//!
//! The lead image is the first match of, in order:
//! 1. `<meta property="og:image">`
//! 2. `<meta name="twitter:image">`
//! 3. the first `<img src>`
//!
//! Relative URLs are resolved against the (post-redirect) page URL and only
//! `http`/`https` results are kept.

use crate::error::PipelineError;
use crate::models::Article;
use crate::utils::{ensure_success, truncate_chars};
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static TWITTER_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="twitter:image"]"#).unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

/// Fetch and parse a single article.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `url` - The topic's source link
/// * `user_agent` - Sent as the `User-Agent` header
/// * `max_chars` - Limit applied to the joined paragraph text
///
/// # Errors
///
/// Transport failures and non-success statuses. The body itself is parsed
/// best-effort and never fails.
#[instrument(level = "info", skip(client, user_agent))]
pub async fn fetch_article(
    client: &Client,
    url: &str,
    user_agent: &str,
    max_chars: usize,
) -> Result<Article, PipelineError> {
    let response = client.get(url).header(USER_AGENT, user_agent).send().await?;
    let response = ensure_success("article", response).await?;
    let page_url = response.url().clone();
    let html = response.text().await?;

    let article = parse_article(&html, &page_url, max_chars);
    info!(
        chars = article.text.chars().count(),
        image = ?article.image_url.as_ref().map(Url::as_str),
        "Parsed article"
    );
    Ok(article)
}

/// Build an [`Article`] from raw HTML.
///
/// # Returns
///
/// The paragraph text cut to `max_chars` and the lead image, if any, as an
/// absolute http(s) URL.
pub fn parse_article(html: &str, page_url: &Url, max_chars: usize) -> Article {
    let document = Html::parse_document(html);
    let text = extract_text(&document);
    debug!(full_chars = text.chars().count(), max_chars, "Extracted paragraph text");

    Article {
        url: page_url.to_string(),
        text: truncate_chars(&text, max_chars),
        image_url: extract_image_url(&document, page_url),
    }
}

/// Text of every paragraph in document order, joined by a single space.
fn extract_text(document: &Html) -> String {
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_image_url(document: &Html, page_url: &Url) -> Option<Url> {
    let meta = document
        .select(&OG_IMAGE)
        .chain(document.select(&TWITTER_IMAGE))
        .filter_map(|m| m.value().attr("content"));
    let imgs = document
        .select(&IMG)
        .filter_map(|img| img.value().attr("src"));

    meta.chain(imgs)
        .filter_map(|candidate| page_url.join(candidate.trim()).ok())
        .find(|url| matches!(url.scheme(), "http" | "https"))
}
