//! Trend feed reader.
//!
//! Fetches the trending-searches RSS feed for one region and keeps the
//! topics whose title mentions the configured keyword.
//!
//! # Feed Shape
//!
//! ```text
//! <rss><channel>
//!   <item><title>…</title><link>…</link> …</item>
//!   …
//! </channel></rss>
//! ```
//!
//! Extension elements (`ht:approx_traffic`, `ht:news_item`, …) are ignored.

use crate::config::Settings;
use crate::error::PipelineError;
use crate::models::TrendItem;
use crate::utils::ensure_success;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
}

/// Fetch the trend feed and return up to `max_items` keyword matches.
///
/// Any failure here (transport, HTTP status, XML) is returned to the caller,
/// which treats it as fatal for the whole cycle.
#[instrument(level = "info", skip_all, fields(feed_url = %settings.feed_url, geo = %settings.geo))]
pub async fn fetch_trending(
    client: &Client,
    settings: &Settings,
) -> Result<Vec<TrendItem>, PipelineError> {
    let response = client
        .get(&settings.feed_url)
        .query(&[("geo", settings.geo.as_str())])
        .send()
        .await?;
    let xml = ensure_success("trend feed", response).await?.text().await?;

    let items = parse_feed(&xml)?;
    let total = items.len();
    let topics = filter_topics(items, &settings.keyword, settings.max_items);

    info!(
        total,
        matched = topics.len(),
        keyword = %settings.keyword,
        "Fetched trending topics"
    );
    debug!(topics = ?topics, "Selected topics");
    Ok(topics)
}

/// Parse an RSS document into feed-ordered items.
///
/// Items without both a title and a link are dropped.
///
/// # Arguments
///
/// * `xml` - The raw RSS 2.0 document
///
/// # Returns
///
/// Every usable `<item>` in feed order, or [`PipelineError::Feed`] when the
/// document is not RSS.
pub fn parse_feed(xml: &str) -> Result<Vec<TrendItem>, PipelineError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    let items = rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let title = item.title?.trim().to_string();
            let link = item.link?.trim().to_string();
            (!title.is_empty() && !link.is_empty()).then_some(TrendItem { title, link })
        })
        .collect();
    Ok(items)
}

/// Keep items whose title contains `keyword` (case-insensitive), first `max` only.
///
/// # Arguments
///
/// * `items` - Parsed feed items, in feed order
/// * `keyword` - Substring a title must contain; empty matches everything
/// * `max` - Maximum number of items to keep
///
/// # Returns
///
/// At most `max` matching items, in their original order.
///
/// # Examples
///
/// ```ignore
/// let items = vec![
///     TrendItem { title: "Sports final".into(), link: "https://a".into() },
///     TrendItem { title: "Election".into(), link: "https://b".into() },
/// ];
/// assert_eq!(filter_topics(items, "SPORT", 5).len(), 1);
/// ```
pub fn filter_topics(items: Vec<TrendItem>, keyword: &str, max: usize) -> Vec<TrendItem> {
    let keyword = keyword.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.title.to_lowercase().contains(&keyword))
        .take(max)
        .collect()
}
