//! Data models passed between pipeline stages.
//!
//! Everything here lives for a single cycle:
//! - [`TrendItem`]: a topic from the trend feed
//! - [`Article`]: scraped text and the image discovered on the page
//! - [`UploadOutcome`]: result of handing an image to the image host
//! - [`BlogPost`]: the JSON body sent to the blogging platform
//! - [`ItemOutcome`] and [`CycleReport`]: what the run loop reports

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use url::Url;

/// A trending topic taken from the trend feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendItem {
    /// The topic headline.
    pub title: String,
    /// Link to the topic's source page.
    pub link: String,
}

/// A scraped article.
#[derive(Debug, Clone)]
pub struct Article {
    /// The URL the article was fetched from.
    pub url: String,
    /// Paragraph text joined by single spaces, already truncated.
    pub text: String,
    /// The lead image found on the page, if any.
    pub image_url: Option<Url>,
}

/// Result of uploading an image to the image host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The host accepted the image and returned its public URL.
    Hosted(String),
    /// The host answered with something other than 200; no URL is available.
    NoUrl { status: StatusCode },
}

/// Body of a post-creation request.
#[derive(Debug, Serialize)]
pub struct BlogPost {
    pub title: String,
    /// Rendered HTML: image tag followed by a paragraph of content.
    pub content: String,
    pub labels: Vec<String>,
}

/// What happened to a single topic during a cycle.
#[derive(Debug)]
pub enum ItemOutcome {
    Posted { status: StatusCode },
    PostRejected { status: StatusCode },
    ImageUploadFailed { status: StatusCode },
    Failed(PipelineError),
}

impl ItemOutcome {
    /// The human-readable status line printed for this outcome.
    pub fn status_line(&self, title: &str) -> String {
        match self {
            ItemOutcome::Posted { .. } => format!("Posted: {title}"),
            ItemOutcome::PostRejected { status } => {
                format!("Post rejected ({}): {title}", status.as_u16())
            }
            ItemOutcome::ImageUploadFailed { .. } => "Image upload failed!".to_string(),
            ItemOutcome::Failed(e) => format!("Error: {e}"),
        }
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub topics: usize,
    pub posted: usize,
    pub rejected: usize,
    pub upload_failures: usize,
    pub failed: usize,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            topics: 0,
            posted: 0,
            rejected: 0,
            upload_failures: 0,
            failed: 0,
        }
    }

    /// Count one item's outcome.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.topics += 1;
        match outcome {
            ItemOutcome::Posted { .. } => self.posted += 1,
            ItemOutcome::PostRejected { .. } => self.rejected += 1,
            ItemOutcome::ImageUploadFailed { .. } => self.upload_failures += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} topics: {} posted, {} rejected, {} upload failures, {} errors",
            self.topics, self.posted, self.rejected, self.upload_failures, self.failed
        )
    }
}
