//! Error type shared by every pipeline stage.
//!
//! Hard failures from any stage surface as a [`PipelineError`]. Soft outcomes
//! (an image host refusing an upload, a blog refusing a post) are not errors;
//! they are variants of [`crate::models::UploadOutcome`] and
//! [`crate::models::ItemOutcome`].

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("feed parse error: {0}")]
    Feed(#[from] quick_xml::de::DeError),

    #[error("image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image encode error: {0}")]
    Encode(#[source] image::ImageError),

    #[error("{service} response malformed: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    #[error("no image found for {0}")]
    NoImage(String),
}
