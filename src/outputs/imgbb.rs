//! Image host upload.
//!
//! Sends the enhanced JPEG as a multipart form (`key`, `image`) and reads the
//! public URL from the JSON reply:
//!
//! ```json
//! { "data": { "url": "https://i.ibb.co/…/image.jpg" }, "success": true }
//! ```
//!
//! Only HTTP 200 counts as success. Any other status yields
//! [`UploadOutcome::NoUrl`], a soft failure the caller checks before posting.

use crate::error::PipelineError;
use crate::models::UploadOutcome;
use crate::utils::truncate_for_log;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

/// Upload `jpeg` and return where it is hosted.
///
/// # Errors
///
/// Transport failures, and a 200 reply whose body has no `data.url`.
#[instrument(level = "info", skip(client, api_key, jpeg), fields(bytes = jpeg.len()))]
pub async fn upload_image(
    client: &Client,
    upload_url: &str,
    api_key: &str,
    jpeg: Vec<u8>,
) -> Result<UploadOutcome, PipelineError> {
    let image = Part::bytes(jpeg)
        .file_name("image.jpg")
        .mime_str("image/jpeg")?;
    let form = Form::new().text("key", api_key.to_string()).part("image", image);

    let response = client.post(upload_url).multipart(form).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %truncate_for_log(&body, 300), "Image host refused upload");
        return Ok(UploadOutcome::NoUrl { status });
    }

    let body = response.text().await?;
    let parsed: UploadResponse =
        serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse {
            service: "imgbb",
            reason: e.to_string(),
        })?;
    info!(url = %parsed.data.url, "Image hosted");
    Ok(UploadOutcome::Hosted(parsed.data.url))
}
