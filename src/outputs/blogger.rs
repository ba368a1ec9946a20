//! Blog post creation.
//!
//! Posts go to `{api_base}/blogs/{blog_id}/posts/` as JSON, authenticated
//! with a pre-issued bearer token. The body HTML is the hosted image followed
//! by one paragraph of rewritten text.

use crate::error::PipelineError;
use crate::models::BlogPost;
use crate::utils::{escape_html, truncate_for_log};
use reqwest::{Client, StatusCode};
use tracing::{info, instrument, warn};

/// Assemble the post body.
///
/// # Arguments
///
/// * `title` - Post title, taken verbatim from the trend topic
/// * `content` - The rewritten article text
/// * `image_url` - Where the enhanced image is hosted
/// * `labels` - Labels attached to the post
///
/// # Returns
///
/// A [`BlogPost`] whose content is `<img src='…'/><p>…</p>`, with the image
/// URL and the text HTML-escaped.
pub fn render_post(title: &str, content: &str, image_url: &str, labels: &[String]) -> BlogPost {
    BlogPost {
        title: title.to_string(),
        content: format!(
            "<img src='{}'/><p>{}</p>",
            escape_html(image_url),
            escape_html(content)
        ),
        labels: labels.to_vec(),
    }
}

/// Submit `post` and return the platform's HTTP status.
///
/// The status is returned as-is, success or not; only transport failures are
/// errors.
///
/// # Arguments
///
/// * `api_base` - Blogger API root, e.g. `https://www.googleapis.com/blogger/v3`
/// * `blog_id` - Target blog
/// * `access_token` - OAuth bearer token
/// * `post` - The rendered post
#[instrument(level = "info", skip(client, access_token, post), fields(title = %post.title))]
pub async fn publish_post(
    client: &Client,
    api_base: &str,
    blog_id: &str,
    access_token: &str,
    post: &BlogPost,
) -> Result<StatusCode, PipelineError> {
    let endpoint = format!("{}/blogs/{}/posts/", api_base.trim_end_matches('/'), blog_id);
    let response = client
        .post(&endpoint)
        .bearer_auth(access_token)
        .json(post)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        info!(%status, "Post published");
    } else {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %truncate_for_log(&body, 300), "Blog refused post");
    }
    Ok(status)
}
