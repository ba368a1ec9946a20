//! One cycle of the content pipeline.
//!
//! ```text
//! fetch trends ─┬─ topic 1: scrape → rewrite → enhance image → upload → post
//!               ├─ topic 2: …
//!               └─ topic n (n ≤ max_items)
//! ```
//!
//! Topics are processed strictly one after another. A failure anywhere in a
//! topic's chain is caught, logged and reported as that topic's
//! [`ItemOutcome`]; the next topic is still processed. Only a failure to read
//! the trend feed aborts the cycle.

use crate::api::ChatClient;
use crate::config::{Credentials, Settings};
use crate::error::PipelineError;
use crate::imaging;
use crate::models::{Article, CycleReport, ItemOutcome, TrendItem, UploadOutcome};
use crate::outputs::{blogger, imgbb};
use crate::scrapers::{article, trends};
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Everything one cycle needs: an HTTP client, settings and credentials.
#[derive(Debug)]
pub struct Pipeline {
    client: Client,
    chat: ChatClient,
    settings: Settings,
    credentials: Credentials,
}

impl Pipeline {
    pub fn new(settings: Settings, credentials: Credentials) -> Result<Self, PipelineError> {
        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        let chat = ChatClient::new(client.clone(), &settings, &credentials);
        Ok(Self {
            client,
            chat,
            settings,
            credentials,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one full cycle and summarize it.
    ///
    /// Prints one status line per topic on stdout.
    ///
    /// # Errors
    ///
    /// Only trend feed failures; per-topic failures are folded into the
    /// returned [`CycleReport`].
    #[instrument(level = "info", skip_all)]
    pub async fn run_cycle(&self) -> Result<CycleReport, PipelineError> {
        let mut report = CycleReport::new(Utc::now());
        let topics = trends::fetch_trending(&self.client, &self.settings).await?;

        for (index, topic) in topics.iter().enumerate() {
            let outcome = self.process_item(topic).await;
            match &outcome {
                ItemOutcome::Failed(e) => {
                    error!(index, title = %topic.title, error = %e, "Topic failed; continuing with next")
                }
                ItemOutcome::ImageUploadFailed { status } => {
                    warn!(index, title = %topic.title, %status, "Image upload failed; post skipped")
                }
                ItemOutcome::PostRejected { status } => {
                    warn!(index, title = %topic.title, %status, "Post rejected")
                }
                ItemOutcome::Posted { status } => {
                    info!(index, title = %topic.title, %status, "Topic posted")
                }
            }
            println!("{}", outcome.status_line(&topic.title));
            report.record(&outcome);
        }

        info!(started_at = %report.started_at, %report, "Cycle complete");
        Ok(report)
    }

    /// Push a single topic through scrape, rewrite, image and post.
    #[instrument(level = "info", skip_all, fields(title = %item.title, link = %item.link))]
    pub async fn process_item(&self, item: &TrendItem) -> ItemOutcome {
        match self.try_process(item).await {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    async fn try_process(&self, item: &TrendItem) -> Result<ItemOutcome, PipelineError> {
        let settings = &self.settings;

        let article = article::fetch_article(
            &self.client,
            &item.link,
            &settings.user_agent,
            settings.max_article_chars,
        )
        .await?;
        let source = self.image_source(&article)?;
        let rewritten = self.chat.rewrite(&article.text).await?;

        let raw = imaging::download_image(&self.client, &source).await?;
        let jpeg = imaging::enhance(&raw, settings.sharpness, settings.jpeg_quality)?;

        let hosted = match imgbb::upload_image(
            &self.client,
            &settings.imgbb_upload_url,
            &self.credentials.imgbb_api_key,
            jpeg,
        )
        .await?
        {
            UploadOutcome::Hosted(url) => url,
            UploadOutcome::NoUrl { status } => {
                return Ok(ItemOutcome::ImageUploadFailed { status });
            }
        };

        let post = blogger::render_post(&item.title, &rewritten, &hosted, &settings.labels);
        let status = blogger::publish_post(
            &self.client,
            &settings.blogger_api_base,
            &self.credentials.blogger_blog_id,
            &self.credentials.blogger_access_token,
            &post,
        )
        .await?;

        Ok(if status.is_success() {
            ItemOutcome::Posted { status }
        } else {
            ItemOutcome::PostRejected { status }
        })
    }

    /// The page's lead image, else the configured fallback.
    fn image_source(&self, article: &Article) -> Result<String, PipelineError> {
        article
            .image_url
            .as_ref()
            .map(|url| url.to_string())
            .or_else(|| self.settings.fallback_image_url.clone())
            .ok_or_else(|| PipelineError::NoImage(article.url.clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use std::io::Cursor;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn credentials() -> Credentials {
        Credentials {
            openai_api_key: "sk-test".to_string(),
            imgbb_api_key: "imgbb-test".to_string(),
            blogger_blog_id: "BLOG".to_string(),
            blogger_access_token: "token".to_string(),
        }
    }

    pub(crate) fn settings_for(server: &MockServer) -> Settings {
        Settings {
            feed_url: format!("{}/trends", server.uri()),
            openai_base_url: format!("{}/v1", server.uri()),
            imgbb_upload_url: format!("{}/upload", server.uri()),
            blogger_api_base: format!("{}/blogger/v3", server.uri()),
            ..Settings::default()
        }
    }

    pub(crate) fn feed(items: &[(&str, String)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link)| format!("<item><title>{title}</title><link>{link}</link></item>"))
            .collect();
        format!("<rss version=\"2.0\"><channel><title>Trends</title>{items}</channel></rss>")
    }

    fn png() -> Vec<u8> {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 90]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    async fn mount_feed(server: &MockServer, body: String) {
        Mock::given(method("GET"))
            .and(path("/trends"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_article(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(server)
            .await;
    }

    fn article_html(server: &MockServer, text: &str) -> String {
        format!(
            r#"<html><head><meta property="og:image" content="{}/lead.png"></head>
               <body><p>{text}</p></body></html>"#,
            server.uri()
        )
    }

    /// Mounts the rewrite, image download and upload endpoints, each expected
    /// to be hit `calls` times.
    async fn mount_services(server: &MockServer, calls: u64, upload_status: u16) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Rewritten story" } }]
            })))
            .expect(calls)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lead.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
            .expect(calls)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(upload_status).set_body_json(json!({
                "data": { "url": "https://i.ibb.co/lead.jpg" }
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    async fn mount_blogger(server: &MockServer, calls: u64, status: u16) {
        Mock::given(method("POST"))
            .and(path("/blogger/v3/blogs/BLOG/posts/"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": "p" })))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_failing_topic_does_not_stop_the_cycle() {
        let server = MockServer::start().await;
        let links: Vec<(String, String)> = (1..=5)
            .map(|n| (format!("Sports story {n}"), format!("{}/article/{n}", server.uri())))
            .collect();
        let items: Vec<(&str, String)> =
            links.iter().map(|(t, l)| (t.as_str(), l.clone())).collect();
        mount_feed(&server, feed(&items)).await;

        for n in [1, 2, 4, 5] {
            mount_article(&server, &format!("/article/{n}"), article_html(&server, "Body")).await;
        }
        Mock::given(method("GET"))
            .and(path("/article/3"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_services(&server, 4, 200).await;
        mount_blogger(&server, 4, 200).await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let report = pipeline.run_cycle().await.unwrap();

        assert_eq!(report.topics, 5);
        assert_eq!(report.posted, 4);
        assert_eq!(report.failed, 1);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_only_keyword_topics_are_posted() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            feed(&[
                ("Team X wins championship sports final", format!("{}/a", server.uri())),
                ("Election results", format!("{}/b", server.uri())),
            ]),
        )
        .await;
        mount_article(&server, "/a", article_html(&server, "Team X won.")).await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_services(&server, 1, 200).await;
        Mock::given(method("POST"))
            .and(path("/blogger/v3/blogs/BLOG/posts/"))
            .and(body_partial_json(json!({
                "title": "Team X wins championship sports final",
                "content": "<img src='https://i.ibb.co/lead.jpg'/><p>Rewritten story</p>",
                "labels": ["Trending", "Sports"]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let report = pipeline.run_cycle().await.unwrap();

        assert_eq!(report.topics, 1);
        assert_eq!(report.posted, 1);
    }

    #[tokio::test]
    async fn test_upload_refusal_skips_post() {
        let server = MockServer::start().await;
        let item = TrendItem {
            title: "Sport".to_string(),
            link: format!("{}/a", server.uri()),
        };
        mount_article(&server, "/a", article_html(&server, "Body")).await;
        mount_services(&server, 1, 400).await;
        mount_blogger(&server, 0, 200).await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let outcome = pipeline.process_item(&item).await;

        assert!(matches!(
            outcome,
            ItemOutcome::ImageUploadFailed { status } if status.as_u16() == 400
        ));
    }

    #[tokio::test]
    async fn test_post_rejection_is_reported() {
        let server = MockServer::start().await;
        let item = TrendItem {
            title: "Sport".to_string(),
            link: format!("{}/a", server.uri()),
        };
        mount_article(&server, "/a", article_html(&server, "Body")).await;
        mount_services(&server, 1, 200).await;
        mount_blogger(&server, 1, 403).await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let outcome = pipeline.process_item(&item).await;

        assert!(matches!(
            outcome,
            ItemOutcome::PostRejected { status } if status.as_u16() == 403
        ));
    }

    #[tokio::test]
    async fn test_fallback_image_used_when_page_has_none() {
        let server = MockServer::start().await;
        let item = TrendItem {
            title: "Sport".to_string(),
            link: format!("{}/a", server.uri()),
        };
        mount_article(&server, "/a", "<p>No pictures here</p>".to_string()).await;
        mount_services(&server, 1, 200).await;
        mount_blogger(&server, 1, 200).await;

        let settings = Settings {
            fallback_image_url: Some(format!("{}/lead.png", server.uri())),
            ..settings_for(&server)
        };
        let pipeline = Pipeline::new(settings, credentials()).unwrap();
        let outcome = pipeline.process_item(&item).await;

        assert!(matches!(outcome, ItemOutcome::Posted { .. }));
    }

    #[tokio::test]
    async fn test_missing_image_without_fallback_fails_topic() {
        let server = MockServer::start().await;
        let item = TrendItem {
            title: "Sport".to_string(),
            link: format!("{}/a", server.uri()),
        };
        mount_article(&server, "/a", "<p>No pictures here</p>".to_string()).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Rewritten story" } }]
            })))
            .expect(0)
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let outcome = pipeline.process_item(&item).await;

        assert!(matches!(outcome, ItemOutcome::Failed(PipelineError::NoImage(_))));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_every_request_carries_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lead.png"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trends"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let raw = imaging::download_image(&pipeline.client, &format!("{}/lead.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(raw, png());
        pipeline.run_cycle().await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_cycle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trends"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        assert!(pipeline.run_cycle().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_feed_is_empty_cycle() {
        let server = MockServer::start().await;
        mount_feed(&server, feed(&[])).await;

        let pipeline = Pipeline::new(settings_for(&server), credentials()).unwrap();
        let report = pipeline.run_cycle().await.unwrap();
        assert_eq!(report.topics, 0);
    }
}
