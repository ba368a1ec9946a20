//! Command-line interface definitions for Trend Blogger.
//!
//! Every credential can be given as a flag or through the environment
//! variable of the same name; running with no flags at all is the normal way
//! to start the service.

use crate::config::Credentials;
use clap::Parser;

/// Command-line arguments for the Trend Blogger service.
///
/// # Examples
///
/// ```sh
/// # Credentials from the environment, built-in settings
/// trend_blogger
///
/// # Custom settings, one cycle only
/// trend_blogger --config ./settings.yaml --once
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a settings YAML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// API key for the chat-completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// API key for the image host
    #[arg(long, env = "IMGBB_API_KEY", hide_env_values = true)]
    pub imgbb_api_key: String,

    /// Blog that receives the posts
    #[arg(long, env = "BLOGGER_BLOG_ID")]
    pub blogger_blog_id: String,

    /// Pre-issued OAuth bearer token for the blogging API
    #[arg(long, env = "BLOGGER_ACCESS_TOKEN", hide_env_values = true)]
    pub blogger_access_token: String,
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            openai_api_key: self.openai_api_key.clone(),
            imgbb_api_key: self.imgbb_api_key.clone(),
            blogger_blog_id: self.blogger_blog_id.clone(),
            blogger_access_token: self.blogger_access_token.clone(),
        }
    }
}
