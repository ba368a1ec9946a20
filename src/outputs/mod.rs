//! Outbound side of the pipeline: where finished work is published.
//!
//! # Submodules
//!
//! - [`imgbb`]: uploads the enhanced JPEG and returns its public URL
//! - [`blogger`]: renders the post HTML and creates the blog post
//!
//! The image is always uploaded first; a post is only created once the
//! image has a public URL to embed.

pub mod blogger;
pub mod imgbb;
