//! Inbound side of the pipeline: discovering topics and reading their pages.
//!
//! | Stage | Module | Method |
//! |-------|--------|--------|
//! | Topic discovery | [`trends`] | RSS feed, keyword filter |
//! | Article text and lead image | [`article`] | HTML scraping |
//!
//! Both modules are sequential and make exactly one request per call.

pub mod article;
pub mod trends;
