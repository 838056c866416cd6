// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling for email addresses.
//
// Features:
// - Breadth-first crawling starting from a URL
// - Same-domain restriction (doesn't wander off to external sites)
// - Hard limit on how many addresses are attempted
// - Email-like tokens collected from every page's raw HTML
//
// Submodules:
// - queue: the traversal itself (Crawler, CrawlReport)
// - fetch: the Fetcher trait and its reqwest implementation
// - links: link normalization, same-domain check, <a href> extraction
// - emails: the email pattern
// =============================================================================

mod emails;
mod fetch;
mod links;
mod queue;

pub use fetch::{Fetcher, HttpFetcher};
pub use links::{AnchorExtractor, HtmlAnchorExtractor};
pub use queue::{CrawlReport, Crawler};
