// src/crawl/queue.rs
// =============================================================================
// This module implements the email crawl with a breadth-first approach.
//
// How it works:
// 1. Start with the initial URL in a queue (the "frontier")
// 2. Pop the oldest address, mark it visited, fetch it
// 3. Collect every email-like token from the raw page text
// 4. Normalize each <a href> and queue the ones that are on the same host,
//    not visited yet and not already waiting in the queue
// 5. Repeat until the queue is empty or `max_pages` attempts were made
//
// A failed fetch (timeout, DNS, 404, ...) just skips that address. The crawl
// as a whole never fails once the start URL has parsed; it returns whatever
// it collected.
//
// Rust concepts:
// - HashSet: To track visited URLs (O(1) lookup)
// - VecDeque: Double-ended queue for breadth-first crawling
// - Generics: The fetcher and link extractor are plugged in from outside
// =============================================================================

use super::emails::extract_emails;
use super::fetch::Fetcher;
use super::links::{is_same_domain, normalize_link, AnchorExtractor, PageContext};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL has no host: {0}")]
    NoHost(String),
}

// The queue of addresses still to visit
//
// The VecDeque gives FIFO order; the HashSet mirrors its contents so
// "is this already queued?" doesn't have to scan the whole queue.
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
}

impl Frontier {
    // Returns false (and does nothing) if the address is already queued
    fn push(&mut self, address: String) -> bool {
        if !self.pending.insert(address.clone()) {
            return false;
        }
        self.queue.push_back(address);
        true
    }

    fn pop(&mut self) -> Option<String> {
        let address = self.queue.pop_front()?;
        self.pending.remove(&address);
        Some(address)
    }

    fn contains(&self, address: &str) -> bool {
        self.pending.contains(address)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// What a crawl produced, whether it ran to the end or was interrupted.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub emails: BTreeSet<String>,
    /// Dequeue attempts made, counted against `max_pages`
    pub attempts: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub visited: usize,
    /// Addresses discovered but never dequeued
    pub pending_left: usize,
}

/// A single-site email crawler.
///
/// All crawl state lives on this value. `run` can be raced against a
/// shutdown signal: dropping it between fetches leaves `report()` accurate
/// for everything processed so far.
pub struct Crawler<F, A> {
    fetcher: F,
    extractor: A,
    start_url: String,
    start: Url,
    max_pages: usize,
    frontier: Frontier,
    visited: HashSet<String>,
    emails: BTreeSet<String>,
    attempts: usize,
    pages_fetched: usize,
    pages_failed: usize,
}

impl<F: Fetcher, A: AnchorExtractor> Crawler<F, A> {
    // Prepares a crawl rooted at `start_url`
    //
    // This is the only place a crawl can fail outright: the start address
    // must parse and must have a host to compare links against.
    pub fn new(start_url: &str, max_pages: usize, fetcher: F, extractor: A) -> Result<Self, CrawlError> {
        let start = Url::parse(start_url).map_err(|source| CrawlError::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;

        if start.host_str().is_none() {
            return Err(CrawlError::NoHost(start_url.to_string()));
        }

        let mut frontier = Frontier::default();
        frontier.push(start_url.to_string());

        Ok(Self {
            fetcher,
            extractor,
            start_url: start_url.to_string(),
            start,
            max_pages,
            frontier,
            visited: HashSet::new(),
            emails: BTreeSet::new(),
            attempts: 0,
            pages_fetched: 0,
            pages_failed: 0,
        })
    }

    // Runs the traversal until the frontier is empty or the limit is hit
    pub async fn run(&mut self) {
        while !self.frontier.is_empty() && self.attempts < self.max_pages {
            self.attempts += 1;

            let Some(address) = self.frontier.pop() else {
                break;
            };

            // Counts as an attempt even though nothing is fetched
            if self.visited.contains(&address) {
                debug!("Already visited {}, skipping", address);
                continue;
            }
            self.visited.insert(address.clone());

            info!("[{}] Processing {}", self.attempts, address);

            let page = match self.fetcher.fetch(&address).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Failed to fetch {}: {}, skipping", address, e);
                    self.pages_failed += 1;
                    continue;
                }
            };
            self.pages_fetched += 1;
            debug!("Fetched {} (HTTP {}, {} bytes)", address, page.status, page.body.len());

            self.emails.extend(extract_emails(&page.body));
            self.enqueue_links(&address, &page.body);
        }
    }

    // Queues the same-domain links of a fetched page
    fn enqueue_links(&mut self, address: &str, body: &str) {
        let ctx = match PageContext::from_address(address) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("Cannot resolve links on {}: {}", address, e);
                return;
            }
        };

        for href in self.extractor.extract_hrefs(body) {
            let link = normalize_link(&href, &ctx);

            if self.visited.contains(&link) || self.frontier.contains(&link) {
                continue;
            }
            if !is_same_domain(&self.start, &link) {
                debug!("Off-site link {}, discarded", link);
                continue;
            }

            debug!("Queued {}", link);
            self.frontier.push(link);
        }
    }

    pub fn report(&self) -> CrawlReport {
        CrawlReport {
            start_url: self.start_url.clone(),
            emails: self.emails.clone(),
            attempts: self.attempts,
            pages_fetched: self.pages_fetched,
            pages_failed: self.pages_failed,
            visited: self.visited.len(),
            pending_left: self.frontier.len(),
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why keep both a VecDeque and a HashSet in the Frontier?
//    - VecDeque remembers the order (oldest first = breadth-first)
//    - HashSet answers "already queued?" in O(1)
//    - push/pop keep the two in sync
//
// 2. Why does a skipped (already visited) address still count?
//    - `max_pages` bounds dequeue attempts, not successful fetches
//    - A site full of broken links still ends after `max_pages` steps
//
// 3. What is `let ... else`?
//    - Pattern match that must succeed, otherwise run the else block
//    - The else block has to diverge (break, continue, return, panic)
//
// 4. Why generics (F, A) instead of Box<dyn Trait>?
//    - The fetcher returns a future; generics keep it zero-cost
//    - Tests plug in an in-memory site without any HTTP
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::{FetchError, Page};
    use crate::crawl::links::HtmlAnchorExtractor;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // An in-memory website: address -> HTML. Anything else is a 404.
    // Addresses listed in `hang` never answer.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        hang: HashSet<String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSite {
        fn page(mut self, address: &str, html: &str) -> Self {
            self.pages.insert(address.to_string(), html.to_string());
            self
        }

        fn hanging(mut self, address: &str) -> Self {
            self.hang.insert(address.to_string());
            self
        }

        fn log(&self) -> Arc<Mutex<Vec<String>>> {
            self.log.clone()
        }
    }

    impl Fetcher for FakeSite {
        async fn fetch(&self, address: &str) -> Result<Page, FetchError> {
            self.log.lock().unwrap().push(address.to_string());
            if self.hang.contains(address) {
                std::future::pending::<()>().await;
            }
            match self.pages.get(address) {
                Some(body) => Ok(Page {
                    status: 200,
                    body: body.clone(),
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn crawler(site: FakeSite, max_pages: usize) -> Crawler<FakeSite, HtmlAnchorExtractor> {
        Crawler::new("http://example.com/", max_pages, site, HtmlAnchorExtractor).unwrap()
    }

    #[test]
    fn test_frontier_is_fifo_and_deduplicated() {
        let mut frontier = Frontier::default();
        assert!(frontier.push("a".to_string()));
        assert!(frontier.push("b".to_string()));
        assert!(!frontier.push("a".to_string()));
        assert_eq!(frontier.len(), 2);

        assert_eq!(frontier.pop().as_deref(), Some("a"));
        assert!(!frontier.contains("a"));
        assert!(frontier.push("a".to_string()));
        assert_eq!(frontier.pop().as_deref(), Some("b"));
        assert_eq!(frontier.pop().as_deref(), Some("a"));
        assert!(frontier.pop().is_none());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_invalid_start_url() {
        let result = Crawler::new("no scheme here", 10, FakeSite::default(), HtmlAnchorExtractor);
        assert!(matches!(result, Err(CrawlError::InvalidUrl { .. })));

        let result = Crawler::new("mailto:x@y.com", 10, FakeSite::default(), HtmlAnchorExtractor);
        assert!(matches!(result, Err(CrawlError::NoHost(_))));
    }

    #[tokio::test]
    async fn test_start_page_404() {
        let site = FakeSite::default();
        let log = site.log();
        let mut crawler = crawler(site, 100);
        crawler.run().await;

        let report = crawler.report();
        assert!(report.emails.is_empty());
        assert_eq!(report.attempts, 1);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pending_left, 0);
        assert_eq!(*log.lock().unwrap(), vec!["http://example.com/"]);
    }

    #[tokio::test]
    async fn test_limit_one_fetches_only_start() {
        let site = FakeSite::default().page(
            "http://example.com/",
            r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
               <a href="/d">d</a><a href="/e">e</a>"#,
        );
        let log = site.log();
        let mut crawler = crawler(site, 1);
        crawler.run().await;

        let report = crawler.report();
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(report.visited, 1);
        assert_eq!(report.pending_left, 5);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let site = FakeSite::default()
            .page("http://example.com/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("http://example.com/a", r#"<a href="/a/deep">deep</a>"#)
            .page("http://example.com/b", "")
            .page("http://example.com/a/deep", "");
        let log = site.log();
        let mut crawler = crawler(site, 100);
        crawler.run().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "http://example.com/",
                "http://example.com/a",
                "http://example.com/b",
                "http://example.com/a/deep",
            ]
        );
    }

    #[tokio::test]
    async fn test_each_address_fetched_once() {
        // Pages link back to each other and to the start page
        let site = FakeSite::default()
            .page("http://example.com/", r#"<a href="/x">x</a><a href="/y">y</a><a href="/x">x</a>"#)
            .page("http://example.com/x", r#"<a href="/">home</a><a href="/y">y</a>"#)
            .page("http://example.com/y", r#"<a href="/x">x</a><a href="http://example.com/">home</a>"#);
        let log = site.log();
        let mut crawler = crawler(site, 100);
        crawler.run().await;

        let log = log.lock().unwrap();
        let unique: HashSet<_> = log.iter().collect();
        assert_eq!(log.len(), 3);
        assert_eq!(unique.len(), 3);
        assert_eq!(crawler.report().attempts, 3);
    }

    #[tokio::test]
    async fn test_never_leaves_start_host() {
        let site = FakeSite::default().page(
            "http://example.com/",
            r#"<a href="https://other.org/contact">x</a>
               <a href="http://sub.example.com/">sub</a>
               <a href="http://example.com:9000/">port</a>
               <a href="/team">team</a>"#,
        );
        let log = site.log();
        let mut crawler = crawler(site, 100);
        crawler.run().await;

        for address in log.lock().unwrap().iter() {
            assert!(is_same_domain(&crawler.start, address), "left the site: {}", address);
        }
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_visited_never_exceeds_limit() {
        let mut html = String::new();
        for i in 0..30 {
            html.push_str(&format!(r#"<a href="/p{}">p</a>"#, i));
        }

        for limit in [0, 1, 2, 7, 30, 100] {
            let mut site = FakeSite::default().page("http://example.com/", &html);
            for i in 0..30 {
                site = site.page(&format!("http://example.com/p{}", i), &html);
            }
            let mut crawler = crawler(site, limit);
            crawler.run().await;

            let report = crawler.report();
            assert!(report.visited <= limit);
            assert!(crawler.frontier.queue.iter().all(|a| is_same_domain(&crawler.start, a)));
            assert!(crawler.frontier.queue.iter().all(|a| !crawler.visited.contains(a)));
        }
    }

    #[tokio::test]
    async fn test_collects_emails_across_pages() {
        let site = FakeSite::default()
            .page(
                "http://example.com/",
                r#"<p>Sales@Example.com</p><a href="contact.html">contact</a><a href="/gone">gone</a>"#,
            )
            .page("http://example.com/contact.html", "<p>sales@example.com, jobs@example.com</p>");
        let mut crawler = crawler(site, 100);
        crawler.run().await;

        let report = crawler.report();
        let emails: Vec<_> = report.emails.iter().map(String::as_str).collect();
        assert_eq!(emails, vec!["Sales@Example.com", "jobs@example.com", "sales@example.com"]);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_failed, 1);
    }

    #[tokio::test]
    async fn test_interrupted_crawl_keeps_progress() {
        let site = FakeSite::default()
            .page("http://example.com/", r#"owner@example.com <a href="/slow">slow</a>"#)
            .hanging("http://example.com/slow");
        let mut crawler = crawler(site, 100);

        tokio::select! {
            _ = crawler.run() => panic!("crawl should still be waiting on /slow"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }

        let report = crawler.report();
        assert!(report.emails.contains("owner@example.com"));
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.visited, 2);
    }
}
