// src/harvest.rs
// =============================================================================
// Runs a crawl and saves what it found, with Ctrl-C as an early way out.
//
// The interrupt signal is passed in as a future, so main hands over
// tokio::signal::ctrl_c() and the tests hand over whatever they like.
// A signal future that fails (the handler could not be installed) is not
// treated as an interrupt: the work simply runs to the end.
// =============================================================================

use crate::crawl::{AnchorExtractor, CrawlReport, Crawler, Fetcher};
use crate::output;
use std::future::Future;
use std::io;
use std::path::Path;
use tracing::warn;

/// What a crawl left behind once its CSV is on disk.
#[derive(Debug)]
pub struct Harvest {
    pub report: CrawlReport,
    pub interrupted: bool,
}

// Polls `work` until it finishes or `signal` fires
//
// Returns None when interrupted. Dropping `work` at that point is fine for
// anything that keeps its state outside the future, like Crawler::run.
pub async fn until_interrupted<W, S>(work: W, signal: S) -> Option<W::Output>
where
    W: Future,
    S: Future<Output = io::Result<()>>,
{
    tokio::pin!(work);

    let signalled = tokio::select! {
        output = &mut work => return Some(output),
        result = signal => result,
    };

    match signalled {
        Ok(()) => None,
        Err(e) => {
            warn!("Could not listen for Ctrl-C, it will not stop this step: {}", e);
            Some(work.await)
        }
    }
}

// Crawls until done or interrupted, then writes the CSV either way
pub async fn crawl_and_save<F, A, S>(
    mut crawler: Crawler<F, A>,
    output: &Path,
    signal: S,
) -> csv::Result<Harvest>
where
    F: Fetcher,
    A: AnchorExtractor,
    S: Future<Output = io::Result<()>>,
{
    let interrupted = until_interrupted(crawler.run(), signal).await.is_none();

    let report = crawler.report();
    output::save_emails(output, &report.emails)?;

    Ok(Harvest {
        report,
        interrupted,
    })
}
