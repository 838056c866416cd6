// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate,
// plus the small interactive prompts used when something wasn't passed
// on the command line.
//
// Running the binary with no subcommand behaves like `crawl` with all
// defaults: it asks for the start URL and goes.
// =============================================================================

use crate::config::DEFAULT_MAX_PAGES;
use crate::output::DEFAULT_OUTPUT;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "email-harvester",
    version,
    about = "Crawl a website for email addresses, or tally notification usage",
    long_about = "email-harvester walks a single website breadth-first, collects every email-like \
                  address it sees and saves them to CSV. It can then mail the collected addresses. \
                  The `usage` command sums this month's notification deliveries per channel."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and collect email addresses
    ///
    /// Example: email-harvester crawl https://example.com --max-pages 50
    Crawl(CrawlArgs),

    /// Tally this month's notification deliveries by channel
    ///
    /// Needs ONESIGNAL_APP_ID and ONESIGNAL_API_KEY (a .env file works too)
    Usage {
        /// Output the tally as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Website URL to start from (asked for interactively if omitted)
    pub start_url: Option<String>,

    /// Maximum number of addresses to attempt before stopping
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// CSV file to write the collected addresses to (overwritten)
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// After saving, send a message to every collected address
    #[arg(long)]
    pub send_mail: bool,

    /// Print the crawl report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for CrawlArgs {
    fn default() -> Self {
        Self {
            start_url: None,
            max_pages: DEFAULT_MAX_PAGES,
            output: PathBuf::from(DEFAULT_OUTPUT),
            send_mail: false,
            json: false,
        }
    }
}

// Prints `label`, reads one line from stdin and returns it trimmed
//
// The read runs on tokio's blocking pool, off the runtime workers.
pub async fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let answer = tokio::task::spawn_blocking(|| read_answer(io::stdin().lock()))
        .await
        .context("stdin reader stopped")?;

    answer.context("failed to read from stdin")
}

fn read_answer(mut reader: impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
