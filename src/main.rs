// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, to stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the crawl or usage handler
// 4. Exit with proper code (0 = success, 1 = some mail failed, 2 = error,
//    130 = Ctrl-C during the mail step)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod harvest;
mod mail;
mod output;
mod usage;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, CrawlArgs, Commands};
use config::{CrawlConfig, MailConfig, UsageConfig};
use crawl::{CrawlReport, Crawler, HtmlAnchorExtractor, HttpFetcher};
use harvest::until_interrupted;
use mail::{Delivery, SmtpMailer};
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;
use usage::{UsageClient, UsageTally};

const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Crawl(args)) => handle_crawl(args).await,
        Some(Commands::Usage { json }) => handle_usage(json).await,
        None => handle_crawl(CrawlArgs::default()).await,
    }
}

// Handles the 'crawl' subcommand (and the bare invocation)
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let start_url = match args.start_url {
        Some(url) => url.trim().to_string(),
        None => cli::prompt("[+] Enter URL to scan: ").await?,
    };
    let config = CrawlConfig {
        start_url,
        max_pages: args.max_pages,
        output: args.output,
    };

    let crawler = Crawler::new(
        &config.start_url,
        config.max_pages,
        HttpFetcher::new()?,
        HtmlAnchorExtractor,
    )?;

    // Ctrl-C stops the crawl but not the save
    let harvest = harvest::crawl_and_save(crawler, &config.output, tokio::signal::ctrl_c())
        .await
        .with_context(|| format!("failed to write {}", config.output.display()))?;
    if harvest.interrupted {
        println!("\n[-] Interrupted by user, exiting.");
    }

    let report = harvest.report;
    print_report(&report, args.json)?;
    println!("\n[+] Emails saved to {}", config.output.display());

    if args.send_mail {
        if report.emails.is_empty() {
            println!("[-] Nothing to send.");
        } else {
            return match until_interrupted(handle_mail(&report.emails), tokio::signal::ctrl_c()).await {
                Some(result) => result,
                None => {
                    println!("\n[-] Interrupted by user, mail step abandoned.");
                    Ok(EXIT_INTERRUPTED)
                }
            };
        }
    }

    Ok(0)
}

// Asks for login and message, then mails every collected address
async fn handle_mail(recipients: &BTreeSet<String>) -> Result<i32> {
    let username = cli::prompt("[+] Sender email: ").await?;
    let password = match std::env::var("SMTP_PASSWORD") {
        Ok(password) => password,
        Err(_) => cli::prompt("[+] Sender password (or app password): ").await?,
    };
    let subject = cli::prompt("[+] Subject: ").await?;
    let body = cli::prompt("[+] Message: ").await?;

    let config = MailConfig::from_lookup(username, password, subject, body, |key| {
        std::env::var(key).ok()
    })?;

    let mailer = SmtpMailer::connect(&config)
        .await
        .with_context(|| format!("could not log in to {}:{}", config.relay, config.port))?;

    println!("\n📧 Sending to {} address(es)...\n", recipients.len());
    let deliveries = mail::send_bulk(&mailer, recipients, &config.subject, &config.body).await;
    mailer.close().await;
    print_deliveries(&deliveries);

    if deliveries.iter().all(Delivery::is_sent) {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Handles the 'usage' subcommand
async fn handle_usage(json: bool) -> Result<i32> {
    let config = UsageConfig::from_env()?;
    let client = UsageClient::new(config)?;

    let tally = client
        .fetch_usage(chrono::Utc::now())
        .await
        .context("failed to fetch notification usage")?;

    print_usage(&tally, json)?;
    Ok(0)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.emails.is_empty() {
        println!("\n[-] No emails found.");
    } else {
        println!("\n[+] Found {} unique email(s).", report.emails.len());
        for email in &report.emails {
            println!("   - {}", email);
        }
    }

    println!(
        "\n📊 {} page(s) fetched, {} failed, {} still queued",
        report.pages_fetched, report.pages_failed, report.pending_left
    );
    Ok(())
}

fn print_deliveries(deliveries: &[Delivery]) {
    for delivery in deliveries {
        match &delivery.error {
            None => println!("   ✅ {}", delivery.recipient),
            Some(error) => println!("   ❌ {} ({})", delivery.recipient, error),
        }
    }

    let sent = deliveries.iter().filter(|d| d.is_sent()).count();
    println!("\n📊 Summary:");
    println!("   ✅ Sent: {}", sent);
    println!("   ❌ Failed: {}", deliveries.len() - sent);
}

fn print_usage(tally: &UsageTally, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(tally)?;
        value["total"] = tally.total().into();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{:<15} {:>12}", "CHANNEL", "DELIVERED");
    println!("{}", "=".repeat(28));
    println!("{:<15} {:>12}", "mobile_push", tally.mobile_push);
    println!("{:<15} {:>12}", "web_push", tally.web_push);
    println!("{:<15} {:>12}", "email", tally.email);
    println!("{:<15} {:>12}", "sms", tally.sms);
    println!("{}", "-".repeat(28));
    println!("{:<15} {:>12}", "total", tally.total());
    Ok(())
}
