//! harvest CLI: scrape the source channel, send today's messages or digest, show stats,
//! run the daily schedule. Config from env (.env supported).

use anyhow::{bail, Context, Result};
use clap::Parser;
use field_extractor::{build_extractor, EnvExtractorConfig};
use harvest_cli::{Cli, Commands};
use harvest_core::{init_tracing, HarvestConfig, Messenger};
use pipeline::{build_harvester, format_stats, run_schedule, Harvester, Schedule, SendReport, StopReason};
use std::sync::Arc;
use tracing::{error, info};
use webdriver_messenger::{WebDriverConfig, WebMessenger};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = HarvestConfig::from_env().context("Load configuration from environment")?;
    init_tracing(&config.log_file, config.debug)?;

    info!(
        source = %config.source_channel,
        destination = %config.destination_channel,
        database_url = %config.database_url,
        "Starting harvest"
    );

    let extractor = build_extractor(&EnvExtractorConfig::from_env())?;
    let messenger: Arc<dyn Messenger> = Arc::new(
        WebMessenger::new(WebDriverConfig::from_env()).context("Create WebDriver messenger")?,
    );
    let harvester = build_harvester(&config, messenger, extractor)
        .await
        .context("Initialize message storage")?;

    match cli.command {
        Commands::Scrape => handle_scrape(&harvester).await,
        Commands::ScrapeOnce => handle_scrape_once(&harvester).await,
        Commands::Send => {
            let report = harvester.reporter.send_individual().await?;
            print_send_report("Individual send", &report)
        }
        Commands::Digest => {
            let report = harvester.reporter.send_digest().await?;
            print_send_report("Digest", &report)
        }
        Commands::Stats => handle_stats(&harvester).await,
        Commands::Auto => handle_auto(&config, &harvester).await,
        Commands::Purge { yes } => handle_purge(&harvester, yes).await,
    }
}

async fn handle_scrape(harvester: &Harvester) -> Result<()> {
    let report = harvester.convergence.run().await?;
    match &report.stop {
        StopReason::Converged => println!(
            "Scrape converged after {} attempt(s): {} new message(s)",
            report.attempts, report.new_records
        ),
        StopReason::BudgetExhausted => println!(
            "Scrape stopped after {} attempt(s) (budget spent): {} new message(s)",
            report.attempts, report.new_records
        ),
        StopReason::CycleFailed(reason) => {
            error!(reason = %reason, "Scrape failed");
            bail!(
                "Scrape failed on attempt {} after {} new message(s): {}",
                report.attempts,
                report.new_records,
                reason
            );
        }
    }
    Ok(())
}

async fn handle_scrape_once(harvester: &Harvester) -> Result<()> {
    let report = harvester
        .pipeline
        .run_cycle()
        .await
        .context("Ingestion cycle failed")?;
    println!(
        "Fetched {}, stored {}, duplicates {}, discarded {}, failed {}",
        report.fetched, report.stored, report.duplicates, report.discarded, report.failed
    );
    Ok(())
}

fn print_send_report(what: &str, report: &SendReport) -> Result<()> {
    if report.nothing_to_send() {
        println!("{}: no messages stored today, nothing sent", what);
        return Ok(());
    }
    println!(
        "{}: {} record(s), {} sent, {} failed",
        what, report.records, report.sent, report.failed
    );
    if report.sent == 0 {
        bail!("{} failed: nothing was delivered", what);
    }
    Ok(())
}

async fn handle_stats(harvester: &Harvester) -> Result<()> {
    let records = harvester.reporter.today_records().await?;
    let stats = harvester.reporter.stats().await?;
    println!("{}", format_stats(&records, &stats));
    Ok(())
}

async fn handle_auto(config: &HarvestConfig, harvester: &Harvester) -> Result<()> {
    let schedule = Schedule::from_config(&config.schedule);
    println!(
        "Continuous mode: {} scheduled task(s), polling every {}s. Ctrl-C to stop.",
        schedule.entries().len(),
        config.schedule.poll_interval.as_secs()
    );

    run_schedule(&schedule, harvester, config.schedule.poll_interval, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await;

    println!("Stopped");
    Ok(())
}

async fn handle_purge(harvester: &Harvester, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete all stored messages without --yes");
    }
    let deleted = harvester.repo.purge_all().await?;
    println!("Deleted {} message(s)", deleted);
    Ok(())
}
