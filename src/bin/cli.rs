use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use sharp_shooter::schedule::{league_now, next_window_description, resolve, LAST_WEEK};
use sharp_shooter::{
    Config, OddsApiClient, OddsSource, ReplaySource, RunReport, RunRequest, WeeklyWorkflow,
    WorkbookStore,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[command(name = "cli", about = "NFL odds and player prop snapshot collector")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Collect the snapshot due now and write it to the workbook
    Collect {
        /// NFL week (defaults to the week of today's date)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=LAST_WEEK as i64))]
        week: Option<u8>,

        /// force a snapshot number instead of using the schedule
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=6))]
        snapshot: Option<u8>,

        /// replay raw payloads cached in this directory instead of calling the API
        #[arg(long)]
        replay: Option<PathBuf>,

        /// pretend the current time is this RFC 3339 timestamp
        #[arg(long, value_parser = parse_at)]
        at: Option<DateTime<Utc>>,

        /// print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which snapshot is due and the NFL week
    Schedule {
        #[arg(long, value_parser = parse_at)]
        at: Option<DateTime<Utc>>,
    },

    /// Show remaining Odds API quota
    Usage,
}

fn parse_at(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("invalid timestamp {s}: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sharp_shooter=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = Config::from_env()?;

    match args.command {
        Command::Collect {
            week,
            snapshot,
            replay,
            at,
            json,
        } => {
            let source: Box<dyn OddsSource> = match replay {
                Some(dir) => {
                    println!("Replaying cached data from {}\n", dir.display());
                    Box::new(ReplaySource::new(dir))
                }
                None => Box::new(OddsApiClient::from_config(&config)?),
            };
            let store = WorkbookStore::new(config.workbook_dir.clone());
            let workflow = WeeklyWorkflow::new(source.as_ref(), &store, config.calendar())
                .with_archive_dir(config.collected_data_dir.clone());

            let request = RunRequest {
                now: at.unwrap_or_else(Utc::now),
                week,
                snapshot,
            };
            let report = workflow.run(request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if !report.success && !report.is_no_op() {
                std::process::exit(1);
            }
        }
        Command::Schedule { at } => {
            let now = at.unwrap_or_else(Utc::now);
            let local = league_now(now);

            println!("League time: {}", local.format("%A %Y-%m-%d %H:%M"));
            match config.calendar().week_of(local.date()) {
                Some(week) => println!("NFL week: {}", week),
                None => println!("NFL week: outside the season calendar"),
            }
            match resolve(local) {
                Some(window) => println!(
                    "Due: snapshot {} - {} ({:?})",
                    window.number,
                    window.description(),
                    window.matched
                ),
                None => println!("Due: nothing"),
            }
            println!("Next: {}", next_window_description(local));
        }
        Command::Usage => {
            let client = OddsApiClient::from_config(&config)?;
            let usage = client.check_usage().await?;
            println!(
                "API requests remaining: {}",
                usage.remaining.map_or("unknown".to_string(), |n| n.to_string())
            );
            println!(
                "API requests used: {}",
                usage.used.map_or("unknown".to_string(), |n| n.to_string())
            );
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    let week = report.week.map_or("?".to_string(), |w| w.to_string());

    if report.success {
        println!("Week {} collection complete", week);
        if let (Some(snapshot), Some(description)) =
            (report.snapshot, &report.snapshot_description)
        {
            println!("Snapshot {}: {}", snapshot, description);
        }
        println!("  {} game lines", report.games_collected);
        println!("  {} player props", report.props_collected);
        println!("  {} anytime TD props", report.anytime_td_props_collected);
        println!("  {} rows written", report.rows_written);
        if report.skipped_records.total() > 0 {
            println!(
                "  {} records skipped ({} games, {} bookmakers, {} prop outcomes)",
                report.skipped_records.total(),
                report.skipped_records.games,
                report.skipped_records.bookmakers,
                report.skipped_records.props
            );
        }
        println!("  {} API requests made", report.api_requests_made);
        if let Some(file) = &report.data_file {
            println!("  saved to {}", file.display());
        }
        return;
    }

    if report.is_no_op() {
        println!("Nothing to collect for week {}", week);
    } else {
        println!("Week {} collection failed", week);
    }

    if let Some(error) = &report.error {
        println!("  {}", error);
    }
    if !report.existing_snapshots.is_empty() {
        let existing: Vec<String> = report.existing_snapshots.iter().map(u8::to_string).collect();
        println!("  Existing snapshots: {}", existing.join(", "));
    }
    if !report.available_games.is_empty() {
        println!("  Games this week:");
        for game in &report.available_games {
            println!(
                "    {} @ {} ({})",
                game.away_team,
                game.home_team,
                game.commence_time.as_deref().unwrap_or("TBD")
            );
        }
    }
    if let Some(suggestion) = &report.suggestion {
        println!("  {}", suggestion);
    }
}
