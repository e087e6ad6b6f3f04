use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use community_meta::api::state::AppState;
use community_meta::calculate::{
    champion_deck_distribution, deck_distribution, host_weekly_extract, rank_top_players,
    CHAMPION_WINDOW_MONTHS,
};
use community_meta::config::AppConfig;
use community_meta::listing::{EventQuery, SortKey, SortOrder};
use community_meta::models::{parse_event_date, EventRecord, YearMonth};
use community_meta::submission::{payload, EventDraft, SUBMISSION_SUBJECT};

#[derive(Parser)]
#[command(name = "community-meta")]
#[command(about = "Event statistics for a trading card game community site")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./config.toml")]
    config: PathBuf,

    /// Static site directory (overrides the configuration)
    #[arg(long, global = true)]
    site_dir: Option<PathBuf>,

    /// Reference date for windowed statistics (defaults to today)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Champions per format group
    TopPlayers {
        /// Trailing months to rank over
        #[arg(long, default_value = "1")]
        months: u32,
    },

    /// Deck participation per format group
    Decks {
        /// Trailing months to count
        #[arg(long, default_value = "6")]
        months: u32,

        /// Only count official events
        #[arg(long)]
        official_only: bool,
    },

    /// Champion decks over the last six months
    Champions,

    /// Events per host per week
    Hosts {
        /// Week order: desc (most recent first) or asc
        #[arg(long, default_value = "desc")]
        order: String,
    },

    /// List events with search and filters
    Events {
        /// Case-insensitive search over event titles
        #[arg(long)]
        q: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        format: Option<String>,

        #[arg(long)]
        official: Option<bool>,

        /// Sort key: when, title or host
        #[arg(long, default_value = "when")]
        sort: String,

        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: String,

        /// First month (YYYY-MM)
        #[arg(long)]
        from: Option<String>,

        /// Last month (YYYY-MM)
        #[arg(long)]
        to: Option<String>,
    },

    /// Load every month file and report skipped or duplicate records
    Validate,

    /// Turn a submission form draft (JSON) into an event record
    DraftEvent {
        /// Path to the draft JSON file
        path: PathBuf,
    },

    /// Start the API server
    Serve {
        /// Bind address (overrides the configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the configuration)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_now(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => parse_event_date(s).with_context(|| format!("Unrecognized date: {}", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn parse_month(raw: &str) -> Result<YearMonth> {
    raw.parse::<YearMonth>()
        .with_context(|| format!("Invalid month: {}", raw))
}

fn check_months(state: &AppState, months: u32) -> Result<()> {
    let max = state.config.max_window_months;
    anyhow::ensure!(months > 0, "months must be at least 1");
    anyhow::ensure!(months <= max, "months must be at most {}", max);
    Ok(())
}

async fn load_events(state: &AppState, now: NaiveDate, months: u32) -> Vec<EventRecord> {
    let window = months.max(state.config.window_months);
    state.loader.load_window(now, window).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(site_dir) = &cli.site_dir {
        config.site_dir = site_dir.clone();
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let json_layer = cli.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!cli.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Starting community-meta v{}", env!("CARGO_PKG_VERSION"));

    let now = resolve_now(cli.now.as_deref())?;
    let state = AppState::from_config(config)?;

    match cli.command {
        Commands::TopPlayers { months } => {
            check_months(&state, months)?;
            let events = load_events(&state, now, months).await;
            print_json(&rank_top_players(&events, months, now))?;
        }
        Commands::Decks {
            months,
            official_only,
        } => {
            check_months(&state, months)?;
            let events = load_events(&state, now, months).await;
            print_json(&deck_distribution(&events, months, official_only, now))?;
        }
        Commands::Champions => {
            let events = load_events(&state, now, CHAMPION_WINDOW_MONTHS).await;
            print_json(&champion_deck_distribution(&events, now))?;
        }
        Commands::Hosts { order } => {
            let order = order.parse::<SortOrder>().map_err(anyhow::Error::msg)?;
            let events = load_events(&state, now, state.config.window_months).await;
            let mut table = host_weekly_extract(&events);
            if order == SortOrder::Asc {
                table.weeks.reverse();
            }
            print_json(&table)?;
        }
        Commands::Events {
            q,
            host,
            format,
            official,
            sort,
            order,
            from,
            to,
        } => {
            let query = EventQuery {
                search: q,
                host,
                format,
                official,
                sort: sort.parse::<SortKey>().map_err(anyhow::Error::msg)?,
                order: order.parse::<SortOrder>().map_err(anyhow::Error::msg)?,
            };
            let end = match to.as_deref() {
                Some(raw) => parse_month(raw)?,
                None => YearMonth::from_date(now),
            };
            let start = match from.as_deref() {
                Some(raw) => parse_month(raw)?,
                None => end.months_back(state.config.window_months.saturating_sub(1)),
            };
            anyhow::ensure!(start <= end, "from ({}) is after to ({})", start, end);
            let span = u32::try_from(end.months_since(start) + 1).unwrap_or(u32::MAX);
            check_months(&state, span)?;

            let events = query.apply(state.loader.load_range(start, end).await);
            tracing::info!("{} events match", events.len());
            print_json(&events)?;
        }
        Commands::Validate => {
            let (events, report) = match state.loader.load_all().await? {
                Some(loaded) => loaded,
                None => {
                    tracing::warn!("Source cannot list months, validating the configured window");
                    let end = YearMonth::from_date(now);
                    let start = end.months_back(state.config.window_months.saturating_sub(1));
                    state.loader.load_range_with_report(start, end).await
                }
            };
            tracing::info!("Validated {} events", events.len());
            print_json(&report)?;
            anyhow::ensure!(
                report.skipped.is_empty(),
                "{} month file(s) could not be loaded",
                report.skipped.len()
            );
        }
        Commands::DraftEvent { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let draft: EventDraft = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid draft in {}", path.display()))?;
            let record = draft.into_record()?;
            tracing::info!(
                "Draft {} ready to send as {:?} for {}",
                record.id,
                SUBMISSION_SUBJECT,
                record.when()
            );
            println!("{}", payload(&record)?);
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let state = state.with_fixed_now(cli.now.as_deref().map(|_| now));

            let app = community_meta::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Serving on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
