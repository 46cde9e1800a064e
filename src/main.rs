use anyhow::{Context, Result};
use champ_finals::app::ports::DocumentFetcher;
use champ_finals::calendar::ShowCalendar;
use champ_finals::class_info::ClassInfo;
use champ_finals::combine::{FinalStanding, StandingOrder};
use champ_finals::config::Config;
use champ_finals::constants;
use champ_finals::error::FinalsError;
use champ_finals::infra::{InMemoryFetcher, ReqwestFetcher};
use champ_finals::logging;
use champ_finals::session::{FinalSession, FinalsTracker};
use champ_finals::types::{ClassId, Discipline, Height};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "champ-finals")]
#[command(about = "Live standings for two-round agility championship finals")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file (defaults to $CHAMP_FINALS_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct OutputArgs {
    /// Number of standings rows to print (defaults to refresh.max_rows)
    #[arg(long)]
    rows: Option<usize>,
    /// Print the standings as JSON
    #[arg(long)]
    json: bool,
    /// Rank by combined faults and time instead of combined points
    #[arg(long)]
    by_faults: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the calendar shows closest to today
    Shows {
        /// Shift the reference date by this many days
        #[arg(long)]
        days_ahead: Option<i64>,
        /// How many shows to list
        #[arg(long)]
        count: Option<usize>,
    },
    /// Resolve a show name and print its results-page URL
    Find {
        #[arg(long)]
        show: String,
        /// Show date (YYYY-MM-DD); taken from the calendar when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Track the championship final of one height at a show
    Final {
        #[arg(long)]
        show: String,
        /// Height code or name (Sml, Med, Int, Lge)
        #[arg(long)]
        height: Height,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Refresh every refresh.interval_seconds until interrupted
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Track a final from the two class identifiers
    FinalIds {
        #[arg(long)]
        agility: ClassId,
        #[arg(long)]
        jumping: ClassId,
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Combine two saved results pages without touching the network
    Offline {
        #[arg(long)]
        agility: PathBuf,
        #[arg(long)]
        jumping: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var(constants::CONFIG_PATH_ENV).ok());
    let mut config = Config::load(config_path.as_deref()).context("loading configuration")?;
    let _log_guard = logging::init_logging(&config.logging).context("initializing logging")?;
    info!(
        "Configuration from {}",
        config_path.as_deref().unwrap_or(constants::DEFAULT_CONFIG_PATH)
    );

    match cli.command {
        Commands::Shows { days_ahead, count } => {
            if let Some(days) = days_ahead {
                config.calendar.days_ahead = days;
            }
            if let Some(count) = count {
                config.calendar.num_shows = count;
            }
            config.validate()?;
            let calendar = load_calendar(&config)?;
            let tracker = FinalsTracker::new(ReqwestFetcher::new(&config.plaza)?, config);
            let shows = calendar.nearest(
                tracker.reference_date(),
                tracker.config().calendar.num_shows,
            );
            println!("📅 Shows near {}:", tracker.reference_date());
            for show in shows {
                println!("   {}  {}", show.date, show.name);
            }
        }
        Commands::Find { show, date } => {
            let calendar = load_calendar(&config)?;
            let tracker = FinalsTracker::new(ReqwestFetcher::new(&config.plaza)?, config);
            let url = locate_show(&tracker, &calendar, &show, date).await?;
            println!("{}", url);
        }
        Commands::Final {
            show,
            height,
            date,
            watch,
            output,
        } => {
            let calendar = load_calendar(&config)?;
            let tracker = FinalsTracker::new(ReqwestFetcher::new(&config.plaza)?, config);
            let url = locate_show(&tracker, &calendar, &show, date).await?;
            println!("🏆 {} {} championship final", show, height.full_name());
            watch_final(&tracker, watch, output, || tracker.refresh(&url, height)).await?;
        }
        Commands::FinalIds {
            agility,
            jumping,
            watch,
            output,
        } => {
            let tracker = FinalsTracker::new(ReqwestFetcher::new(&config.plaza)?, config);
            println!("🏆 Final from classes {} (agility) and {} (jumping)", agility, jumping);
            watch_final(&tracker, watch, output, || {
                tracker.refresh_from_ids(&agility, &jumping)
            })
            .await?;
        }
        Commands::Offline {
            agility,
            jumping,
            output,
        } => {
            let fetcher = InMemoryFetcher::new();
            let mut agility_class = saved_round(&fetcher, Discipline::Agility, &agility)?;
            let mut jumping_class = saved_round(&fetcher, Discipline::Jumping, &jumping)?;
            agility_class.update_order(&mut jumping_class);

            let tracker = FinalsTracker::new(fetcher, config);
            let session = tracker
                .import_session(FinalSession::new(agility_class, jumping_class))
                .await?;
            report(&session, rows_to_show(&tracker, output), output)?;
        }
    }
    Ok(())
}

/// Serve a saved results page under its own path and point a round at it.
fn saved_round(
    fetcher: &InMemoryFetcher,
    discipline: Discipline,
    path: &Path,
) -> Result<ClassInfo> {
    let key = path.display().to_string();
    fetcher
        .insert_file(key.clone(), path)
        .with_context(|| format!("reading saved {} page {}", discipline, key))?;
    Ok(ClassInfo::new(discipline).with_results_url(key))
}

fn load_calendar(config: &Config) -> Result<ShowCalendar> {
    ShowCalendar::from_path(&config.calendar.path)
        .with_context(|| format!("loading show calendar {}", config.calendar.path))
}

/// Calendar match first, then the site's month catalog.
async fn locate_show<F: DocumentFetcher>(
    tracker: &FinalsTracker<F>,
    calendar: &ShowCalendar,
    show: &str,
    date: Option<NaiveDate>,
) -> Result<String> {
    let entry = tracker.resolve_show(calendar, show)?;
    let date = date.unwrap_or(entry.date);
    let url = tracker.find_show_url(&entry.name, date).await?;
    Ok(url)
}

fn rows_to_show<F: DocumentFetcher>(tracker: &FinalsTracker<F>, output: OutputArgs) -> usize {
    output.rows.unwrap_or(tracker.config().refresh.max_rows)
}

/// Run one refresh, or keep refreshing when watching. Each pass builds a
/// fresh session; transient failures are logged and retried while watching.
async fn watch_final<F, R, Fut>(
    tracker: &FinalsTracker<F>,
    watch: bool,
    output: OutputArgs,
    refresh: R,
) -> Result<()>
where
    F: DocumentFetcher,
    R: Fn() -> Fut,
    Fut: std::future::Future<Output = champ_finals::error::Result<FinalSession>>,
{
    let interval = Duration::from_secs(tracker.config().refresh.interval_seconds);
    let rows = rows_to_show(tracker, output);
    loop {
        match refresh().await {
            Ok(session) => report(&session, rows, output)?,
            Err(e) if watch && e.is_retryable() => {
                warn!("Refresh failed, retrying in {:?}: {}", interval, e);
            }
            Err(e) => {
                error!("Refresh failed: {}", e);
                return Err(e.into());
            }
        }
        if !watch {
            return Ok(());
        }
        info!("Next refresh in {:?}", interval);
        tokio::time::sleep(interval).await;
    }
}

fn report(session: &FinalSession, rows: usize, output: OutputArgs) -> Result<()> {
    let standing = match session.standing() {
        Ok(standing) if output.by_faults => Some(standing.by_faults()),
        Ok(standing) => Some(standing),
        Err(FinalsError::MissingData(reason)) => {
            info!("Standings not available: {}", reason);
            None
        }
        Err(e) => return Err(e.into()),
    };

    if output.json {
        let body = match &standing {
            Some(standing) => serde_json::to_string_pretty(standing)?,
            None => serde_json::to_string_pretty(session)?,
        };
        println!("{}", body);
        return Ok(());
    }

    println!();
    print_class(&session.agility);
    print_class(&session.jumping);
    println!("   Final status: {}", session.status());

    match standing {
        Some(standing) => print_standing(&standing, rows),
        None => {
            for class in [&session.agility, &session.jumping] {
                print_progress(class, rows);
            }
        }
    }
    Ok(())
}

fn print_class(class: &ClassInfo) {
    println!(
        "   {} {}: {} (order {:?})",
        class.discipline.label(),
        class.class_number.as_deref().unwrap_or("-"),
        class.status(),
        class.order()
    );
}

fn print_standing(standing: &FinalStanding, rows: usize) {
    match standing.first_round() {
        Some(round) => println!("   First round: {}", round.label()),
        None => println!("   First round: undetermined"),
    }
    if let Some(winner) = standing.agility_winner() {
        println!("   Agility winner: {}", winner.pairing);
    }
    if let Some(winner) = standing.jumping_winner() {
        println!("   Jumping winner: {}", winner.pairing);
    }

    let heading = match standing.order {
        StandingOrder::Points => "by points",
        StandingOrder::Faults => "by faults",
    };
    println!("\n📊 Combined standings ({}):", heading);
    println!(
        "   {:>3}  {:<40} {:>4} {:>4} {:>6} {:>7} {:>8}",
        "Pos", "Handler & Dog", "Ag", "Jp", "Pts", "Faults", "Time"
    );
    for row in standing.top(rows) {
        println!(
            "   {:>3}  {:<40} {:>4} {:>4} {:>6} {:>7.2} {:>8.2}",
            row.place,
            row.pairing,
            row.agility_rank,
            row.jumping_rank,
            row.combined_points,
            row.combined_faults,
            row.combined_time
        );
    }
}

fn print_progress(class: &ClassInfo, rows: usize) {
    if class.has_results() {
        println!("\n📋 {} results so far:", class.discipline.label());
        for row in class.results().iter().take(rows) {
            println!(
                "   {:>3}  {:<40} {:>7.2} {:>8.2}",
                row.rank, row.pairing, row.faults, row.time
            );
        }
        if !class.eliminations().is_empty() {
            println!("   Eliminated: {}", class.eliminations().len());
        }
    }

    if let Some(order) = class.running_orders() {
        println!("\n🏃 {} running order:", class.discipline.label());
        for entry in order.iter().take(rows) {
            let marker = if entry.withdrawn { " (withdrawn)" } else { "" };
            println!("   {:>3}  {}{}", entry.position, entry.pairing, marker);
        }
    }
}
