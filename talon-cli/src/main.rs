//! talon CLI
//!
//! Search an aggregated IOC document, keep it fresh, or rebuild it from
//! public threat feeds.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use talon_core::{FeedStats, MatchResult};
use talon_feed::{
    aggregate, save_document, AggregatorConfig, FileSource, HttpSource, IocSource, LoadStrategy,
    DEFAULT_FEEDS,
};
use talon_runtime::{spawn_refresh, LookupSession, SearchScheduler, SearchView};

#[derive(Parser)]
#[command(name = "talon")]
#[command(author, version, about = "Threat-intel IOC lookup and feed aggregation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Args)]
struct SourceArgs {
    /// Local IOC document to load
    #[arg(long, default_value = "iocs.json", conflicts_with = "url")]
    file: PathBuf,

    /// Remote IOC document URL (instead of --file)
    #[arg(long)]
    url: Option<String>,

    /// Fallback search API base URL, used when the primary source is unavailable
    #[arg(long, env = "TALON_FALLBACK_API")]
    fallback_api: Option<String>,
}

impl SourceArgs {
    fn strategy(&self) -> LoadStrategy {
        let primary: Box<dyn IocSource> = match &self.url {
            Some(url) => Box::new(HttpSource::new(url.clone())),
            None => Box::new(FileSource::new(self.file.clone())),
        };
        let mut strategy = LoadStrategy::new(primary);
        if let Some(api) = &self.fallback_api {
            strategy = strategy.with_fallback_api(api.clone());
        }
        strategy
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search the IOC store once and print classified matches
    Search {
        /// The query string
        query: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Interactive prompt with periodic store refresh
    Interactive {
        #[command(flatten)]
        source: SourceArgs,

        /// Refresh interval in seconds (0 disables refresh)
        #[arg(long, default_value = "300")]
        refresh: u64,
    },

    /// Rebuild the IOC document from the public feed registry
    Aggregate {
        /// Output path for the aggregated document
        #[arg(short, long, default_value = "iocs.json")]
        output: PathBuf,

        /// Directory for cached feed responses
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Always refetch, ignoring cached responses
        #[arg(long)]
        no_cache: bool,
    },

    /// Show IOC document statistics
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Search { query, source } => run_search(&query, &source).await?,
        Commands::Interactive { source, refresh } => run_interactive(&source, refresh).await?,
        Commands::Aggregate {
            output,
            cache_dir,
            no_cache,
        } => run_aggregate(output, cache_dir, no_cache).await?,
        Commands::Stats { source } => run_stats(&source).await?,
    }

    Ok(())
}

async fn run_search(query: &str, source: &SourceArgs) -> Result<()> {
    let session = LookupSession::new(source.strategy())?;

    eprintln!("⏳ Loading IOC database...");
    if let Err(e) = session.load().await {
        eprintln!("⚠️  Failed to load IOC database: {}", e);
    }

    render_view(&session.search(query).await);
    Ok(())
}

async fn run_interactive(source: &SourceArgs, refresh: u64) -> Result<()> {
    let mut strategy = source.strategy();
    if refresh > 0 {
        strategy = strategy.with_refresh_interval(Duration::from_secs(refresh));
    }
    let session = Arc::new(LookupSession::new(strategy)?);

    println!("🔎 talon interactive - type a query, 'quit' to exit\n");

    println!("⏳ Loading IOC database...");
    match session.load().await {
        Ok(count) => println!("Loaded {} indicators", count),
        Err(e) => println!("⚠️  Failed to load IOC database: {} (searches run degraded)", e),
    }
    print_stats(&session.stats());
    println!();

    let refresh_task = session
        .refresh_interval()
        .map(|every| spawn_refresh(session.clone(), every));

    // Every line from the terminal is an explicit submission; the
    // scheduler is the single funnel for query events
    let (mut scheduler, mut fired) = SearchScheduler::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("talon> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line == "quit" || line == "exit" {
            break;
        }

        scheduler.on_submit(&line);
        if let Some(query) = fired.recv().await {
            render_view(&session.search(&query).await);
            println!();
        }
    }

    if let Some(task) = refresh_task {
        task.abort();
    }
    Ok(())
}

async fn run_aggregate(output: PathBuf, cache_dir: PathBuf, no_cache: bool) -> Result<()> {
    println!("📡 Aggregating {} feeds...", DEFAULT_FEEDS.len());

    let config = AggregatorConfig {
        cache_dir: (!no_cache).then_some(cache_dir),
        ..AggregatorConfig::default()
    };

    let doc = aggregate(DEFAULT_FEEDS, &config).await?;
    save_document(&doc, &output).await?;

    println!("✅ Aggregation complete");
    print_stats(&doc.stats);
    println!("📄 Document written to {}", output.display());
    Ok(())
}

async fn run_stats(source: &SourceArgs) -> Result<()> {
    let session = LookupSession::new(source.strategy())?;

    match session.load().await {
        Ok(_) => {
            println!("📊 IOC database statistics");
            println!("   Indicators in store: {}", session.store_len());
            print_stats(&session.stats());
        }
        Err(e) => println!("❌ Failed to load IOC database: {}", e),
    }
    Ok(())
}

fn render_view(view: &SearchView) {
    match view {
        SearchView::IdlePrompt => println!("Enter a search term to begin"),
        SearchView::LoadError { message } => {
            println!("❌ Search unavailable: {}", message);
        }
        SearchView::NoMatches { query } => println!("No results found for \"{}\"", query),
        SearchView::Results {
            matches,
            total,
            truncated,
            degraded,
        } => {
            let noun = if *total == 1 { "match" } else { "matches" };
            let suffix = if *degraded { " (via fallback API)" } else { "" };
            println!("{} {}{}", total, noun, suffix);

            for m in matches {
                println!("  {}  [{}]", highlighted(m), m.ioc_type.label());
            }
            if *truncated {
                println!("Showing {} of {} matches.", matches.len(), total);
            }
        }
    }
}

/// Emphasize the matched span with ANSI bold
fn highlighted(m: &MatchResult) -> String {
    let (before, hit, after) = m.segments();
    if hit.is_empty() {
        m.text.clone()
    } else {
        format!("{}\x1b[1;33m{}\x1b[0m{}", before, hit, after)
    }
}

fn print_stats(stats: &FeedStats) {
    let updated = stats
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let unique = stats
        .unique
        .map(|u| u.to_string())
        .unwrap_or_else(|| "0".to_string());

    println!(
        "   Total: {} | Unique: {} | Last updated: {}",
        stats.total, unique, updated
    );
    for (name, count) in &stats.feeds {
        println!("   {}: {}", name, count);
    }
}
