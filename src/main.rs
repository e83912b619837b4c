mod cli;

use marquee::{
    config::{self, Config, TrackerBackend},
    metadata::{MetadataClient, TmdbClient},
    search::SearchOrchestrator,
    server,
    tracker::{self, PopularityTracker},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use marquee_common::MovieRecord;
use std::path::Path;
use std::sync::Arc;

fn build_orchestrator(config: &Config) -> Arc<SearchOrchestrator> {
    let metadata: Arc<dyn MetadataClient> = Arc::new(TmdbClient::new(&config.tmdb));
    let tracker = tracker::create_tracker(config);
    SearchOrchestrator::new(&config.search, metadata, tracker)
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting marquee");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let orchestrator = build_orchestrator(&config);
    server::start_server(config, orchestrator).await
}

async fn search_once(query: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if config.tmdb.api_key.trim().is_empty() {
        anyhow::bail!("TMDB API key is not configured; set tmdb.api_key or TMDB_API_KEY");
    }

    let orchestrator = build_orchestrator(&config);
    orchestrator.fetch_movies(query).await;
    let state = orchestrator.snapshot();

    if let Some(message) = state.error_message {
        anyhow::bail!(message);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&state.movies)?);
        return Ok(());
    }

    if state.movies.is_empty() {
        println!("No movies found");
        return Ok(());
    }
    for movie in &state.movies {
        println!("{}", describe(movie, &config.tmdb.image_base_url));
    }
    Ok(())
}

fn describe(movie: &MovieRecord, poster_base: &str) -> String {
    let mut line = movie.title.clone();
    if let Some(year) = movie.release_year() {
        line.push_str(&format!(" ({year})"));
    }
    match movie.vote_average {
        Some(rating) if rating > 0.0 => line.push_str(&format!("  {rating:.1}/10")),
        _ => line.push_str("  N/A"),
    }
    if let Some(ref lang) = movie.original_language {
        line.push_str(&format!("  [{lang}]"));
    }
    if let Some(url) = movie.poster_url(poster_base) {
        line.push_str(&format!("\n    {url}"));
    }
    line
}

async fn show_trending(limit: Option<usize>, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tracker = tracker::create_tracker(&config);
    let limit = limit.unwrap_or(config.search.trending_limit);

    if config.tracker.backend == TrackerBackend::Memory {
        tracing::warn!(
            "The memory tracker keeps no counters between runs; \
             query GET /api/trending on a running `marquee serve`, or configure the appwrite backend"
        );
    }

    let entries = tracker.trending(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No searches recorded yet ({} tracker)", tracker.name());
        return Ok(());
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!("{:>2}. {} ({} searches)", rank + 1, entry.query_text, entry.count);
    }
    Ok(())
}

fn check_config(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Configuration is valid");
    println!("  TMDB:     {}", config.tmdb.base_url);
    println!(
        "  API key:  {}",
        if config.tmdb.api_key.trim().is_empty() {
            "missing"
        } else {
            "set"
        }
    );
    println!("  Tracker:  {:?}", config.tracker.backend);
    println!("  Debounce: {} ms", config.search.debounce_ms);
    println!("  Trending: top {}", config.search.trending_limit);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "marquee=trace,marquee_common=debug,tower_http=debug".to_string()
        } else {
            "marquee=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Search { query, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(search_once(&query, json, cli.config.as_deref()))
        }
        Commands::Trending { limit, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(show_trending(limit, json, cli.config.as_deref()))
        }
        Commands::CheckConfig {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            check_config(path.as_deref())
        }
        Commands::Version => {
            println!("marquee {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
