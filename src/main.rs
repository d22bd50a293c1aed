use std::{io::Read, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use riksflix::{
    AppState,
    config::Config,
    db, harvest,
    populate::{self, GenreRecord, SlugRecord},
    routes,
    tmdb::TmdbClient,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Parser)]
#[command(name = "riksflix")]
#[command(about = "Read-only movie catalog API and its data tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Import the JSON files in DATA_DIR into the database
    Populate {
        /// Drop and recreate every table first
        #[arg(long)]
        fresh: bool,
    },
    /// Look up movies on TMDB and write import files to DATA_DIR
    Harvest {
        /// File with one `Title` or `Title@Year` per line (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Fetch the TMDB genre list into DATA_DIR/genres.json
    HarvestGenres,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,riksflix=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            db::connect_and_migrate(&config.database_url).await?;
            tracing::info!("database is up to date");
            Ok(())
        }
        Command::Populate { fresh } => {
            let conn = db::connect_and_migrate(&config.database_url).await?;
            if fresh {
                db::reset(&conn).await?;
            }
            populate::populate(&conn, &config.data_dir).await?;
            Ok(())
        }
        Command::Harvest { input } => {
            let queries = read_queries(input)?;
            let harvested = harvest::harvest(&tmdb_client(&config)?, &queries).await?;
            harvested.write_to(&config.data_dir)?;
            Ok(())
        }
        Command::HarvestGenres => {
            let genres = harvest::harvest_genres(&tmdb_client(&config)?).await?;
            populate::write_records(&config.data_dir, GenreRecord::FILE, &genres)?;
            Ok(())
        }
    }
}

async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState { config: config.clone(), db });

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, name = %config.name, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn tmdb_client(config: &Config) -> anyhow::Result<TmdbClient> {
    let http = reqwest::Client::builder()
        .user_agent("riksflix/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;
    TmdbClient::new(
        http,
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    )
}

fn read_queries(input: Option<PathBuf>) -> anyhow::Result<Vec<String>> {
    let text = match input {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    Ok(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}
