use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use openclipart_repo::commons::CommonsClient;
use openclipart_repo::config;
use openclipart_repo::db::SqliteSettingsStore;
use openclipart_repo::feed::HttpFeedSource;
use openclipart_repo::form::FormSpec;
use openclipart_repo::http::{CachingHttpClient, HttpFetch};
use openclipart_repo::repository::{ClipartRepository, OpenClipart};

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse and search Open Clipart as a file repository")]
struct Args {
    /// Path to YAML config file (defaults apply when ./config.yaml is absent)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a sample config file
    Init {
        #[arg(default_value = "config.yaml")]
        path: PathBuf,
    },
    /// List the most recent clipart
    Recent,
    /// Search with the configured backend
    Search {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Search the commons image API directly
    Images {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Print the stored (and repaired) settings
    Settings,
    /// Print the settings form
    Form,
    /// Print option names and supported return types
    Options,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::Init { path } = &args.command {
        std::fs::write(path, config::example())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote sample config");
        return Ok(());
    }

    let cfg = config::load(args.config.as_deref())?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.app.database_url.clone());
    let store = SqliteSettingsStore::connect(&database_url).await?;

    let http: Arc<dyn HttpFetch> = Arc::new(CachingHttpClient::from_config(&cfg)?);
    let repo = OpenClipart::connect(
        &cfg,
        &store,
        Arc::new(HttpFeedSource::new(http.clone())),
        CommonsClient::from_config(http, &cfg),
    )
    .await?;

    match args.command {
        Command::Init { .. } => {}
        Command::Recent => print_json(&repo.list_recent().await)?,
        Command::Search { keyword, page } => print_json(&repo.search(&keyword, page).await)?,
        Command::Images { keyword, page } => {
            print_json(&repo.commons().search_images(&keyword, page).await?)?
        }
        Command::Settings => print_json(repo.settings())?,
        Command::Form => {
            let mut form = FormSpec::default();
            repo.render_config_form(&mut form);
            print_json(&form)?
        }
        Command::Options => print_json(&serde_json::json!({
            "options": repo.option_names(),
            "return_types": repo.supported_return_types().bits(),
        }))?,
    }

    Ok(())
}
