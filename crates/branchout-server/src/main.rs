//! BranchOut server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers
//! `BRANCHOUT_*` environment variables over it, opens the SQLite store, and
//! serves the site and the JSON API over HTTP.
//!
//! # Seeding
//!
//! To insert the default interest, club, and language vocabulary and exit:
//!
//! ```
//! cargo run -p branchout-server -- --seed
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use branchout_server::{AppState, ServerConfig};
use branchout_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "BranchOut student directory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert the default tag vocabulary and exit.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BRANCHOUT"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.database_path = expand_tilde(&server_cfg.database_path);
  server_cfg.upload_dir = expand_tilde(&server_cfg.upload_dir);

  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.database_path))?;

  if cli.seed {
    store
      .seed_vocabulary()
      .await
      .context("failed to seed tag vocabulary")?;
    tracing::info!("seeded default tag vocabulary");
    return Ok(());
  }

  tokio::fs::create_dir_all(&server_cfg.upload_dir)
    .await
    .with_context(|| format!("failed to create {:?}", server_cfg.upload_dir))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, server_cfg).context("invalid oauth configuration")?;
  if state.oauth.is_none() {
    tracing::warn!("google client id/secret not set; google sign-in is disabled");
  }

  let app = branchout_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
