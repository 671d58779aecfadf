//! lectio-server binary.
//!
//! Reads `lectio.toml` (or the path given with `--config`) layered under
//! `LECTIO_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.
//!
//! # Admin PIN hash generation
//!
//! To generate the argon2 PHC string for `admin_pin_hash`:
//!
//! ```sh
//! cargo run -p lectio-server -- --hash-pin
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use lectio_api::credentials::hash_pin;
use lectio_core::{pin::validate_new_pin, user::Role};
use lectio_server::{ServerConfig, app, app_state, bootstrap_admin};
use lectio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lectio reading-club server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lectio.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an admin PIN entered on stdin and exit.
  #[arg(long)]
  hash_pin: bool,
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

  if cli.hash_pin {
    let pin = read_pin()?;
    validate_new_pin(Role::Admin, &pin)?;
    let hash = hash_pin(&pin)?;
    println!("{hash}");
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config)?;
  let store_path = cfg.resolved_store_path();
  if let Some(dir) = store_path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {}", dir.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  bootstrap_admin(&store, &cfg).await?;

  let app = app(app_state(store, &cfg));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}

/// Read a PIN from stdin.
fn read_pin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Admin PIN: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}
