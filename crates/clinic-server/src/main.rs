use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;
use clinic_server::{ServerConfig, app, build_state, spawn_session_sweeper};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clinic web service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert the demo doctor roster, all sharing a password read from stdin,
  /// then exit. Existing emails are left alone.
  #[arg(long)]
  seed_demo_doctors: bool,
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

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let state = build_state(&cfg).await.context("failed to initialise server state")?;

  if cli.seed_demo_doctors {
    let password = password_from_stdin()?;
    anyhow::ensure!(!password.is_empty(), "demo doctor password must not be empty");
    let hash =
      clinic_api::auth::hash_password(&password).context("failed to hash demo password")?;
    let inserted = state
      .store
      .seed_demo_doctors(hash)
      .await
      .context("failed to seed demo doctors")?;
    tracing::info!(inserted, "demo doctors seeded");
    return Ok(());
  }

  match state.store.purge_expired_sessions(chrono::Utc::now()).await {
    Ok(removed) => tracing::debug!(removed, "startup session purge"),
    Err(e) => tracing::warn!(error = %e, "startup session purge failed"),
  }
  if cfg.session_sweep_secs > 0 {
    spawn_session_sweeper(state.store.clone(), Duration::from_secs(cfg.session_sweep_secs));
  }

  tracing::info!(
    uploads = %state.files.root().display(),
    store = %cfg.store_path.display(),
    "state ready"
  );

  let app = app(state, cfg.max_upload_bytes);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a single line from stdin.
fn password_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
