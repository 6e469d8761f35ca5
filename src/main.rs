use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod app;
mod game;
mod leaderboard;
mod protocol;
mod shared;
mod storage;
mod transport;

use app::config::ServerConfig;
use app::rate_limit::spawn_sweeper;
use app::{build_router, spawn_profile_sweeper, AppState};
use leaderboard::client::ScoreClient;
use leaderboard::store::ScoreStore;

#[derive(Parser)]
#[command(name = "neon-snake")]
#[command(about = "Neon Snake game server and high-score tools", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the game and high-score server (default)
  Serve,

  /// Submit a score to a running server
  Submit {
    #[arg(long)]
    username: String,
    #[arg(long)]
    score: u32,
    /// Base URL of the score server
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("neon_snake=info")),
    )
    .init();

  let cli = Cli::parse();
  let config = ServerConfig::from_env();
  match cli.command.unwrap_or(Commands::Serve) {
    Commands::Serve => serve(config).await,
    Commands::Submit {
      username,
      score,
      server,
    } => {
      let client = ScoreClient::new(server, config.fallback);
      client.submit(&username, score).await?;
      tracing::info!(%username, score, "score submitted");
      Ok(())
    }
  }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
  let store = match config.database_url.as_deref() {
    Some(url) => Some(ScoreStore::connect(url).await?),
    None => {
      tracing::warn!("DATABASE_URL is empty; score submissions are disabled");
      None
    }
  };

  let port = config.port;
  let state = Arc::new(AppState::new(config, store.clone()));
  let sweeper = spawn_sweeper(Arc::clone(&state.limiter));
  let profile_sweeper = spawn_profile_sweeper(Arc::clone(&state));
  let app = build_router(Arc::clone(&state));

  let address = format!("0.0.0.0:{port}");
  let listener = tokio::net::TcpListener::bind(&address).await?;
  tracing::info!(port, variant = ?state.game.variant, "server listening");

  axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(shutdown_signal())
  .await?;

  sweeper.abort();
  profile_sweeper.abort();
  if let Some(store) = store {
    store.close().await;
  }
  tracing::info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(error) = tokio::signal::ctrl_c().await {
      tracing::error!(%error, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(error) => {
        tracing::error!(%error, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  tracing::info!("shutdown requested");
}
