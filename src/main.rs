use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use safety_board::api::transport::ReqwestTransport;
use safety_board::models::clock::SystemClock;
use safety_board::server::{build_router, AppState};
use safety_board::utils::display::DisplayFormatter;
use safety_board::{AppConfig, BoardService};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "safety_board", about = "Building safety status board backed by a Feishu bitable")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the board over HTTP (default)
    Serve,
    /// Fetch once and print the board to the terminal
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_env()?);
    debug!(
        "Loaded config for table {} (status precedence: {})",
        config.table_id, config.status_precedence
    );

    let board = Arc::new(BoardService::new(
        config.clone(),
        Arc::new(ReqwestTransport::new()),
        Arc::new(SystemClock),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = build_router(AppState { board });
            let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
            info!("Starting safety board on {}", config.bind_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
        Command::Snapshot => {
            let response = board.handle_get_data().await;
            println!("{}", DisplayFormatter::new().format_board(&response));
        }
    }

    info!("Shutting down");
    Ok(())
}
