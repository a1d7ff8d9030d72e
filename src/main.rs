use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use versus_board::commands;
use versus_board::db;
use versus_board::error::AppError;
use versus_board::feed::types::{Product, StartFeedArgs};
use versus_board::state::AppState;
use versus_board::ui::{RenderSink, StdoutBridge};

/// Realtime sync engine for the kinoko vs takenoko purchase dashboard.
///
/// Rendering events leave on stdout as JSON lines; UI actions arrive on
/// stdin as JSON lines; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "versus-board", version)]
struct Cli {
    /// Base URL of the purchase write endpoint
    #[arg(long)]
    api_base: Option<String>,

    /// Push channel URL (ws:// or wss://)
    #[arg(long)]
    ws_url: Option<String>,

    /// Flat reconnect delay in milliseconds
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,

    /// Synthesize the feed locally instead of connecting
    #[arg(long)]
    mock: bool,

    /// Interval between synthetic purchases in mock mode, in milliseconds
    #[arg(long)]
    mock_interval_ms: Option<u64>,

    /// Purchase journal database path
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn default_journal_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum UiAction {
    Purchase {
        product: Product,
    },
    Status,
    Journal {
        #[serde(default = "default_journal_limit")]
        limit: u32,
    },
    Quit,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // stdout belongs to the ui bridge; logs must stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = StartFeedArgs {
        ws_url: cli.ws_url,
        api_base: cli.api_base,
        reconnect_delay_ms: cli.reconnect_delay_ms,
        mock_mode: cli.mock.then_some(true),
        mock_interval_ms: cli.mock_interval_ms,
    };
    let config = args.clone().normalize()?;

    let db_path = db::resolve_db_path(cli.db_path.as_deref());
    let db_pool = db::initialize_pool_from_path(&db_path).await?;
    tracing::info!(path = %db_path.display(), "purchase journal ready");

    let sink: Arc<dyn RenderSink> = Arc::new(StdoutBridge);
    let state = AppState::new(db_pool, sink, config.api_base.clone());

    commands::feed::start_feed(&state, args).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if handle_action(&state, line.trim()).await {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("stdin closed, running until ctrl-c");
                        let _ = tokio::signal::ctrl_c().await;
                        break;
                    }
                }
            }
        }
    }

    commands::feed::stop_feed(&state).await?;
    Ok(())
}

/// Handles one stdin action line. Returns true when the engine should shut
/// down. Unparseable lines are logged and skipped, never fatal.
async fn handle_action(state: &AppState, line: &str) -> bool {
    if line.is_empty() {
        return false;
    }

    let action: UiAction = match serde_json::from_str(line) {
        Ok(action) => action,
        Err(error) => {
            tracing::warn!(%error, line, "ignoring unparseable action line");
            return false;
        }
    };

    match action {
        UiAction::Purchase { product } => {
            commands::purchase::purchase(state, product);
            false
        }
        UiAction::Status => {
            let snapshot = commands::feed::feed_status(state).await;
            state.board.sink().status_changed(&snapshot);
            false
        }
        UiAction::Journal { limit } => {
            match commands::purchase::journal_recent(state, limit).await {
                Ok(records) => {
                    let line = serde_json::json!({ "event": "journal", "payload": records });
                    println!("{line}");
                }
                Err(error) => tracing::warn!(%error, "journal readback failed"),
            }
            false
        }
        UiAction::Quit => true,
    }
}
