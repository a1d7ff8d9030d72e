use crate::error::AppError;
use crate::feed::pipeline::run_feed;
use crate::feed::types::{FeedSession, FeedStatusSnapshot, FeedStopResult, StartFeedArgs};
use crate::state::{AppState, FeedHandle};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Starts the feed, restarting it if one is already running.
pub async fn start_feed(state: &AppState, args: StartFeedArgs) -> Result<FeedSession, AppError> {
    let config = args.normalize()?;

    let existing_handle = {
        let mut feed_slot = state.feed.lock().await;
        feed_slot.take()
    };
    if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
    }

    let cancellation_token = CancellationToken::new();
    let task_token = cancellation_token.clone();
    let status_store = Arc::clone(&state.feed_status);
    let board = Arc::clone(&state.board);
    let runtime_config = config.clone();

    let join_handle = tokio::spawn(async move {
        run_feed(runtime_config, board, status_store, task_token).await;
    });

    {
        let mut feed_slot = state.feed.lock().await;
        *feed_slot = Some(FeedHandle {
            cancellation_token,
            join_handle,
        });
    }

    Ok(FeedSession::from_config(&config))
}

pub async fn stop_feed(state: &AppState) -> Result<FeedStopResult, AppError> {
    let existing_handle = {
        let mut feed_slot = state.feed.lock().await;
        feed_slot.take()
    };

    let stopped = if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
        true
    } else {
        false
    };

    Ok(FeedStopResult { stopped })
}

pub async fn feed_status(state: &AppState) -> FeedStatusSnapshot {
    state.feed_status.read().await.clone()
}
