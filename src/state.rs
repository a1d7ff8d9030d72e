use crate::feed::board::SalesBoard;
use crate::feed::dispatch::PurchaseDispatcher;
use crate::feed::types::{FeedStatusSnapshot, DEFAULT_WS_ENDPOINT};
use crate::ui::RenderSink;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

pub struct FeedHandle {
    pub cancellation_token: CancellationToken,
    pub join_handle: tokio::task::JoinHandle<()>,
}

/// Context object owning everything the engine mutates: the journal pool,
/// the board (tally + sinks), the dispatcher, the running feed handle and
/// the connection status store. Constructed once at startup and passed by
/// reference; there are no ambient globals.
pub struct AppState {
    pub db_pool: SqlitePool,
    pub board: Arc<SalesBoard>,
    pub dispatcher: PurchaseDispatcher,
    pub feed: Mutex<Option<FeedHandle>>,
    pub feed_status: Arc<RwLock<FeedStatusSnapshot>>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, sink: Arc<dyn RenderSink>, api_base: String) -> Self {
        let board = Arc::new(SalesBoard::new(sink));
        let dispatcher =
            PurchaseDispatcher::new(api_base, Arc::clone(&board), Some(db_pool.clone()));
        let feed_status = Arc::new(RwLock::new(FeedStatusSnapshot::idle(
            DEFAULT_WS_ENDPOINT.to_string(),
            Some("feed idle".to_string()),
        )));

        Self {
            db_pool,
            board,
            dispatcher,
            feed: Mutex::new(None),
            feed_status,
        }
    }
}
