use crate::error::AppError;
use crate::feed::persistence::{recent_purchases, PurchaseRecord};
use crate::feed::types::{Product, PurchaseRequest};
use crate::state::AppState;

/// One user purchase: sampled location, detached write, optimistic marker.
/// Infallible from the caller's perspective; write failures only show up in
/// the log and the journal.
pub fn purchase(state: &AppState, product: Product) -> PurchaseRequest {
    state.dispatcher.dispatch(product)
}

pub async fn journal_recent(
    state: &AppState,
    limit: u32,
) -> Result<Vec<PurchaseRecord>, AppError> {
    recent_purchases(&state.db_pool, limit).await
}
