use crate::feed::board::SalesBoard;
use crate::feed::endpoint::submit_purchase;
use crate::feed::persistence::record_purchase;
use crate::feed::types::{Product, PurchaseRequest};
use crate::geo::{GeoSampler, Location};
use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Orchestrates one user-initiated purchase: sample a plausible city, hand
/// the write to a detached task, and render the marker immediately.
///
/// The marker is optimistic by contract — it is placed before the write
/// endpoint answers and is never rolled back, whatever the outcome. The
/// authoritative chart is untouched here; it only moves when the push
/// channel confirms the totals.
pub struct PurchaseDispatcher {
    http_client: Client,
    api_base: String,
    sampler: GeoSampler,
    board: Arc<SalesBoard>,
    journal: Option<SqlitePool>,
}

impl PurchaseDispatcher {
    pub fn new(api_base: String, board: Arc<SalesBoard>, journal: Option<SqlitePool>) -> Self {
        Self {
            http_client: Client::new(),
            api_base,
            sampler: GeoSampler::new(),
            board,
            journal,
        }
    }

    /// Must be called from within the tokio runtime; the network write is
    /// spawned as a detached task whose failure is observed only through
    /// the log and the journal.
    pub fn dispatch(&self, product: Product) -> PurchaseRequest {
        let city = self.sampler.sample();
        let request = PurchaseRequest {
            product,
            timestamp: chrono::Utc::now().to_rfc3339(),
            location: Location::from(city),
        };

        let http_client = self.http_client.clone();
        let api_base = self.api_base.clone();
        let journal = self.journal.clone();
        let task_request = request.clone();
        tokio::spawn(async move {
            let (order_id, submitted) =
                match submit_purchase(&http_client, &api_base, &task_request).await {
                    Ok(ack) => {
                        tracing::info!(
                            product = task_request.product.as_str(),
                            order_id = ack.order_id.as_deref().unwrap_or(""),
                            "purchase acknowledged"
                        );
                        (ack.order_id, true)
                    }
                    Err(error) => {
                        tracing::warn!(
                            %error,
                            product = task_request.product.as_str(),
                            "purchase submission failed"
                        );
                        (None, false)
                    }
                };

            if let Some(pool) = journal {
                if let Err(error) =
                    record_purchase(&pool, &task_request, order_id.as_deref(), submitted).await
                {
                    tracing::warn!(%error, "failed to journal purchase");
                }
            }
        });

        // Never gated on the write above.
        self.board
            .place_local_marker(product, request.location.clone());
        request
    }
}
