use crate::feed::board::SalesBoard;
use crate::feed::endpoint::connect_update_stream;
use crate::feed::types::{
    decode_inbound_frame, now_unix_ms, FeedConfig, FeedConnectionState, FeedStatusSnapshot,
    InboundFrame, NewOrder, Product, Tally, UpdateFrame,
};
use crate::geo::{GeoSampler, Location};
use futures_util::StreamExt;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

const MOCK_ENDPOINT: &str = "mock://local";

enum StreamDirective {
    Continue,
    Disconnect,
}

/// Owns the push-channel lifecycle until cancelled: connect, drain frames,
/// and on loss reconnect forever at the configured flat delay. The status
/// indicator is updated on every transition, one invocation per transition.
pub async fn run_feed(
    config: FeedConfig,
    board: Arc<SalesBoard>,
    status_store: Arc<RwLock<FeedStatusSnapshot>>,
    cancel_token: CancellationToken,
) {
    if config.mock_mode {
        run_mock_feed(&config, &board, &status_store, &cancel_token).await;
    } else {
        run_live_feed(&config, &board, &status_store, &cancel_token).await;
    }

    let endpoint = if config.mock_mode {
        MOCK_ENDPOINT
    } else {
        config.ws_url.as_str()
    };
    publish_status(
        &status_store,
        &board,
        FeedConnectionState::Disconnected,
        endpoint,
        Some("feed stopped".to_string()),
    )
    .await;
}

async fn run_live_feed(
    config: &FeedConfig,
    board: &Arc<SalesBoard>,
    status_store: &Arc<RwLock<FeedStatusSnapshot>>,
    cancel_token: &CancellationToken,
) {
    while !cancel_token.is_cancelled() {
        publish_status(
            status_store,
            board,
            FeedConnectionState::Connecting,
            &config.ws_url,
            Some("opening push channel".to_string()),
        )
        .await;

        match connect_update_stream(&config.ws_url).await {
            Ok(mut stream) => {
                publish_status(
                    status_store,
                    board,
                    FeedConnectionState::Connected,
                    &config.ws_url,
                    Some("push channel connected".to_string()),
                )
                .await;

                loop {
                    let frame = tokio::select! {
                        _ = cancel_token.cancelled() => break,
                        next_message = stream.next() => next_message,
                    };

                    let Some(frame_result) = frame else {
                        break;
                    };

                    match frame_result {
                        Ok(message) => match handle_message(message, board) {
                            StreamDirective::Continue => {}
                            StreamDirective::Disconnect => break,
                        },
                        Err(error) => {
                            // Transport errors pass through the transient
                            // error state before the close-driven transition.
                            publish_status(
                                status_store,
                                board,
                                FeedConnectionState::Error,
                                &config.ws_url,
                                Some(format!("push channel transport error: {error}")),
                            )
                            .await;
                            break;
                        }
                    }
                }

                if cancel_token.is_cancelled() {
                    break;
                }

                publish_status(
                    status_store,
                    board,
                    FeedConnectionState::Disconnected,
                    &config.ws_url,
                    Some("push channel closed".to_string()),
                )
                .await;
            }
            Err(error) => {
                publish_status(
                    status_store,
                    board,
                    FeedConnectionState::Error,
                    &config.ws_url,
                    Some(format!("push channel connect failed: {error}")),
                )
                .await;
                publish_status(
                    status_store,
                    board,
                    FeedConnectionState::Disconnected,
                    &config.ws_url,
                    Some("push channel unavailable".to_string()),
                )
                .await;
            }
        }

        // Flat reconnect interval, no backoff growth, no retry cap.
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_millis(config.reconnect_delay_ms)) => {}
        }
    }
}

fn handle_message(message: Message, board: &SalesBoard) -> StreamDirective {
    match message {
        Message::Text(text_payload) => {
            let mut owned_payload = text_payload.into_bytes();
            apply_payload(owned_payload.as_mut_slice(), board);
            StreamDirective::Continue
        }
        Message::Binary(mut binary_payload) => {
            apply_payload(binary_payload.as_mut_slice(), board);
            StreamDirective::Continue
        }
        Message::Close(_) => StreamDirective::Disconnect,
        _ => StreamDirective::Continue,
    }
}

fn apply_payload(payload: &mut [u8], board: &SalesBoard) {
    match decode_inbound_frame(payload) {
        Ok(InboundFrame::Update(update)) => board.apply_update(&update),
        Ok(InboundFrame::Unhandled) => {
            tracing::debug!("ignoring inbound frame with unrecognized type");
        }
        Err(error) => {
            tracing::debug!(%error, "dropping malformed inbound frame");
        }
    }
}

/// Synthesizes the feed locally: one randomly-sampled purchase per tick,
/// pushed through the same apply path as live frames, with full running
/// totals so replacement semantics hold.
async fn run_mock_feed(
    config: &FeedConfig,
    board: &Arc<SalesBoard>,
    status_store: &Arc<RwLock<FeedStatusSnapshot>>,
    cancel_token: &CancellationToken,
) {
    publish_status(
        status_store,
        board,
        FeedConnectionState::Connecting,
        MOCK_ENDPOINT,
        Some("starting mock feed".to_string()),
    )
    .await;
    publish_status(
        status_store,
        board,
        FeedConnectionState::Connected,
        MOCK_ENDPOINT,
        Some("mock mode active".to_string()),
    )
    .await;

    let sampler = GeoSampler::new();
    let mut tally = Tally::default();
    let mut order_seq = 0_u64;
    let mut ticker = tokio::time::interval(Duration::from_millis(config.mock_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !cancel_token.is_cancelled() {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                order_seq = order_seq.saturating_add(1);
                let product = if rand::thread_rng().gen_bool(0.5) {
                    Product::Kinoko
                } else {
                    Product::Takenoko
                };
                match product {
                    Product::Kinoko => tally.kinoko += 1,
                    Product::Takenoko => tally.takenoko += 1,
                }

                let city = sampler.sample();
                board.apply_update(&UpdateFrame {
                    tally,
                    new_order: Some(NewOrder {
                        product,
                        location: Some(Location::from(city)),
                        order_id: Some(format!("mock-{order_seq}")),
                    }),
                });
            }
        }
    }
}

async fn publish_status(
    status_store: &Arc<RwLock<FeedStatusSnapshot>>,
    board: &Arc<SalesBoard>,
    state: FeedConnectionState,
    endpoint: &str,
    reason: Option<String>,
) {
    let snapshot = FeedStatusSnapshot {
        state,
        endpoint: endpoint.to_string(),
        reason,
        changed_at_ms: now_unix_ms(),
    };
    tracing::info!(
        state = state.as_str(),
        reason = snapshot.reason.as_deref().unwrap_or(""),
        "feed status"
    );

    {
        let mut writable = status_store.write().await;
        *writable = snapshot.clone();
    }

    board.sink().status_changed(&snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::RecordingSink;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    fn test_config(ws_url: String, reconnect_delay_ms: u64) -> FeedConfig {
        FeedConfig {
            ws_url,
            api_base: "http://127.0.0.1:1".to_string(),
            reconnect_delay_ms,
            mock_mode: false,
            mock_interval_ms: 800,
        }
    }

    fn test_fixture(endpoint: &str) -> (Arc<RecordingSink>, Arc<SalesBoard>, Arc<RwLock<FeedStatusSnapshot>>) {
        let sink = Arc::new(RecordingSink::default());
        let board = Arc::new(SalesBoard::new(sink.clone()));
        let status_store = Arc::new(RwLock::new(FeedStatusSnapshot::idle(
            endpoint.to_string(),
            None,
        )));
        (sink, board, status_store)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition should hold before the timeout");
    }

    #[tokio::test]
    async fn reconnects_after_loss_with_the_configured_flat_delay() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            // First connection closes right after the handshake.
            let (stream, _) = listener.accept().await.expect("first accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("first handshake");
            ws.close(None).await.expect("close");

            // Second connection stays open until the test tears down.
            let (stream, _) = listener.accept().await.expect("second accept");
            let _ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("second handshake");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let ws_url = format!("ws://{addr}");
        let (sink, board, status_store) = test_fixture(&ws_url);
        let cancel_token = CancellationToken::new();
        let feed = tokio::spawn(run_feed(
            test_config(ws_url, 200),
            board,
            status_store,
            cancel_token.clone(),
        ));

        wait_until(|| {
            sink.status_states()
                .iter()
                .filter(|state| **state == FeedConnectionState::Connected)
                .count()
                >= 2
        })
        .await;

        let states = sink.status_states();
        assert_eq!(
            &states[..5],
            &[
                FeedConnectionState::Connecting,
                FeedConnectionState::Connected,
                FeedConnectionState::Disconnected,
                FeedConnectionState::Connecting,
                FeedConnectionState::Connected,
            ]
        );

        // The gap between the drop and the next attempt is the configured
        // flat interval, within scheduler tolerance.
        let snapshots = sink.statuses.lock().clone();
        let delay_ms = snapshots[3].changed_at_ms - snapshots[2].changed_at_ms;
        assert!(delay_ms >= 180, "reconnect fired after {delay_ms}ms");
        assert!(delay_ms < 2_000, "reconnect fired after {delay_ms}ms");

        cancel_token.cancel();
        feed.await.expect("feed task");
        server.abort();
    }

    #[tokio::test]
    async fn malformed_and_unrecognized_frames_change_nothing() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
            ws.send(Message::Text("not-json".to_string())).await.expect("send");
            ws.send(Message::Text(r#"{"type":"heartbeat"}"#.to_string()))
                .await
                .expect("send");
            ws.send(Message::Text(
                r#"{"type":"update","data":{"kinoko":2,"takenoko":1}}"#.to_string(),
            ))
            .await
            .expect("send");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let ws_url = format!("ws://{addr}");
        let (sink, board, status_store) = test_fixture(&ws_url);
        let cancel_token = CancellationToken::new();
        let feed = tokio::spawn(run_feed(
            test_config(ws_url, 200),
            board.clone(),
            status_store,
            cancel_token.clone(),
        ));

        wait_until(|| board.tally() == Tally { kinoko: 2, takenoko: 1 }).await;

        // The garbage frames were dropped without a state transition.
        assert_eq!(
            sink.status_states(),
            vec![FeedConnectionState::Connecting, FeedConnectionState::Connected]
        );
        assert_eq!(*sink.tallies.lock(), vec![Tally { kinoko: 2, takenoko: 1 }]);

        cancel_token.cancel();
        feed.await.expect("feed task");
        server.abort();
    }

    #[tokio::test]
    async fn located_new_order_from_the_wire_reaches_the_map() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
            ws.send(Message::Text(
                r#"{"type":"update","data":{"kinoko":1,"takenoko":0,"newOrder":{"product":"kinoko","location":{"name":"Tokyo","lat":35.6762,"lng":139.6503,"region":"kanto"}}}}"#
                    .to_string(),
            ))
            .await
            .expect("send");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let ws_url = format!("ws://{addr}");
        let (sink, board, status_store) = test_fixture(&ws_url);
        let cancel_token = CancellationToken::new();
        let feed = tokio::spawn(run_feed(
            test_config(ws_url, 200),
            board,
            status_store,
            cancel_token.clone(),
        ));

        wait_until(|| !sink.markers.lock().is_empty()).await;

        let markers = sink.markers.lock().clone();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].product, Product::Kinoko);
        assert_eq!(markers[0].location.name, "Tokyo");

        cancel_token.cancel();
        feed.await.expect("feed task");
        server.abort();
    }

    #[tokio::test]
    async fn mock_feed_applies_running_totals() {
        let (sink, board, status_store) = test_fixture(MOCK_ENDPOINT);
        let config = FeedConfig {
            ws_url: "ws://unused".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
            reconnect_delay_ms: 200,
            mock_mode: true,
            mock_interval_ms: 50,
        };
        let cancel_token = CancellationToken::new();
        let feed = tokio::spawn(run_feed(
            config,
            board.clone(),
            status_store,
            cancel_token.clone(),
        ));

        wait_until(|| {
            let tally = board.tally();
            tally.kinoko + tally.takenoko >= 3
        })
        .await;

        assert_eq!(
            &sink.status_states()[..2],
            &[FeedConnectionState::Connecting, FeedConnectionState::Connected]
        );
        assert!(sink.markers.lock().len() >= 3);

        cancel_token.cancel();
        feed.await.expect("feed task");

        // Teardown publishes the final disconnected status.
        assert_eq!(
            sink.status_states().last(),
            Some(&FeedConnectionState::Disconnected)
        );
    }
}
