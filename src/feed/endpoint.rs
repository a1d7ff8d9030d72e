use crate::error::AppError;
use crate::feed::types::{PurchaseAck, PurchaseRequest};
use reqwest::Client;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};

pub type UpdateWsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn purchase_endpoint(api_base: &str) -> String {
    format!("{api_base}/purchase")
}

/// Opens the push channel. Update frames are tiny JSON documents, so the
/// transport limits are kept far below tungstenite's defaults.
pub async fn connect_update_stream(ws_url: &str) -> Result<UpdateWsStream, AppError> {
    let ws_config = WebSocketConfig {
        max_message_size: Some(1 << 20),
        max_frame_size: Some(256 << 10),
        ..Default::default()
    };

    let (stream, _) = connect_async_with_config(ws_url, Some(ws_config), true).await?;
    Ok(stream)
}

/// Submits one purchase to the write endpoint. Non-2xx responses surface as
/// errors; the caller decides that they are never fatal.
pub async fn submit_purchase(
    client: &Client,
    api_base: &str,
    request: &PurchaseRequest,
) -> Result<PurchaseAck, AppError> {
    let endpoint = purchase_endpoint(api_base);
    let response = client
        .post(endpoint)
        .json(request)
        .send()
        .await?
        .error_for_status()?;
    let ack = response.json::<PurchaseAck>().await?;
    Ok(ack)
}
