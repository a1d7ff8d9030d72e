use crate::error::AppError;
use crate::geo::Location;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str =
    "https://v04tokbw1g.execute-api.ap-northeast-1.amazonaws.com/prod";
pub const DEFAULT_WS_ENDPOINT: &str =
    "wss://svo2gfv6ml.execute-api.ap-northeast-1.amazonaws.com/prod";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
pub const DEFAULT_MOCK_MODE: bool = false;
pub const DEFAULT_MOCK_INTERVAL_MS: u64 = 800;
pub const MIN_RECONNECT_DELAY_MS: u64 = 100;
pub const MAX_RECONNECT_DELAY_MS: u64 = 60_000;
pub const MIN_MOCK_INTERVAL_MS: u64 = 50;
pub const MAX_MOCK_INTERVAL_MS: u64 = 10_000;

/// Frame type the push channel uses for aggregate updates. Anything else is
/// dropped without being treated as an error.
pub const UPDATE_FRAME_TYPE: &str = "update";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Kinoko,
    Takenoko,
}

impl Product {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kinoko => "kinoko",
            Self::Takenoko => "takenoko",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, AppError> {
        match value {
            "kinoko" => Ok(Self::Kinoko),
            "takenoko" => Ok(Self::Takenoko),
            other => Err(AppError::InvalidArgument(format!(
                "unknown product '{other}'"
            ))),
        }
    }
}

/// Authoritative aggregate counts. Zeroed at startup and replaced wholesale
/// by each inbound update; local purchase actions never touch these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Tally {
    pub kinoko: u64,
    pub takenoko: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub product: Product,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// One decoded aggregate update from the push channel. Counts are full
/// current totals, never deltas; `new_order` is present only when the update
/// corresponds to a fresh purchase worth marking on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFrame {
    pub tally: Tally,
    pub new_order: Option<NewOrder>,
}

#[derive(Debug, PartialEq)]
pub enum InboundFrame {
    Update(UpdateFrame),
    Unhandled,
}

#[derive(Debug, Deserialize)]
struct InboundFrameWire {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    data: Option<TallyDataWire>,
}

#[derive(Debug, Deserialize)]
struct TallyDataWire {
    #[serde(default)]
    kinoko: Option<u64>,
    #[serde(default)]
    takenoko: Option<u64>,
    #[serde(rename = "newOrder", default)]
    new_order: Option<NewOrder>,
}

pub fn decode_inbound_frame(payload: &mut [u8]) -> Result<InboundFrame, AppError> {
    let wire: InboundFrameWire = simd_json::serde::from_slice(payload)?;
    if wire.frame_type != UPDATE_FRAME_TYPE {
        return Ok(InboundFrame::Unhandled);
    }

    let data = wire.data.ok_or_else(|| {
        AppError::InvalidArgument("update frame is missing its data field".to_string())
    })?;

    Ok(InboundFrame::Update(UpdateFrame {
        tally: Tally {
            kinoko: data.kinoko.unwrap_or(0),
            takenoko: data.takenoko.unwrap_or(0),
        },
        new_order: data.new_order,
    }))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl FeedConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatusSnapshot {
    pub state: FeedConnectionState,
    pub endpoint: String,
    pub reason: Option<String>,
    pub changed_at_ms: i64,
}

impl FeedStatusSnapshot {
    pub fn idle(endpoint: String, reason: Option<String>) -> Self {
        Self {
            state: FeedConnectionState::Disconnected,
            endpoint,
            reason,
            changed_at_ms: now_unix_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartFeedArgs {
    pub ws_url: Option<String>,
    pub api_base: Option<String>,
    pub reconnect_delay_ms: Option<u64>,
    pub mock_mode: Option<bool>,
    pub mock_interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    pub api_base: String,
    pub reconnect_delay_ms: u64,
    pub mock_mode: bool,
    pub mock_interval_ms: u64,
}

impl StartFeedArgs {
    pub fn normalize(self) -> Result<FeedConfig, AppError> {
        let ws_url = self
            .ws_url
            .unwrap_or_else(|| DEFAULT_WS_ENDPOINT.to_string())
            .trim()
            .to_string();
        if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
            return Err(AppError::InvalidArgument(
                "wsUrl must start with ws:// or wss://".to_string(),
            ));
        }

        let api_base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(AppError::InvalidArgument(
                "apiBase must start with http:// or https://".to_string(),
            ));
        }

        let reconnect_delay_ms = self
            .reconnect_delay_ms
            .unwrap_or(DEFAULT_RECONNECT_DELAY_MS);
        if !(MIN_RECONNECT_DELAY_MS..=MAX_RECONNECT_DELAY_MS).contains(&reconnect_delay_ms) {
            return Err(AppError::InvalidArgument(format!(
                "reconnectDelayMs must be between {MIN_RECONNECT_DELAY_MS} and {MAX_RECONNECT_DELAY_MS}"
            )));
        }

        let mock_mode = self.mock_mode.unwrap_or(DEFAULT_MOCK_MODE);
        let mock_interval_ms = self.mock_interval_ms.unwrap_or(DEFAULT_MOCK_INTERVAL_MS);
        if !(MIN_MOCK_INTERVAL_MS..=MAX_MOCK_INTERVAL_MS).contains(&mock_interval_ms) {
            return Err(AppError::InvalidArgument(format!(
                "mockIntervalMs must be between {MIN_MOCK_INTERVAL_MS} and {MAX_MOCK_INTERVAL_MS}"
            )));
        }

        Ok(FeedConfig {
            ws_url,
            api_base,
            reconnect_delay_ms,
            mock_mode,
            mock_interval_ms,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSession {
    pub running: bool,
    pub ws_url: String,
    pub api_base: String,
    pub reconnect_delay_ms: u64,
    pub mock_mode: bool,
}

impl FeedSession {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            running: true,
            ws_url: config.ws_url.clone(),
            api_base: config.api_base.clone(),
            reconnect_delay_ms: config.reconnect_delay_ms,
            mock_mode: config.mock_mode,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStopResult {
    pub stopped: bool,
}

/// Body of `POST <api_base>/purchase`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub product: Product,
    pub timestamp: String,
    pub location: Location,
}

/// Acknowledgement body returned by the write endpoint on 2xx. Only the
/// server-assigned order id is consumed, and only for the local journal.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<String>,
}

pub fn now_unix_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
