use crate::feed::types::{FeedStatusSnapshot, Product, Tally};
use crate::feed::{FEED_STATUS_EVENT, MARKER_PLACED_EVENT, TALLY_UPDATE_EVENT};
use crate::geo::Location;
use serde::Serialize;
use std::io::Write;

/// Map-marker payload: one dot per purchase, colored by product on the UI
/// side.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPlacement {
    pub product: Product,
    pub location: Location,
}

/// Rendering surface of the dashboard. Implementations are synchronous and
/// side-effect-only; the engine never consumes a return value.
///
/// The bar chart is fed exclusively through `tally_changed`, the map through
/// `marker_placed`, and the connection badge through `status_changed`.
pub trait RenderSink: Send + Sync {
    fn tally_changed(&self, tally: &Tally);
    fn marker_placed(&self, marker: &MarkerPlacement);
    fn status_changed(&self, status: &FeedStatusSnapshot);
}

#[derive(Serialize)]
struct EventLine<'a, T: Serialize> {
    event: &'a str,
    payload: &'a T,
}

/// Production sink: one JSON line per event on stdout, consumed by whatever
/// renders the dashboard.
#[derive(Debug, Default)]
pub struct StdoutBridge;

impl StdoutBridge {
    fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        let line = match serde_json::to_string(&EventLine { event, payload }) {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(%error, event, "failed to encode ui event");
                return;
            }
        };

        let mut stdout = std::io::stdout().lock();
        if let Err(error) = writeln!(stdout, "{line}") {
            tracing::debug!(%error, event, "ui bridge write failed");
        }
    }
}

impl RenderSink for StdoutBridge {
    fn tally_changed(&self, tally: &Tally) {
        self.emit(TALLY_UPDATE_EVENT, tally);
    }

    fn marker_placed(&self, marker: &MarkerPlacement) {
        self.emit(MARKER_PLACED_EVENT, marker);
    }

    fn status_changed(&self, status: &FeedStatusSnapshot) {
        self.emit(FEED_STATUS_EVENT, status);
    }
}

#[cfg(test)]
pub use testing::RecordingSink;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_payload_serializes_camel_case() {
        let marker = MarkerPlacement {
            product: Product::Takenoko,
            location: Location {
                name: "Osaka".to_string(),
                lat: 34.6937,
                lng: 135.5023,
                region: crate::geo::Region::Kansai,
            },
        };

        let json = serde_json::to_string(&marker).expect("marker should serialize");
        assert!(json.contains("\"product\":\"takenoko\""));
        assert!(json.contains("\"region\":\"kansai\""));
    }
}
