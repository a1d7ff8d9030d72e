use crate::feed::types::{Product, Tally, UpdateFrame};
use crate::geo::Location;
use crate::ui::{MarkerPlacement, RenderSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// The one place aggregate counts are allowed to change.
///
/// Inbound pushes land in `apply_update`, which replaces the tally wholesale
/// and fans out to the rendering sinks. Locally-initiated purchases go
/// through `place_local_marker`, which touches the map sink only — keeping
/// the chart strictly authoritative even while markers render optimistically.
pub struct SalesBoard {
    tally: Mutex<Tally>,
    sink: Arc<dyn RenderSink>,
}

impl SalesBoard {
    pub fn new(sink: Arc<dyn RenderSink>) -> Self {
        Self {
            tally: Mutex::new(Tally::default()),
            sink,
        }
    }

    pub fn sink(&self) -> &Arc<dyn RenderSink> {
        &self.sink
    }

    pub fn tally(&self) -> Tally {
        *self.tally.lock()
    }

    /// Applies one authoritative update: absolute replacement of the counts
    /// (the push channel sends full totals, never deltas), then the chart
    /// sink, then a map marker when the update carries a located new order.
    pub fn apply_update(&self, frame: &UpdateFrame) {
        {
            let mut tally = self.tally.lock();
            *tally = frame.tally;
        }
        self.sink.tally_changed(&frame.tally);

        if let Some(order) = &frame.new_order {
            if let Some(location) = &order.location {
                self.sink.marker_placed(&MarkerPlacement {
                    product: order.product,
                    location: location.clone(),
                });
            }
        }
    }

    /// Optimistic marker for a locally-dispatched purchase. Never reads or
    /// writes the tally; the authoritative count for this purchase arrives
    /// later over the push channel.
    pub fn place_local_marker(&self, product: Product, location: Location) {
        self.sink.marker_placed(&MarkerPlacement { product, location });
    }
}
