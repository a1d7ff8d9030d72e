pub mod board;
pub mod dispatch;
pub mod endpoint;
pub mod persistence;
pub mod pipeline;
pub mod types;

pub const TALLY_UPDATE_EVENT: &str = "tally_update";
pub const MARKER_PLACED_EVENT: &str = "marker_placed";
pub const FEED_STATUS_EVENT: &str = "feed_status";
