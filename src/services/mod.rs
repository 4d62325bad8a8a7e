pub mod admin;
pub mod dedup;
pub mod formatter;
pub mod message_parser;
pub mod prediction_engine;
pub mod relay_service;

pub use admin::AdminCommand;
pub use dedup::{Admission, RecentMessageFilter};
pub use prediction_engine::{EngineSnapshot, Observation, PredictionEngine, Rejection};
pub use relay_service::{Disposition, RelayReport, RelayService};
