pub mod config;
pub mod game_record;
pub mod prediction;
pub mod suit;

pub use config::{
    BackupAnchor, Config, ContinuationPolicy, CreationTrigger, EngineConfig, LoggingConfig,
    RelayConfig, TelegramConfig,
};
pub use game_record::GameRecord;
pub use prediction::{
    CheckOutcome, MessageHandle, Prediction, PredictionOrigin, PredictionStatus,
};
pub use suit::{extract_first_suit, normalize_suits, Suit, SuitPairTable};
