//! Port trait definitions (Hexagonal Architecture)
//!
//! - NotificationSink: posting and editing prediction messages
//!
//! Services depend on these traits so the engine stays independent of the
//! chat transport.

pub mod notification_sink;
pub mod null_sink;

pub use notification_sink::NotificationSink;
pub use null_sink::NullNotificationSink;
