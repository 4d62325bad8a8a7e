//! In-memory notification sink.
//!
//! Records every post and edit instead of sending it anywhere. Used by the
//! replay command and by tests.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::domain::errors::SinkError;
use crate::domain::models::MessageHandle;
use crate::domain::ports::NotificationSink;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEntry {
    Post { handle: i64, text: String },
    Edit { handle: i64, text: String },
}

impl SinkEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Post { text, .. } | Self::Edit { text, .. } => text,
        }
    }
}

/// Sink that keeps every call in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    entries: Mutex<Vec<SinkEntry>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Recorded calls in order.
    pub fn entries(&self) -> Vec<SinkEntry> {
        self.lock().clone()
    }

    pub fn posts(&self) -> Vec<SinkEntry> {
        self.lock()
            .iter()
            .filter(|e| matches!(e, SinkEntry::Post { .. }))
            .cloned()
            .collect()
    }

    pub fn edits(&self) -> Vec<SinkEntry> {
        self.lock()
            .iter()
            .filter(|e| matches!(e, SinkEntry::Edit { .. }))
            .cloned()
            .collect()
    }

    /// Current text of a posted message after all edits.
    pub fn current_text(&self, handle: MessageHandle) -> Option<String> {
        self.lock()
            .iter()
            .rev()
            .find_map(|entry| match entry {
                SinkEntry::Post { handle: h, text } | SinkEntry::Edit { handle: h, text }
                    if *h == handle.raw() =>
                {
                    Some(text.clone())
                }
                _ => None,
            })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkEntry>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_failing(&self) -> Result<(), SinkError> {
        if self.failing.load(Ordering::Relaxed) {
            Err(SinkError::Transport("simulated failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationSink for InMemorySink {
    async fn post(&self, text: &str) -> Result<MessageHandle, SinkError> {
        self.check_failing()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().push(SinkEntry::Post {
            handle: id,
            text: text.to_string(),
        });
        Ok(MessageHandle::new(id))
    }

    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), SinkError> {
        self.check_failing()?;
        let mut entries = self.lock();
        let known = entries.iter().any(
            |e| matches!(e, SinkEntry::Post { handle: h, .. } if *h == handle.raw()),
        );
        if !known {
            return Err(SinkError::Rejected(format!("unknown message {handle}")));
        }
        entries.push(SinkEntry::Edit {
            handle: handle.raw(),
            text: text.to_string(),
        });
        Ok(())
    }
}
