//! Duplicate suppression for inbound source messages.
//!
//! The source channel can deliver the same message more than once (edits,
//! reconnects). Two bounded memories guard the engine:
//! - message fingerprints, so an identical delivery is dropped;
//! - finalized game numbers, so verification runs once per game.

use std::collections::{HashSet, VecDeque};

/// Characters of message text kept in a fingerprint.
const FINGERPRINT_CHARS: usize = 50;

/// Bounded FIFO set; the oldest entry is evicted when full.
#[derive(Debug, Clone)]
struct BoundedSet<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
    capacity: usize,
}

impl<T: Clone + Eq + std::hash::Hash> BoundedSet<T> {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Insert and report whether the value was new.
    fn insert(&mut self, value: T) -> bool {
        if !self.members.insert(value.clone()) {
            return false;
        }
        self.order.push_back(value);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.members.remove(&old);
            }
        }
        true
    }

    fn contains(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Fingerprint of one message: game number, finalization state and leading text.
///
/// The provisional and finalized versions of a game can share their leading
/// text when the marker sits past [`FINGERPRINT_CHARS`], so the state is part
/// of the key.
pub fn fingerprint(game: u64, finalized: bool, text: &str) -> String {
    let head: String = text.chars().take(FINGERPRINT_CHARS).collect();
    let state = if finalized { 'F' } else { 'P' };
    format!("{game}_{state}_{head}")
}

/// Decision for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time this message is seen.
    Fresh,
    /// Identical message already processed.
    Duplicate,
    /// A finalized message for this game was already verified.
    AlreadyFinalized,
}

/// Remembers recently seen messages and finalized games.
#[derive(Debug, Clone)]
pub struct RecentMessageFilter {
    messages: BoundedSet<String>,
    finalized: BoundedSet<u64>,
}

impl RecentMessageFilter {
    pub fn new(message_capacity: usize, finalized_capacity: usize) -> Self {
        Self {
            messages: BoundedSet::new(message_capacity),
            finalized: BoundedSet::new(finalized_capacity),
        }
    }

    /// Check a message and remember it when fresh.
    pub fn admit(&mut self, game: u64, text: &str, finalized: bool) -> Admission {
        if finalized && self.finalized.contains(&game) {
            return Admission::AlreadyFinalized;
        }
        if !self.messages.insert(fingerprint(game, finalized, text)) {
            return Admission::Duplicate;
        }
        if finalized {
            self.finalized.insert(game);
        }
        Admission::Fresh
    }

    /// Whether a finalized message for this game has been admitted.
    #[cfg(test)]
    pub fn is_finalized(&self, game: u64) -> bool {
        self.finalized.contains(&game)
    }

    /// Remembered fingerprints.
    #[cfg(test)]
    pub fn remembered(&self) -> usize {
        self.messages.len()
    }
}
