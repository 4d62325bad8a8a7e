use serde::{Deserialize, Serialize};

use super::suit::{extract_first_suit, Suit};

/// One observed game from the source channel.
///
/// Records are consumed once by the engine and then dropped; only the
/// sequence number and first group are remembered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Externally assigned, increasing game number.
    pub sequence: u64,

    /// Parenthesized card groups in message order.
    pub groups: Vec<String>,

    /// Whether the source marked this game's outcome as confirmed.
    pub finalized: bool,
}

impl GameRecord {
    /// Create a record.
    pub fn new(sequence: u64, groups: Vec<String>, finalized: bool) -> Self {
        Self {
            sequence,
            groups,
            finalized,
        }
    }

    /// Convenience constructor for a single-group record.
    pub fn single(sequence: u64, group: impl Into<String>, finalized: bool) -> Self {
        Self::new(sequence, vec![group.into()], finalized)
    }

    /// The first card group, the only one the engine looks at.
    pub fn first_group(&self) -> Option<&str> {
        self.groups.first().map(String::as_str)
    }

    /// Suit of the first card of the first group.
    pub fn first_suit(&self) -> Option<Suit> {
        self.first_group().and_then(extract_first_suit)
    }
}
