//! Card suits and suit-glyph extraction.
//!
//! Source messages embed suit glyphs directly after rank tokens inside free
//! text groups such as `Q♦️5♥A❤️`. The same suit may arrive in several
//! encodings (plain glyph, emoji presentation selector, heavy heart), so every
//! comparison goes through [`normalize_suits`] first.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Emoji presentation selector (VS16).
const VARIATION_SELECTOR_EMOJI: char = '\u{FE0F}';
/// Text presentation selector (VS15).
const VARIATION_SELECTOR_TEXT: char = '\u{FE0E}';
/// Heavy black heart, used by some sources in place of `♥`.
const HEAVY_HEART: char = '\u{2764}';

/// One of the four card suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    /// ♠
    #[serde(alias = "♠", alias = "♠️")]
    Spades,
    /// ♥
    #[serde(alias = "♥", alias = "♥️", alias = "❤️")]
    Hearts,
    /// ♦
    #[serde(alias = "♦", alias = "♦️")]
    Diamonds,
    /// ♣
    #[serde(alias = "♣", alias = "♣️")]
    Clubs,
}

impl Suit {
    /// All suits in canonical order.
    pub const ALL: [Self; 4] = [Self::Spades, Self::Hearts, Self::Diamonds, Self::Clubs];

    /// Canonical single-codepoint glyph used for matching.
    pub const fn glyph(self) -> char {
        match self {
            Self::Spades => '♠',
            Self::Hearts => '♥',
            Self::Diamonds => '♦',
            Self::Clubs => '♣',
        }
    }

    /// Emoji form used when displaying the suit in a notification.
    pub const fn display(self) -> &'static str {
        match self {
            Self::Spades => "♠️",
            Self::Hearts => "❤️",
            Self::Diamonds => "♦️",
            Self::Clubs => "♣️",
        }
    }

    /// Full display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spades => "Pique",
            Self::Hearts => "Cœur",
            Self::Diamonds => "Carreau",
            Self::Clubs => "Trèfle",
        }
    }

    /// Map a canonical glyph back to its suit.
    pub const fn from_glyph(c: char) -> Option<Self> {
        match c {
            '♠' => Some(Self::Spades),
            '♥' => Some(Self::Hearts),
            '♦' => Some(Self::Diamonds),
            '♣' => Some(Self::Clubs),
            _ => None,
        }
    }

    /// Number of occurrences of this suit's canonical glyph in `group`.
    ///
    /// This is a raw glyph count on the normalized text, not a card count.
    pub fn count_in(self, group: &str) -> usize {
        let glyph = self.glyph();
        normalize_suits(group).chars().filter(|&c| c == glyph).count()
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display(), self.name())
    }
}

/// Fold every suit-glyph variant to its canonical single-codepoint glyph.
///
/// `❤` becomes `♥`, and presentation selectors directly following a suit
/// glyph are dropped. Selectors elsewhere in the text are left untouched.
/// Applying this twice yields the same string as applying it once.
pub fn normalize_suits(group: &str) -> String {
    let mut out = String::with_capacity(group.len());
    let mut after_suit = false;

    for c in group.chars() {
        if after_suit && (c == VARIATION_SELECTOR_EMOJI || c == VARIATION_SELECTOR_TEXT) {
            continue;
        }

        let c = if c == HEAVY_HEART { '♥' } else { c };
        after_suit = Suit::from_glyph(c).is_some();
        out.push(c);
    }

    out
}

/// Suit of the first card in a group: the first suit glyph scanning left to right.
pub fn extract_first_suit(group: &str) -> Option<Suit> {
    normalize_suits(group).chars().find_map(Suit::from_glyph)
}

/// Pairing table used to pick the suit of a backup prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuitPairTable(BTreeMap<Suit, Suit>);

impl SuitPairTable {
    /// Build a table from explicit pairs. Later entries win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Suit, Suit)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Paired suit, or the suit itself when the table has no entry for it.
    pub fn opposite(&self, suit: Suit) -> Suit {
        self.0.get(&suit).copied().unwrap_or(suit)
    }

    /// Iterate over configured pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Suit, Suit)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl Default for SuitPairTable {
    /// ♠↔♥ and ♣↔♦.
    fn default() -> Self {
        Self::from_pairs([
            (Suit::Spades, Suit::Hearts),
            (Suit::Hearts, Suit::Spades),
            (Suit::Clubs, Suit::Diamonds),
            (Suit::Diamonds, Suit::Clubs),
        ])
    }
}
