//! Text side of the inbound record source.
//!
//! Source channel messages look like
//! `#N720. 3(Q♦5♥A♥) - 6(K♠️9♣) ✅`: a game number, one or more
//! parenthesized card groups, and optional status markers.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::errors::ParseError;
use crate::domain::models::GameRecord;

static GAME_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#N\s*(\d+)\.?").expect("valid game number regex"));

static CARD_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid card group regex"));

/// Result confirmed.
const MARK_CONFIRMED: char = '✅';
/// Result confirmed after a tie.
const MARK_CONFIRMED_ALT: char = '🔰';
/// Game still in progress; overrides the confirmation markers.
const MARK_IN_PROGRESS: char = '⏰';

/// Largest game number accepted from the source channel.
pub const MAX_GAME_NUMBER: u64 = 1_000_000_000;

/// First `#N<digits>` game number in the text, when it is in range.
pub fn parse_game_number(text: &str) -> Option<u64> {
    read_game_number(text).ok()
}

/// Game numbers are positive and at most [`MAX_GAME_NUMBER`].
fn read_game_number(text: &str) -> Result<u64, ParseError> {
    let digits = GAME_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::MissingGameNumber)?
        .as_str();
    digits
        .parse::<u64>()
        .ok()
        .filter(|n| (1..=MAX_GAME_NUMBER).contains(n))
        .ok_or_else(|| ParseError::GameNumberOutOfRange(digits.to_string()))
}

/// Contents of every parenthesized group, in order.
pub fn parse_card_groups(text: &str) -> Vec<String> {
    CARD_GROUP
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether the message reports a confirmed result.
pub fn is_finalized(text: &str) -> bool {
    if text.contains(MARK_IN_PROGRESS) {
        return false;
    }
    text.contains(MARK_CONFIRMED) || text.contains(MARK_CONFIRMED_ALT)
}

/// Turn a source message into a game record.
pub fn parse_record(text: &str) -> Result<GameRecord, ParseError> {
    let sequence = read_game_number(text)?;
    let groups = parse_card_groups(text);
    if groups.is_empty() {
        return Err(ParseError::NoCardGroups(sequence));
    }
    Ok(GameRecord::new(sequence, groups, is_finalized(text)))
}
