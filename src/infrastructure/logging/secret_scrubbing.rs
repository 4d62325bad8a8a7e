use regex::Regex;
use std::fmt;

/// Removes Telegram bot tokens from text before it reaches a log line.
///
/// The Bot API puts the token in the request path (`/bot<token>/method`),
/// so transport errors that echo the URL would otherwise leak it.
#[derive(Clone)]
pub struct SecretScrubber {
    url_token_pattern: Regex,
    bare_token_pattern: Regex,
}

impl SecretScrubber {
    /// Create a new scrubber
    pub fn new() -> Self {
        Self {
            // Match tokens embedded in Bot API paths: /bot123456:AA.../sendMessage
            url_token_pattern: Regex::new(r"/bot\d+:[A-Za-z0-9_-]+").expect("valid url token regex"),
            // Match bare tokens: 123456789:AAE...
            bare_token_pattern: Regex::new(r"\b\d{5,}:[A-Za-z0-9_-]{30,}")
                .expect("valid bare token regex"),
        }
    }

    /// Scrub a message of bot tokens
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .url_token_pattern
            .replace_all(message, "/bot[TOKEN_REDACTED]");
        self.bare_token_pattern
            .replace_all(&scrubbed, "[TOKEN_REDACTED]")
            .into_owned()
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456789:AAEhBOweik6ad9r_QXMENQjcrGbqCr4K-xw";

    #[test]
    fn test_scrub_token_in_url() {
        let scrubber = SecretScrubber::new();
        let message = format!(
            "error sending request for url (https://api.telegram.org/bot{TOKEN}/sendMessage)"
        );
        let scrubbed = scrubber.scrub_message(&message);

        assert!(!scrubbed.contains(TOKEN));
        assert!(scrubbed.contains("/bot[TOKEN_REDACTED]/sendMessage"));
    }

    #[test]
    fn test_scrub_bare_token() {
        let scrubber = SecretScrubber::new();
        let scrubbed = scrubber.scrub_message(&format!("token={TOKEN}"));

        assert!(!scrubbed.contains(TOKEN));
        assert_eq!(scrubbed, "token=[TOKEN_REDACTED]");
    }

    #[test]
    fn test_no_scrubbing_needed() {
        let scrubber = SecretScrubber::new();
        let message = "#N720. 3(Q♦5♥A♥) at 12:30";
        assert_eq!(scrubber.scrub_message(message), message);
    }
}
