//! Offline replay of recorded source messages.
//!
//! The input is split into chunks on lines containing only `---`. Each chunk
//! is one source message, except:
//! - chunks starting with `/` are admin commands sent as the configured admin
//! - chunks whose first line is `[edit]` are edits of an earlier message

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::output::{output, table_with_header, truncate, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::memory_sink::{InMemorySink, SinkEntry};
use crate::services::{EngineSnapshot, RelayReport, RelayService};

const SEPARATOR: &str = "---";
const EDIT_MARKER: &str = "[edit]";

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File with recorded messages, or `-` for stdin
    pub input: PathBuf,
}

/// One chunk of replay input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayItem {
    Message(String),
    Edit(String),
    Command(String),
}

/// Split raw replay input into items.
pub fn parse_items(input: &str) -> Vec<ReplayItem> {
    let mut items = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |lines: &mut Vec<&str>| {
        let chunk = lines.join("\n");
        lines.clear();
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return;
        }
        if chunk.starts_with('/') {
            items.push(ReplayItem::Command(chunk.to_string()));
        } else if let Some(rest) = chunk.strip_prefix(EDIT_MARKER) {
            items.push(ReplayItem::Edit(rest.trim().to_string()));
        } else {
            items.push(ReplayItem::Message(chunk.to_string()));
        }
    };

    for line in input.lines() {
        if line.trim() == SEPARATOR {
            flush(&mut current);
        } else {
            current.push(line);
        }
    }
    flush(&mut current);

    items
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayStep {
    Message { report: RelayReport },
    Edit { report: RelayReport },
    Command { command: String, reply: Option<String> },
}

#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub steps: Vec<ReplayStep>,
    /// Every post and edit sent to the prediction channel.
    pub notifications: Vec<SinkEntry>,
    /// Messages forwarded to the admin.
    pub forwarded: usize,
    pub snapshot: EngineSnapshot,
}

impl ReplayOutput {
    fn step_row(index: usize, step: &ReplayStep) -> Vec<String> {
        match step {
            ReplayStep::Message { report } | ReplayStep::Edit { report } => {
                let kind = if matches!(step, ReplayStep::Edit { .. }) { "edit" } else { "message" };
                let mut detail = Vec::new();
                if let Some(obs) = &report.observation {
                    if !obs.created.is_empty() {
                        let targets: Vec<String> =
                            obs.created.iter().map(|p| format!("#{}", p.target_game)).collect();
                        detail.push(format!("created {}", targets.join(",")));
                    }
                    for p in &obs.resolved {
                        detail.push(format!("#{} {:?}", p.target_game, p.status()));
                    }
                    for r in &obs.rejected {
                        detail.push(format!("rejected: {}", r.reason));
                    }
                }
                if let Some(err) = &report.error {
                    detail.push(err.clone());
                }
                vec![
                    index.to_string(),
                    kind.to_string(),
                    report.game.map_or_else(|| "-".to_string(), |g| g.to_string()),
                    format!("{:?}", report.disposition),
                    detail.join("; "),
                ]
            }
            ReplayStep::Command { command, reply } => vec![
                index.to_string(),
                "command".to_string(),
                "-".to_string(),
                truncate(command, 20),
                reply
                    .as_deref()
                    .map_or_else(String::new, |r| truncate(&r.replace('\n', " "), 60)),
            ],
        }
    }
}

impl CommandOutput for ReplayOutput {
    fn to_human(&self) -> String {
        let mut table = table_with_header(&["#", "KIND", "GAME", "RESULT", "DETAIL"]);
        for (i, step) in self.steps.iter().enumerate() {
            table.add_row(Self::step_row(i + 1, step));
        }

        let mut lines = vec![table.to_string()];

        if !self.notifications.is_empty() {
            lines.push(format!("\nPrediction channel ({} call(s)):", self.notifications.len()));
            for entry in &self.notifications {
                let (kind, handle) = match entry {
                    SinkEntry::Post { handle, .. } => ("post", handle),
                    SinkEntry::Edit { handle, .. } => ("edit", handle),
                };
                lines.push(format!("[{kind} msg:{handle}]\n{}", entry.text()));
            }
        }

        lines.push(format!(
            "\nForwarded: {}  Active: {}  Last game: {}",
            self.forwarded,
            self.snapshot.active.len(),
            self.snapshot
                .last_game
                .map_or_else(|| "-".to_string(), |g| g.to_string())
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run every item through a relay backed by in-memory sinks.
pub async fn replay(relay: &RelayService, admin_id: i64, items: Vec<ReplayItem>) -> Vec<ReplayStep> {
    let mut steps = Vec::with_capacity(items.len());
    for item in items {
        let step = match item {
            ReplayItem::Message(text) => ReplayStep::Message {
                report: relay.handle_source_message(&text).await,
            },
            ReplayItem::Edit(text) => ReplayStep::Edit {
                report: relay.handle_source_edit(&text).await,
            },
            ReplayItem::Command(command) => {
                let reply = relay.handle_admin_command(admin_id, &command).await;
                ReplayStep::Command { command, reply }
            }
        };
        steps.push(step);
    }
    steps
}

pub async fn execute(args: ReplayArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_optional(config_path)?;
    let input = read_input(&args.input).await?;
    let items = parse_items(&input);

    let sink = Arc::new(InMemorySink::new());
    let admin_sink = Arc::new(InMemorySink::new());
    let relay = RelayService::new(&config, sink.clone()).with_admin_sink(admin_sink.clone());

    let steps = replay(&relay, config.telegram.admin_id, items).await;

    let out = ReplayOutput {
        steps,
        notifications: sink.entries(),
        forwarded: admin_sink.posts().len(),
        snapshot: relay.snapshot().await,
    };
    output(&out, json_mode);
    Ok(())
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read replay input from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay input {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Config;

    const SESSION: &str = "\
#N720. 5(K♠️9♥️) - 3(J♦️3♣️)
---
#N721. ✅8(8♥️Q♣️) - 6(6♦️)
---
/status
---
[edit]
#N722. ✅2(A♠️A♣️) - 9(9♠️)
";

    #[test]
    fn test_parse_items_kinds() {
        let items = parse_items(SESSION);
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], ReplayItem::Message(ref t) if t.starts_with("#N720")));
        assert_eq!(items[2], ReplayItem::Command("/status".to_string()));
        assert!(matches!(items[3], ReplayItem::Edit(ref t) if t.starts_with("#N722")));
    }

    #[test]
    fn test_parse_items_skips_empty_chunks() {
        let items = parse_items("---\n\n---\n#N5 (♠️)\n---\n");
        assert_eq!(items, vec![ReplayItem::Message("#N5 (♠️)".to_string())]);
    }

    #[tokio::test]
    async fn test_replay_posts_and_edits() {
        let sink = Arc::new(InMemorySink::new());
        let relay = RelayService::new(&Config::default(), sink.clone());

        let steps = replay(&relay, 0, parse_items(SESSION)).await;
        assert_eq!(steps.len(), 4);

        // #720 predicts ♠ for #722, the #722 edit verifies it at stage 0
        let posts = sink.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text().contains("#722"));
        let edits = sink.edits();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].text().contains("\u{2705}0\u{FE0F}\u{20E3}"));

        match &steps[2] {
            ReplayStep::Command { reply, .. } => assert!(reply.is_some()),
            other => panic!("Expected command step, got {other:?}"),
        }
    }
}
