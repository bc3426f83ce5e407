//! Digest document model.
//!
//! A digest is an ordered sequence of display blocks. Block ordering is part
//! of the contract: chat-side rendering relies on the sections always
//! appearing in the same positions.

use serde_json::{Value, json};

/// One display block of the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestBlock {
    /// Plain-text header
    Header { text: String },
    /// Markdown body section
    Section { text: String },
    /// Horizontal rule
    Divider,
    /// Small-print footer
    Context { text: String },
}

impl DigestBlock {
    /// Slack Block Kit JSON for this block.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Header { text } => json!({
                "type": "header",
                "text": { "type": "plain_text", "text": text }
            }),
            Self::Section { text } => json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": text }
            }),
            Self::Divider => json!({ "type": "divider" }),
            Self::Context { text } => json!({
                "type": "context",
                "elements": [ { "type": "mrkdwn", "text": text } ]
            }),
        }
    }

    /// Plain-text rendering, used for the notification fallback.
    pub fn to_plain_text(&self) -> Option<String> {
        match self {
            Self::Header { text } | Self::Section { text } | Self::Context { text } => {
                Some(text.replace('*', ""))
            }
            Self::Divider => None,
        }
    }
}

/// Ordered digest document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestDocument {
    blocks: Vec<DigestBlock>,
}

impl DigestDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block.
    pub fn push(&mut self, block: DigestBlock) {
        self.blocks.push(block);
    }

    /// Blocks in display order.
    pub fn blocks(&self) -> &[DigestBlock] {
        &self.blocks
    }

    /// Block Kit JSON array for the message payload.
    pub fn to_blocks_json(&self) -> Vec<Value> {
        self.blocks.iter().map(DigestBlock::to_json).collect()
    }

    /// Plain-text fallback, one line per textual block.
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(DigestBlock::to_plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
