//! Markdown rule files evaluated against hook events.
//!
//! A rule lives in `.claude/hookify/rules/<name>.local.md`: YAML frontmatter
//! describing when it fires, followed by the message shown when it does.
//!
//! ```markdown
//! ---
//! name: no-force-push
//! event: bash
//! action: block
//! conditions:
//!   - field: command
//!     operator: regex_match
//!     pattern: git\s+push\s+.*--force
//! ---
//! Force pushes rewrite shared history. Push a new commit instead.
//! ```

mod engine;
mod loader;

pub use engine::RuleEngine;
pub use loader::{load_rules, parse_rule, RULES_DIR};

use serde::Deserialize;

/// Which family of hook events a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleEvent {
    Bash,
    File,
    Stop,
    Prompt,
    #[default]
    All,
}

impl RuleEvent {
    /// Event family for a tool call, `None` when the tool has no family.
    pub fn for_tool(tool_name: &str) -> Option<Self> {
        match tool_name {
            "Bash" => Some(Self::Bash),
            "Edit" | "Write" | "MultiEdit" => Some(Self::File),
            _ => None,
        }
    }

    /// Field a bare `pattern:` is matched against.
    pub fn default_field(self) -> &'static str {
        match self {
            Self::Bash => "command",
            Self::File => "new_text",
            Self::Prompt => "user_prompt",
            Self::Stop | Self::All => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Warn,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    RegexMatch,
    Contains,
    Equals,
    NotContains,
    StartsWith,
    EndsWith,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub enabled: bool,
    pub event: RuleEvent,
    pub action: Action,
    /// `*` or `|`-separated tool names.
    pub tool_matcher: Option<String>,
    pub conditions: Vec<Condition>,
    pub message: String,
}

impl Rule {
    pub fn applies_to(&self, event: Option<RuleEvent>) -> bool {
        match event {
            None => true,
            Some(e) => self.event == RuleEvent::All || self.event == e,
        }
    }
}
