use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::{Action, Condition, Operator, Rule, RuleEvent};

/// Rules directory, relative to the project root.
pub const RULES_DIR: &str = ".claude/hookify/rules";
const RULE_SUFFIX: &str = ".local.md";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Frontmatter {
    name: Option<String>,
    enabled: bool,
    event: RuleEvent,
    action: Action,
    pattern: Option<String>,
    conditions: Vec<Condition>,
    tool_matcher: Option<String>,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            name: None,
            enabled: true,
            event: RuleEvent::All,
            action: Action::Warn,
            pattern: None,
            conditions: Vec::new(),
            tool_matcher: None,
        }
    }
}

/// Split `---` delimited frontmatter from the body.
fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse one rule file. `fallback_name` is used when the frontmatter has no
/// `name`.
pub fn parse_rule(text: &str, fallback_name: &str) -> Result<Rule> {
    let Some((yaml, body)) = split_frontmatter(text) else {
        bail!("missing frontmatter");
    };
    let front: Frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml).context("invalid frontmatter")?
    };

    let mut conditions = front.conditions;
    if conditions.is_empty() {
        if let Some(pattern) = front.pattern {
            conditions.push(Condition {
                field: front.event.default_field().to_string(),
                operator: Operator::RegexMatch,
                pattern,
            });
        }
    }

    Ok(Rule {
        name: front.name.unwrap_or_else(|| fallback_name.to_string()),
        enabled: front.enabled,
        event: front.event,
        action: front.action,
        tool_matcher: front.tool_matcher,
        conditions,
        message: body.trim().to_string(),
    })
}

/// Load enabled rules for `event` from `<project_dir>/.claude/hookify/rules`.
///
/// `event == None` loads every enabled rule. Unparseable files are skipped
/// with a warning so one bad rule cannot disable the rest.
pub fn load_rules(event: Option<RuleEvent>, project_dir: &Path) -> Result<Vec<Rule>> {
    let dir = project_dir.join(RULES_DIR);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", dir.display())),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", dir.display()))?
            .path();
        let is_rule = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(RULE_SUFFIX));
        if is_rule && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut rules = Vec::new();
    for path in paths {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let stem = file_name.strip_suffix(RULE_SUFFIX).unwrap_or(file_name);
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|text| parse_rule(&text, stem));
        match parsed {
            Ok(rule) if rule.enabled && rule.applies_to(event) => rules.push(rule),
            Ok(_) => {}
            Err(e) => log::warn!("skipping rule {}: {e:#}", path.display()),
        }
    }
    Ok(rules)
}
