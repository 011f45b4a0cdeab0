//! Injects a summary of `project_index.json` when the assistant spawns a
//! planning sub-task, so the planner starts with the project layout.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use super::{Hook, HookContext};
use crate::event::{HookInput, Outcome};

pub const INDEX_FILE: &str = "project_index.json";
const LIST_LIMIT: usize = 5;
const CONTEXT_LIMIT: usize = 3;

pub fn load_project_index(project_dir: &Path) -> Result<Option<Value>> {
    let path = project_dir.join(INDEX_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let index = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(index))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key).map(text).unwrap_or_else(|| default.to_string())
}

/// `snake_case` key → "Snake Case".
pub fn title_case(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn entry_count(modules: &Value) -> Option<usize> {
    match modules {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Markdown summary of the project index, or a placeholder when missing.
pub fn format_context_summary(index: Option<&Value>) -> String {
    let Some(index) = index.filter(|v| !is_empty(v)) else {
        return "❌ Project index unavailable".to_string();
    };

    let empty = Map::new();
    let overview = index.get("project_overview").cloned().unwrap_or(Value::Null);
    let key_modules = index
        .get("key_modules")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let stats = index.get("project_statistics").cloned().unwrap_or(Value::Null);

    let mut layers: Vec<&str> = key_modules.keys().map(String::as_str).collect();
    layers.sort_unstable();
    let mut counts: Vec<(&str, usize)> = key_modules
        .iter()
        .filter_map(|(k, v)| entry_count(v).map(|n| (k.as_str(), n)))
        .collect();
    counts.sort_unstable();

    let mut out = String::new();
    let _ = writeln!(out, "# 📋 Project Structure Context (Auto-injected for /ct)\n");
    let _ = writeln!(out, "## Project Overview");
    let _ = writeln!(out, "- **Name**: {}", field(&overview, "name", "Unknown"));
    let _ = writeln!(
        out,
        "- **Description**: {}",
        field(&overview, "description", "No description available")
    );
    let _ = writeln!(
        out,
        "- **Architecture**: {}",
        field(&overview, "architecture", "Not specified")
    );
    let _ = writeln!(out, "- **Last Updated**: {}", field(&overview, "last_updated", "Unknown"));
    let _ = writeln!(
        out,
        "- **Python Files**: {}/{}\n",
        field(&stats, "python_files", "0"),
        field(&stats, "total_files", "0")
    );

    let _ = writeln!(out, "## Architecture Layers");
    if layers.is_empty() {
        let _ = writeln!(out, "Not analyzed\n");
    } else {
        let _ = writeln!(out, "{}\n", layers.join(", "));
    }

    let _ = writeln!(out, "## Module Distribution");
    for (category, count) in counts {
        let _ = writeln!(out, "- **{category}**: {count} modules");
    }

    if let Some(patterns) = index.get("architecture_patterns").filter(|v| !is_empty(v)) {
        let _ = writeln!(out, "\n## Architecture Patterns");
        let items: Vec<String> = match patterns {
            Value::Array(items) => items.iter().map(text).collect(),
            Value::Object(map) => map.keys().cloned().collect(),
            other => vec![text(other)],
        };
        for item in items.iter().take(LIST_LIMIT) {
            let _ = writeln!(out, "- {item}");
        }
    }

    if let Some(features) = index.get("key_features").filter(|v| !is_empty(v)) {
        let _ = writeln!(out, "\n## Key Features");
        match features {
            Value::Object(map) => {
                for (feature, details) in map.iter().take(LIST_LIMIT) {
                    let desc = details
                        .get("description")
                        .map(text)
                        .unwrap_or_else(|| text(details));
                    let _ = writeln!(out, "- **{feature}** - {desc}");
                }
            }
            Value::Array(items) => {
                for item in items.iter().take(LIST_LIMIT) {
                    let _ = writeln!(out, "- {}", text(item));
                }
            }
            other => {
                let _ = writeln!(out, "- {}", text(other));
            }
        }
    }

    for (category, modules) in key_modules {
        if is_empty(modules) {
            continue;
        }
        let _ = writeln!(out, "\n## {}", title_case(category));
        match modules {
            Value::Array(items) => {
                for module in items.iter().take(LIST_LIMIT) {
                    let _ = writeln!(out, "- `{}`", text(module));
                }
            }
            Value::Object(map) => {
                for (module, desc) in map.iter().take(LIST_LIMIT) {
                    let _ = writeln!(out, "- `{module}` - {}", text(desc));
                }
            }
            other => {
                let _ = writeln!(out, "- {}", text(other));
            }
        }
    }

    if let Some(current) = index
        .get("current_development_context")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
    {
        let _ = writeln!(out, "\n## Current Development Context");
        for (key, value) in current {
            match value {
                Value::Array(items) if !items.is_empty() => {
                    let shown: Vec<String> = items.iter().take(CONTEXT_LIMIT).map(text).collect();
                    let _ = writeln!(out, "- **{}**: {}", title_case(key), shown.join(", "));
                }
                Value::String(s) => {
                    let _ = writeln!(out, "- **{}**: {s}", title_case(key));
                }
                _ => {}
            }
        }
    }

    let _ = writeln!(
        out,
        "\n---\n*This context was automatically injected by the context hook*"
    );
    out
}

pub struct ContextHook;

impl Hook for ContextHook {
    fn tag(&self) -> &'static str {
        "CT-CONTEXT"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        if input.tool_name != "Task" {
            log::debug!("not a Task call: {}", input.tool_name);
            return Ok(Outcome::silent());
        }
        log::info!("task call detected, injecting context from {}", ctx.project_dir.display());

        let index = match load_project_index(&ctx.project_dir) {
            Ok(index) => index,
            Err(e) => {
                log::error!("failed to load project index: {e:#}");
                None
            }
        };
        if index.is_none() {
            log::warn!("project index not found in {}", ctx.project_dir.display());
        }
        Ok(Outcome::stdout(format_context_summary(index.as_ref())))
    }

    fn on_invalid_input(&self, _err: &serde_json::Error) -> Outcome {
        Outcome::silent()
    }
}
