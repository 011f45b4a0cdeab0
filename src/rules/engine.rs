use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::{Action, Condition, Operator, Rule};
use crate::event::{HookInput, HookOutput, PermissionDecision};

/// Evaluates rules against one hook event. Compiled patterns are cached for
/// the lifetime of the engine; a pattern that fails to compile is cached as
/// a permanent non-match.
#[derive(Debug, Default)]
pub struct RuleEngine {
    regex_cache: HashMap<String, Option<Regex>>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn input_str(input: &HookInput, key: &str) -> String {
    input.tool_input_str(key).unwrap_or_default().to_string()
}

/// Text of `field` for this event, `None` when the field does not exist for
/// the tool being used.
fn extract_field(field: &str, input: &HookInput) -> Option<String> {
    if let Some(value) = input.tool_input.get(field) {
        return Some(value_text(value));
    }

    match field {
        "reason" => return Some(input.reason.clone().unwrap_or_default()),
        "transcript" => return Some(read_transcript(input)),
        "user_prompt" => return Some(input.user_prompt.clone().unwrap_or_default()),
        _ => {}
    }

    match (input.tool_name.as_str(), field) {
        ("Bash", "command") => Some(input_str(input, "command")),
        ("Write" | "Edit", "content") => Some(
            input
                .tool_input_str("content")
                .filter(|s| !s.is_empty())
                .or_else(|| input.tool_input_str("new_string"))
                .unwrap_or_default()
                .to_string(),
        ),
        ("Write" | "Edit", "new_text" | "new_string") => Some(input_str(input, "new_string")),
        ("Write" | "Edit", "old_text" | "old_string") => Some(input_str(input, "old_string")),
        ("Write" | "Edit" | "MultiEdit", "file_path") => Some(input_str(input, "file_path")),
        ("MultiEdit", "new_text" | "content") => {
            let edits = input
                .tool_input
                .get("edits")
                .and_then(Value::as_array)
                .map(|edits| {
                    edits
                        .iter()
                        .map(|e| e.get("new_string").and_then(Value::as_str).unwrap_or_default())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            Some(edits)
        }
        _ => None,
    }
}

fn read_transcript(input: &HookInput) -> String {
    let Some(path) = input.transcript_path.as_deref().filter(|p| !p.is_empty()) else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("could not read transcript {path}: {e}");
            String::new()
        }
    }
}

fn tool_matches(matcher: &str, tool_name: &str) -> bool {
    matcher == "*" || matcher.split('|').any(|t| t.trim() == tool_name)
}

fn format_messages(rules: &[&Rule]) -> String {
    rules
        .iter()
        .map(|r| format!("**[{}]**\n{}", r.name, r.message))
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn regex(&mut self, pattern: &str) -> Option<&Regex> {
        self.regex_cache
            .entry(pattern.to_string())
            .or_insert_with(|| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        log::warn!("invalid rule pattern {pattern:?}: {e}");
                        None
                    }
                }
            })
            .as_ref()
    }

    fn check_condition(&mut self, condition: &Condition, input: &HookInput) -> bool {
        let Some(value) = extract_field(&condition.field, input) else {
            return false;
        };
        let pattern = condition.pattern.as_str();
        match condition.operator {
            Operator::RegexMatch => self.regex(pattern).is_some_and(|re| re.is_match(&value)),
            Operator::Contains => value.contains(pattern),
            Operator::Equals => value == pattern,
            Operator::NotContains => !value.contains(pattern),
            Operator::StartsWith => value.starts_with(pattern),
            Operator::EndsWith => value.ends_with(pattern),
            Operator::Unknown => false,
        }
    }

    /// True when every condition of `rule` holds. A rule with no conditions
    /// never matches.
    pub fn rule_matches(&mut self, rule: &Rule, input: &HookInput) -> bool {
        if let Some(matcher) = rule.tool_matcher.as_deref() {
            if !tool_matches(matcher, &input.tool_name) {
                return false;
            }
        }
        if rule.conditions.is_empty() {
            return false;
        }
        rule.conditions
            .iter()
            .all(|condition| self.check_condition(condition, input))
    }

    /// Evaluate `rules` and build the response for the host. Blocking rules
    /// take precedence over warnings; no match yields an empty output.
    pub fn evaluate_rules(&mut self, rules: &[Rule], input: &HookInput) -> HookOutput {
        let mut blocking = Vec::new();
        let mut warnings = Vec::new();
        for rule in rules {
            if self.rule_matches(rule, input) {
                match rule.action {
                    Action::Block => blocking.push(rule),
                    Action::Warn => warnings.push(rule),
                }
            }
        }

        if !blocking.is_empty() {
            let message = format_messages(&blocking);
            let event = input.hook_event_name.as_str();
            return match event {
                "Stop" => HookOutput {
                    decision: Some("block".into()),
                    reason: Some(message.clone()),
                    system_message: Some(message),
                    ..HookOutput::default()
                },
                "PreToolUse" | "PostToolUse" => HookOutput {
                    system_message: Some(message),
                    ..HookOutput::permission(event, PermissionDecision::Deny, None)
                },
                _ => HookOutput::system_message(message),
            };
        }

        if !warnings.is_empty() {
            return HookOutput::system_message(format_messages(&warnings));
        }

        HookOutput::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEvent;
    use serde_json::json;

    fn input(value: Value) -> HookInput {
        HookInput::parse(&value.to_string()).unwrap()
    }

    fn rule(name: &str, action: Action, conditions: Vec<Condition>) -> Rule {
        Rule {
            name: name.into(),
            enabled: true,
            event: RuleEvent::All,
            action,
            tool_matcher: None,
            conditions,
            message: format!("{name} fired"),
        }
    }

    fn cond(field: &str, operator: Operator, pattern: &str) -> Condition {
        Condition {
            field: field.into(),
            operator,
            pattern: pattern.into(),
        }
    }

    #[test]
    fn regex_is_case_insensitive() {
        let mut engine = RuleEngine::new();
        let r = rule("rm", Action::Warn, vec![cond("command", Operator::RegexMatch, r"RM\s+-rf")]);
        let i = input(json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /tmp/x"}}));
        assert!(engine.rule_matches(&r, &i));
    }

    #[test]
    fn all_conditions_must_hold() {
        let mut engine = RuleEngine::new();
        let r = rule(
            "env",
            Action::Warn,
            vec![
                cond("file_path", Operator::EndsWith, ".env"),
                cond("new_text", Operator::Contains, "SECRET"),
            ],
        );
        let hit = input(json!({
            "tool_name": "Edit",
            "tool_input": {"file_path": "app/.env", "new_string": "SECRET=1"}
        }));
        let miss = input(json!({
            "tool_name": "Edit",
            "tool_input": {"file_path": "app/.env", "new_string": "DEBUG=1"}
        }));
        assert!(engine.rule_matches(&r, &hit));
        assert!(!engine.rule_matches(&r, &miss));
    }

    #[test]
    fn no_conditions_never_match() {
        let mut engine = RuleEngine::new();
        let r = rule("empty", Action::Block, vec![]);
        assert!(!engine.rule_matches(&r, &input(json!({"tool_name": "Bash"}))));
    }

    #[test]
    fn tool_matcher_filters() {
        let mut engine = RuleEngine::new();
        let mut r = rule("w", Action::Warn, vec![cond("file_path", Operator::Contains, "src")]);
        r.tool_matcher = Some("Write|MultiEdit".into());
        let edit = input(json!({"tool_name": "Edit", "tool_input": {"file_path": "src/a.rs"}}));
        let write = input(json!({"tool_name": "Write", "tool_input": {"file_path": "src/a.rs"}}));
        assert!(!engine.rule_matches(&r, &edit));
        assert!(engine.rule_matches(&r, &write));

        r.tool_matcher = Some("*".into());
        assert!(engine.rule_matches(&r, &edit));
    }

    #[test]
    fn missing_field_is_no_match() {
        let mut engine = RuleEngine::new();
        let r = rule("n", Action::Warn, vec![cond("command", Operator::NotContains, "x")]);
        // `command` does not exist for Write.
        let i = input(json!({"tool_name": "Write", "tool_input": {"file_path": "a"}}));
        assert!(!engine.rule_matches(&r, &i));
    }

    #[test]
    fn write_content_falls_back_to_new_string() {
        let i = input(json!({"tool_name": "Edit", "tool_input": {"new_string": "print(1)"}}));
        assert_eq!(extract_field("content", &i).as_deref(), Some("print(1)"));
        let w = input(json!({"tool_name": "Write", "tool_input": {"content": "body"}}));
        assert_eq!(extract_field("content", &w).as_deref(), Some("body"));
    }

    #[test]
    fn multiedit_joins_new_strings() {
        let i = input(json!({
            "tool_name": "MultiEdit",
            "tool_input": {"file_path": "a.py", "edits": [{"new_string": "one"}, {"new_string": "two"}]}
        }));
        assert_eq!(extract_field("new_text", &i).as_deref(), Some("one two"));
    }

    #[test]
    fn non_string_tool_input_serialized() {
        let i = input(json!({"tool_name": "Task", "tool_input": {"limit": 5}}));
        assert_eq!(extract_field("limit", &i).as_deref(), Some("5"));
    }

    #[test]
    fn transcript_read_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        std::fs::write(&path, "ran the tests").unwrap();
        let i = input(json!({"hook_event_name": "Stop", "transcript_path": path}));
        assert_eq!(extract_field("transcript", &i).as_deref(), Some("ran the tests"));

        let gone = input(json!({
            "hook_event_name": "Stop",
            "transcript_path": dir.path().join("nope")
        }));
        assert_eq!(extract_field("transcript", &gone).as_deref(), Some(""));
    }

    #[test]
    fn invalid_regex_never_matches() {
        let mut engine = RuleEngine::new();
        let r = rule(
            "bad",
            Action::Block,
            vec![cond("command", Operator::RegexMatch, "(unclosed")],
        );
        let i = input(json!({"tool_name": "Bash", "tool_input": {"command": "(unclosed"}}));
        assert!(!engine.rule_matches(&r, &i));
        assert!(!engine.rule_matches(&r, &i));
    }

    #[test]
    fn block_on_pre_tool_use_denies() {
        let mut engine = RuleEngine::new();
        let rules = vec![
            rule("warn-one", Action::Warn, vec![cond("command", Operator::Contains, "push")]),
            rule("block-one", Action::Block, vec![cond("command", Operator::Contains, "--force")]),
        ];
        let i = input(json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git push --force"}
        }));
        let out = engine.evaluate_rules(&rules, &i);
        let hso = out.hook_specific_output.unwrap();
        assert_eq!(hso.permission_decision, PermissionDecision::Deny);
        assert_eq!(hso.hook_event_name, "PreToolUse");
        assert_eq!(out.system_message.as_deref(), Some("**[block-one]**\nblock-one fired"));
    }

    #[test]
    fn block_on_stop_sets_decision() {
        let mut engine = RuleEngine::new();
        let rules = vec![rule(
            "tests",
            Action::Block,
            vec![cond("reason", Operator::NotContains, "tests pass")],
        )];
        let i = input(json!({"hook_event_name": "Stop"}));
        let out = engine.evaluate_rules(&rules, &i);
        assert_eq!(out.decision.as_deref(), Some("block"));
        assert_eq!(out.reason, out.system_message);
    }

    #[test]
    fn block_on_other_event_is_message_only() {
        let mut engine = RuleEngine::new();
        let rules = vec![rule(
            "p",
            Action::Block,
            vec![cond("user_prompt", Operator::Contains, "deploy")],
        )];
        let i = input(json!({"hook_event_name": "UserPromptSubmit", "prompt": "deploy now"}));
        let out = engine.evaluate_rules(&rules, &i);
        assert!(out.hook_specific_output.is_none());
        assert!(out.decision.is_none());
        assert_eq!(out.system_message.as_deref(), Some("**[p]**\np fired"));
    }

    #[test]
    fn warnings_joined() {
        let mut engine = RuleEngine::new();
        let rules = vec![
            rule("a", Action::Warn, vec![cond("command", Operator::StartsWith, "git")]),
            rule("b", Action::Warn, vec![cond("command", Operator::Equals, "git status")]),
        ];
        let i = input(json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git status"}
        }));
        let out = engine.evaluate_rules(&rules, &i);
        assert_eq!(
            out.system_message.as_deref(),
            Some("**[a]**\na fired\n\n**[b]**\nb fired")
        );
        assert!(out.hook_specific_output.is_none());
    }

    #[test]
    fn nothing_matched_is_empty() {
        let mut engine = RuleEngine::new();
        let rules = vec![rule("a", Action::Block, vec![cond("command", Operator::Contains, "rm")])];
        let i = input(json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"}
        }));
        assert!(engine.evaluate_rules(&rules, &i).is_empty());
    }
}
