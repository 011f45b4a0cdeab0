//! The JSON contract between the assistant host and a hook process.
//!
//! The host writes one JSON object to stdin describing the event and reads
//! back optional JSON on stdout plus the process exit code.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Map<String, Value>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub hook_event_name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "prompt")]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(skip)]
    pub raw: Value,
}

impl HookInput {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(text)?;
        let mut input: HookInput = serde_json::from_value(raw.clone())?;
        input.raw = raw;
        Ok(input)
    }

    /// String-valued field of `tool_input`, if present.
    pub fn tool_input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }

    /// The `command` of a Bash tool call, or "".
    pub fn command(&self) -> &str {
        self.tool_input_str("command").unwrap_or("")
    }

    /// Resolve the project root: explicit override, then the event's `cwd`,
    /// then the working directory of this process.
    pub fn project_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        match self.cwd.as_deref() {
            Some(cwd) if !cwd.is_empty() => Ok(PathBuf::from(cwd)),
            _ => std::env::current_dir().context("failed to determine working directory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub permission_decision: PermissionDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

/// JSON written to stdout. Empty fields are omitted so that "no opinion"
/// serialises as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_output: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

impl HookOutput {
    pub fn system_message(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn permission(
        event: &str,
        decision: PermissionDecision,
        reason: Option<String>,
    ) -> Self {
        Self {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: event.to_string(),
                permission_decision: decision,
                permission_decision_reason: reason,
            }),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize hook output")
    }
}

/// Exit codes understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookExit {
    Success = 0,
    /// Shown to the user, the assistant carries on.
    NonBlocking = 1,
    /// stderr is fed back to the assistant.
    Blocking = 2,
}

impl HookExit {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Everything a hook wants the dispatcher to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit: HookExit,
}

impl Outcome {
    pub fn silent() -> Self {
        Self {
            stdout: None,
            stderr: None,
            exit: HookExit::Success,
        }
    }

    pub fn exit(exit: HookExit) -> Self {
        Self {
            exit,
            ..Self::silent()
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: Some(text.into()),
            ..Self::silent()
        }
    }

    pub fn json(output: &HookOutput) -> Result<Self> {
        Ok(Self::stdout(output.to_json()?))
    }

    pub fn with_stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = Some(text.into());
        self
    }

    pub fn with_exit(mut self, exit: HookExit) -> Self {
        self.exit = exit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_event() {
        let input = HookInput::parse(
            r#"{"tool_name":"Bash","tool_input":{"command":"git status"},"cwd":"/repo","hook_event_name":"PreToolUse"}"#,
        )
        .unwrap();
        assert_eq!(input.tool_name, "Bash");
        assert_eq!(input.command(), "git status");
        assert_eq!(input.hook_event_name, "PreToolUse");
        assert_eq!(input.raw["cwd"], "/repo");
    }

    #[test]
    fn missing_fields_default() {
        let input = HookInput::parse("{}").unwrap();
        assert_eq!(input.tool_name, "");
        assert!(input.tool_input.is_empty());
        assert_eq!(input.command(), "");
    }

    #[test]
    fn prompt_alias() {
        let input = HookInput::parse(r#"{"prompt":"hello"}"#).unwrap();
        assert_eq!(input.user_prompt.as_deref(), Some("hello"));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(HookInput::parse("not json").is_err());
    }

    #[test]
    fn project_dir_precedence() {
        let input = HookInput::parse(r#"{"cwd":"/from/event"}"#).unwrap();
        assert_eq!(
            input.project_dir(Some(Path::new("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(input.project_dir(None).unwrap(), PathBuf::from("/from/event"));
    }

    #[test]
    fn empty_output_is_empty_object() {
        assert_eq!(HookOutput::default().to_json().unwrap(), "{}");
    }

    #[test]
    fn deny_output_shape() {
        let out = HookOutput::permission(
            "PreToolUse",
            PermissionDecision::Deny,
            Some("nope".into()),
        );
        let value: Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(value["hookSpecificOutput"]["hookEventName"], "PreToolUse");
        assert_eq!(value["hookSpecificOutput"]["permissionDecision"], "deny");
        assert_eq!(value["hookSpecificOutput"]["permissionDecisionReason"], "nope");
        assert!(value.get("systemMessage").is_none());
    }
}
