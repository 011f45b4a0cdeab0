use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use devhooks::event::HookExit;
use devhooks::hooks::rules::{RuleStage, RulesHook};
use devhooks::hooks::{execute, Invocation};
use devhooks::rules::RULES_DIR;

fn write_rule(project: &Path, file: &str, text: &str) {
    let dir = project.join(RULES_DIR);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), text).unwrap();
}

fn run(stage: RuleStage, project: &Path, event: Value) -> Value {
    let invocation = Invocation {
        project_dir: Some(project.to_path_buf()),
        ..Invocation::default()
    };
    let out = execute(&RulesHook { stage }, &event.to_string(), &invocation);
    assert_eq!(out.exit, HookExit::Success);
    serde_json::from_str(out.stdout.as_deref().unwrap()).unwrap()
}

#[test]
fn blocking_bash_rule_denies_tool_call() {
    let dir = tempfile::tempdir().unwrap();
    write_rule(
        dir.path(),
        "no-force-push.local.md",
        "---\nname: no-force-push\nevent: bash\naction: block\npattern: git\\s+push\\s+--force\n---\n\nForce pushes are not allowed.\n",
    );
    write_rule(
        dir.path(),
        "disabled.local.md",
        "---\nname: disabled\nenabled: false\nevent: bash\npattern: git\n---\nnever shown\n",
    );

    let out = run(
        RuleStage::PreToolUse,
        dir.path(),
        json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git push --force origin main"}
        }),
    );
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(out["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    assert_eq!(
        out["systemMessage"],
        "**[no-force-push]**\nForce pushes are not allowed."
    );
}

#[test]
fn file_warning_is_a_system_message() {
    let dir = tempfile::tempdir().unwrap();
    write_rule(
        dir.path(),
        "console-log.local.md",
        "---\nname: console-log\nevent: file\nconditions:\n  - field: file_path\n    operator: ends_with\n    pattern: .ts\n  - field: new_text\n    operator: contains\n    pattern: console.log\n---\nRemove debug logging.\n",
    );

    let hit = run(
        RuleStage::PostToolUse,
        dir.path(),
        json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Edit",
            "tool_input": {"file_path": "src/app.ts", "new_string": "console.log(x)"}
        }),
    );
    assert_eq!(hit, json!({"systemMessage": "**[console-log]**\nRemove debug logging."}));

    let bash = run(
        RuleStage::PostToolUse,
        dir.path(),
        json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "echo console.log > src/app.ts"}
        }),
    );
    assert_eq!(bash, json!({}));
}

#[test]
fn stop_rule_blocks_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    write_rule(
        dir.path(),
        "tests-first.local.md",
        "---\nname: tests-first\nevent: stop\naction: block\nconditions:\n  - field: transcript\n    operator: not_contains\n    pattern: cargo test\n---\nRun the tests before stopping.\n",
    );
    let transcript = dir.path().join("transcript.jsonl");
    fs::write(&transcript, "{\"role\":\"assistant\",\"content\":\"done\"}\n").unwrap();

    let out = run(
        RuleStage::Stop,
        dir.path(),
        json!({
            "hook_event_name": "Stop",
            "transcript_path": transcript,
        }),
    );
    assert_eq!(out["decision"], "block");
    assert_eq!(out["reason"], "**[tests-first]**\nRun the tests before stopping.");
}

#[test]
fn missing_rules_directory_is_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        RuleStage::UserPrompt,
        dir.path(),
        json!({"hook_event_name": "UserPromptSubmit", "prompt": "hello"}),
    );
    assert_eq!(out, json!({}));
}

#[test]
fn malformed_input_reports_error_without_blocking() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = Invocation {
        project_dir: Some(dir.path().to_path_buf()),
        ..Invocation::default()
    };
    let out = execute(
        &RulesHook {
            stage: RuleStage::PreToolUse,
        },
        "{oops",
        &invocation,
    );
    assert_eq!(out.exit, HookExit::Success);
    let value: Value = serde_json::from_str(out.stdout.as_deref().unwrap()).unwrap();
    assert!(value["systemMessage"]
        .as_str()
        .unwrap()
        .starts_with("Hookify error:"));
}
