//! Quick checks run before the assistant executes `git commit`.
//!
//! Syntax errors and merge-conflict markers deny the commit; leftover debug
//! code and oversized files only produce warnings. Formatting, linting and
//! tests stay with the repository's own git pre-commit hook.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

use super::{Hook, HookContext};
use crate::config::PreCommitConfig;
use crate::event::{HookInput, HookOutput, Outcome, PermissionDecision};
use crate::{git, process};

const HOOK_EVENT: &str = "PreToolUse";
/// Files containing the marker strings on purpose.
const SELF_DIR: &str = ".claude/hooks/";

const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[1;33m";
const CYAN: &str = "\x1b[0;36m";
const NC: &str = "\x1b[0m";
const RULE: &str = "═════════════════════════════════════════════════════════";

fn commit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bgit\s+commit\b").expect("valid regex"))
}

fn git_add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"git\s+add\s+([^&|;]+)").expect("valid regex"))
}

fn debug_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"pdb\.set_trace\(\)", "pdb.set_trace()"),
            (r"\bbreakpoint\(\)", "breakpoint()"),
            (r"import pdb", "import pdb"),
            (r#"print\s*\(\s*["']DEBUG"#, "print(\"DEBUG..."),
            (r"#\s*TODO:\s*remove", "# TODO: remove"),
            (r"#\s*FIXME:\s*remove", "# FIXME: remove"),
        ]
        .into_iter()
        .map(|(pattern, label)| (Regex::new(pattern).expect("valid regex"), label))
        .collect()
    })
}

pub fn is_commit_command(command: &str) -> bool {
    commit_re().is_match(command)
}

fn is_python(path: &str) -> bool {
    path.ends_with(".py")
}

/// Python files named by a `git add` clause in `command`.
///
/// `git add .`/`-A`/`--all` expand to every file modified since HEAD.
/// Only files that exist under `repo` are returned.
pub fn files_from_command(command: &str, repo: &Path, git_timeout: Duration) -> Vec<String> {
    let Some(caps) = git_add_re().captures(command) else {
        return Vec::new();
    };
    let args = caps[1].trim();

    let files = if matches!(args, "." | "-A" | "--all") {
        match git::modified_files(repo, git_timeout) {
            Ok(files) => files,
            Err(e) => {
                log::debug!("error getting modified files: {e:#}");
                return Vec::new();
            }
        }
    } else {
        shlex::split(args)
            .unwrap_or_else(|| args.split_whitespace().map(str::to_string).collect())
    };

    files
        .into_iter()
        .filter(|f| is_python(f) && repo.join(f).exists())
        .collect()
}

/// Files to check: those named in the command, else the staged Python files.
pub fn candidate_files(command: &str, repo: &Path, config: &PreCommitConfig) -> Vec<String> {
    let timeout = Duration::from_secs(config.git_timeout_secs);
    let from_command = files_from_command(command, repo, timeout);
    if !from_command.is_empty() {
        log::info!("Extracted {} Python files from command", from_command.len());
        return from_command;
    }
    match git::staged_files(repo, timeout) {
        Ok(files) => {
            let files: Vec<String> = files.into_iter().filter(|f| is_python(f)).collect();
            if !files.is_empty() {
                log::info!("Found {} staged Python files in git index", files.len());
            }
            files
        }
        Err(e) => {
            log::debug!("error getting staged files: {e:#}");
            Vec::new()
        }
    }
}

pub fn check_syntax(files: &[String], repo: &Path, config: &PreCommitConfig) -> Vec<String> {
    let timeout = Duration::from_secs(config.syntax_timeout_secs);
    let mut errors = Vec::new();
    for file in files {
        if !repo.join(file).exists() {
            continue;
        }
        let result = process::run(
            Command::new(&config.python)
                .current_dir(repo)
                .args(["-m", "py_compile", file.as_str()]),
            timeout,
        );
        match result {
            Ok(out) if out.timed_out => errors.push(format!("Timeout checking syntax in {file}")),
            Ok(out) if !out.success() => {
                errors.push(format!("Syntax error in {file}:\n{}", out.stderr))
            }
            Ok(_) => {}
            Err(e) => log::debug!("error checking syntax for {file}: {e:#}"),
        }
    }
    errors
}

fn has_conflict_markers(content: &[u8]) -> bool {
    content.split(|&b| b == b'\n').any(|line| {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        line.starts_with(b"<<<<<<<") || line.starts_with(b">>>>>>>") || line == b"======="
    })
}

pub fn check_merge_conflicts(files: &[String], repo: &Path) -> Vec<String> {
    let mut conflicts = Vec::new();
    for file in files {
        if file.contains(SELF_DIR) {
            continue;
        }
        let path = repo.join(file);
        if !path.exists() {
            continue;
        }
        match fs::read(&path) {
            Ok(content) if has_conflict_markers(&content) => {
                conflicts.push(format!("Merge conflict markers found in {file}"))
            }
            Ok(_) => {}
            Err(e) => log::debug!("error checking merge conflicts in {file}: {e}"),
        }
    }
    conflicts
}

pub fn check_debug_code(files: &[String], repo: &Path) -> Vec<String> {
    let mut warnings = Vec::new();
    for file in files {
        if file.contains(SELF_DIR) {
            continue;
        }
        let path = repo.join(file);
        if !path.exists() {
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::debug!("error checking debug code in {file}: {e}");
                continue;
            }
        };
        for (re, label) in debug_patterns() {
            if re.is_match(&content) {
                warnings.push(format!("{file}: Found {label}"));
            }
        }
    }
    warnings
}

pub fn check_large_files(files: &[String], repo: &Path, max_kb: u64) -> Vec<String> {
    let max_bytes = max_kb * 1024;
    files
        .iter()
        .filter_map(|file| {
            let size = fs::metadata(repo.join(file)).ok()?.len();
            (size > max_bytes)
                .then(|| format!("{file} ({}KB) - unusually large", size / 1024))
        })
        .collect()
}

/// Everything the checks found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Findings {
    pub syntax_errors: Vec<String>,
    pub conflicts: Vec<String>,
    pub debug_warnings: Vec<String>,
    pub file_warnings: Vec<String>,
}

impl Findings {
    pub fn has_errors(&self) -> bool {
        !self.syntax_errors.is_empty() || !self.conflicts.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.debug_warnings.is_empty() || !self.file_warnings.is_empty()
    }
}

fn push_section(parts: &mut Vec<String>, color: &str, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    parts.push(format!("{color}{title}{NC}"));
    parts.extend(items.iter().map(|item| format!("  {item}")));
    parts.push(String::new());
}

/// Human-readable report shown to the assistant.
pub fn format_feedback(findings: &Findings) -> String {
    let mut parts = vec![
        format!("{CYAN}{RULE}{NC}"),
        format!("{YELLOW}⚡ Pre-Commit Validation (Quick Checks){NC}"),
        format!("{CYAN}{RULE}{NC}\n"),
    ];

    push_section(&mut parts, RED, "❌ SYNTAX ERRORS FOUND:", &findings.syntax_errors);
    push_section(&mut parts, RED, "❌ MERGE CONFLICTS DETECTED:", &findings.conflicts);
    push_section(&mut parts, YELLOW, "⚠️  DEBUG CODE DETECTED:", &findings.debug_warnings);
    push_section(&mut parts, YELLOW, "⚠️  LARGE FILES DETECTED:", &findings.file_warnings);

    if findings.has_errors() {
        parts.push(format!("{RED}❌ CRITICAL ISSUES FOUND - FIX BEFORE COMMITTING{NC}"));
        parts.push(format!("{CYAN}ℹ️  Fix these issues and try committing again{NC}"));
    } else if findings.has_warnings() {
        parts.push(format!("{YELLOW}⚠️  WARNINGS FOUND - CONSIDER REVIEWING{NC}"));
        parts.push(format!("{GREEN}✅ No critical errors, you may proceed with commit{NC}"));
        parts.push(format!(
            "{CYAN}ℹ️  Git pre-commit hook will run full checks (formatting, linting, tests){NC}"
        ));
    } else {
        parts.push(format!("{GREEN}✅ All quick checks passed!{NC}"));
        parts.push(format!("{CYAN}ℹ️  Git pre-commit hook will run full checks next{NC}"));
    }

    parts.push(format!("\n{CYAN}{RULE}{NC}"));
    parts.join("\n")
}

/// Map findings to the host response: deny on errors, allow-with-report on
/// warnings, nothing at all when clean.
pub fn decide(findings: &Findings) -> Option<HookOutput> {
    if findings.has_errors() {
        return Some(HookOutput::permission(
            HOOK_EVENT,
            PermissionDecision::Deny,
            Some(format_feedback(findings)),
        ));
    }
    if findings.has_warnings() {
        return Some(HookOutput {
            suppress_output: Some(false),
            ..HookOutput::permission(
                HOOK_EVENT,
                PermissionDecision::Allow,
                Some(format_feedback(findings)),
            )
        });
    }
    None
}

pub struct PreCommitHook;

impl Hook for PreCommitHook {
    fn tag(&self) -> &'static str {
        "PRE-COMMIT"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        let command = input.command();
        if input.tool_name != "Bash" || !is_commit_command(command) {
            return Ok(Outcome::silent());
        }

        log::info!("Git commit detected: {}", input.raw);

        if command.contains("--no-verify") {
            log::info!("--no-verify flag detected, allowing commit");
            return Ok(Outcome::silent());
        }

        let config = &ctx.config.pre_commit;
        let repo = ctx.project_dir.as_path();
        let files = candidate_files(command, repo, config);
        if files.is_empty() {
            log::info!("No Python files to check");
            return Ok(Outcome::silent());
        }
        log::info!("Checking {} Python files: {}", files.len(), files.join(", "));

        let staged = git::staged_files(repo, Duration::from_secs(config.git_timeout_secs))
            .unwrap_or_else(|e| {
                log::debug!("error checking file sizes: {e:#}");
                Vec::new()
            });
        let findings = Findings {
            syntax_errors: check_syntax(&files, repo, config),
            conflicts: check_merge_conflicts(&files, repo),
            debug_warnings: check_debug_code(&files, repo),
            file_warnings: check_large_files(&staged, repo, config.max_file_kb),
        };

        match decide(&findings) {
            Some(output) => {
                if findings.has_errors() {
                    log::info!("Critical errors found, blocking commit");
                } else {
                    log::info!("Checks passed with warnings");
                }
                Outcome::json(&output)
            }
            None => {
                log::info!("All checks passed, allowing commit silently");
                Ok(Outcome::silent())
            }
        }
    }
}
