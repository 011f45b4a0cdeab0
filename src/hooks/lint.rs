//! Format and lint a Python file right after the assistant writes it.
//!
//! Progress goes to stderr. Exit 2 feeds that report back to the assistant
//! so it can fix the file; exit 0 means everything passed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::Result;

use super::{Hook, HookContext};
use crate::event::{HookExit, HookInput, Outcome};
use crate::process::{self, CommandOutput};

/// Whether `file` is a Python file under `lint_root` worth linting.
pub fn should_process(file: &str, lint_root: &Path) -> bool {
    if !file.ends_with(".py") {
        return false;
    }
    if relative_to_root(Path::new(file), lint_root).is_none() {
        return false;
    }
    if file.contains("venv") {
        return false;
    }
    // Generated migrations.
    !file.contains("/alembic/versions/")
}

/// `file` relative to `root`, comparing canonical paths when they exist.
fn relative_to_root(file: &Path, root: &Path) -> Option<PathBuf> {
    let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    file.strip_prefix(&root).ok().map(Path::to_path_buf)
}

fn needs_type_check(file: &str) -> bool {
    file.contains("/app/") || file.ends_with("/app")
}

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub passed: bool,
    pub message: String,
}

impl StepResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Runs the lint tools for one project.
pub struct Linter {
    root: PathBuf,
    timeout: Duration,
}

impl Linter {
    pub fn new(root: PathBuf, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    /// Prefer the project's virtualenv copy of `tool`.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        let venv_tool = self.root.join(".venv").join("bin").join(tool);
        if venv_tool.exists() {
            venv_tool
        } else {
            PathBuf::from(tool)
        }
    }

    fn run_tool(&self, tool: &str, args: &[&str]) -> CommandOutput {
        let mut cmd = Command::new(self.tool_path(tool));
        cmd.args(args).current_dir(&self.root);
        match process::run(&mut cmd, self.timeout) {
            Ok(out) if out.timed_out => CommandOutput {
                code: Some(1),
                stderr: format!("Command timed out after {} seconds", self.timeout.as_secs()),
                ..out
            },
            Ok(out) => out,
            Err(e) => CommandOutput {
                code: Some(1),
                timed_out: false,
                stdout: String::new(),
                stderr: format!("Failed to execute command: {e:#}"),
            },
        }
    }

    /// black then isort. Stops at the first formatter failure.
    pub fn format(&self, file: &str) -> StepResult {
        let mut messages = Vec::new();

        let out = self.run_tool("black", &[file]);
        if !out.success() {
            messages.push(format!("✗ black: {}", out.stderr));
            return StepResult::fail(messages.join("\n"));
        }
        // black reports "reformatted <file>" on stderr.
        if out.stdout.contains("reformatted") || out.stderr.contains("reformatted") {
            let name = Path::new(file)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            messages.push(format!("✓ black: reformatted {name}"));
        } else {
            messages.push("✓ black: already formatted".to_string());
        }

        let out = self.run_tool("isort", &[file]);
        if !out.success() {
            messages.push(format!("✗ isort: {}", out.stderr));
            return StepResult::fail(messages.join("\n"));
        }
        if out.stdout.contains("Fixing") || out.stderr.contains("Fixing") {
            messages.push("✓ isort: fixed imports".to_string());
        } else {
            messages.push("✓ isort: imports already sorted".to_string());
        }

        StepResult::pass(messages.join("\n"))
    }

    pub fn flake8(&self, file: &str) -> StepResult {
        let out = self.run_tool("flake8", &[file]);
        if out.success() {
            return StepResult::pass("✓ flake8: no style violations");
        }
        StepResult::fail(format!(
            "✗ flake8: found style violations\n{}",
            first_non_empty(&out.stdout, &out.stderr)
        ))
    }

    pub fn mypy(&self, file: &str) -> StepResult {
        let Some(rel) = relative_to_root(Path::new(file), &self.root) else {
            return StepResult::pass(format!(
                "⊘ mypy: skipped (file outside {}/)",
                self.root.display()
            ));
        };
        let rel = rel.to_string_lossy().into_owned();
        let out = self.run_tool("mypy", &[rel.as_str(), "--no-error-summary"]);
        if out.success() {
            return StepResult::pass("✓ mypy: type checks passed");
        }
        let errors = first_non_empty(&out.stdout, &out.stderr);
        if errors.contains("Success: no issues found") {
            return StepResult::pass("✓ mypy: type checks passed");
        }
        StepResult::fail(format!("✗ mypy: found type errors\n{errors}"))
    }
}

fn first_non_empty<'a>(a: &'a str, b: &'a str) -> &'a str {
    let a = a.trim();
    if a.is_empty() {
        b.trim()
    } else {
        a
    }
}

/// Render the stderr report and pick the exit code for one file.
pub fn lint_file(linter: &Linter, file: &str) -> (String, HookExit) {
    let name = Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    let mut report = vec![format!("\n🔍 Linting {name}...")];

    let formatted = linter.format(file);
    report.push(formatted.message);
    if !formatted.passed {
        report.push("\n❌ Formatting failed. Please check the file manually.".to_string());
        return (report.join("\n"), HookExit::Blocking);
    }

    let flake8 = linter.flake8(file);
    report.push(flake8.message);

    let mypy = if needs_type_check(file) {
        let result = linter.mypy(file);
        report.push(result.message.clone());
        result.passed
    } else {
        true
    };

    if flake8.passed && mypy {
        report.push(format!("\n✅ All checks passed for {name}"));
        return (report.join("\n"), HookExit::Success);
    }

    let mut issues = Vec::new();
    if !flake8.passed {
        issues.push("flake8 violations");
    }
    if !mypy {
        issues.push("mypy type errors");
    }
    report.push(format!("\n❌ Found issues: {}", issues.join(", ")));
    report.push("\nPlease fix these issues before proceeding.".to_string());
    (report.join("\n"), HookExit::Blocking)
}

pub struct LintHook;

impl Hook for LintHook {
    fn tag(&self) -> &'static str {
        "LINT"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        if !matches!(input.tool_name.as_str(), "Write" | "Edit") {
            return Ok(Outcome::silent());
        }
        let file = match input.tool_input_str("file_path") {
            Some(f) if !f.is_empty() => f,
            _ => return Ok(Outcome::silent()),
        };

        let lint = &ctx.config.lint;
        let root = ctx.resolve(&lint.root);
        if !should_process(file, &root) {
            return Ok(Outcome::silent());
        }
        if !Path::new(file).exists() {
            let warning = format!("Warning: File does not exist: {file}");
            return Ok(Outcome::silent().with_stderr(warning));
        }

        log::info!("linting {file}");
        let linter = Linter::new(root, Duration::from_secs(lint.timeout_secs));
        let (report, exit) = lint_file(&linter, file);
        log::info!("lint finished for {file}: exit {}", exit.code());
        Ok(Outcome::silent().with_stderr(report).with_exit(exit))
    }

    fn on_invalid_input(&self, err: &serde_json::Error) -> Outcome {
        Outcome::exit(HookExit::NonBlocking)
            .with_stderr(format!("Error: Invalid JSON input: {err}"))
    }
}
