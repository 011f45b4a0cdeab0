use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::Result;

use super::{Hook, HookContext};
use crate::config::PublishConfig;
use crate::event::{HookInput, Outcome};
use crate::{git, process};

pub const REPO_PATH_ENV: &str = "PUBLIC_REPO_PATH";
const CONFIG_PREFIX: &str = ".claude/";
const GIT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_commit_event(input: &HookInput) -> bool {
    input.hook_event_name == "PostToolUse"
        && input.tool_name == "Bash"
        && input.command().contains("git commit")
}

pub fn config_changes(files: &[String]) -> Vec<&str> {
    files
        .iter()
        .map(String::as_str)
        .filter(|f| f.starts_with(CONFIG_PREFIX))
        .collect()
}

/// Public checkout: `PUBLIC_REPO_PATH`, else the configured path relative to
/// the project root.
pub fn public_repo_path(
    project_dir: &Path,
    config: &PublishConfig,
    env: Option<String>,
) -> PathBuf {
    match env.filter(|p| !p.is_empty()) {
        Some(p) => PathBuf::from(p),
        None => project_dir.join(&config.repo_path),
    }
}

/// Run the publish script. Never fails the caller; returns whether it
/// succeeded.
pub fn trigger_sync(project_dir: &Path, config: &PublishConfig, public_repo: &Path) -> bool {
    let script = project_dir.join(&config.script);
    if !script.exists() {
        log::warn!("Sync script not found: {}", script.display());
        return false;
    }
    log::info!("Triggering sync to {}", public_repo.display());

    let result = process::run(
        Command::new(&script)
            .current_dir(project_dir)
            .env(REPO_PATH_ENV, public_repo),
        Duration::from_secs(config.timeout_secs),
    );
    match result {
        Ok(out) if out.timed_out => {
            log::error!("Sync script timed out after {} seconds", config.timeout_secs);
            false
        }
        Ok(out) if out.success() => {
            log::info!("Sync completed successfully");
            for line in out.stdout.lines().filter(|l| l.contains("github.com")) {
                log::info!("Updated: {}", line.trim());
            }
            true
        }
        Ok(out) => {
            log::error!("Sync failed with code {:?}", out.code);
            log::error!("Error: {}", out.stderr.trim());
            false
        }
        Err(e) => {
            log::error!("Error running sync script: {e:#}");
            false
        }
    }
}

/// Mirrors the project's assistant configuration into a public repository
/// after commits that touch `.claude/`. Never blocks the commit.
pub struct PublishSyncHook;

impl Hook for PublishSyncHook {
    fn tag(&self) -> &'static str {
        "auto-sync-public"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        log::info!(
            "Hook triggered: {} for {}",
            input.hook_event_name,
            input.tool_name
        );
        if !is_commit_event(input) {
            return Ok(Outcome::silent());
        }
        let command: String = input.command().chars().take(100).collect();
        log::info!("Git commit detected: {command}");

        let changed = git::last_commit_files(&ctx.project_dir, GIT_TIMEOUT).unwrap_or_else(|e| {
            log::debug!("could not list changed files: {e:#}");
            Vec::new()
        });
        if changed.is_empty() {
            log::info!("No changed files detected");
            return Ok(Outcome::silent());
        }
        log::info!("Files changed: {}", changed.len());

        let claude_files = config_changes(&changed);
        if claude_files.is_empty() {
            log::info!("No .claude/ files changed, skipping sync");
            return Ok(Outcome::silent());
        }
        let preview: Vec<&str> = claude_files.iter().take(5).copied().collect();
        log::info!("Claude files changed: {}", preview.join(", "));

        let config = &ctx.config.publish;
        let public_repo =
            public_repo_path(&ctx.project_dir, config, std::env::var(REPO_PATH_ENV).ok());
        if !trigger_sync(&ctx.project_dir, config, &public_repo) {
            log::warn!("Sync failed but not blocking commit");
        }
        Ok(Outcome::silent())
    }

    fn on_invalid_input(&self, _err: &serde_json::Error) -> Outcome {
        Outcome::silent()
    }
}
