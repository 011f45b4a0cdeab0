//! Keeps each `CLAUDE.md` identical to its sibling `AGENTS.md`.
//!
//! Whichever side of a configured pair changed is copied over the other
//! side, unless the two already agree once blank lines and surrounding
//! whitespace are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::{Hook, HookContext};
use crate::config::SyncPair;
use crate::event::{HookExit, HookInput, Outcome};

pub const SYNC_FILE_NAMES: [&str; 2] = ["CLAUDE.md", "AGENTS.md"];

/// Exact file-name match, as written by the assistant's tools.
pub fn is_sync_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| SYNC_FILE_NAMES.contains(&n))
}

fn is_sync_file_ignore_case(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| SYNC_FILE_NAMES.iter().any(|s| s.eq_ignore_ascii_case(n)))
}

/// Drop blank lines and trim the rest.
pub fn normalize_content(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical form of a path whose final component may not exist yet.
fn comparable(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// A configured pair with both sides resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub name: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

pub fn find_pair(changed: &Path, pairs: &[SyncPair], root: &Path) -> Option<ResolvedPair> {
    let changed = comparable(changed);
    pairs.iter().find_map(|pair| {
        let source = comparable(&root.join(&pair.source));
        let target = comparable(&root.join(&pair.target));
        (changed == source || changed == target).then(|| ResolvedPair {
            name: pair.name.clone(),
            source,
            target,
        })
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    AlreadyInSync { direction: &'static str },
    Updated { direction: &'static str, target: PathBuf },
}

impl SyncResult {
    pub fn describe(&self, pair: &str) -> String {
        match self {
            Self::AlreadyInSync { direction } => {
                format!("Files are already in sync ({direction})")
            }
            Self::Updated { direction, target } => format!(
                "Successfully synchronized {pair} ({direction}), updated {}",
                target.display()
            ),
        }
    }
}

/// Copy the changed side of `pair` over the other side.
pub fn synchronize(pair: &ResolvedPair, changed: &Path) -> Result<SyncResult> {
    let (from, to, direction) = if comparable(changed) == pair.source {
        (&pair.source, &pair.target, "CLAUDE.md → AGENTS.md")
    } else {
        (&pair.target, &pair.source, "AGENTS.md → CLAUDE.md")
    };

    if !from.exists() {
        bail!("source file {} does not exist", from.display());
    }
    let content =
        fs::read_to_string(from).with_context(|| format!("failed to read {}", from.display()))?;

    if to.exists() {
        match fs::read_to_string(to) {
            Ok(existing) if normalize_content(&existing) == normalize_content(&content) => {
                return Ok(SyncResult::AlreadyInSync { direction });
            }
            Ok(_) => {}
            Err(e) => log::error!("error reading {}: {e}", to.display()),
        }
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(to, &content).with_context(|| format!("failed to write {}", to.display()))?;
    Ok(SyncResult::Updated {
        direction,
        target: to.clone(),
    })
}

/// Sync the pair containing `changed`. `Ok(None)` when the file is not a
/// sync file at all; an error when it is one but belongs to no pair.
pub fn sync_file(changed: &Path, root: &Path, pairs: &[SyncPair]) -> Result<Option<String>> {
    if !is_sync_file_ignore_case(changed) {
        return Ok(None);
    }
    let Some(pair) = find_pair(changed, pairs, root) else {
        bail!("no matching file pair found for {}", changed.display());
    };
    log::info!("processing synchronization for {} files", pair.name);
    let result = synchronize(&pair, changed)?;
    let message = result.describe(&pair.name);
    log::info!("{message}");
    Ok(Some(message))
}

/// `sync-pair` command: report lines and exit status for one file.
pub fn sync_pair_command(
    changed: &Path,
    root: &Path,
    pairs: &[SyncPair],
) -> (Vec<String>, HookExit) {
    let mut lines = vec![format!("File change detected: {}", changed.display())];
    match sync_file(changed, root, pairs) {
        Ok(None) => {
            lines.push("File does not require synchronization".to_string());
            (lines, HookExit::Success)
        }
        Ok(Some(message)) => {
            lines.push(message);
            lines.push("Synchronization completed successfully".to_string());
            (lines, HookExit::Success)
        }
        Err(e) => {
            log::error!("synchronization failed: {e:#}");
            lines.push(format!("ERROR: {e:#}"));
            (lines, HookExit::NonBlocking)
        }
    }
}

pub struct AgentsSyncHook;

impl Hook for AgentsSyncHook {
    fn tag(&self) -> &'static str {
        "AUTO-SYNC"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        let file = input.tool_input_str("file_path").unwrap_or_default();
        match input.tool_name.as_str() {
            "Edit" | "Write" => {}
            "Read" => {
                if !file.is_empty() && is_sync_file(Path::new(file)) {
                    log::debug!("read operation on sync file: {file}");
                }
                return Ok(Outcome::silent());
            }
            _ => return Ok(Outcome::silent()),
        }
        if file.is_empty() || !is_sync_file(Path::new(file)) {
            return Ok(Outcome::silent());
        }

        log::info!("detected modification of sync file: {file}");
        let changed = ctx.resolve(file);
        let mut lines = Vec::new();
        let synced = match sync_file(&changed, &ctx.project_dir, &ctx.config.sync.pairs) {
            Ok(Some(message)) => {
                lines.push(message);
                1
            }
            Ok(None) => 0,
            Err(e) => {
                log::error!("sync failed for {file}: {e:#}");
                lines.push(format!("Sync failed for {file}: {e:#}"));
                0
            }
        };
        let summary = if synced > 0 {
            format!("Auto-sync completed: {synced}/1 files synchronized")
        } else {
            "Auto-sync failed for all files".to_string()
        };
        log::info!("{summary}");
        lines.push(summary);
        Ok(Outcome::stdout(lines.join("\n")))
    }

    fn on_error(&self, _err: &anyhow::Error) -> Outcome {
        Outcome::exit(HookExit::NonBlocking)
    }
}
