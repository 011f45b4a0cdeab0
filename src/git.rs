use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::process;

/// Run `git diff --name-only <args>` in `repo` and return the listed paths.
pub fn diff_names(repo: &Path, args: &[&str], timeout: Duration) -> Result<Vec<String>> {
    let out = process::run(
        Command::new("git")
            .current_dir(repo)
            .args(["diff", "--name-only"])
            .args(args),
        timeout,
    )?;
    if !out.success() {
        bail!("git diff {} failed: {}", args.join(" "), out.stderr.trim());
    }
    Ok(parse_name_list(&out.stdout))
}

/// Files added, copied or modified in the index.
pub fn staged_files(repo: &Path, timeout: Duration) -> Result<Vec<String>> {
    diff_names(repo, &["--cached", "--diff-filter=ACM"], timeout)
}

/// Files differing between the working tree and HEAD.
pub fn modified_files(repo: &Path, timeout: Duration) -> Result<Vec<String>> {
    diff_names(repo, &["HEAD"], timeout)
}

/// Files touched by the most recent commit, falling back to the index when
/// there is no parent commit.
pub fn last_commit_files(repo: &Path, timeout: Duration) -> Result<Vec<String>> {
    match diff_names(repo, &["HEAD~1", "HEAD"], timeout) {
        Ok(files) => Ok(files),
        Err(e) => {
            log::debug!("falling back to index: {e:#}");
            diff_names(repo, &["--cached"], timeout)
        }
    }
}

fn parse_name_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
