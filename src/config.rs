use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Location of the optional config file, relative to the project root.
pub const CONFIG_FILE: &str = ".claude/devhooks.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub pre_commit: PreCommitConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Log file, relative to the project root.
    pub file: PathBuf,
    /// Rotate once the file grows past this many bytes.
    pub max_bytes: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".claude/hooks/logs/hook-debug.log"),
            max_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Directory (relative to the project root) whose Python files are linted.
    pub root: PathBuf,
    pub timeout_secs: u64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content-intelligence"),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreCommitConfig {
    pub max_file_kb: u64,
    pub python: String,
    pub syntax_timeout_secs: u64,
    pub git_timeout_secs: u64,
}

impl Default for PreCommitConfig {
    fn default() -> Self {
        Self {
            max_file_kb: 500,
            python: "python3".into(),
            syntax_timeout_secs: 10,
            git_timeout_secs: 5,
        }
    }
}

/// A pair of files kept identical. Paths are relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncPair {
    pub name: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub pairs: Vec<SyncPair>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pairs: vec![
                SyncPair {
                    name: "Root".into(),
                    source: PathBuf::from("CLAUDE.md"),
                    target: PathBuf::from("AGENTS.md"),
                },
                SyncPair {
                    name: "Backend".into(),
                    source: PathBuf::from("backend/CLAUDE.md"),
                    target: PathBuf::from("backend/AGENTS.md"),
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    pub script: PathBuf,
    /// Checkout of the public repository. Overridden by `PUBLIC_REPO_PATH`.
    pub repo_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from(".claude/scripts/sync-to-public.sh"),
            repo_path: PathBuf::from("wythm-claude-workflows"),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load `path`, or `<project_dir>/.claude/devhooks.toml` when no path is
    /// given. A missing file yields the defaults.
    pub fn load(project_dir: &Path, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&project_dir.join(CONFIG_FILE)),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for pair in &self.sync.pairs {
            if pair.source == pair.target {
                bail!(
                    "failed to parse {}: sync pair '{}' has identical source and target",
                    path.display(),
                    pair.name
                );
            }
        }
        if self.log.max_bytes == 0 {
            bail!("failed to parse {}: log.max_bytes must be positive", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/devhooks.toml")).unwrap();
        assert_eq!(config.lint.root, PathBuf::from("content-intelligence"));
        assert_eq!(config.pre_commit.max_file_kb, 500);
        assert_eq!(config.sync.pairs.len(), 2);
        assert_eq!(config.publish.timeout_secs, 60);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[lint]
root = "service"

[[sync.pairs]]
name = "Docs"
source = "docs/CLAUDE.md"
target = "docs/AGENTS.md"
"#
        )
        .unwrap();
        let config = Config::load_from(f.path()).unwrap();
        assert_eq!(config.lint.root, PathBuf::from("service"));
        assert_eq!(config.lint.timeout_secs, 30);
        assert_eq!(config.sync.pairs.len(), 1);
        assert_eq!(config.sync.pairs[0].name, "Docs");
        assert_eq!(config.log.max_bytes, 1024 * 1024);
    }

    #[test]
    fn unknown_keys_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "[lint]\nrooot = \"x\"\n").unwrap();
        let err = Config::load_from(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn identical_pair_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "[[sync.pairs]]\nname = \"x\"\nsource = \"a.md\"\ntarget = \"a.md\"\n"
        )
        .unwrap();
        let err = Config::load_from(f.path()).unwrap_err();
        assert!(err.to_string().contains("identical source and target"));
    }
}
