//! Hook entry points and the dispatcher that maps their results onto the
//! host's stdout/exit-code contract.

pub mod agents_sync;
pub mod context;
pub mod lint;
pub mod notify;
pub mod pre_commit;
pub mod publish_sync;
pub mod rules;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::event::{HookExit, HookInput, Outcome};
use crate::logging;

/// Resolved environment a hook runs in.
#[derive(Debug)]
pub struct HookContext {
    pub project_dir: PathBuf,
    pub config: Config,
}

impl HookContext {
    pub fn new(project_dir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            project_dir: project_dir.into(),
            config,
        }
    }

    /// `path` resolved against the project root when relative.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.project_dir.join(path)
    }
}

/// One hook program.
///
/// `run` only sees well-formed input. The two failure paths default to the
/// host convention of "never block the user": malformed stdin exits 1 and
/// every other failure exits 0 silently.
pub trait Hook {
    /// Tag identifying this hook in the shared log file.
    fn tag(&self) -> &'static str;

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome>;

    fn on_invalid_input(&self, _err: &serde_json::Error) -> Outcome {
        Outcome::exit(HookExit::NonBlocking)
    }

    fn on_error(&self, _err: &anyhow::Error) -> Outcome {
        Outcome::silent()
    }
}

/// Process-level options shared by every hook invocation.
#[derive(Debug, Default)]
pub struct Invocation {
    /// Overrides the event's `cwd` as project root.
    pub project_dir: Option<PathBuf>,
    /// Overrides `<project>/.claude/devhooks.toml`.
    pub config_path: Option<PathBuf>,
    /// Install the file logger before running.
    pub log_to_file: bool,
}

/// Install the file logger for `tag`. Logging failures are ignored.
pub fn init_logging(tag: &'static str, project_dir: &Path, config: Option<&Config>) {
    let defaults = crate::config::LogConfig::default();
    let log = config.map(|c| &c.log).unwrap_or(&defaults);
    let _ = logging::init(&project_dir.join(&log.file), log.max_bytes, tag);
}

/// Read the event from `reader` and [`execute`] it. A read failure goes to
/// the hook's error handler like any other failure.
pub fn execute_reader(hook: &dyn Hook, mut reader: impl Read, invocation: &Invocation) -> Outcome {
    let mut stdin = String::new();
    if let Err(e) = reader.read_to_string(&mut stdin) {
        let err = anyhow::Error::new(e).context("failed to read stdin");
        log::error!("{err:#}");
        return hook.on_error(&err);
    }
    execute(hook, &stdin, invocation)
}

/// Parse `stdin`, resolve the project and config, run `hook`, and fold every
/// failure into the hook's declared outcome.
pub fn execute(hook: &dyn Hook, stdin: &str, invocation: &Invocation) -> Outcome {
    let parsed = HookInput::parse(stdin);
    let explicit = invocation.project_dir.as_deref();
    let project_dir = match &parsed {
        Ok(input) => input.project_dir(explicit),
        Err(_) => HookInput::default().project_dir(explicit),
    };
    let project_dir = match project_dir {
        Ok(dir) => dir,
        Err(e) => return hook.on_error(&e),
    };
    let config = Config::load(&project_dir, invocation.config_path.as_deref());

    if invocation.log_to_file {
        init_logging(hook.tag(), &project_dir, config.as_ref().ok());
    }

    let input = match parsed {
        Ok(input) => input,
        Err(e) => {
            log::error!("invalid hook input: {e}");
            return hook.on_invalid_input(&e);
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            return hook.on_error(&e);
        }
    };

    let ctx = HookContext::new(project_dir, config);
    match hook.run(&input, &ctx) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("unexpected error: {e:#}");
            hook.on_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Failing;

    impl Hook for Failing {
        fn tag(&self) -> &'static str {
            "test"
        }

        fn run(&self, _input: &HookInput, _ctx: &HookContext) -> Result<Outcome> {
            bail!("boom")
        }
    }

    struct Echo;

    impl Hook for Echo {
        fn tag(&self) -> &'static str {
            "test"
        }

        fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
            Ok(Outcome::stdout(format!(
                "{}:{}",
                input.tool_name,
                ctx.project_dir.display()
            )))
        }
    }

    #[test]
    fn malformed_input_uses_default_exit() {
        let out = execute(&Echo, "{not json", &Invocation::default());
        assert_eq!(out.exit, HookExit::NonBlocking);
        assert!(out.stdout.is_none());
    }

    #[test]
    fn failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let stdin = serde_json::json!({"cwd": dir.path()}).to_string();
        assert_eq!(execute(&Failing, &stdin, &Invocation::default()), Outcome::silent());
    }

    #[test]
    fn explicit_project_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation {
            project_dir: Some(dir.path().to_path_buf()),
            ..Invocation::default()
        };
        let out = execute(&Echo, r#"{"tool_name":"Bash","cwd":"/elsewhere"}"#, &invocation);
        assert_eq!(
            out.stdout.unwrap(),
            format!("Bash:{}", dir.path().display())
        );
    }

    #[test]
    fn bad_config_routes_to_on_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::write(dir.path().join(crate::config::CONFIG_FILE), "not = [valid").unwrap();
        let stdin = serde_json::json!({"cwd": dir.path()}).to_string();
        assert_eq!(execute(&Echo, &stdin, &Invocation::default()), Outcome::silent());
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe closed"))
        }
    }

    #[test]
    fn unreadable_stdin_routes_to_on_error() {
        use super::rules::{RuleStage, RulesHook};

        let hook = RulesHook {
            stage: RuleStage::PreToolUse,
        };
        let out = execute_reader(&hook, BrokenPipe, &Invocation::default());
        assert_eq!(out.exit, HookExit::Success);
        let stdout = out.stdout.unwrap();
        assert!(stdout.starts_with(r#"{"systemMessage":"Hookify error: failed to read stdin"#));
        assert!(stdout.contains("pipe closed"));

        assert_eq!(execute_reader(&Failing, BrokenPipe, &Invocation::default()), Outcome::silent());
    }

    #[test]
    fn reader_feeds_execute() {
        let dir = tempfile::tempdir().unwrap();
        let stdin = serde_json::json!({"tool_name": "Write", "cwd": dir.path()}).to_string();
        let out = execute_reader(&Echo, stdin.as_bytes(), &Invocation::default());
        assert_eq!(out.stdout.unwrap(), format!("Write:{}", dir.path().display()));
    }
}
