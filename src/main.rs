mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use devhooks::config::Config;
use devhooks::event::{HookExit, Outcome};
use devhooks::hooks::agents_sync::{self, AgentsSyncHook};
use devhooks::hooks::context::ContextHook;
use devhooks::hooks::lint::LintHook;
use devhooks::hooks::notify::NotifyHook;
use devhooks::hooks::pre_commit::PreCommitHook;
use devhooks::hooks::publish_sync::PublishSyncHook;
use devhooks::hooks::rules::RulesHook;
use devhooks::hooks::{self, Hook, Invocation};
use devhooks::tweet::{self, TweetAnalyzer};

fn main() -> ExitCode {
    match run() {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(HookExit::NonBlocking.code())
        }
    }
}

fn run() -> Result<HookExit> {
    let cli = Cli::parse();
    let invocation = Invocation {
        project_dir: cli.project_dir,
        config_path: cli.config,
        log_to_file: true,
    };

    let hook: Box<dyn Hook> = match cli.command {
        Command::Rules { stage } => Box::new(RulesHook { stage }),
        Command::PreCommit => Box::new(PreCommitHook),
        Command::Lint => Box::new(LintHook),
        Command::Notify => Box::new(NotifyHook),
        Command::Context => Box::new(ContextHook),
        Command::AgentsSync => Box::new(AgentsSyncHook),
        Command::PublishSync => Box::new(PublishSyncHook),
        Command::SyncPair { file } => return sync_pair(&file, &invocation),
        Command::Tweet {
            text,
            premium,
            json,
        } => return analyze_tweet(&text, premium, json),
    };

    let outcome = hooks::execute_reader(hook.as_ref(), std::io::stdin().lock(), &invocation);
    Ok(emit(outcome))
}

fn emit(outcome: Outcome) -> HookExit {
    if let Some(stdout) = outcome.stdout {
        println!("{stdout}");
    }
    if let Some(stderr) = outcome.stderr {
        eprintln!("{stderr}");
    }
    outcome.exit
}

fn sync_pair(file: &Path, invocation: &Invocation) -> Result<HookExit> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let root = invocation.project_dir.clone().unwrap_or_else(|| cwd.clone());
    let file: PathBuf = cwd.join(file);

    let config = Config::load(&root, invocation.config_path.as_deref())?;
    hooks::init_logging("SYNC", &root, Some(&config));

    let (lines, exit) = agents_sync::sync_pair_command(&file, &root, &config.sync.pairs);
    for line in lines {
        println!("{line}");
    }
    Ok(exit)
}

fn analyze_tweet(text: &str, premium: bool, json: bool) -> Result<HookExit> {
    let analysis = TweetAnalyzer::new(text, premium).analyze();
    if json {
        let out = serde_json::to_string_pretty(&analysis).context("failed to serialize analysis")?;
        println!("{out}");
    } else {
        print!("{}", tweet::format_report(&analysis));
    }
    Ok(HookExit::Success)
}
