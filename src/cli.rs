use std::path::PathBuf;

use clap::{Parser, Subcommand};

use devhooks::hooks::rules::RuleStage;

#[derive(Parser)]
#[command(name = "devhooks", about = "Automation hooks for an AI coding assistant")]
pub struct Cli {
    /// Project root [default: the event's cwd]
    #[arg(long, env = "CLAUDE_PROJECT_DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Config file [default: <project>/.claude/devhooks.toml]
    #[arg(long, env = "DEVHOOKS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate rule files in .claude/hookify/rules
    Rules {
        /// Host event this invocation is registered for
        #[arg(value_enum)]
        stage: RuleStage,
    },

    /// Validate `git commit` commands before they run
    PreCommit,

    /// Format and lint Python files after they are written
    Lint,

    /// Send a Telegram message for notifications and stops
    Notify,

    /// Inject the project index when a Task is spawned
    Context,

    /// Mirror CLAUDE.md and AGENTS.md after edits
    AgentsSync,

    /// Synchronise the pair containing one file
    SyncPair {
        /// Changed file
        #[arg(env = "FILE_PATH")]
        file: PathBuf,
    },

    /// Publish .claude/ changes to the public repository after a commit
    PublishSync,

    /// Analyse a draft tweet
    Tweet {
        /// Tweet text
        text: String,
        /// Account has the premium character limit
        #[arg(long)]
        premium: bool,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
}
