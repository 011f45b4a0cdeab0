use anyhow::Result;

use super::{Hook, HookContext};
use crate::event::{HookInput, HookOutput, Outcome};
use crate::rules::{load_rules, RuleEngine, RuleEvent};

/// Which host event the rule hook was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RuleStage {
    PreToolUse,
    PostToolUse,
    UserPrompt,
    Stop,
}

impl RuleStage {
    fn rule_event(self, input: &HookInput) -> Option<RuleEvent> {
        match self {
            Self::PreToolUse | Self::PostToolUse => RuleEvent::for_tool(&input.tool_name),
            Self::UserPrompt => Some(RuleEvent::Prompt),
            Self::Stop => Some(RuleEvent::Stop),
        }
    }
}

/// Evaluates the project's rule files. Always answers with JSON and exit 0,
/// reporting its own failures as a system message.
pub struct RulesHook {
    pub stage: RuleStage,
}

fn error_output(err: impl std::fmt::Display) -> Outcome {
    let output = HookOutput::system_message(format!("Hookify error: {err}"));
    match output.to_json() {
        Ok(json) => Outcome::stdout(json),
        Err(_) => Outcome::stdout("{}"),
    }
}

impl Hook for RulesHook {
    fn tag(&self) -> &'static str {
        "HOOKIFY"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        let event = self.stage.rule_event(input);
        let rules = load_rules(event, &ctx.project_dir)?;
        log::debug!("evaluating {} rule(s) for {:?}", rules.len(), event);
        let output = RuleEngine::new().evaluate_rules(&rules, input);
        Outcome::json(&output)
    }

    fn on_invalid_input(&self, err: &serde_json::Error) -> Outcome {
        error_output(err)
    }

    fn on_error(&self, err: &anyhow::Error) -> Outcome {
        error_output(format!("{err:#}"))
    }
}
