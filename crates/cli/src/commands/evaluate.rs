use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use shelve_filter::Entry;
use shelve_policy::{Compiler, Outcome};
use shelve_policy_yaml::ConfigLoader;
use tracing::info;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Configuration name (`fs1`) or absolute path without extension.
    pub config: String,

    /// JSON file holding an array of entries.
    #[arg(long)]
    pub entries: PathBuf,

    /// Policies to run, in order; all of them by default.
    #[arg(long = "policy")]
    pub policies: Vec<String>,

    /// Reference time for relative durations (RFC 3339); defaults to now.
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct Decision<'a> {
    policy: &'a str,
    path: &'a str,
    #[serde(flatten)]
    outcome: Outcome,
}

pub fn run(
    loader: &ConfigLoader,
    args: &EvaluateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let namespace = super::load(loader, &args.config)?;
    let content = std::fs::read_to_string(&args.entries)
        .with_context(|| format!("cannot read {}", args.entries.display()))?;
    let entries: Vec<Entry> = serde_json::from_str(&content)
        .with_context(|| format!("invalid entries in {}", args.entries.display()))?;

    let compiler = match args.now {
        Some(now) => Compiler::new().with_now(now),
        None => Compiler::new(),
    };

    let mut decisions = Vec::new();
    for policy in super::selected(&namespace, &args.policies)? {
        let compiled = compiler.compile_policy(policy)?;
        for entry in &entries {
            let outcome = compiled
                .evaluate(entry)
                .with_context(|| format!("policy '{}' on {}", policy.name, entry.path))?;
            decisions.push(Decision {
                policy: &policy.name,
                path: &entry.path,
                outcome,
            });
        }
    }
    info!(
        entries = entries.len(),
        decisions = decisions.len(),
        "evaluated entries"
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&decisions)?);
        }
        OutputFormat::Text => {
            for decision in &decisions {
                match &decision.outcome {
                    Outcome::Skipped => {}
                    Outcome::RuleMatched { rule, action } => println!(
                        "{policy}: {path} -> {action} (rule {rule})",
                        policy = decision.policy,
                        path = decision.path,
                        action = action.action,
                    ),
                    Outcome::Default { action } => println!(
                        "{policy}: {path} -> {action} (default)",
                        policy = decision.policy,
                        path = decision.path,
                        action = action.action,
                    ),
                }
            }
        }
    }
    Ok(())
}
