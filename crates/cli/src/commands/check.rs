use clap::Args;
use serde::Serialize;
use shelve_policy_yaml::ConfigLoader;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration name (`fs1`) or absolute path without extension.
    pub config: String,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    config: &'a str,
    fileclasses: Vec<String>,
    policies: Vec<PolicySummary>,
}

#[derive(Serialize)]
struct PolicySummary {
    name: String,
    action: String,
    trigger: Option<String>,
    rules: Vec<String>,
}

pub fn run(loader: &ConfigLoader, args: &CheckArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let namespace = super::load(loader, &args.config)?;

    let report = CheckReport {
        config: &args.config,
        fileclasses: namespace.fileclasses().map(|c| c.name().to_owned()).collect(),
        policies: namespace
            .policies()
            .map(|p| -> anyhow::Result<PolicySummary> {
                Ok(PolicySummary {
                    name: p.name.clone(),
                    action: p.action.normalize()?,
                    trigger: p.trigger.as_ref().map(ToString::to_string),
                    rules: p.rules.iter().map(|r| r.name.clone()).collect(),
                })
            })
            .collect::<anyhow::Result<_>>()?,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "Configuration '{}' is valid: {} fileclass(es), {} policy(ies).",
                report.config,
                report.fileclasses.len(),
                report.policies.len()
            );
            for name in &report.fileclasses {
                println!("  fileclass {name}");
            }
            for policy in &report.policies {
                println!(
                    "  policy {name} -> {action} ({count} rule(s), {trigger})",
                    name = policy.name,
                    action = policy.action,
                    count = policy.rules.len(),
                    trigger = policy.trigger.as_deref().unwrap_or("on demand"),
                );
            }
        }
    }
    Ok(())
}
