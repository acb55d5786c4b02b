use clap::Args;
use serde::Serialize;
use shelve_policy::Compiler;
use shelve_policy_yaml::ConfigLoader;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Configuration name (`fs1`) or absolute path without extension.
    pub config: String,

    /// Policies to explain; all of them by default.
    #[arg(long = "policy")]
    pub policies: Vec<String>,
}

#[derive(Serialize)]
struct Explained {
    policy: String,
    target: Clause,
    action: String,
    trigger: Option<String>,
    rules: Vec<RuleClause>,
}

#[derive(Serialize)]
struct Clause {
    condition: String,
    filter: String,
}

#[derive(Serialize)]
struct RuleClause {
    rule: String,
    #[serde(flatten)]
    clause: Clause,
    action: Option<String>,
}

pub fn run(loader: &ConfigLoader, args: &ExplainArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let namespace = super::load(loader, &args.config)?;
    let compiler = Compiler::new();

    let mut explained = Vec::new();
    for policy in super::selected(&namespace, &args.policies)? {
        let compiled = compiler.compile_policy(policy)?;
        let rules = policy
            .rules
            .iter()
            .zip(compiled.rules())
            .map(|(rule, (_, predicate))| -> anyhow::Result<RuleClause> {
                Ok(RuleClause {
                    rule: rule.name.clone(),
                    clause: Clause {
                        condition: rule.condition.to_source(),
                        filter: predicate.to_string(),
                    },
                    action: rule.action.as_ref().map(|a| a.normalize()).transpose()?,
                })
            })
            .collect::<anyhow::Result<_>>()?;

        explained.push(Explained {
            policy: policy.name.clone(),
            target: Clause {
                condition: policy.target.to_source(),
                filter: compiled.target().to_string(),
            },
            action: policy.action.normalize()?,
            trigger: policy.trigger.as_ref().map(ToString::to_string),
            rules,
        });
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&explained)?);
        }
        OutputFormat::Text => {
            for policy in &explained {
                println!("policy {}", policy.policy);
                println!("  target: {}", policy.target.condition);
                println!("  filter: {}", policy.target.filter);
                println!("  action: {}", policy.action);
                if let Some(trigger) = &policy.trigger {
                    println!("  trigger: {trigger}");
                }
                for rule in &policy.rules {
                    println!("  rule {}", rule.rule);
                    println!("    condition: {}", rule.clause.condition);
                    println!("    filter:    {}", rule.clause.filter);
                    if let Some(action) = &rule.action {
                        println!("    action:    {action}");
                    }
                }
            }
        }
    }
    Ok(())
}
