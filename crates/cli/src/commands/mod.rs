pub mod check;
pub mod evaluate;
pub mod explain;

use anyhow::Context;
use shelve_policy::{Namespace, Policy};
use shelve_policy_yaml::ConfigLoader;

/// Load configuration `name`, naming it in the error.
pub fn load(loader: &ConfigLoader, name: &str) -> anyhow::Result<Namespace> {
    loader
        .load(name)
        .with_context(|| format!("cannot load configuration '{name}'"))
}

/// The requested policies, or every declared one when none is requested.
pub fn selected<'n>(namespace: &'n Namespace, names: &[String]) -> anyhow::Result<Vec<&'n Policy>> {
    if names.is_empty() {
        return Ok(namespace.policies().collect());
    }
    Ok(namespace.select(names)?)
}
