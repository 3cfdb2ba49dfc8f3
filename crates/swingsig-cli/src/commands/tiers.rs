use serde::Serialize;
use swingsig_core::Tier;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TierRow {
    name: &'static str,
    description: &'static str,
}

pub fn run() -> Result<CommandResult, CliError> {
    let rows = Tier::ALL
        .iter()
        .map(|tier| TierRow {
            name: tier.as_str(),
            description: tier.description(),
        })
        .collect::<Vec<_>>();

    let text = rows
        .iter()
        .map(|row| format!("{:<12} {}", row.name, row.description))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(CommandResult::new(serde_json::to_value(&rows)?, text))
}
