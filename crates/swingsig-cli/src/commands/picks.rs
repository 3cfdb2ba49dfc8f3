use swingsig_core::{PicksQuery, SignalService};

use crate::cli::PicksArgs;
use crate::error::CliError;

use super::{seeded_rng, with_narrative, CommandResult};

pub async fn run(args: &PicksArgs, service: &SignalService) -> Result<CommandResult, CliError> {
    let query = PicksQuery {
        tier: args.tier.clone(),
        universe: args.universe.clone(),
        sample: args.sample,
        top: args.top,
        policy: args.policy.clone(),
        indicators: args.indicators,
        backfill: args.backfill,
        narrate: args.narrate,
    };
    let mut rng = seeded_rng(args.seed);

    let report = service.picks(&query, &mut rng).await?;
    if report.outcome.is_empty() {
        tracing::info!(tier = ?report.outcome.tier, "no candidates survived ranking");
    }

    let text = with_narrative(&report.formatted, report.narrative.as_deref());
    let warnings = report.warnings();
    Ok(CommandResult::new(serde_json::to_value(&report)?, text).with_warnings(warnings))
}
