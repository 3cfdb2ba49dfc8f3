use swingsig_core::{SignalOptions, SignalService, SymbolRequest};

use crate::cli::SignalArgs;
use crate::error::CliError;

use super::{seeded_rng, with_narrative, CommandResult};

pub async fn run(args: &SignalArgs, service: &SignalService) -> Result<CommandResult, CliError> {
    let options = SignalOptions {
        policy: args.policy.clone(),
        narrate: args.narrate,
    };
    let mut rng = seeded_rng(args.seed);

    let report = service
        .signal(&SymbolRequest::new(args.symbol.as_str()), &options, &mut rng)
        .await?;

    let text = with_narrative(&report.formatted, report.narrative.as_deref());
    let warnings = report.warnings.clone();
    Ok(CommandResult::new(serde_json::to_value(&report)?, text).with_warnings(warnings))
}
