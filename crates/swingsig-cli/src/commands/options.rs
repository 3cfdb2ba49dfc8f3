use swingsig_core::{render_optional, SignalService, SymbolRequest};

use crate::cli::OptionsArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &OptionsArgs, service: &SignalService) -> Result<CommandResult, CliError> {
    let insight = service
        .options_insight(&SymbolRequest::new(args.symbol.as_str()))
        .await?;

    let text = format!(
        "{} @ ${}\n{}\n",
        insight.symbol,
        render_optional(Some(insight.price)),
        insight.message
    );
    Ok(CommandResult::new(serde_json::to_value(&insight)?, text))
}
