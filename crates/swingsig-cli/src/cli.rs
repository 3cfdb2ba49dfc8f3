//! CLI argument definitions for swingsig.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `signal` | Composite signal for one symbol |
//! | `picks` | Ranked top picks from a universe |
//! | `options` | Short-term options idea for one symbol |
//! | `tiers` | List ranking tiers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve data from the built-in fixture market |
//! | `--timeout-ms` | config | Per-call upstream timeout |
//! | `--verbose` | `false` | Debug-level logs on stderr |

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "swingsig",
    author,
    version,
    about = "Swing-trade signals: targets, stops and ranked picks",
    long_about = "swingsig gathers quotes and technical indicators, derives target and \
stop-loss prices under a selectable policy, and ranks a universe into top picks.\n\
\n\
Configuration is read from the environment (and a .env file):\n\
  SWINGSIG_FMP_API_KEY, SWINGSIG_OPENAI_API_KEY, SWINGSIG_OPENAI_MODEL,\n\
  SWINGSIG_TIMEOUT_MS, SWINGSIG_UNIVERSE"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve data from the built-in fixture market instead of live providers.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Per-call upstream timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable block.
    Text,
    /// JSON envelope with metadata.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Composite signal for one symbol.
    ///
    ///   swingsig signal AAPL
    ///   swingsig signal TSLA --policy band --narrate
    Signal(SignalArgs),

    /// Ranked top picks from a candidate universe.
    ///
    ///   swingsig picks --tier large-cap
    ///   swingsig picks --universe random --sample 8 --top 3 --seed 42
    ///   swingsig picks --universe screened --tier high-volume --indicators
    Picks(PicksArgs),

    /// Short-term options idea for one symbol.
    ///
    ///   swingsig options NVDA
    Options(OptionsArgs),

    /// List ranking tiers and their predicates.
    Tiers,
}

#[derive(Debug, Args)]
pub struct SignalArgs {
    pub symbol: String,

    /// swing, conservative, momentum, band, fixed:G/L or band:G1-G2/L1-L2.
    #[arg(long)]
    pub policy: Option<String>,

    /// Add a generated narrative.
    #[arg(long, default_value_t = false)]
    pub narrate: bool,

    /// Seed for randomized policies.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct PicksArgs {
    /// high-volume, large-cap or mid-cap.
    #[arg(long)]
    pub tier: Option<String>,

    /// fixed, random or screened.
    #[arg(long)]
    pub universe: Option<String>,

    /// Sample size for the random universe, screen limit for screened.
    #[arg(long)]
    pub sample: Option<usize>,

    /// Number of picks to return.
    #[arg(long)]
    pub top: Option<usize>,

    /// swing, conservative, momentum, band, fixed:G/L or band:G1-G2/L1-L2.
    #[arg(long)]
    pub policy: Option<String>,

    /// Fetch indicators for every pick.
    #[arg(long, default_value_t = false)]
    pub indicators: bool,

    /// Fill empty slots with universe members outside the tier.
    #[arg(long, default_value_t = false)]
    pub backfill: bool,

    /// Add a generated narrative.
    #[arg(long, default_value_t = false)]
    pub narrate: bool,

    /// Seed for sampling and randomized policies.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    pub symbol: String,
}
