//! Invoice ledger replay CLI
//!
//! Replays a CSV script of ledger commands against a fresh invoice escrow
//! ledger and prints the final invoice table.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > invoices.csv
//! cargo run -- --strategy sync script.csv > invoices.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 script.csv > invoices.csv
//! cargo run -- --config ledger.toml --balances balances.csv --events events.jsonl script.csv
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see every applied command.
//!
//! # Processing Strategies
//!
//! - **sync**: Streaming, single-threaded replay in script order
//! - **async**: Batched replay with invoices processed concurrently (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad config, script not found, output not writable, etc.)

use invoice_escrow_ledger::cli;
use invoice_escrow_ledger::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let options = match args.to_replay_options() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            process::exit(1);
        }
    };

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, options)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, "replay failed");
        process::exit(1);
    }
}
