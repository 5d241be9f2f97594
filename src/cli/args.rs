use crate::config::{ConfigError, LedgerConfig};
use crate::strategy::{BatchConfig, ReplayOptions};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the ledger replay tool
#[derive(Parser, Debug)]
#[command(name = "invoice-ledger")]
#[command(about = "Replay invoice escrow commands against a fresh ledger", long_about = None)]
pub struct CliArgs {
    #[arg(value_name = "SCRIPT", help = "Path to the CSV command script")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for concurrent across unrelated invoices"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for the async strategy (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "config",
        value_name = "FILE",
        help = "TOML file with initial administrators and backend services"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "balances",
        value_name = "FILE",
        help = "Write final wallet balances as CSV to FILE"
    )]
    pub balances: Option<PathBuf>,

    #[arg(
        long = "events",
        value_name = "FILE",
        help = "Write the event journal as JSON lines to FILE"
    )]
    pub events: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Load the ledger config and collect output paths
    pub fn to_replay_options(&self) -> Result<ReplayOptions, ConfigError> {
        Ok(ReplayOptions {
            ledger: LedgerConfig::load(self.config.as_deref())?,
            balances_path: self.balances.clone(),
            events_path: self.events.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "script.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "script.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "script.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::batch_size(&["program", "--batch-size", "2000", "script.csv"], Some(2000), None)]
    #[case::max_concurrent(&["program", "--max-concurrent", "8", "script.csv"], None, Some(8))]
    #[case::no_options(&["program", "script.csv"], None, None)]
    #[case::all_options(
        &["program", "--strategy", "async", "--batch-size", "2000", "--max-concurrent", "8", "script.csv"],
        Some(2000),
        Some(8)
    )]
    fn test_batch_options(
        #[case] args: &[&str],
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.batch_size, batch_size);
        assert_eq!(parsed.max_concurrent_batches, max_concurrent);
    }

    #[rstest]
    #[case::all_defaults(&["program", "script.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "script.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "script.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "script.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "script.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_output_paths_flow_into_replay_options() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--balances",
            "balances.csv",
            "--events",
            "events.jsonl",
            "script.csv",
        ])
        .unwrap();

        let options = parsed.to_replay_options().unwrap();

        assert_eq!(options.balances_path, Some(PathBuf::from("balances.csv")));
        assert_eq!(options.events_path, Some(PathBuf::from("events.jsonl")));
        assert_eq!(options.ledger, LedgerConfig::default());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let parsed =
            CliArgs::try_parse_from(["program", "--config", "missing.toml", "script.csv"]).unwrap();

        assert!(matches!(
            parsed.to_replay_options(),
            Err(ConfigError::Read { .. })
        ));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "script.csv"])]
    #[case::config_without_value(&["program", "script.csv", "--config"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
