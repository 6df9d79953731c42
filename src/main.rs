use bridgeapi::cli::{run_cli, Cli};
use bridgeapi::logging::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = &cli.log_level {
        log_config.log_level = level.clone();
    }
    let _log_guard = init_logging(&log_config)?;

    run_cli(cli)
}
