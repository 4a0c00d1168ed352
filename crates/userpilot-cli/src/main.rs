mod logging;

use std::path::PathBuf;

use clap::Parser;
use userpilot_engine::{orchestrator, telemetry, Config};

#[derive(Parser)]
#[command(
    name = "target-userpilot",
    version,
    about = "Singer target that sends records to the Userpilot identify API"
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let config = Config::load(&cli.config)?;

    if !config.disable_collection {
        tracing::info!(
            "Sending version information to singer.io. To disable sending anonymous usage data, \
             set the config parameter \"disable_collection\" to true"
        );
        // Detached; never awaited.
        let _ = telemetry::spawn_usage_ping(env!("CARGO_PKG_VERSION"));
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout().lock();
    orchestrator::run_target(&config, stdin, &mut stdout).await?;

    tracing::debug!("Exiting normally");
    Ok(())
}
