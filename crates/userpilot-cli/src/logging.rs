use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output to stderr.
///
/// `RUST_LOG` wins over `log_level` when set. Stdout is reserved for the
/// state line, and colour is dropped when stderr is captured by an
/// orchestrator rather than a terminal.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}
