//! Wires config, delivery client, processor, and state emission for one run.

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::AsyncBufRead;

use crate::config::Config;
use crate::delivery::UserpilotClient;
use crate::processor::{ProcessStats, StreamProcessor};
use crate::state::emit_state;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub state: Option<Value>,
    pub stats: ProcessStats,
}

/// Process `input` to exhaustion against the Userpilot API and write the
/// final checkpoint to `output`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, processing hits a
/// fatal error (nothing is written to `output` then), or the state line
/// cannot be written.
pub async fn run_target<R, W>(config: &Config, input: R, output: &mut W) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let client = UserpilotClient::new(config).context("Failed to create Userpilot client")?;
    tracing::info!(endpoint = client.endpoint(), "Starting target-userpilot");

    let mut processor = StreamProcessor::new(client);
    let state = processor.process_lines(input).await?;
    emit_state(output, state.as_ref()).context("Failed to write state to stdout")?;

    Ok(RunSummary {
        state,
        stats: processor.stats(),
    })
}
