//! Anonymous usage ping to the Singer collector.
//!
//! Fire-and-forget: the task is detached, never awaited by the pipeline,
//! and every failure is swallowed after a debug log line.

use std::time::Duration;

use tokio::task::JoinHandle;

pub const COLLECTOR_URL: &str = "http://collector.singer.io/i";
const COLLECTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters of the `open` event for this target `version`.
#[must_use]
pub fn usage_params(version: &str) -> [(&'static str, &str); 5] {
    [
        ("e", "se"),
        ("aid", "singer"),
        ("se_ca", "target-userpilot"),
        ("se_ac", "open"),
        ("se_la", version),
    ]
}

/// Spawn the usage ping in the background.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_usage_ping(version: &str) -> JoinHandle<()> {
    spawn_usage_ping_to(COLLECTOR_URL, version)
}

pub(crate) fn spawn_usage_ping_to(url: &str, version: &str) -> JoinHandle<()> {
    let url = url.to_string();
    let version = version.to_string();
    tokio::spawn(async move {
        if let Err(e) = send_usage_stats(&url, &version).await {
            tracing::debug!(error = %e, "Collection request failed");
        }
    })
}

async fn send_usage_stats(url: &str, version: &str) -> reqwest::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(COLLECTOR_TIMEOUT)
        .build()?;
    client
        .get(url)
        .query(&usage_params(version))
        .send()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_params_identify_target_and_version() {
        let params = usage_params("0.1.0");
        assert!(params.contains(&("se_ca", "target-userpilot")));
        assert!(params.contains(&("se_ac", "open")));
        assert!(params.contains(&("se_la", "0.1.0")));
    }

    #[tokio::test]
    async fn test_failed_ping_is_swallowed() {
        // Nothing listens on the discard port; the task must finish quietly.
        let handle = spawn_usage_ping_to("http://127.0.0.1:9/i", "0.1.0");
        handle.await.expect("usage ping task must not panic");
    }

    #[tokio::test]
    async fn test_invalid_url_is_swallowed() {
        let handle = spawn_usage_ping_to("::not a url::", "0.1.0");
        handle.await.expect("usage ping task must not panic");
    }
}
