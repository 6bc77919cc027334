//! Self-ping loop
//!
//! Sleep-prone hosts idle a process that receives no traffic. When an
//! external URL is configured, a background loop pings it on an interval;
//! failures are logged and retried, never fatal.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::KeepaliveConfig;

/// Pause after a failed ping before rejoining the normal cadence
const RETRY_DELAY: Duration = Duration::from_secs(60);

pub async fn run(config: Option<KeepaliveConfig>) {
    let Some(config) = config else {
        info!("Self-ping disabled (no keepalive url configured)");
        return;
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build self-ping client, self-ping disabled");
            return;
        }
    };

    let interval = Duration::from_secs(config.interval_secs);
    info!(url = %config.url, interval_secs = config.interval_secs, "Self-ping enabled");

    loop {
        tokio::time::sleep(interval).await;

        match client.get(&config.url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(status = %response.status(), "Self-ping ok");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Self-ping returned non-success");
            }
            Err(e) => {
                warn!(error = %e, "Self-ping failed");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
