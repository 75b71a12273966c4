//! Startup connectivity check against the model server

use std::time::Duration;

use tracing::{debug, warn};

use crate::metrics::PROBE_RESULTS;

/// Check whether the model server at `base_url` is alive.
///
/// Issues `GET {base_url}/api/tags` and returns true only when a 2xx status
/// arrives within `timeout`. Refused connections, timeouts, bad URLs and
/// error statuses all yield false; nothing is raised to the caller.
pub async fn probe(base_url: &str, timeout: Duration) -> bool {
    let endpoint = format!("{}/api/tags", base_url.trim_end_matches('/'));

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build probe client");
            PROBE_RESULTS.with_label_values(&["error"]).inc();
            return false;
        }
    };

    let reachable = match client.get(&endpoint).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            warn!(endpoint = %endpoint, status = %response.status(), "Model server answered with an error");
            false
        }
        Err(e) => {
            debug!(endpoint = %endpoint, error = %e, "Model server unreachable");
            false
        }
    };

    let label = if reachable { "reachable" } else { "unreachable" };
    PROBE_RESULTS.with_label_values(&[label]).inc();
    reachable
}
