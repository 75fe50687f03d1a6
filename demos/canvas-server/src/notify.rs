//! Admin webhook: posts connect/disconnect events to a messaging API.

use boxgrid::AdminNotifier;

/// Posts a small JSON event to a configured webhook URL.
///
/// With no URL configured this is a no-op. Failures are logged and
/// swallowed — admin notifications are best-effort and must never
/// affect a client connection.
pub struct AdminWebhook {
    client: reqwest::Client,
    url: Option<String>,
}

impl AdminWebhook {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    async fn post(&self, event: &str, count: i64) {
        let Some(url) = &self.url else {
            return;
        };
        let payload = serde_json::json!({
            "event": event,
            "players": count,
        });
        if let Err(e) = self.client.post(url).json(&payload).send().await {
            tracing::warn!(error = %e, event, "admin webhook failed");
        }
    }
}

impl AdminNotifier for AdminWebhook {
    async fn player_joined(&self, count: i64) {
        self.post("connected", count).await;
    }

    async fn player_left(&self, count: i64) {
        self.post("disconnected", count).await;
    }
}
