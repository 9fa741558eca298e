//! Fire-and-forget shipping of error envelopes to a Loki push endpoint.
//! Only used outside production; failures are logged and dropped.

use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::config::AppConfig;

const APP_NAME: &str = "formsrv";

#[derive(Clone)]
pub struct LokiShipper {
    client: reqwest::Client,
    push_url: String,
    app_env: String,
}

/// Stream labels attached to a shipped error payload.
#[derive(Clone, Debug, Default)]
pub struct ErrorLabels {
    pub trace_id: String,
    pub method: String,
    pub path: String,
}

impl LokiShipper {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            push_url: format!("{}/loki/api/v1/push", config.loki_url.trim_end_matches('/')),
            app_env: config.app_env.clone(),
        }
    }

    /// Ships `payload` on a detached task so the request path never waits on
    /// the log sink.
    pub fn ship_error(&self, labels: ErrorLabels, payload: Value) {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let body = json!({
            "streams": [{
                "stream": {
                    "app": APP_NAME,
                    "env": self.app_env,
                    "level": "error",
                    "trace_id": labels.trace_id,
                    "method": labels.method,
                    "path": labels.path,
                    "api_error": "true",
                },
                "values": [[timestamp.to_string(), payload.to_string()]],
            }]
        });

        let client = self.client.clone();
        let push_url = self.push_url.clone();
        tokio::spawn(async move {
            if let Err(err) = client.post(&push_url).json(&body).send().await {
                tracing::warn!(error = %err, "failed to ship error envelope to loki");
            }
        });
    }
}
