//! Session labels posted to the device-cloud API.
//!
//! Labels mark the time span of a flow step on the session's performance
//! timeline. They are a side channel: a failed post is logged and dropped.

use crate::config::Config;
use chrono::Utc;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{info, warn};

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Something that can record a labelled time span for a session.
pub trait LabelSink {
    fn post_label(&self, session_id: &str, name: &str, start: f64, end: f64);
}

#[derive(Debug, Serialize)]
struct LabelRequest<'a> {
    label_type: &'a str,
    name: &'a str,
    ts_start: f64,
    ts_end: f64,
}

/// Posts labels over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct LabelReporter {
    http: Client,
    api_base: String,
    token: String,
}

impl LabelReporter {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base.clone(), config.api_token.clone())
    }

    fn label_url(&self, session_id: &str) -> String {
        format!("{}/sessions/{}/label/add", self.api_base, session_id)
    }
}

impl LabelSink for LabelReporter {
    fn post_label(&self, session_id: &str, name: &str, start: f64, end: f64) {
        let body = LabelRequest {
            label_type: "user",
            name,
            ts_start: start,
            ts_end: end,
        };

        let result = self
            .http
            .post(self.label_url(session_id))
            .bearer_auth(&self.token)
            .json(&body)
            .send();

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Successfully added label: '{}'", name);
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let text = response.text().unwrap_or_default();
                warn!("HTTP error while sending label: {} - {}", status, text);
            }
            Err(e) => {
                warn!("Request error while sending label: {}", e);
            }
        }
    }
}
