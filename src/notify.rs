// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! Leaderboard notifications
//!
//! A single best-effort webhook POST when a submission clears the
//! leaderboard threshold. Delivery failures are reported to the caller,
//! which logs and swallows them; they never abort an evaluation run.

use std::time::Duration;

/// Timeout for the webhook POST, the same bound as the URL probe.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification delivery seam. Tests substitute recording fakes; the
/// pipeline uses [`WebhookNotifier`].
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `endpoint` once. No retries.
    fn notify(&self, endpoint: &str, message: &str) -> Result<(), String>;
}

/// Posts a JSON body `{"content": "<message>"}` to the webhook endpoint.
#[derive(Debug, Default)]
pub struct WebhookNotifier;

impl Notifier for WebhookNotifier {
    fn notify(&self, endpoint: &str, message: &str) -> Result<(), String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|err| err.to_string())?;
        let response = client
            .post(endpoint)
            .json(&serde_json::json!({ "content": message }))
            .send()
            .map_err(|err| err.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("webhook responded with status {}", response.status()))
        }
    }
}
