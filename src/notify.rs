//! Outbound notifications.
//!
//! Every new feed item becomes a [`NotificationEvent`] that is POSTed as JSON
//! to `{destination}/event`.  Delivery is best effort: there are no retries,
//! and a failure is only reported back to the caller for logging.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::{RawItem, USER_AGENT};

/// The payload sent for one new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub title: String,
    pub link: String,
}

impl From<&RawItem> for NotificationEvent {
    fn from(item: &RawItem) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(u16),
}

/// Delivers events somewhere.
pub trait Notifier: Send + Sync {
    fn deliver(&self, event: &NotificationEvent, destination: &str) -> Result<(), NotifyError>;
}

/// Posts events to an HTTP endpoint.
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

/// The URL events for `destination` are posted to.
pub fn event_endpoint(destination: &str) -> String {
    format!("{}/event", destination.trim_end_matches('/'))
}

impl Notifier for HttpNotifier {
    fn deliver(&self, event: &NotificationEvent, destination: &str) -> Result<(), NotifyError> {
        // `.json()` also sets `Content-Type: application/json`.
        let response = self
            .client
            .post(event_endpoint(destination))
            .json(event)
            .send()?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}
