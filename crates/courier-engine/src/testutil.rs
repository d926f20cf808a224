//! In-memory fakes and fixture helpers shared by the engine tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use courier_core::{Post, RunEvent};

use crate::traits::{Notifier, Receipt, Transport, TransportError};

pub(crate) fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

pub(crate) fn post_at(slot: &str, text: &str) -> Post {
    Post {
        scheduled_at: Some(ts(slot)),
        text: text.to_string(),
        photo_url: None,
        video_url: None,
        buttons: Vec::new(),
    }
}

/// Transport fake: records publish order, optionally failing marked posts.
pub(crate) struct RecordingTransport {
    fail_marker: Option<String>,
    sent: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            fail_marker: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Posts whose text contains `marker` fail with an API error.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, post: &Post) -> std::result::Result<Receipt, TransportError> {
        if let Some(marker) = &self.fail_marker {
            if post.text.contains(marker) {
                return Err(TransportError::Api("refused by fake".into()));
            }
        }
        self.sent.lock().unwrap().push(post.text.clone());
        Ok(Receipt {
            message_id: Some(1),
        })
    }
}

/// Notifier fake: collects every emitted event.
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn emit(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
