//! Collaborator seams: the delivery transport and the event notifier.
//!
//! The engine only ever sees these traits. The real implementations live in
//! `courier-telegram`; tests use in-memory fakes.

use async_trait::async_trait;
use courier_core::{Post, RunEvent};
use thiserror::Error;

/// Proof of delivery returned by the transport.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// Message ID assigned by the destination, when it provides one.
    pub message_id: Option<i32>,
}

/// A failed delivery attempt. Always transient from the engine's point of
/// view: the post stays un-recorded and comes back while still in window.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("delivery API rejected the post: {0}")]
    Api(String),

    #[error("network failure: {0}")]
    Network(String),
}

/// Outbound delivery of a single post.
#[async_trait]
pub trait Transport: Send + Sync {
    /// One attempt, no internal retry. Retry policy, if any, belongs to the
    /// implementation behind this seam — the engine's retry is simply the
    /// next eligible invocation.
    async fn publish(&self, post: &Post) -> std::result::Result<Receipt, TransportError>;
}

/// Consumer of run events (owner notifications, logs, …).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget. Implementations swallow their own delivery errors;
    /// the engine never changes behavior based on notification outcome.
    async fn emit(&self, event: &RunEvent);
}
