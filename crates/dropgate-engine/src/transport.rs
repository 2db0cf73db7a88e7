//! Chat transport boundary
//!
//! The transport (message delivery, button rendering, command parsing) is an
//! external collaborator. The engine consumes inbound items and uses four
//! outbound capabilities: fetch a file's bytes through its transient
//! reference, send a text message, send a message with selectable destination
//! labels, and edit a previously sent message in place.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use dropgate_core::{InboundFile, UserId};

/// Transport operation errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transient fetch token expired before the bytes were retrieved.
    #[error("transient reference expired: {0}")]
    ReferenceExpired(String),

    /// The transport refused the transfer (oversized for the transport).
    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Failure(String),
}

/// Handle to a sent message, used for in-place edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// One inbound chat event: an attached file, free text, or both.
#[derive(Debug, Clone)]
pub struct InboundItem {
    pub user_id: UserId,
    pub file: Option<InboundFile>,
    pub text: Option<String>,
}

/// Outbound chat capabilities consumed by the engine.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Materialize the bytes behind a transient reference into `dest`.
    /// The reference is usable exactly once before it expires.
    async fn fetch_file(&self, fetch_token: &str, dest: &Path) -> Result<(), TransportError>;

    async fn send_text(&self, user_id: UserId, text: &str) -> Result<MessageRef, TransportError>;

    /// Send a message with a set of selectable destination labels.
    async fn send_choices(
        &self,
        user_id: UserId,
        text: &str,
        choices: &[String],
    ) -> Result<MessageRef, TransportError>;

    /// Edit a previously sent message in place.
    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), TransportError>;
}
