//! Domain models
//!
//! Batch items and their lifecycle types. A `PendingFile` is created when an
//! inbound file passes classification, owned by the session that created it,
//! and consumed when uploaded or when the batch resets. An `UnsupportedFile`
//! is informational only and never uploaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::CategoryKind;

/// An inbound file descriptor as delivered by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundFile {
    /// Short-lived token allowing one retrieval of the file's bytes.
    pub fetch_token: String,
    /// Sender-provided file name, absent for bare photos.
    pub file_name: Option<String>,
    /// Declared content type, absent when the transport does not know it.
    pub content_type: Option<String>,
    pub size_bytes: u64,
    /// Delivered through the transport's native video slot, which imposes its
    /// own transfer ceiling below the storage policy's.
    pub via_video_slot: bool,
}

impl InboundFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// A classified file waiting in a session for a destination to be chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFile {
    pub fetch_token: String,
    /// Destination file name, derived from the sender-provided name or
    /// generated (`image_3.jpg`).
    pub file_name: String,
    pub category: CategoryKind,
    pub size_mb: f64,
}

/// A rejected file kept for the result report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedFile {
    pub file_name: String,
    pub reason: String,
}

/// A text note submitted alongside or instead of files. Materialized to a
/// scratch text file only at upload time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Generated name, `comment_<n>.txt`.
    pub file_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Result of one batch run. `failed_at` names the first item whose transfer
/// failed; items uploaded before it stay uploaded (no rollback).
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    pub uploaded: Vec<String>,
    pub failed_at: Option<String>,
}

impl UploadOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}

/// One append-only audit record per completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub recorded_at: DateTime<Utc>,
    pub user_id: i64,
    /// `<destination>/<dated-subfolder>`
    pub destination_path: String,
    pub file_names: Vec<String>,
}

impl AuditEntry {
    pub fn file_count(&self) -> usize {
        self.file_names.len()
    }
}
