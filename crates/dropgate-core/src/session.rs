//! Session store module
//!
//! Per-user mutable batch state behind an explicit keyed store. Each session
//! is guarded by its own async mutex: intake (classification/accumulation)
//! and upload orchestration for the same user must never interleave, so both
//! paths hold the session lock for their entire pass. Cross-user operations
//! share nothing beyond the short-lived map lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::models::{Comment, PendingFile, UnsupportedFile};

/// Chat identity of the sending user.
pub type UserId = i64;

/// One user's accumulated batch state.
#[derive(Debug, Default)]
pub struct Session {
    files: Vec<PendingFile>,
    unsupported: Vec<UnsupportedFile>,
    comments: Vec<Comment>,
    last_prompt_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Record an accepted file. Deduplicates by destination file name:
    /// first write wins, a duplicate is silently ignored.
    pub fn record_file(&mut self, file: PendingFile) -> bool {
        if self.files.iter().any(|f| f.file_name == file.file_name) {
            tracing::debug!(file_name = %file.file_name, "Duplicate destination name ignored");
            return false;
        }
        self.files.push(file);
        true
    }

    /// Record a rejected file for the result report.
    pub fn record_unsupported(&mut self, file: UnsupportedFile) {
        self.unsupported.push(file);
    }

    /// Record a text note, returning its generated file name. Comments are
    /// never deduplicated; names are generated sequentially from the current
    /// comment count.
    pub fn record_comment(&mut self, content: String, now: DateTime<Utc>) -> String {
        let file_name = format!("comment_{}.txt", self.comments.len() + 1);
        self.comments.push(Comment {
            file_name: file_name.clone(),
            content,
            created_at: now,
        });
        file_name
    }

    /// Whether a destination prompt may be shown now. True if no prompt was
    /// shown yet or at least `throttle` elapsed; updates the stored timestamp
    /// on true so rapid multi-file sends produce a single prompt.
    pub fn should_prompt(&mut self, now: DateTime<Utc>, throttle: Duration) -> bool {
        let due = match self.last_prompt_at {
            None => true,
            Some(last) => now.signed_duration_since(last) >= throttle,
        };
        if due {
            self.last_prompt_at = Some(now);
        }
        due
    }

    /// Clear all three sequences. The prompt timestamp is cleared too so the
    /// next batch prompts immediately.
    pub fn reset(&mut self) {
        self.files.clear();
        self.unsupported.clear();
        self.comments.clear();
        self.last_prompt_at = None;
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn unsupported(&self) -> &[UnsupportedFile] {
        &self.unsupported
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of uploadable items (files plus comments).
    pub fn batch_len(&self) -> usize {
        self.files.len() + self.comments.len()
    }

    pub fn has_uploadable(&self) -> bool {
        self.batch_len() > 0
    }

    /// Remove the first `files` accepted files and first `comments` comments,
    /// in arrival order. Used by the orchestrator to consume uploaded items
    /// while leaving the failed and not-yet-attempted records in place.
    pub fn consume_uploaded(&mut self, files: usize, comments: usize) {
        self.files.drain(..files.min(self.files.len()));
        self.comments.drain(..comments.min(self.comments.len()));
    }
}

/// Keyed store of sessions, created lazily on first use.
///
/// The outer map lock is synchronous and held only to clone the per-session
/// handle; all awaiting happens on the per-session mutex.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: StdMutex<HashMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session handle for a user.
    pub fn session(&self, user_id: UserId) -> Arc<Mutex<Session>> {
        let mut map = self.inner.lock().expect("session map lock poisoned");
        map.entry(user_id).or_default().clone()
    }
}
