//! Upload orchestration
//!
//! Drives one batch through materialize → idempotent upload → progress →
//! result accumulation. The pass is a sequential pipeline, never a parallel
//! fan-out: items upload strictly in arrival order, progress is reported item
//! by item, and the first failure stops the batch. The caller holds the
//! session lock for the whole run, so accumulation for the same user cannot
//! interleave.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use dropgate_core::{Comment, PendingFile, Session, UploadOutcome};
use dropgate_storage::RemoteStore;

use crate::progress::ProgressRenderer;
use crate::transport::ChatTransport;

/// Receives the in-place status line updates for one batch.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, text: &str);
}

enum BatchItem<'a> {
    File(&'a PendingFile),
    Comment(&'a Comment),
}

impl BatchItem<'_> {
    fn name(&self) -> &str {
        match self {
            BatchItem::File(file) => &file.file_name,
            BatchItem::Comment(comment) => &comment.file_name,
        }
    }
}

/// Sequential batch upload pipeline.
pub struct UploadOrchestrator {
    store: Arc<dyn RemoteStore>,
    transport: Arc<dyn ChatTransport>,
    renderer: ProgressRenderer,
}

impl UploadOrchestrator {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        transport: Arc<dyn ChatTransport>,
        renderer: ProgressRenderer,
    ) -> Self {
        Self {
            store,
            transport,
            renderer,
        }
    }

    /// Run the batch currently held by `session` against a resolved dated
    /// folder. Items upload in arrival order, files before comments. The
    /// first failure stops the pass; items uploaded before it stay uploaded
    /// and are removed from the session, the failed and remaining records
    /// are left in place.
    pub async fn run(
        &self,
        session: &mut Session,
        dated_folder_id: &str,
        progress: &dyn ProgressSink,
    ) -> UploadOutcome {
        let files: Vec<PendingFile> = session.files().to_vec();
        let comments: Vec<Comment> = session.comments().to_vec();
        let total = files.len() + comments.len();
        let batch_id = Uuid::new_v4();

        let mut outcome = UploadOutcome::default();
        if total == 0 {
            return outcome;
        }

        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                tracing::error!(batch_id = %batch_id, error = %err, "Failed to create scratch directory");
                outcome.failed_at = files
                    .first()
                    .map(|f| f.file_name.clone())
                    .or_else(|| comments.first().map(|c| c.file_name.clone()));
                return outcome;
            }
        };

        tracing::info!(batch_id = %batch_id, total = total, "Starting batch upload");

        let items = files
            .iter()
            .map(BatchItem::File)
            .chain(comments.iter().map(BatchItem::Comment));

        let mut files_done = 0usize;
        let mut comments_done = 0usize;

        for (index, item) in items.enumerate() {
            let index = index + 1;
            let name = item.name().to_string();
            progress
                .update(&self.renderer.started(&name, index, total))
                .await;

            let path = scratch.path().join(scratch_name(&name));
            let materialized = match &item {
                BatchItem::File(file) => self
                    .transport
                    .fetch_file(&file.fetch_token, &path)
                    .await
                    .map_err(|err| err.to_string()),
                BatchItem::Comment(comment) => tokio::fs::write(&path, &comment.content)
                    .await
                    .map_err(|err| err.to_string()),
            };

            if let Err(reason) = materialized {
                tracing::error!(batch_id = %batch_id, item = %name, reason = %reason, "Failed to materialize item");
                outcome.failed_at = Some(name);
                break;
            }

            if let Err(err) = self.store.put_file(&path, dated_folder_id, &name).await {
                tracing::error!(batch_id = %batch_id, item = %name, error = %err, "Failed to upload item");
                outcome.failed_at = Some(name);
                break;
            }

            if let Err(err) = tokio::fs::remove_file(&path).await {
                tracing::debug!(item = %name, error = %err, "Scratch file not removed");
            }

            match item {
                BatchItem::File(_) => files_done += 1,
                BatchItem::Comment(_) => comments_done += 1,
            }
            outcome.uploaded.push(name.clone());
            progress
                .update(&self.renderer.completed(&name, index, total))
                .await;
        }

        // Uploaded items are consumed; the failed and not-yet-attempted
        // records stay for a retry against another destination.
        session.consume_uploaded(files_done, comments_done);

        tracing::info!(
            batch_id = %batch_id,
            uploaded = outcome.uploaded.len(),
            failed_at = outcome.failed_at.as_deref().unwrap_or("-"),
            "Batch upload finished"
        );
        outcome
    }
}

/// Scratch file name: keep the destination name, minus path separators.
fn scratch_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_names_cannot_escape_the_directory() {
        assert_eq!(scratch_name("notes/../../etc"), "notes_.._.._etc");
        assert_eq!(scratch_name("plain.jpg"), "plain.jpg");
    }
}
