//! Intake engine
//!
//! Entry point for the surrounding bot glue: one call per inbound chat event,
//! one call per destination selection. Classification/accumulation and upload
//! orchestration for the same user hold the same session lock, so they can
//! never interleave; events from distinct users proceed concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use dropgate_core::{
    AuditEntry, Classification, Classifier, EngineConfig, EngineError, EngineResult, SessionStore,
    TypePolicy, UnsupportedFile, UploadOutcome, UserId,
};
use dropgate_storage::RemoteStore;

use crate::audit::AuditRecorder;
use crate::orchestrator::{ProgressSink, UploadOrchestrator};
use crate::progress::ProgressRenderer;
use crate::resolver::{DestinationResolver, ResolvedDestination};
use crate::transport::{ChatTransport, InboundItem, MessageRef};

/// Batch intake and upload engine for one chat deployment.
pub struct IntakeEngine {
    config: Arc<EngineConfig>,
    classifier: Classifier,
    sessions: SessionStore,
    transport: Arc<dyn ChatTransport>,
    resolver: DestinationResolver,
    orchestrator: UploadOrchestrator,
    audit: AuditRecorder,
}

impl IntakeEngine {
    pub fn new(
        config: EngineConfig,
        policy: TypePolicy,
        store: Arc<dyn RemoteStore>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let config = Arc::new(config);
        let classifier = Classifier::new(policy, config.video_transport_limit_mb);
        let resolver = DestinationResolver::new(store.clone(), config.clone());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            transport.clone(),
            ProgressRenderer::new(config.progress_bar_width),
        );
        let audit = AuditRecorder::new(store, config.clone());
        Self {
            config,
            classifier,
            sessions: SessionStore::new(),
            transport,
            resolver,
            orchestrator,
            audit,
        }
    }

    /// Session store accessor, used by the glue for diagnostics and by tests.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Greeting listing the accepted categories and their ceilings.
    pub fn welcome_text(&self) -> String {
        format!(
            "Hi! I upload your files to the shared drive.\n\
             Supported file types:\n\n{}\n\n\
             Send me files and I will help you put them in the right folder.",
            self.classifier.policy().describe()
        )
    }

    /// Handle one inbound chat event: classify and accumulate, then prompt
    /// for a destination when the batch gained an uploadable file.
    pub async fn handle_item(&self, item: InboundItem) -> EngineResult<()> {
        let user_id = item.user_id;
        if !self.config.user_allowed(user_id) {
            tracing::warn!(user_id, "Upload attempt from a user outside the allow-list");
            self.send(user_id, "You are not allowed to upload files.").await;
            return Ok(());
        }

        let handle = self.sessions.session(user_id);
        let mut session = handle.lock().await;
        let now = Utc::now();
        let mut accepted_file = false;

        if let Some(file) = &item.file {
            match self.classifier.evaluate(file, session.files().len()) {
                Classification::Accepted(pending) => {
                    let name = pending.file_name.clone();
                    if session.record_file(pending) {
                        tracing::info!(user_id, file_name = %name, "File accepted");
                        self.send(
                            user_id,
                            &format!("Saved {name}. Now pick a destination folder."),
                        )
                        .await;
                    }
                    accepted_file = true;
                }
                Classification::Rejected(rejected) => {
                    tracing::debug!(user_id, file_name = %rejected.file_name, reason = %rejected.reason, "File rejected");
                    self.send(
                        user_id,
                        &format!("{}: {}", rejected.file_name, rejected.reason),
                    )
                    .await;
                    session.record_unsupported(rejected);
                    if !session.has_uploadable() {
                        // Nothing uploadable accumulated, only rejects: the
                        // user has been told why, start the session fresh.
                        session.reset();
                    }
                }
            }
        }

        if let Some(text) = &item.text {
            session.record_comment(text.clone(), now);
            if item.file.is_none() {
                self.send(
                    user_id,
                    "Note saved. Send a file or pick a destination folder.",
                )
                .await;
            }
        }

        if accepted_file {
            let throttle = Duration::seconds(self.config.prompt_throttle_secs as i64);
            if session.should_prompt(now, throttle) {
                self.prompt_destinations(user_id).await?;
            }
        }
        Ok(())
    }

    /// Handle the user's destination selection: resolve the dated folder,
    /// run the batch, record the audit row, report the result in place.
    pub async fn handle_destination_selected(
        &self,
        user_id: UserId,
        selection: &str,
        status: MessageRef,
    ) -> EngineResult<()> {
        let handle = self.sessions.session(user_id);
        let mut session = handle.lock().await;

        if !session.has_uploadable() {
            self.edit(&status, "There is nothing to upload yet. Send files first.")
                .await;
            return Ok(());
        }

        self.edit(&status, "Starting upload...").await;
        let now = Utc::now();

        let destination = match self.resolver.resolve(selection, now).await {
            Ok(destination) => destination,
            Err(err) => {
                // The session is preserved so the same batch can be retried
                // against another destination.
                self.edit(&status, &user_message(&err)).await;
                return Err(err);
            }
        };

        let sink = EditSink {
            transport: self.transport.as_ref(),
            message: status.clone(),
        };
        let outcome = self
            .orchestrator
            .run(&mut session, &destination.dated_folder_id, &sink)
            .await;

        if let Some(failed) = outcome.failed_at.clone() {
            self.edit(
                &status,
                &format!("Failed to upload {failed}. Files uploaded before it were kept."),
            )
            .await;
            return Err(EngineError::transfer(failed, "batch aborted"));
        }

        let entry = AuditEntry {
            recorded_at: now,
            user_id,
            destination_path: destination.path(),
            file_names: outcome.uploaded.clone(),
        };
        if let Err(err) = self.audit.record(&destination.root_id, &entry).await {
            // Best-effort: the upload already succeeded from the user's
            // point of view.
            tracing::warn!(user_id, error = %err, "Audit recording failed");
        }

        let summary = success_summary(&destination, &outcome, session.unsupported());
        session.reset();
        self.edit(&status, &summary).await;
        Ok(())
    }

    async fn prompt_destinations(&self, user_id: UserId) -> EngineResult<()> {
        match self.resolver.list_destinations().await {
            Ok(destinations) if destinations.is_empty() => {
                self.send(user_id, "No destination folders are available.").await;
                Ok(())
            }
            Ok(destinations) => {
                let names: Vec<String> =
                    destinations.into_iter().map(|folder| folder.name).collect();
                if let Err(err) = self
                    .transport
                    .send_choices(user_id, "Choose a destination folder:", &names)
                    .await
                {
                    tracing::warn!(user_id, error = %err, "Failed to send destination prompt");
                }
                Ok(())
            }
            Err(err) => {
                self.send(user_id, &user_message(&err)).await;
                Err(err)
            }
        }
    }

    async fn send(&self, user_id: UserId, text: &str) {
        if let Err(err) = self.transport.send_text(user_id, text).await {
            tracing::warn!(user_id, error = %err, "Failed to send message");
        }
    }

    async fn edit(&self, message: &MessageRef, text: &str) {
        if let Err(err) = self.transport.edit_text(message, text).await {
            tracing::warn!(error = %err, "Failed to edit status message");
        }
    }
}

/// Progress sink that edits the batch status message in place.
struct EditSink<'a> {
    transport: &'a dyn ChatTransport,
    message: MessageRef,
}

#[async_trait]
impl ProgressSink for EditSink<'_> {
    async fn update(&self, text: &str) {
        if let Err(err) = self.transport.edit_text(&self.message, text).await {
            tracing::debug!(error = %err, "Progress edit failed");
        }
    }
}

/// User-facing failure text: names the item and the category of problem,
/// never raw internal error text.
fn user_message(err: &EngineError) -> String {
    match err {
        EngineError::Configuration(reason) => format!("Error: {reason}."),
        EngineError::DestinationGone(name) => {
            format!("The destination \"{name}\" no longer exists. Pick another folder.")
        }
        EngineError::Transfer { item, .. } => format!("Failed to transfer {item}."),
        EngineError::Validation(reason) => reason.clone(),
        EngineError::Audit(_) => String::new(),
    }
}

fn success_summary(
    destination: &ResolvedDestination,
    outcome: &UploadOutcome,
    unsupported: &[UnsupportedFile],
) -> String {
    let mut summary = format!(
        "All items uploaded!\nFolder: {}\nUploaded {} items:\n",
        destination.path(),
        outcome.uploaded.len()
    );
    for name in &outcome.uploaded {
        summary.push_str(&format!("• {name}\n"));
    }
    if !unsupported.is_empty() {
        summary.push_str("\nNot accepted:\n");
        for rejected in unsupported {
            summary.push_str(&format!("• {} ({})\n", rejected.file_name, rejected.reason));
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_name_item_and_problem() {
        let gone = EngineError::DestinationGone("Events".into());
        assert_eq!(
            user_message(&gone),
            "The destination \"Events\" no longer exists. Pick another folder."
        );

        let transfer = EngineError::transfer("report.pdf", "socket closed");
        assert_eq!(user_message(&transfer), "Failed to transfer report.pdf.");
    }
}
