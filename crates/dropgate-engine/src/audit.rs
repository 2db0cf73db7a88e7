//! Audit recording
//!
//! One row per completed batch, appended to a tabular log inside a fixed
//! statistics folder under the root. Recording is best-effort: a failure is
//! logged and must never invalidate an already-reported successful upload.

use std::sync::Arc;

use dropgate_core::{AuditEntry, EngineConfig, EngineError, EngineResult};
use dropgate_storage::RemoteStore;

use crate::clock::audit_timestamp;

/// Fixed five-column header of the audit sheet.
pub const AUDIT_HEADER: [&str; 5] = [
    "Дата",
    "ID пользователя",
    "Папка загрузки",
    "Имена файлов",
    "Количество файлов",
];

/// Appends audit rows for completed batches.
pub struct AuditRecorder {
    store: Arc<dyn RemoteStore>,
    config: Arc<EngineConfig>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn RemoteStore>, config: Arc<EngineConfig>) -> Self {
        Self { store, config }
    }

    /// Append one row for a completed batch. Creates the statistics folder
    /// and the sheet (with its header) on first use.
    pub async fn record(&self, root_id: &str, entry: &AuditEntry) -> EngineResult<()> {
        let folder_id = match self
            .store
            .find_folder(&self.config.statistics_folder, Some(root_id))
            .await
            .map_err(audit_failure)?
        {
            Some(folder) => folder.id,
            None => self
                .store
                .create_folder(root_id, &self.config.statistics_folder)
                .await
                .map_err(audit_failure)?,
        };

        let sheet_id = self
            .store
            .ensure_sheet(&folder_id, &self.config.statistics_file, &AUDIT_HEADER)
            .await
            .map_err(audit_failure)?;

        let row = [
            audit_timestamp(entry.recorded_at, self.config.timezone_offset_hours),
            entry.user_id.to_string(),
            entry.destination_path.clone(),
            entry.file_names.join(", "),
            entry.file_count().to_string(),
        ];
        self.store
            .append_row(&sheet_id, &row)
            .await
            .map_err(audit_failure)?;

        tracing::info!(
            user_id = entry.user_id,
            destination = %entry.destination_path,
            files = entry.file_count(),
            "Audit row appended"
        );
        Ok(())
    }
}

fn audit_failure(err: dropgate_storage::StoreError) -> EngineError {
    EngineError::Audit(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use dropgate_storage::MemoryStore;

    fn entry() -> AuditEntry {
        AuditEntry {
            recorded_at: Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap(),
            user_id: 42,
            destination_path: "Events/07-03-2024".into(),
            file_names: vec!["a.jpg".into(), "comment_1.txt".into()],
        }
    }

    #[tokio::test]
    async fn first_record_creates_folder_sheet_and_header() {
        let store = Arc::new(MemoryStore::new());
        let root = store.add_folder(None, "Upload").await;
        let config = Arc::new(EngineConfig::default());
        let recorder = AuditRecorder::new(store.clone(), config.clone());

        recorder.record(&root, &entry()).await.unwrap();

        let stats = store
            .find_folder(&config.statistics_folder, Some(&root))
            .await
            .unwrap()
            .expect("statistics folder created");
        let sheet_id = store
            .find_file(&config.statistics_file, &stats.id)
            .await
            .unwrap()
            .expect("sheet created");

        let rows = store.sheet_rows(&sheet_id).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], AUDIT_HEADER.map(String::from).to_vec());
        assert_eq!(
            rows[1],
            vec![
                "2024-03-07 15:00:00",
                "42",
                "Events/07-03-2024",
                "a.jpg, comment_1.txt",
                "2",
            ]
        );
    }

    #[tokio::test]
    async fn repeat_records_append_without_reordering() {
        let store = Arc::new(MemoryStore::new());
        let root = store.add_folder(None, "Upload").await;
        let config = Arc::new(EngineConfig::default());
        let recorder = AuditRecorder::new(store.clone(), config.clone());

        recorder.record(&root, &entry()).await.unwrap();
        let mut second = entry();
        second.user_id = 43;
        recorder.record(&root, &second).await.unwrap();

        let stats = store
            .find_folder(&config.statistics_folder, Some(&root))
            .await
            .unwrap()
            .unwrap();
        let sheet_id = store
            .find_file(&config.statistics_file, &stats.id)
            .await
            .unwrap()
            .unwrap();
        let rows = store.sheet_rows(&sheet_id).await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], "42");
        assert_eq!(rows[2][1], "43");
    }
}
