//! In-memory backend
//!
//! A process-local tree behind the same [`RemoteStore`] contract, used by the
//! engine test suites and for local development without credentials. Supports
//! injecting put failures to exercise the orchestrator's stop-on-first-failure
//! path.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tokio::sync::Mutex;

use crate::traits::{RemoteFolder, RemoteStore, StoreError, StoreResult};

#[derive(Debug)]
struct FolderNode {
    id: String,
    name: String,
    parent: Option<String>,
}

#[derive(Debug)]
struct FileNode {
    id: String,
    name: String,
    parent: String,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    folders: Vec<FolderNode>,
    files: Vec<FileNode>,
    sheets: HashMap<String, Vec<Vec<String>>>,
    fail_puts: HashSet<String>,
    next_id: u64,
}

impl State {
    fn alloc(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

/// In-memory remote store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a folder, returning its identifier.
    pub async fn add_folder(&self, parent_id: Option<&str>, name: &str) -> String {
        let mut state = self.state.lock().await;
        let id = state.alloc("folder-");
        state.folders.push(FolderNode {
            id: id.clone(),
            name: name.to_string(),
            parent: parent_id.map(str::to_string),
        });
        id
    }

    /// Make every `put_file` for this destination name fail with a transport
    /// error.
    pub async fn fail_put_on(&self, name: &str) {
        self.state.lock().await.fail_puts.insert(name.to_string());
    }

    /// Content of the object with this name in a folder, if present.
    pub async fn file_content(&self, parent_id: &str, name: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state
            .files
            .iter()
            .find(|f| f.parent == parent_id && f.name == name)
            .map(|f| f.content.clone())
    }

    /// Names of all objects directly inside a folder, in creation order.
    pub async fn file_names_in(&self, parent_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .files
            .iter()
            .filter(|f| f.parent == parent_id)
            .map(|f| f.name.clone())
            .collect()
    }

    /// All rows of a sheet, header first.
    pub async fn sheet_rows(&self, sheet_id: &str) -> Vec<Vec<String>> {
        let state = self.state.lock().await;
        state.sheets.get(sheet_id).cloned().unwrap_or_default()
    }

    /// Names of all child folders of a parent.
    pub async fn folder_names_in(&self, parent_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .folders
            .iter()
            .filter(|f| f.parent.as_deref() == Some(parent_id))
            .map(|f| f.name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<RemoteFolder>> {
        let state = self.state.lock().await;
        Ok(state
            .folders
            .iter()
            .find(|f| f.name == name && (parent_id.is_none() || f.parent.as_deref() == parent_id))
            .map(|f| RemoteFolder {
                id: f.id.clone(),
                name: f.name.clone(),
            }))
    }

    async fn list_folders(&self, parent_id: &str) -> StoreResult<Vec<RemoteFolder>> {
        let state = self.state.lock().await;
        Ok(state
            .folders
            .iter()
            .filter(|f| f.parent.as_deref() == Some(parent_id))
            .map(|f| RemoteFolder {
                id: f.id.clone(),
                name: f.name.clone(),
            })
            .collect())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> StoreResult<String> {
        let mut state = self.state.lock().await;
        let id = state.alloc("folder-");
        state.folders.push(FolderNode {
            id: id.clone(),
            name: name.to_string(),
            parent: Some(parent_id.to_string()),
        });
        Ok(id)
    }

    async fn find_file(&self, name: &str, parent_id: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock().await;
        Ok(state
            .files
            .iter()
            .find(|f| f.parent == parent_id && f.name == name)
            .map(|f| f.id.clone()))
    }

    async fn put_file(
        &self,
        local_path: &Path,
        parent_id: &str,
        name: &str,
    ) -> StoreResult<String> {
        let content = tokio::fs::read(local_path).await?;
        let mut state = self.state.lock().await;

        if state.fail_puts.contains(name) {
            return Err(StoreError::Transport(format!("injected failure for {name}")));
        }

        if let Some(existing) = state
            .files
            .iter_mut()
            .find(|f| f.parent == parent_id && f.name == name)
        {
            existing.content = content;
            return Ok(existing.id.clone());
        }

        let id = state.alloc("file-");
        state.files.push(FileNode {
            id: id.clone(),
            name: name.to_string(),
            parent: parent_id.to_string(),
            content,
        });
        Ok(id)
    }

    async fn ensure_sheet(
        &self,
        parent_id: &str,
        name: &str,
        header: &[&str],
    ) -> StoreResult<String> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .files
            .iter()
            .find(|f| f.parent == parent_id && f.name == name)
        {
            return Ok(existing.id.clone());
        }

        let id = state.alloc("sheet-");
        state.files.push(FileNode {
            id: id.clone(),
            name: name.to_string(),
            parent: parent_id.to_string(),
            content: Vec::new(),
        });
        state
            .sheets
            .insert(id.clone(), vec![header.iter().map(|h| h.to_string()).collect()]);
        Ok(id)
    }

    async fn append_row(&self, sheet_id: &str, row: &[String]) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        match state.sheets.get_mut(sheet_id) {
            Some(rows) => {
                rows.push(row.to_vec());
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("sheet {sheet_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[tokio::test]
    async fn put_twice_overwrites_in_place() {
        let store = MemoryStore::new();
        let folder = store.add_folder(None, "Events").await;
        let dir = tempfile::tempdir().unwrap();

        let first = scratch_file(&dir, "report.pdf", b"v1");
        let id1 = store.put_file(&first, &folder, "report.pdf").await.unwrap();

        let second = scratch_file(&dir, "report.pdf", b"v2");
        let id2 = store.put_file(&second, &folder, "report.pdf").await.unwrap();

        // Exactly one object afterwards, identifier preserved, second
        // content wins.
        assert_eq!(id1, id2);
        assert_eq!(store.file_names_in(&folder).await, vec!["report.pdf"]);
        assert_eq!(
            store.file_content(&folder, "report.pdf").await,
            Some(b"v2".to_vec())
        );
    }

    #[tokio::test]
    async fn ensure_sheet_writes_header_once() {
        let store = MemoryStore::new();
        let folder = store.add_folder(None, "Statistics").await;
        let header = ["a", "b"];

        let id1 = store.ensure_sheet(&folder, "log", &header).await.unwrap();
        let id2 = store.ensure_sheet(&folder, "log", &header).await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.sheet_rows(&id1).await, vec![vec!["a", "b"]]);
    }

    #[tokio::test]
    async fn append_row_is_insert_at_end() {
        let store = MemoryStore::new();
        let folder = store.add_folder(None, "Statistics").await;
        let id = store.ensure_sheet(&folder, "log", &["h"]).await.unwrap();

        store.append_row(&id, &["one".to_string()]).await.unwrap();
        store.append_row(&id, &["two".to_string()]).await.unwrap();

        let rows = store.sheet_rows(&id).await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["one"]);
        assert_eq!(rows[2], vec!["two"]);
    }

    #[tokio::test]
    async fn injected_put_failure_reports_transport_error() {
        let store = MemoryStore::new();
        let folder = store.add_folder(None, "Events").await;
        store.fail_put_on("broken.jpg").await;

        let dir = tempfile::tempdir().unwrap();
        let path = scratch_file(&dir, "broken.jpg", b"data");
        let result = store.put_file(&path, &folder, "broken.jpg").await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}
