//! Remote store abstraction trait
//!
//! This module defines the gateway contract all storage backends implement.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Remote store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The authorization token is stale. Handled by the gateway-level
    /// refresh-and-retry interceptor; callers see it only when a retry after
    /// refresh failed again.
    #[error("authorization expired: {0}")]
    AuthExpired(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A folder in the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub id: String,
    pub name: String,
}

/// Remote hierarchical object store contract.
///
/// All operations may fail with an authorization-expired condition, a
/// not-found condition, or a generic transport error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Find a folder by exact name, optionally under a parent. When the
    /// parent is absent the whole store is searched; the first match wins.
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<RemoteFolder>>;

    /// List immediate child folders of a parent.
    async fn list_folders(&self, parent_id: &str) -> StoreResult<Vec<RemoteFolder>>;

    /// Create a folder and return its identifier.
    async fn create_folder(&self, parent_id: &str, name: &str) -> StoreResult<String>;

    /// Find a non-folder object by exact name directly inside a parent.
    async fn find_file(&self, name: &str, parent_id: &str) -> StoreResult<Option<String>>;

    /// Idempotent upload: overwrite the existing object with this name in
    /// place, or create a new one. Returns the object identifier.
    async fn put_file(
        &self,
        local_path: &Path,
        parent_id: &str,
        name: &str,
    ) -> StoreResult<String>;

    /// Resolve the named tabular sheet inside a parent, creating it with the
    /// given header row if absent. Returns the sheet identifier.
    async fn ensure_sheet(
        &self,
        parent_id: &str,
        name: &str,
        header: &[&str],
    ) -> StoreResult<String>;

    /// Append one row at the end of a sheet. Must not overwrite or reorder
    /// prior rows.
    async fn append_row(&self, sheet_id: &str, row: &[String]) -> StoreResult<()>;
}
