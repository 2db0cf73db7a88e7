//! Google Drive backend
//!
//! Implements [`RemoteStore`] over the Drive v3 and Sheets v4 REST surfaces:
//! `files.list` with a `q` filter for lookups, `files.create` for folders and
//! object metadata, a media `files.update` for content (both the overwrite
//! path and the create path upload content this way, so an interrupted create
//! never leaves a half-written object with a different identifier), and
//! `values.update`/`values.append` for the tabular log. Every call runs
//! through the credential interceptor in [`crate::auth`].

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{with_auth_retry, CredentialCache, TokenSource};
use crate::traits::{RemoteFolder, RemoteStore, StoreError, StoreResult};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive-backed remote store.
pub struct DriveStore {
    http: reqwest::Client,
    credentials: CredentialCache,
    files_url: String,
    upload_url: String,
    sheets_url: String,
}

impl DriveStore {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_endpoints(source, FILES_URL, UPLOAD_URL, SHEETS_URL)
    }

    /// Construct against alternative endpoints (API-compatible proxies,
    /// test servers).
    pub fn with_endpoints(
        source: Arc<dyn TokenSource>,
        files_url: &str,
        upload_url: &str,
        sheets_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials: CredentialCache::new(source),
            files_url: files_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.trim_end_matches('/').to_string(),
            sheets_url: sheets_url.trim_end_matches('/').to_string(),
        }
    }

    async fn list(&self, token: &str, query: &str) -> StoreResult<Vec<DriveFile>> {
        let response = self
            .http
            .get(&self.files_url)
            .bearer_auth(token)
            .query(&[("q", query), ("fields", "files(id, name)")])
            .send()
            .await
            .map_err(transport)?;
        let response = error_for_status(response, "files.list").await?;
        let list: FileList = response.json().await.map_err(transport)?;
        Ok(list.files)
    }

    async fn create_metadata(
        &self,
        token: &str,
        parent_id: &str,
        name: &str,
        mime_type: Option<&str>,
    ) -> StoreResult<String> {
        let mut metadata = json!({
            "name": name,
            "parents": [parent_id],
        });
        if let Some(mime_type) = mime_type {
            metadata["mimeType"] = json!(mime_type);
        }
        let response = self
            .http
            .post(&self.files_url)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()
            .await
            .map_err(transport)?;
        let response = error_for_status(response, "files.create").await?;
        let created: CreatedFile = response.json().await.map_err(transport)?;
        Ok(created.id)
    }

    async fn upload_content(&self, token: &str, file_id: &str, data: Bytes) -> StoreResult<()> {
        let url = format!("{}/{}", self.upload_url, file_id);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .body(data)
            .send()
            .await
            .map_err(transport)?;
        error_for_status(response, "files.update").await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for DriveStore {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<RemoteFolder>> {
        let mut query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query_value(name),
            FOLDER_MIME_TYPE
        );
        if let Some(parent_id) = parent_id {
            query.push_str(&format!(" and '{}' in parents", escape_query_value(parent_id)));
        }

        let files = with_auth_retry(&self.credentials, |token| {
            let query = query.clone();
            async move { self.list(&token, &query).await }
        })
        .await?;

        Ok(files
            .into_iter()
            .next()
            .map(|f| RemoteFolder { id: f.id, name: f.name }))
    }

    async fn list_folders(&self, parent_id: &str) -> StoreResult<Vec<RemoteFolder>> {
        let query = format!(
            "'{}' in parents and mimeType='{}' and trashed=false",
            escape_query_value(parent_id),
            FOLDER_MIME_TYPE
        );

        let files = with_auth_retry(&self.credentials, |token| {
            let query = query.clone();
            async move { self.list(&token, &query).await }
        })
        .await?;

        Ok(files
            .into_iter()
            .map(|f| RemoteFolder { id: f.id, name: f.name })
            .collect())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> StoreResult<String> {
        with_auth_retry(&self.credentials, |token| async move {
            self.create_metadata(&token, parent_id, name, Some(FOLDER_MIME_TYPE))
                .await
        })
        .await
    }

    async fn find_file(&self, name: &str, parent_id: &str) -> StoreResult<Option<String>> {
        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            escape_query_value(name),
            escape_query_value(parent_id)
        );

        let files = with_auth_retry(&self.credentials, |token| {
            let query = query.clone();
            async move { self.list(&token, &query).await }
        })
        .await?;

        Ok(files.into_iter().next().map(|f| f.id))
    }

    async fn put_file(
        &self,
        local_path: &Path,
        parent_id: &str,
        name: &str,
    ) -> StoreResult<String> {
        let data = Bytes::from(tokio::fs::read(local_path).await?);

        let file_id = match self.find_file(name, parent_id).await? {
            Some(existing) => {
                tracing::debug!(name = %name, file_id = %existing, "Overwriting existing object");
                existing
            }
            None => {
                with_auth_retry(&self.credentials, |token| async move {
                    self.create_metadata(&token, parent_id, name, None).await
                })
                .await?
            }
        };

        with_auth_retry(&self.credentials, |token| {
            let data = data.clone();
            let file_id = file_id.clone();
            async move { self.upload_content(&token, &file_id, data).await }
        })
        .await?;

        Ok(file_id)
    }

    async fn ensure_sheet(
        &self,
        parent_id: &str,
        name: &str,
        header: &[&str],
    ) -> StoreResult<String> {
        if let Some(existing) = self.find_file(name, parent_id).await? {
            return Ok(existing);
        }

        let sheet_id = with_auth_retry(&self.credentials, |token| async move {
            self.create_metadata(&token, parent_id, name, Some(SPREADSHEET_MIME_TYPE))
                .await
        })
        .await?;

        let range = header_range(header.len());
        let url = format!("{}/{}/values/{}", self.sheets_url, sheet_id, range);
        let body = json!({ "values": [header] });
        with_auth_retry(&self.credentials, |token| {
            let url = url.clone();
            let body = body.clone();
            async move {
                let response = self
                    .http
                    .put(&url)
                    .bearer_auth(&token)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body)
                    .send()
                    .await
                    .map_err(transport)?;
                error_for_status(response, "values.update").await?;
                Ok(())
            }
        })
        .await?;

        Ok(sheet_id)
    }

    async fn append_row(&self, sheet_id: &str, row: &[String]) -> StoreResult<()> {
        let url = format!("{}/{}/values/A1:append", self.sheets_url, sheet_id);
        let body = json!({ "values": [row] });
        with_auth_retry(&self.credentials, |token| {
            let url = url.clone();
            let body = body.clone();
            async move {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(&token)
                    .query(&[
                        ("valueInputOption", "RAW"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&body)
                    .send()
                    .await
                    .map_err(transport)?;
                error_for_status(response, "values.append").await?;
                Ok(())
            }
        })
        .await
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

async fn error_for_status(
    response: reqwest::Response,
    context: &str,
) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 => Err(StoreError::AuthExpired(format!("{context}: {body}"))),
        403 => Err(StoreError::Denied(format!("{context}: {body}"))),
        404 => Err(StoreError::NotFound(format!("{context}: {body}"))),
        _ => Err(StoreError::Transport(format!(
            "{context}: HTTP {status}: {body}"
        ))),
    }
}

/// Escape a value embedded in a Drive `q` filter string.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// A1-notation range covering one header row of `columns` cells.
fn header_range(columns: usize) -> String {
    // Audit headers are short; single-letter columns cover them.
    let last = (b'A' + (columns.max(1) - 1).min(25) as u8) as char;
    format!("A1:{last}1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_escape_quotes() {
        assert_eq!(escape_query_value("O'Brien"), "O\\'Brien");
        assert_eq!(escape_query_value("plain"), "plain");
    }

    #[test]
    fn header_range_covers_five_columns() {
        assert_eq!(header_range(5), "A1:E1");
        assert_eq!(header_range(1), "A1:A1");
    }
}
