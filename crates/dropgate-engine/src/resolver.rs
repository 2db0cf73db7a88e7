//! Destination resolution
//!
//! Destinations are the child folders of the fixed root, minus a configured
//! deny-list. A user's selection is validated by name against the current
//! children (never trusted as an identifier), then today's dated subfolder is
//! looked up or created. The lookup-then-create is not atomic against
//! concurrent creators; a rare duplicate dated folder is accepted rather than
//! locked against.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use dropgate_core::{EngineConfig, EngineError, EngineResult};
use dropgate_storage::{RemoteFolder, RemoteStore, StoreError};

use crate::clock::dated_folder_name;

/// Outcome of destination resolution for one batch.
#[derive(Debug, Clone)]
pub struct ResolvedDestination {
    pub root_id: String,
    pub destination_name: String,
    pub dated_folder_name: String,
    pub dated_folder_id: String,
}

impl ResolvedDestination {
    /// `<destination>/<dated-subfolder>`, the audit path string.
    pub fn path(&self) -> String {
        format!("{}/{}", self.destination_name, self.dated_folder_name)
    }
}

/// Resolves logical destination names to dated remote folders.
pub struct DestinationResolver {
    store: Arc<dyn RemoteStore>,
    config: Arc<EngineConfig>,
}

impl DestinationResolver {
    pub fn new(store: Arc<dyn RemoteStore>, config: Arc<EngineConfig>) -> Self {
        Self { store, config }
    }

    /// The fixed root folder. Its absence is a configuration error, reported
    /// and never retried.
    pub async fn root_folder(&self) -> EngineResult<RemoteFolder> {
        let name = &self.config.root_folder_name;
        match self.store.find_folder(name, None).await {
            Ok(Some(folder)) => Ok(folder),
            Ok(None) => Err(EngineError::Configuration(format!(
                "root folder \"{name}\" not found in the remote store"
            ))),
            Err(err) => Err(store_failure(name, err)),
        }
    }

    /// Selectable destinations: the root's child folders minus the
    /// deny-list, in store order.
    pub async fn list_destinations(&self) -> EngineResult<Vec<RemoteFolder>> {
        let root = self.root_folder().await?;
        self.destinations_under(&root).await
    }

    async fn destinations_under(&self, root: &RemoteFolder) -> EngineResult<Vec<RemoteFolder>> {
        let children = self
            .store
            .list_folders(&root.id)
            .await
            .map_err(|err| store_failure(&root.name, err))?;
        Ok(children
            .into_iter()
            .filter(|folder| !self.config.excluded_folders.contains(&folder.name))
            .collect())
    }

    /// Resolve a selected destination name to today's dated folder,
    /// creating the dated folder if absent.
    pub async fn resolve(
        &self,
        selection: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<ResolvedDestination> {
        let root = self.root_folder().await?;
        let destinations = self.destinations_under(&root).await?;

        // The destination set may have changed between prompt render and
        // selection; an unknown name means it is gone, not forged.
        let destination = destinations
            .into_iter()
            .find(|folder| folder.name == selection)
            .ok_or_else(|| EngineError::DestinationGone(selection.to_string()))?;

        let dated_name = dated_folder_name(now, self.config.timezone_offset_hours);
        let dated_folder_id = match self
            .store
            .find_folder(&dated_name, Some(&destination.id))
            .await
            .map_err(|err| store_failure(&dated_name, err))?
        {
            Some(folder) => folder.id,
            None => {
                tracing::info!(destination = %destination.name, dated = %dated_name, "Creating dated folder");
                self.store
                    .create_folder(&destination.id, &dated_name)
                    .await
                    .map_err(|err| store_failure(&dated_name, err))?
            }
        };

        Ok(ResolvedDestination {
            root_id: root.id,
            destination_name: destination.name,
            dated_folder_name: dated_name,
            dated_folder_id,
        })
    }
}

fn store_failure(item: &str, err: StoreError) -> EngineError {
    EngineError::transfer(item, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropgate_storage::MemoryStore;

    async fn fixture() -> (Arc<MemoryStore>, DestinationResolver) {
        let store = Arc::new(MemoryStore::new());
        let root = store.add_folder(None, "Upload").await;
        store.add_folder(Some(&root), "Events").await;
        store.add_folder(Some(&root), "Archive").await;
        store.add_folder(Some(&root), "Trips").await;

        let config = Arc::new(EngineConfig {
            excluded_folders: vec!["Archive".into()],
            ..EngineConfig::default()
        });
        let resolver = DestinationResolver::new(store.clone(), config);
        (store, resolver)
    }

    #[tokio::test]
    async fn deny_listed_folders_are_not_selectable() {
        let (_store, resolver) = fixture().await;
        let names: Vec<_> = resolver
            .list_destinations()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Events", "Trips"]);
    }

    #[tokio::test]
    async fn missing_root_is_a_configuration_error() {
        let store = Arc::new(MemoryStore::new());
        let resolver = DestinationResolver::new(store, Arc::new(EngineConfig::default()));
        let err = resolver.root_folder().await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn unknown_selection_is_destination_gone() {
        let (_store, resolver) = fixture().await;
        let err = resolver.resolve("Projects", Utc::now()).await.unwrap_err();
        assert!(matches!(err, EngineError::DestinationGone(name) if name == "Projects"));
    }

    #[tokio::test]
    async fn deny_listed_selection_is_destination_gone() {
        let (_store, resolver) = fixture().await;
        let err = resolver.resolve("Archive", Utc::now()).await.unwrap_err();
        assert!(matches!(err, EngineError::DestinationGone(_)));
    }

    #[tokio::test]
    async fn dated_folder_is_created_once_and_reused() {
        let (store, resolver) = fixture().await;
        let now = Utc::now();

        let first = resolver.resolve("Events", now).await.unwrap();
        let second = resolver.resolve("Events", now).await.unwrap();
        assert_eq!(first.dated_folder_id, second.dated_folder_id);
        assert_eq!(first.path(), second.path());

        let events = store.find_folder("Events", None).await.unwrap().unwrap();
        assert_eq!(store.folder_names_in(&events.id).await.len(), 1);
    }
}
