//! Credential handling for remote store backends
//!
//! The credential bootstrap itself (service-account exchange, token endpoint)
//! is an external collaborator behind [`TokenSource`]. This module owns the
//! process-wide credential state and the gateway-level interceptor: every
//! backend call runs through [`with_auth_retry`], which on an
//! authorization-expired condition performs one guarded refresh and one
//! retry. Refreshes are single-flight: a caller that observed the same
//! credential generation as an in-flight refresher awaits that refresh
//! instead of triggering a second one.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::traits::{StoreError, StoreResult};

/// Credential bootstrap boundary.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    /// Current access token, fetching one if none is held yet.
    async fn access_token(&self) -> StoreResult<String>;

    /// Force-fetch a new access token.
    async fn refresh(&self) -> StoreResult<String>;
}

#[derive(Default)]
struct CacheState {
    token: Option<String>,
    generation: u64,
}

/// Process-wide credential cache with single-flight refresh.
pub struct CredentialCache {
    source: Arc<dyn TokenSource>,
    state: Mutex<CacheState>,
}

impl CredentialCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Current token plus the generation it belongs to. The generation is
    /// handed back to [`CredentialCache::refresh_after`] so a stale observer
    /// cannot trigger a redundant refresh.
    pub async fn token(&self) -> StoreResult<(String, u64)> {
        let mut state = self.state.lock().await;
        let token = match &state.token {
            Some(token) => token.clone(),
            None => {
                let token = self.source.access_token().await?;
                state.token = Some(token.clone());
                token
            }
        };
        Ok((token, state.generation))
    }

    /// Refresh the credential unless someone already refreshed past
    /// `seen_generation`; either way return the current token.
    pub async fn refresh_after(&self, seen_generation: u64) -> StoreResult<String> {
        let mut state = self.state.lock().await;
        if state.generation == seen_generation {
            let token = self.source.refresh().await?;
            state.token = Some(token);
            state.generation += 1;
            tracing::debug!(generation = state.generation, "Credential refreshed");
        }
        match &state.token {
            Some(token) => Ok(token.clone()),
            None => {
                let token = self.source.access_token().await?;
                state.token = Some(token.clone());
                Ok(token)
            }
        }
    }
}

/// Run a remote call with refresh-once-and-retry on authorization expiry.
///
/// The operation receives the access token and may run twice; a second
/// authorization-expired failure propagates to the caller.
pub async fn with_auth_retry<T, F, Fut>(credentials: &CredentialCache, op: F) -> StoreResult<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let (token, generation) = credentials.token().await?;
    match op(token).await {
        Err(StoreError::AuthExpired(reason)) => {
            tracing::debug!(reason = %reason, "Authorization expired, refreshing and retrying");
            let token = credentials.refresh_after(generation).await?;
            op(token).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSource {
        refreshes: AtomicU32,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                refreshes: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TokenSource for CountingSource {
        async fn access_token(&self) -> StoreResult<String> {
            Ok("stale".to_string())
        }

        async fn refresh(&self) -> StoreResult<String> {
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("fresh-{n}"))
        }
    }

    async fn op_requiring_fresh(token: String) -> StoreResult<String> {
        if token.starts_with("fresh") {
            Ok(token)
        } else {
            Err(StoreError::AuthExpired("stale token".into()))
        }
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_once_and_retried() {
        let source = Arc::new(CountingSource::new());
        let credentials = CredentialCache::new(source.clone());

        let result = with_auth_retry(&credentials, op_requiring_fresh).await;
        assert_eq!(result.ok().as_deref(), Some("fresh-1"));
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let source = Arc::new(CountingSource::new());
        let credentials = CredentialCache::new(source.clone());

        let (a, b) = tokio::join!(
            with_auth_retry(&credentials, op_requiring_fresh),
            with_auth_retry(&credentials, op_requiring_fresh),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_expiry_after_refresh_propagates() {
        struct AlwaysStale;

        #[async_trait::async_trait]
        impl TokenSource for AlwaysStale {
            async fn access_token(&self) -> StoreResult<String> {
                Ok("stale".to_string())
            }
            async fn refresh(&self) -> StoreResult<String> {
                Ok("stale".to_string())
            }
        }

        let credentials = CredentialCache::new(Arc::new(AlwaysStale));
        let result = with_auth_retry(&credentials, op_requiring_fresh).await;
        assert!(matches!(result, Err(StoreError::AuthExpired(_))));
    }
}
