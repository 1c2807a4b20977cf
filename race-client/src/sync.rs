//! Keeps a [`LocalCache`] eventually consistent with the server.
//!
//! Local edits are applied and shown immediately, then sent on a spawned task
//! whose failure is only logged. Whatever the server holds wins at the next
//! poll.

use std::sync::Arc;

use race_utils::Store;
use tokio::task::JoinHandle;

use crate::{ClientError, api::ProgressApi, cache::LocalCache, identity::IdentityStore};

/// Where the cache gets shown after every change.
pub trait View {
    fn show(&mut self, cache: &LocalCache);
}

impl<F: FnMut(&LocalCache)> View for F {
    fn show(&mut self, cache: &LocalCache) {
        self(cache)
    }
}

pub struct SyncClient<A, V> {
    api: Arc<A>,
    identity: IdentityStore,
    cache: LocalCache,
    view: V,
}

impl<A: ProgressApi, V: View> SyncClient<A, V> {
    pub fn new(api: Arc<A>, identity: IdentityStore, view: V) -> Self {
        Self {
            api,
            identity,
            cache: LocalCache::new(),
            view,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Works out who we are (asking `prompt` if nothing is stored), loads the
    /// store and makes sure our player exists on the server.
    pub async fn bootstrap(
        &mut self,
        prompt: impl FnOnce() -> Option<String>,
    ) -> Result<String, ClientError> {
        let name = match self.identity.get()? {
            Some(name) => name,
            None => {
                let name = prompt()
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .ok_or(ClientError::NoIdentity)?;
                self.identity.set(&name)?;
                name
            }
        };
        self.cache.select(&name);

        let store = match self.api.fetch_progress().await {
            Ok(mut store) => {
                if !store.contains(&name) {
                    self.register(&mut store, &name).await?;
                    match self.api.fetch_progress().await {
                        Ok(fresh) if fresh.contains(&name) => store = fresh,
                        Ok(_) => log::warn!("{name:?} missing from the store after creating it"),
                        Err(e) => log::warn!("Refetch after creating {name:?} failed: {e}"),
                    }
                }
                store
            }
            Err(e) => {
                log::error!("Failed to load progress: {e}");
                let mut store = Store::new();
                store.create_player(&name)?;
                store
            }
        };

        self.cache.replace(store);
        self.view.show(&self.cache);
        Ok(name)
    }

    async fn register(&self, store: &mut Store, name: &str) -> Result<(), ClientError> {
        match self.api.create_user(name).await {
            Ok(response) => {
                log::info!("Registered {name:?} (already existed: {})", response.exists);
                store.replace_player(name, response.data.units)?;
            }
            Err(e) => {
                log::error!("Failed creating user {name:?}: {e}");
                store.create_player(name)?;
            }
        }
        Ok(())
    }

    /// Fetches the whole store and replaces the cache with it. On failure the
    /// stale cache is kept.
    pub async fn poll(&mut self) -> Result<(), ClientError> {
        let store = self
            .api
            .fetch_progress()
            .await
            .inspect_err(|e| log::warn!("Poll failed: {e}"))?;
        self.cache.replace(store);
        self.view.show(&self.cache);
        Ok(())
    }

    pub fn toggle(&mut self, index: usize, value: bool) -> Result<JoinHandle<()>, ClientError> {
        let request = self.cache.toggle(index, value)?;
        self.view.show(&self.cache);

        let api = self.api.clone();
        Ok(tokio::spawn(async move {
            if let Err(e) = api.toggle_unit(request).await {
                log::error!("Update failed: {e}");
            }
        }))
    }

    /// Flips a unit of the selected player.
    pub fn flip(&mut self, index: usize) -> Result<JoinHandle<()>, ClientError> {
        let current = self.cache.unit(index).unwrap_or(false);
        self.toggle(index, !current)
    }

    pub fn reset(&mut self) -> Result<JoinHandle<()>, ClientError> {
        let request = self.cache.reset()?;
        self.view.show(&self.cache);

        let api = self.api.clone();
        Ok(tokio::spawn(async move {
            if let Err(e) = api.update_player(request).await {
                log::error!("Reset failed: {e}");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_utils::{
        ProgressError,
        api::{
            CreateUserResponse, ToggleUnitRequest, ToggleUnitResponse, UpdatePlayerRequest,
            UpdatePlayerResponse,
        },
    };
    use std::sync::Mutex;

    /// In-process stand-in for the server, optionally failing every call.
    #[derive(Default)]
    struct FakeApi {
        store: Mutex<Store>,
        offline: bool,
    }

    fn offline_error() -> ClientError {
        ClientError::Server {
            status: 503,
            message: "offline".to_string(),
        }
    }

    fn server_error(err: ProgressError) -> ClientError {
        ClientError::Server {
            status: 400,
            message: err.to_string(),
        }
    }

    impl ProgressApi for FakeApi {
        async fn fetch_progress(&self) -> Result<Store, ClientError> {
            if self.offline {
                return Err(offline_error());
            }
            Ok(self.store.lock().unwrap().clone())
        }

        async fn create_user(&self, player: &str) -> Result<CreateUserResponse, ClientError> {
            if self.offline {
                return Err(offline_error());
            }
            let outcome = self
                .store
                .lock()
                .unwrap()
                .create_player(player)
                .map_err(server_error)?;
            Ok(CreateUserResponse {
                success: true,
                exists: outcome.exists,
                data: outcome.player,
            })
        }

        async fn toggle_unit(
            &self,
            request: ToggleUnitRequest,
        ) -> Result<ToggleUnitResponse, ClientError> {
            if self.offline {
                return Err(offline_error());
            }
            let completed = self
                .store
                .lock()
                .unwrap()
                .set_unit(&request.player, request.index, request.value)
                .map_err(server_error)?;
            Ok(ToggleUnitResponse {
                success: true,
                index: request.index,
                value: request.value,
                completed,
            })
        }

        async fn update_player(
            &self,
            request: UpdatePlayerRequest,
        ) -> Result<UpdatePlayerResponse, ClientError> {
            if self.offline {
                return Err(offline_error());
            }
            self.store
                .lock()
                .unwrap()
                .replace_player(&request.player, request.units)
                .map_err(server_error)?;
            Ok(UpdatePlayerResponse { success: true })
        }
    }

    /// Counts how many times the cache was shown.
    #[derive(Default)]
    struct CountingView(usize);

    impl View for CountingView {
        fn show(&mut self, _cache: &LocalCache) {
            self.0 += 1;
        }
    }

    fn client(api: Arc<FakeApi>, dir: &tempfile::TempDir) -> SyncClient<FakeApi, CountingView> {
        let identity = IdentityStore::new(dir.path().join("identity.json"));
        SyncClient::new(api, identity, CountingView::default())
    }

    #[tokio::test]
    async fn test_bootstrap_prompts_and_creates_player() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi::default());
        let mut client = client(api.clone(), &dir);

        let name = client
            .bootstrap(|| Some("  Ada  ".to_string()))
            .await
            .unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(client.cache().selected(), Some("Ada"));
        assert!(api.store.lock().unwrap().contains("Ada"));

        let stored = IdentityStore::new(dir.path().join("identity.json"));
        assert_eq!(stored.get().unwrap().as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_bootstrap_uses_stored_identity() {
        let dir = tempfile::tempdir().unwrap();
        IdentityStore::new(dir.path().join("identity.json"))
            .set("Grace")
            .unwrap();
        let api = Arc::new(FakeApi::default());
        let mut client = client(api, &dir);

        let name = client
            .bootstrap(|| panic!("should not prompt"))
            .await
            .unwrap();
        assert_eq!(name, "Grace");
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(Arc::new(FakeApi::default()), &dir);
        let err = client.bootstrap(|| Some("   ".to_string())).await.unwrap_err();
        assert!(matches!(err, ClientError::NoIdentity));
    }

    #[tokio::test]
    async fn test_bootstrap_offline_keeps_local_player() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi {
            offline: true,
            ..FakeApi::default()
        });
        let mut client = client(api, &dir);

        client.bootstrap(|| Some("Ada".to_string())).await.unwrap();
        let (name, player) = client.cache().selected_player().unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(player.completed_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_is_optimistic_then_sent() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi::default());
        let mut client = client(api.clone(), &dir);
        client.bootstrap(|| Some("Ada".to_string())).await.unwrap();

        let shown = client.view().0;
        let pending = client.toggle(3, true).unwrap();
        assert_eq!(client.cache().unit(3), Some(true));
        assert_eq!(client.view().0, shown + 1);
        pending.await.unwrap();
        assert!(api.store.lock().unwrap().get("Ada").unwrap().units[3]);

        client.flip(3).unwrap().await.unwrap();
        assert_eq!(client.cache().unit(3), Some(false));
        assert!(!api.store.lock().unwrap().get("Ada").unwrap().units[3]);
    }

    #[tokio::test]
    async fn test_failed_write_is_corrected_by_poll() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi::default());
        api.store.lock().unwrap().create_player("Ada").unwrap();
        let mut client = client(api.clone(), &dir);
        client.bootstrap(|| Some("Ada".to_string())).await.unwrap();

        // the server forgets Ada, so the toggle is rejected there
        *api.store.lock().unwrap() = Store::new();
        api.store.lock().unwrap().create_player("Bob").unwrap();
        client.toggle(0, true).unwrap().await.unwrap();
        assert_eq!(client.cache().unit(0), Some(true));

        client.poll().await.unwrap();
        assert_eq!(client.cache().selected(), Some("Bob"));
        assert_eq!(client.cache().unit(0), Some(false));
    }

    #[tokio::test]
    async fn test_reset_sends_all_false() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeApi::default());
        let mut client = client(api.clone(), &dir);
        client.bootstrap(|| Some("Ada".to_string())).await.unwrap();
        client.toggle(0, true).unwrap().await.unwrap();

        client.reset().unwrap().await.unwrap();
        assert_eq!(
            api.store.lock().unwrap().get("Ada").unwrap().completed_count(),
            0
        );
    }
}
