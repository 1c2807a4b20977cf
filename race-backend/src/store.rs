//! # Progress file
//!
//! The whole [`Store`] lives in one pretty-printed JSON document that is read
//! and rewritten wholesale by every call.
//!
//! Each operation holds `lock` for its full read-modify-write cycle, so two
//! requests in this process can't clobber each other's writes. Nothing is
//! cached in memory: edits made to the file between requests are picked up
//! on the next call.

use std::path::{Path, PathBuf};

use race_utils::{CreateOutcome, ProgressError, Store, TOTAL_UNITS};
use tokio::{fs, sync::Mutex};

use crate::error::{AppError, StorageError};

pub struct ProgressStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_all(&self) -> Result<Store, AppError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?)
    }

    pub async fn create_user(&self, name: &str) -> Result<CreateOutcome, AppError> {
        let _guard = self.lock.lock().await;
        let mut store = self.load().await?;
        let outcome = store.create_player(name)?;
        if !outcome.exists {
            self.save(&store).await?;
            log::info!("Created player {name:?}");
        }
        Ok(outcome)
    }

    /// Returns the player's completed count after the write.
    pub async fn toggle_unit(
        &self,
        name: &str,
        index: usize,
        value: bool,
    ) -> Result<usize, AppError> {
        self.mutate(|store| store.set_unit(name, index, value)).await
    }

    pub async fn replace_player(
        &self,
        name: &str,
        units: [bool; TOTAL_UNITS],
    ) -> Result<(), AppError> {
        self.mutate(|store| store.replace_player(name, units)).await
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Store) -> Result<T, ProgressError>,
    ) -> Result<T, AppError> {
        let _guard = self.lock.lock().await;
        let mut store = self.load().await?;
        let result = apply(&mut store)?;
        self.save(&store).await?;
        Ok(result)
    }

    /// Reads the document, writing an empty one first if none exists yet.
    async fn load(&self) -> Result<Store, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No progress file at {}, starting empty",
                    self.path.display()
                );
                let store = Store::new();
                self.save(&store).await?;
                Ok(store)
            }
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&self, store: &Store) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let bytes = serde_json::to_vec_pretty(store).map_err(StorageError::Encode)?;

        // write beside the target and rename so readers never see half a file
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).await.map_err(io_error)?;
        fs::rename(&tmp, &self.path).await.map_err(io_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn temp_store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("nested").join("progress.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_get_all_initializes_empty_file() {
        let (_dir, store) = temp_store();
        assert!(!store.path().exists());

        let all = store.get_all().await.unwrap();
        assert!(all.is_empty());

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk.trim(), "{}");
    }

    #[tokio::test]
    async fn test_mutations_persist() {
        let (_dir, store) = temp_store();
        store.create_user("Ada").await.unwrap();
        assert_eq!(store.toggle_unit("Ada", 2, true).await.unwrap(), 1);

        let reopened = ProgressStore::new(store.path());
        let all = reopened.get_all().await.unwrap();
        assert!(all.get("Ada").unwrap().units[2]);
    }

    #[tokio::test]
    async fn test_existing_user_does_not_rewrite() {
        let (_dir, store) = temp_store();
        store.create_user("Ada").await.unwrap();
        store.toggle_unit("Ada", 0, true).await.unwrap();

        let outcome = store.create_user("Ada").await.unwrap();
        assert!(outcome.exists);
        assert!(outcome.player.units[0]);
    }

    #[tokio::test]
    async fn test_toggle_unknown_player() {
        let (_dir, store) = temp_store();
        let err = store.toggle_unit("Nobody", 0, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_fault() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();
        let err = store.get_all().await.unwrap_err();
        assert!(matches!(err, AppError::StorageFault(_)));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_are_not_lost() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        store.create_user("Ada").await.unwrap();

        let handles: Vec<_> = (0..TOTAL_UNITS)
            .map(|index| {
                let store = store.clone();
                tokio::spawn(async move { store.toggle_unit("Ada", index, true).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = store.get_all().await.unwrap();
        assert!(all.get("Ada").unwrap().is_finished());
    }
}
