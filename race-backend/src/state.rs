use std::sync::Arc;

use crate::{config::Config, store::ProgressStore};

pub struct AppState {
    pub store: ProgressStore,
}

impl AppState {
    pub fn new(store: ProgressStore) -> Arc<Self> {
        Arc::new(Self { store })
    }

    pub fn from_config(config: &Config) -> Arc<Self> {
        let path = config.progress_file();
        log::info!("Progress file: {}", path.display());
        Self::new(ProgressStore::new(path))
    }
}
