use std::sync::Arc;

use anyhow::Result;

use crate::{assets::AssetStore, config::Config, storage::Storage};

pub struct AppState {
    pub storage: Storage,
    pub assets: AssetStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let storage = Storage::open(&config.data_file)?;
        let assets = AssetStore::new(config.media_dir.clone());

        Ok(Arc::new(Self {
            storage,
            assets,
            config,
        }))
    }

    /// Unpersisted store; used by tests and tooling.
    pub fn in_memory(config: Config) -> Arc<Self> {
        let assets = AssetStore::new(config.media_dir.clone());

        Arc::new(Self {
            storage: Storage::in_memory(),
            assets,
            config,
        })
    }
}
