//! API module for lecture-graph
//!
//! Provides the REST endpoints behind the upload flow and the lecture views.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::notify::ProcessingNotifier;
use crate::storage::S3Storage;
use crate::store::JsonLectureStore;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::AppState;

/// API server wiring the configured store, bucket and backend together
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Open the lecture store and build clients from configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let store = JsonLectureStore::open(config.store.data_dir.clone()).await?;
        let storage = S3Storage::new(&config.storage);
        let notifier = ProcessingNotifier::new(&config.backend)?;

        Ok(Self {
            state: AppState {
                store: Arc::new(store),
                storage: Arc::new(storage),
                notifier,
                config: Arc::new(config),
            },
        })
    }

    /// Run the API server until it fails
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.state.config.server.port);
        server::start_http_server(self.state).await
    }
}
