pub mod entity;
pub mod ids;
pub mod models;
use tokio::sync::OnceCell;

use std::{sync::Arc, time::Duration};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cache::FeedCache;
use crate::service::Services;

pub mod service;

pub mod cache;

pub mod error;

pub mod forms;

pub mod views;

pub mod config;

static QUILL_CORE: OnceCell<Arc<QuillCore>> = OnceCell::const_new();

pub async fn core() -> Arc<QuillCore> {
    QUILL_CORE
        .get_or_init(|| async move { Arc::new(QuillCore::start().await.expect("failed to init")) })
        .await
        .clone()
}

/// Main runtime handle for Quill.
pub struct QuillCore {
    pub config: config::QuillConfig,

    /// Open handle to the backing store; services hold their own clones.
    pub db: sea_orm::DatabaseConnection,

    /// Service bundle handed to the request handlers in [`views`].
    pub services: Services,
}

impl QuillCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .ok();

        let config = config::get_or_init().await?;
        info!(
            db = %config.database_path.display(),
            page_size = config.page_size,
            "starting quill core"
        );

        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        // Feed cache, shared between the post write path and the feed reads
        let cache = FeedCache::new(Duration::from_secs(config.feed_cache_ttl_secs));

        let services = Services::new(db.clone(), cache, config.page_size);

        Ok(Self {
            config,
            db,
            services,
        })
    }

    pub async fn shutdown(self) -> Result<(), Box<dyn std::error::Error>> {
        self.db.close().await?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;
    pub use super::views;

    pub use super::cache;
    pub use super::error;
    pub use super::forms;

    pub use super::config;
}
