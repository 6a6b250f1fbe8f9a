use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    ArticleService, CatalogService, FileStore, LocalFileStore, PostService, QaService,
    ResourceService, UserService,
};

/// Shared handles passed to every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let files = Arc::new(LocalFileStore::new(&config.uploads.root));
        Self {
            pool,
            config: Arc::new(config),
            files,
        }
    }

    pub fn qa(&self) -> QaService {
        QaService::new(self.pool.clone(), self.config.points)
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.pool.clone(), self.config.points)
    }

    pub fn articles(&self) -> ArticleService {
        ArticleService::new(self.pool.clone(), self.config.points)
    }

    pub fn resources(&self) -> ResourceService {
        ResourceService::new(self.pool.clone(), self.config.points)
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.pool.clone())
    }
}
