//! Book Manager application library
//!
//! Wires settings, the SQLite pool and the feature modules into a runnable service.

pub mod modules;

use anyhow::Context;
use axum::Router;
use bookman_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// A fully bootstrapped service: pool connected, schema applied, modules initialized
pub struct Application {
    settings: Settings,
    pool: SqlitePool,
    registry: ModuleRegistry,
}

impl Application {
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let pool = bookman_db::connect(&settings.database)
            .await
            .context("failed to open database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &pool).context("failed to register modules")?;

        bookman_db::migrate(&pool, &registry.collect_migrations())
            .await
            .context("failed to apply schema")?;

        registry
            .init_all(&InitCtx {
                settings: &settings,
            })
            .await?;

        Ok(Self {
            settings,
            pool,
            registry,
        })
    }

    /// The complete HTTP router, middleware included
    pub fn router(&self) -> Router {
        bookman_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until a shutdown signal arrives, then stop modules and close the pool
    pub async fn run(self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
        };
        self.registry.start_all(&ctx).await?;

        let served = bookman_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_all().await?;
        self.pool.close().await;
        tracing::info!("bookman-app shut down");

        served
    }
}
