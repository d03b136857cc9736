use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema statement contributed by a module.
///
/// `up` must be idempotent (`CREATE TABLE IF NOT EXISTS ...`); it runs on every startup.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Contract every feature module implements
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also the path segment its routes are mounted under
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context
    /// Called after the schema has been applied
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Will be merged with other modules' specs
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Return schema statements contributed by this module, in execution order
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called once the module is initialized, before the server accepts requests
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during application shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
