pub mod books;

use bookman_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Register all feature modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool) -> anyhow::Result<()> {
    registry.register(books::create_module(pool.clone()))?;
    Ok(())
}
