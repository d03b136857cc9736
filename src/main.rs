use anyhow::Context;
use bookman_app::Application;
use bookman_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Book Manager settings")?;

    bookman_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "bookman-app bootstrap starting"
    );

    let app = Application::build(settings).await?;

    tracing::info!("bookman-app bootstrap complete");
    app.run().await
}
