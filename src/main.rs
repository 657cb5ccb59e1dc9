use anyhow::Context;
use booker_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Booker settings")?;
    booker_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "booker-app bootstrap starting"
    );

    let app = booker_app::bootstrap(&settings).await?;
    app.registry.start_all(&InitCtx { settings: &settings }).await?;

    let served =
        booker_http::start_server(&app.registry, &settings, booker_http::shutdown_signal()).await;

    app.registry.stop_all().await?;
    served
}
