use anyhow::Context;
use libris_app::App;
use libris_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "libris-app bootstrap starting"
    );

    let app = App::build(settings).await?;
    app.serve(libris_http::shutdown_signal()).await
}
