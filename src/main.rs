use anyhow::Context;
use murmur::{app, config::Settings, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init();

    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();
    let app = app(AppState::new(settings));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
