use std::net::SocketAddr;

use plan_ai::{GatewayConfig, HttpGateway, PlanningAssistant};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = GatewayConfig::from_env()?;
    let chat_model = config.chat_model.clone();
    let image_model = config.image_model.clone();
    let assistant =
        PlanningAssistant::new(HttpGateway::new(config)).with_models(chat_model, image_model);

    let address: SocketAddr = std::env::var("PLAN_SERVER_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(%address, "plan server listening");
    axum::serve(listener, plan_server::app(assistant)).await?;
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plan_server=info,plan_ai=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}
