use std::sync::Arc;

use tracing::info;

use api::relay::RoomRegistry;
use api::state::AppState;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::services::game_service::GameService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Set up services
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);

    let repository = Arc::new(DynamoDbGameRepository::new(client));
    let game_service = Arc::new(GameService::new(repository));
    // One registry for the lifetime of the process; re-creating it per
    // request would orphan every existing room.
    let rooms = Arc::new(RoomRegistry::new());

    let app_state = AppState {
        game_service,
        rooms,
    };
    let app = api::build_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
