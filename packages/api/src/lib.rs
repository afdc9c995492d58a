use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod relay;
pub mod routes;
pub mod state;

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    // ToDo: Tighten this up
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/ws", get(relay::websocket_handler))
        .merge(routes::games::routes())
        .layer(cors)
        .with_state(state)
}
