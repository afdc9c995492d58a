use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use shared::models::game::{ColorPreference, Game};
use shared::models::game_move::MoveRecord;
use shared::models::move_request::MoveRequest;
use shared::models::requests::{CreateGameRequest, JoinGameRequest, ResignRequest};
use shared::models::responses::MoveResponse;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/:code", get(get_game))
        .route("/games/:code/join", post(join_game))
        .route("/games/:code/moves", get(list_moves).post(make_move))
        .route("/games/:code/resign", post(resign))
        .route("/games/:code/draw", post(declare_draw))
}

async fn create_game(
    State(state): State<AppState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let preference = payload
        .color_preference
        .unwrap_or(ColorPreference::Random);
    let game = state
        .game_service
        .create_game(preference, payload.player_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn get_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Game>, ApiError> {
    let game = state.game_service.get_game(&code).await?;
    Ok(Json(game))
}

async fn join_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<Game>, ApiError> {
    let game = state
        .game_service
        .join_game(&code, &payload.player_id)
        .await?;
    Ok(Json(game))
}

async fn make_move(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let (game, move_record) = state.game_service.apply_move(&code, &payload).await?;

    // The move is durably committed at this point; peers get a best-effort
    // nudge and re-fetch authoritative state themselves. Delivery failures
    // are invisible to the mover.
    let notification = json!({
        "action": "move",
        "game_code": game.game_code,
        "move": move_record,
    })
    .to_string();
    state
        .rooms
        .notify(&game.game_code, None, &notification)
        .await;

    Ok(Json(MoveResponse { game, move_record }))
}

async fn resign(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<ResignRequest>,
) -> Result<Json<Game>, ApiError> {
    let game = state.game_service.resign(&code, payload.side).await?;
    Ok(Json(game))
}

async fn declare_draw(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Game>, ApiError> {
    let game = state.game_service.declare_draw(&code).await?;
    Ok(Json(game))
}

async fn list_moves(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<MoveRecord>>, ApiError> {
    let moves = state.game_service.list_moves(&code).await?;
    Ok(Json(moves))
}
