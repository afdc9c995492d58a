use std::sync::Arc;

use shared::services::game_service::GameService;

use crate::relay::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
    pub rooms: Arc<RoomRegistry>,
}
