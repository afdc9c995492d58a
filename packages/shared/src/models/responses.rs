use serde::{Deserialize, Serialize};

use crate::models::game::Game;
use crate::models::game_move::MoveRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub game: Game,
    #[serde(rename = "move")]
    pub move_record: MoveRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
