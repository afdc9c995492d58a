use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted move, appended to the game's move log. Records are
/// append-only and ordered by `created_at`; `fen_after_move` must match the
/// game's `fen_position` at the moment the move was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub game_code: String,
    pub move_notation: String,
    pub fen_after_move: String,
    pub piece_moved: String,
    pub from_square: String,
    pub to_square: String,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub created_at: DateTime<Utc>,
}
