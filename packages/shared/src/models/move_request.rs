use serde::{Deserialize, Serialize};

/// A candidate move submitted by a player. Carries only the squares and an
/// optional promotion piece; the moving side is derived from the piece on
/// the origin square, never from anything the client asserts about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from_square: String,
    pub to_square: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_piece: Option<String>,
}

impl MoveRequest {
    pub fn new(from_square: &str, to_square: &str) -> Self {
        MoveRequest {
            from_square: from_square.to_string(),
            to_square: to_square.to_string(),
            promotion_piece: None,
        }
    }

    pub fn with_promotion(from_square: &str, to_square: &str, promotion_piece: &str) -> Self {
        MoveRequest {
            from_square: from_square.to_string(),
            to_square: to_square.to_string(),
            promotion_piece: Some(promotion_piece.to_string()),
        }
    }
}
