use serde::{Deserialize, Serialize};

use crate::models::game::{Color, ColorPreference};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_preference: Option<ColorPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResignRequest {
    pub side: Color,
}
