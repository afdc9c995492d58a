use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Standard chess starting position.
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub const GAME_CODE_LENGTH: usize = 6;

const GAME_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
}

impl GameStatus {
    /// Terminal statuses accept no further moves; there is no way back to
    /// `Active`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Active)
    }
}

/// Side requested when creating a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    White,
    Black,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_code: String,
    pub fen_position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_player_id: Option<String>,
    pub next_turn: Color,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(
        game_code: String,
        white_player_id: Option<String>,
        black_player_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Game {
            game_code,
            fen_position: INITIAL_FEN.to_string(),
            pgn: None,
            white_player_id,
            black_player_id,
            next_turn: Color::White,
            status: GameStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn player_for(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_player_id.as_deref(),
            Color::Black => self.black_player_id.as_deref(),
        }
    }

    /// The first unfilled seat, white before black.
    pub fn open_seat(&self) -> Option<Color> {
        if self.white_player_id.is_none() {
            Some(Color::White)
        } else if self.black_player_id.is_none() {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.open_seat().is_none()
    }
}

/// Generate a shareable game code: 6 uppercase alphanumeric characters.
/// Uniqueness is enforced by the store, not here; callers regenerate on
/// collision.
pub fn generate_game_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GAME_CODE_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..GAME_CODE_ALPHABET.len());
            GAME_CODE_ALPHABET[index] as char
        })
        .collect()
}

/// Game codes are case-insensitive on input and stored uppercase.
pub fn normalize_game_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
