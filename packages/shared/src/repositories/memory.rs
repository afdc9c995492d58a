use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::game::{Color, Game, GameStatus};
use crate::models::game_move::MoveRecord;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::{GameRepository, GameStateUpdate};

/// In-memory game store for tests and local development. Mirrors the
/// conditional-write semantics of the DynamoDB implementation: every write
/// re-checks its precondition inside the mutex, and the game update plus
/// move append commit together or not at all.
pub struct InMemoryGameRepository {
    games: Mutex<HashMap<String, GameEntry>>,
}

struct GameEntry {
    game: Game,
    moves: Vec<MoveRecord>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let mut games = self.games.lock().await;
        if games.contains_key(&game.game_code) {
            return Err(GameRepositoryError::ConditionFailed);
        }
        games.insert(
            game.game_code.clone(),
            GameEntry {
                game: game.clone(),
                moves: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_game(&self, game_code: &str) -> Result<Option<Game>, GameRepositoryError> {
        let games = self.games.lock().await;
        Ok(games.get(game_code).map(|entry| entry.game.clone()))
    }

    async fn claim_seat(
        &self,
        game_code: &str,
        seat: Color,
        player_id: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError> {
        let mut games = self.games.lock().await;
        let entry = games
            .get_mut(game_code)
            .ok_or(GameRepositoryError::ConditionFailed)?;

        let slot = match seat {
            Color::White => &mut entry.game.white_player_id,
            Color::Black => &mut entry.game.black_player_id,
        };
        if slot.is_some() {
            return Err(GameRepositoryError::ConditionFailed);
        }
        *slot = Some(player_id.to_string());
        entry.game.updated_at = claimed_at;
        Ok(())
    }

    async fn apply_move(
        &self,
        game_code: &str,
        expected_turn: Color,
        update: &GameStateUpdate,
        record: &MoveRecord,
    ) -> Result<(), GameRepositoryError> {
        let mut games = self.games.lock().await;
        let entry = games
            .get_mut(game_code)
            .ok_or(GameRepositoryError::ConditionFailed)?;

        if entry.game.status != GameStatus::Active || entry.game.next_turn != expected_turn {
            return Err(GameRepositoryError::ConditionFailed);
        }

        entry.game.fen_position = update.fen_position.clone();
        entry.game.pgn = Some(update.pgn.clone());
        entry.game.next_turn = update.next_turn;
        entry.game.status = update.status;
        entry.game.updated_at = update.updated_at;
        entry.moves.push(record.clone());
        Ok(())
    }

    async fn set_status(
        &self,
        game_code: &str,
        status: GameStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError> {
        let mut games = self.games.lock().await;
        let entry = games
            .get_mut(game_code)
            .ok_or(GameRepositoryError::ConditionFailed)?;

        if entry.game.status != GameStatus::Active {
            return Err(GameRepositoryError::ConditionFailed);
        }
        entry.game.status = status;
        entry.game.updated_at = updated_at;
        Ok(())
    }

    async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, GameRepositoryError> {
        let games = self.games.lock().await;
        Ok(games
            .get(game_code)
            .map(|entry| entry.moves.clone())
            .unwrap_or_default())
    }
}
