use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

use crate::models::game::{
    generate_game_code, normalize_game_code, Color, ColorPreference, Game, GameStatus,
};
use crate::models::game_move::MoveRecord;
use crate::models::move_request::MoveRequest;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::{GameRepository, GameStateUpdate};
use crate::services::chess_service::ChessService;
use crate::services::errors::game_service_errors::GameServiceError;

/// Fresh-code attempts before giving up on creation.
const MAX_CODE_ATTEMPTS: usize = 5;
/// Read-validate-write attempts before surfacing a store conflict.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// The authoritative state machine for game sessions. Every operation reads
/// current state, validates, then writes through a conditioned store update;
/// concurrent interference is detected at write time and retried against
/// fresh state, never overwritten blindly.
#[derive(Clone)]
pub struct GameService {
    repository: Arc<dyn GameRepository>,
    rules: ChessService,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository>) -> Self {
        GameService {
            repository,
            rules: ChessService::new(),
        }
    }

    /// Create a game under a fresh code, seating the requester on the
    /// preferred side and leaving the other seat open.
    pub async fn create_game(
        &self,
        preference: ColorPreference,
        player_id: Option<&str>,
    ) -> Result<Game, GameServiceError> {
        let (white_player_id, black_player_id) = seats_for(preference, player_id);

        for attempt in 0..MAX_CODE_ATTEMPTS {
            let game = Game::new(
                generate_game_code(),
                white_player_id.clone(),
                black_player_id.clone(),
            );
            match self.repository.create_game(&game).await {
                Ok(()) => {
                    info!("Created game {}", game.game_code);
                    return Ok(game);
                }
                Err(GameRepositoryError::ConditionFailed) => {
                    debug!("Game code collision on attempt {}, regenerating", attempt + 1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(GameServiceError::StoreConflict)
    }

    /// Fill the first open seat (white before black). Safe under concurrent
    /// joins: the seat claim is conditioned on the slot still being empty,
    /// and a losing racer retries against fresh state.
    pub async fn join_game(
        &self,
        game_code: &str,
        player_id: &str,
    ) -> Result<Game, GameServiceError> {
        let game_code = normalize_game_code(game_code);

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let game = self.get_required(&game_code).await?;
            let seat = match game.open_seat() {
                Some(seat) => seat,
                None => return Err(GameServiceError::GameFull),
            };

            let now = Utc::now();
            match self
                .repository
                .claim_seat(&game_code, seat, player_id, now)
                .await
            {
                Ok(()) => {
                    info!("Player joined game {} as {:?}", game_code, seat);
                    let mut updated = game;
                    match seat {
                        Color::White => updated.white_player_id = Some(player_id.to_string()),
                        Color::Black => updated.black_player_id = Some(player_id.to_string()),
                    }
                    updated.updated_at = now;
                    return Ok(updated);
                }
                Err(GameRepositoryError::ConditionFailed) => {
                    debug!("Lost a seat race in game {}, retrying", game_code);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(GameServiceError::StoreConflict)
    }

    /// Validate and apply a candidate move. The game update and the move
    /// record commit as one atomic unit; the turn flips exactly once,
    /// derived from whose turn it was, never from anything client-supplied.
    pub async fn apply_move(
        &self,
        game_code: &str,
        request: &MoveRequest,
    ) -> Result<(Game, MoveRecord), GameServiceError> {
        let game_code = normalize_game_code(game_code);

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let game = self.get_required(&game_code).await?;
            if game.status.is_terminal() {
                return Err(GameServiceError::GameInactive);
            }

            let outcome = self.rules.evaluate_move(&game.fen_position, request)?;

            let now = Utc::now();
            let status = if outcome.is_checkmate {
                GameStatus::Checkmate
            } else if outcome.is_stalemate {
                GameStatus::Stalemate
            } else {
                GameStatus::Active
            };
            let update = GameStateUpdate {
                fen_position: outcome.fen_after.clone(),
                pgn: extend_pgn(game.pgn.as_deref(), &outcome.notation, outcome.mover),
                next_turn: game.next_turn.opposite(),
                status,
                updated_at: now,
            };
            let record = MoveRecord {
                game_code: game_code.clone(),
                move_notation: outcome.notation.clone(),
                fen_after_move: outcome.fen_after.clone(),
                piece_moved: outcome.piece_moved.clone(),
                from_square: outcome.from_square.clone(),
                to_square: outcome.to_square.clone(),
                is_capture: outcome.is_capture,
                is_check: outcome.is_check,
                is_checkmate: outcome.is_checkmate,
                created_at: now,
            };

            match self
                .repository
                .apply_move(&game_code, game.next_turn, &update, &record)
                .await
            {
                Ok(()) => {
                    info!(
                        "Applied move {} in game {}, next turn {:?}",
                        record.move_notation, game_code, update.next_turn
                    );
                    let updated = Game {
                        fen_position: update.fen_position,
                        pgn: Some(update.pgn),
                        next_turn: update.next_turn,
                        status: update.status,
                        updated_at: now,
                        ..game
                    };
                    return Ok((updated, record));
                }
                Err(GameRepositoryError::ConditionFailed) => {
                    debug!(
                        "Concurrent update detected in game {}, re-validating",
                        game_code
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(GameServiceError::StoreConflict)
    }

    pub async fn resign(&self, game_code: &str, side: Color) -> Result<Game, GameServiceError> {
        info!("{:?} resigns game {}", side, game_code);
        self.finish(game_code, GameStatus::Resigned).await
    }

    pub async fn declare_draw(&self, game_code: &str) -> Result<Game, GameServiceError> {
        self.finish(game_code, GameStatus::Draw).await
    }

    pub async fn get_game(&self, game_code: &str) -> Result<Game, GameServiceError> {
        self.get_required(&normalize_game_code(game_code)).await
    }

    pub async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, GameServiceError> {
        let game_code = normalize_game_code(game_code);
        self.get_required(&game_code).await?;
        self.repository
            .list_moves(&game_code)
            .await
            .map_err(GameServiceError::from)
    }

    async fn finish(
        &self,
        game_code: &str,
        status: GameStatus,
    ) -> Result<Game, GameServiceError> {
        let game_code = normalize_game_code(game_code);
        match self
            .repository
            .set_status(&game_code, status, Utc::now())
            .await
        {
            Ok(()) => self.get_required(&game_code).await,
            Err(GameRepositoryError::ConditionFailed) => {
                // Either the game does not exist or it already ended.
                match self.repository.get_game(&game_code).await? {
                    None => Err(GameServiceError::GameNotFound),
                    Some(_) => Err(GameServiceError::GameInactive),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_required(&self, game_code: &str) -> Result<Game, GameServiceError> {
        self.repository
            .get_game(game_code)
            .await?
            .ok_or(GameServiceError::GameNotFound)
    }
}

fn seats_for(
    preference: ColorPreference,
    player_id: Option<&str>,
) -> (Option<String>, Option<String>) {
    let player_id = match player_id {
        Some(id) => id,
        None => return (None, None),
    };
    let seat = match preference {
        ColorPreference::White => Color::White,
        ColorPreference::Black => Color::Black,
        ColorPreference::Random => {
            if rand::thread_rng().gen_bool(0.5) {
                Color::White
            } else {
                Color::Black
            }
        }
    };
    match seat {
        Color::White => (Some(player_id.to_string()), None),
        Color::Black => (None, Some(player_id.to_string())),
    }
}

/// Extend the game's movetext with one SAN token. White moves open a new
/// numbered pair; a black move on an empty text gets the `N...` form.
fn extend_pgn(pgn: Option<&str>, notation: &str, mover: Color) -> String {
    let text = pgn.unwrap_or("");
    let plies = text
        .split_whitespace()
        .filter(|token| !token.ends_with('.'))
        .count();
    let move_number = plies / 2 + 1;

    match (mover, text.is_empty()) {
        (Color::White, true) => format!("{}. {}", move_number, notation),
        (Color::White, false) => format!("{} {}. {}", text, move_number, notation),
        (Color::Black, true) => format!("{}... {}", move_number, notation),
        (Color::Black, false) => format!("{} {}", text, notation),
    }
}
