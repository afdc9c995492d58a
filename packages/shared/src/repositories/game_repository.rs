use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use crate::models::game::{Color, Game, GameStatus};
use crate::models::game_move::MoveRecord;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

/// Fields written back to a game by an accepted move. The write is
/// conditioned on the status still being active and the turn unchanged, and
/// commits atomically with the move-record append.
#[derive(Debug, Clone)]
pub struct GameStateUpdate {
    pub fen_position: String,
    pub pgn: String,
    pub next_turn: Color,
    pub status: GameStatus,
    pub updated_at: DateTime<Utc>,
}

/// Durable store contract for games and their move logs. The store is the
/// single source of truth shared by every server process; all race safety
/// comes from the conditioned writes below, never from in-process locks.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Insert a new game, conditioned on the code not existing yet.
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError>;

    async fn get_game(&self, game_code: &str) -> Result<Option<Game>, GameRepositoryError>;

    /// Fill one seat, conditioned on that seat still being empty at write
    /// time. At most one of two racing claims can succeed.
    async fn claim_seat(
        &self,
        game_code: &str,
        seat: Color,
        player_id: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError>;

    /// Apply an accepted move: update the game and append the move record as
    /// a single atomic unit, conditioned on the status being active and the
    /// turn matching `expected_turn`. A reader can never observe one half
    /// without the other.
    async fn apply_move(
        &self,
        game_code: &str,
        expected_turn: Color,
        update: &GameStateUpdate,
        record: &MoveRecord,
    ) -> Result<(), GameRepositoryError>;

    /// Transition to a terminal status, conditioned on the game still being
    /// active. Status transitions are monotonic; there is no way back.
    async fn set_status(
        &self,
        game_code: &str,
        status: GameStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError>;

    /// Move log in creation order, oldest first.
    async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, GameRepositoryError>;
}

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub games_table: String,
    pub moves_table: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client) -> Self {
        let games_table = std::env::var("CHESS_GAMES_TABLE")
            .expect("CHESS_GAMES_TABLE environment variable must be set");
        let moves_table = std::env::var("CHESS_MOVES_TABLE")
            .expect("CHESS_MOVES_TABLE environment variable must be set");
        Self {
            client,
            games_table,
            moves_table,
        }
    }

    fn seat_attribute(seat: Color) -> &'static str {
        match seat {
            Color::White => "white_player_id",
            Color::Black => "black_player_id",
        }
    }
}

fn to_attr<T: serde::Serialize>(value: &T) -> Result<AttributeValue, GameRepositoryError> {
    serde_dynamo::to_attribute_value(value)
        .map_err(|e| GameRepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(game)
            .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.games_table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(game_code)")
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    GameRepositoryError::ConditionFailed
                }
                err => GameRepositoryError::Storage(err.to_string()),
            })?;

        Ok(())
    }

    async fn get_game(&self, game_code: &str) -> Result<Option<Game>, GameRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.games_table)
            .key("game_code", AttributeValue::S(game_code.to_string()))
            .send()
            .await
            .map_err(|e| GameRepositoryError::Storage(e.to_string()))?;

        if let Some(item) = result.item {
            let game: Game = serde_dynamo::from_item(item)
                .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
            Ok(Some(game))
        } else {
            Ok(None)
        }
    }

    async fn claim_seat(
        &self,
        game_code: &str,
        seat: Color,
        player_id: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError> {
        let seat_attribute = Self::seat_attribute(seat);

        self.client
            .update_item()
            .table_name(&self.games_table)
            .key("game_code", AttributeValue::S(game_code.to_string()))
            .update_expression("SET #seat = :player_id, updated_at = :updated_at")
            .condition_expression("attribute_exists(game_code) AND attribute_not_exists(#seat)")
            .expression_attribute_names("#seat", seat_attribute)
            .expression_attribute_values(":player_id", AttributeValue::S(player_id.to_string()))
            .expression_attribute_values(":updated_at", to_attr(&claimed_at)?)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    GameRepositoryError::ConditionFailed
                }
                err => GameRepositoryError::Storage(err.to_string()),
            })?;

        Ok(())
    }

    async fn apply_move(
        &self,
        game_code: &str,
        expected_turn: Color,
        update: &GameStateUpdate,
        record: &MoveRecord,
    ) -> Result<(), GameRepositoryError> {
        let mut move_item: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)
            .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
        // Numeric range key so the move log queries back in creation order.
        move_item.insert(
            "move_ts".to_string(),
            AttributeValue::N(record.created_at.timestamp_micros().to_string()),
        );

        let put_move = Put::builder()
            .table_name(&self.moves_table)
            .set_item(Some(move_item))
            .build()
            .map_err(|e| GameRepositoryError::Storage(e.to_string()))?;

        let update_game = Update::builder()
            .table_name(&self.games_table)
            .key("game_code", AttributeValue::S(game_code.to_string()))
            .update_expression(
                "SET fen_position = :fen, pgn = :pgn, next_turn = :next_turn, \
                 #status = :status, updated_at = :updated_at",
            )
            .condition_expression(
                "attribute_exists(game_code) AND #status = :active AND next_turn = :expected_turn",
            )
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":fen", AttributeValue::S(update.fen_position.clone()))
            .expression_attribute_values(":pgn", AttributeValue::S(update.pgn.clone()))
            .expression_attribute_values(":next_turn", to_attr(&update.next_turn)?)
            .expression_attribute_values(":status", to_attr(&update.status)?)
            .expression_attribute_values(":updated_at", to_attr(&update.updated_at)?)
            .expression_attribute_values(":active", to_attr(&GameStatus::Active)?)
            .expression_attribute_values(":expected_turn", to_attr(&expected_turn)?)
            .build()
            .map_err(|e| GameRepositoryError::Storage(e.to_string()))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().update(update_game).build())
            .transact_items(TransactWriteItem::builder().put(put_move).build())
            .send()
            .await
            .map_err(map_transact_error)?;

        Ok(())
    }

    async fn set_status(
        &self,
        game_code: &str,
        status: GameStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GameRepositoryError> {
        self.client
            .update_item()
            .table_name(&self.games_table)
            .key("game_code", AttributeValue::S(game_code.to_string()))
            .update_expression("SET #status = :status, updated_at = :updated_at")
            .condition_expression("attribute_exists(game_code) AND #status = :active")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":status", to_attr(&status)?)
            .expression_attribute_values(":active", to_attr(&GameStatus::Active)?)
            .expression_attribute_values(":updated_at", to_attr(&updated_at)?)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    GameRepositoryError::ConditionFailed
                }
                err => GameRepositoryError::Storage(err.to_string()),
            })?;

        Ok(())
    }

    async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, GameRepositoryError> {
        let result = self
            .client
            .query()
            .table_name(&self.moves_table)
            .key_condition_expression("game_code = :game_code")
            .expression_attribute_values(":game_code", AttributeValue::S(game_code.to_string()))
            .scan_index_forward(true)
            .send()
            .await
            .map_err(|e| GameRepositoryError::Storage(e.to_string()))?;

        let items = result.items.unwrap_or_default();
        serde_dynamo::from_items(items)
            .map_err(|e| GameRepositoryError::Serialization(e.to_string()))
    }
}

fn map_transact_error(e: SdkError<TransactWriteItemsError>) -> GameRepositoryError {
    match e.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(cancel) => {
            let condition_failed = cancel
                .cancellation_reasons()
                .iter()
                .any(|reason| reason.code() == Some("ConditionalCheckFailed"));
            if condition_failed {
                GameRepositoryError::ConditionFailed
            } else {
                GameRepositoryError::Storage(cancel.to_string())
            }
        }
        err => GameRepositoryError::Storage(err.to_string()),
    }
}
