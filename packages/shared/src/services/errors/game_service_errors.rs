use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::services::errors::chess_service_errors::ChessServiceError;

#[derive(Debug)]
pub enum GameServiceError {
    GameNotFound,
    GameFull,
    GameInactive,
    NotYourTurn,
    IllegalMove(String),
    /// Concurrent writers kept invalidating our precondition past the retry
    /// budget. The caller may retry the whole operation.
    StoreConflict,
    Repository(GameRepositoryError),
}

impl std::fmt::Display for GameServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameServiceError::GameNotFound => write!(f, "Game not found"),
            GameServiceError::GameFull => write!(f, "Game is full"),
            GameServiceError::GameInactive => write!(f, "Game is not active"),
            GameServiceError::NotYourTurn => write!(f, "Not your turn"),
            GameServiceError::IllegalMove(msg) => write!(f, "Illegal move: {}", msg),
            GameServiceError::StoreConflict => {
                write!(f, "Store conflict: too many concurrent updates, try again")
            }
            GameServiceError::Repository(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for GameServiceError {}

impl From<GameRepositoryError> for GameServiceError {
    fn from(err: GameRepositoryError) -> Self {
        GameServiceError::Repository(err)
    }
}

impl From<ChessServiceError> for GameServiceError {
    fn from(err: ChessServiceError) -> Self {
        match err {
            ChessServiceError::NotYourTurn => GameServiceError::NotYourTurn,
            other => GameServiceError::IllegalMove(other.to_string()),
        }
    }
}
