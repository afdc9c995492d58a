#[derive(Debug)]
pub enum GameRepositoryError {
    Serialization(String),
    Storage(String),
    /// A conditioned write found the precondition no longer true (seat
    /// already taken, turn already advanced, status no longer active, or
    /// the item missing/present contrary to expectation). The service layer
    /// re-reads and decides whether to retry or surface an error.
    ConditionFailed,
}

impl std::fmt::Display for GameRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            GameRepositoryError::Storage(msg) => write!(f, "Storage error: {}", msg),
            GameRepositoryError::ConditionFailed => {
                write!(f, "Conditional write failed")
            }
        }
    }
}

impl std::error::Error for GameRepositoryError {}
