use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use shared::models::game::{normalize_game_code, Game};
use shared::models::game_move::MoveRecord;

use crate::api::GameApi;
use crate::errors::ClientError;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A client's local picture of one game: the session plus its move log,
/// both fetched from the session API in the same pass.
#[derive(Debug, Clone)]
pub struct GameView {
    pub game: Game,
    pub moves: Vec<MoveRecord>,
}

/// Keeps a local view converged on authoritative state. Relay notifications
/// are treated strictly as wake-up signals: every one of them, however
/// stale, duplicated, or malformed, triggers a re-fetch from the session
/// API, and the notification payload itself is never applied to the view.
pub struct GameSynchronizer {
    api: Arc<dyn GameApi>,
    game_code: String,
    state: ConnectionState,
    view_tx: watch::Sender<Option<GameView>>,
}

impl GameSynchronizer {
    pub fn new(
        api: Arc<dyn GameApi>,
        game_code: &str,
    ) -> (Self, watch::Receiver<Option<GameView>>) {
        let (view_tx, view_rx) = watch::channel(None);
        (
            GameSynchronizer {
                api,
                game_code: normalize_game_code(game_code),
                state: ConnectionState::Disconnected,
                view_tx,
            },
            view_rx,
        )
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Fetch authoritative game and move log, replace the local view, and
    /// publish it to watchers.
    pub async fn reconcile(&mut self) -> Result<GameView, ClientError> {
        let game = self.api.get_game(&self.game_code).await?;
        let moves = self.api.list_moves(&self.game_code).await?;
        let view = GameView { game, moves };
        let _ = self.view_tx.send(Some(view.clone()));
        Ok(view)
    }

    /// React to a relay notification. The payload is a hint, nothing more.
    pub async fn handle_notification(&mut self, payload: &str) -> Result<GameView, ClientError> {
        debug!(
            "Relay notification for game {} ({} bytes), re-fetching",
            self.game_code,
            payload.len()
        );
        self.reconcile().await
    }

    /// Drive the relay leg forever: connect, join the room, re-fetch on
    /// every notification. While the relay is unreachable the loop degrades
    /// to polling the session API, so state stays recoverable regardless of
    /// relay health.
    pub async fn run(mut self, ws_url: String) {
        loop {
            match self.relay_session(&ws_url).await {
                Ok(()) => {
                    info!("Relay connection closed for game {}, reconnecting", self.game_code);
                }
                Err(e) => {
                    warn!("{}; polling until the relay returns", e);
                    if let Err(poll_err) = self.reconcile().await {
                        warn!("Poll reconcile failed: {}", poll_err);
                    }
                }
            }
            self.state = ConnectionState::Disconnected;
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn relay_session(&mut self, ws_url: &str) -> Result<(), ClientError> {
        self.state = ConnectionState::Connecting;
        let (mut stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| ClientError::RelayUnavailable(e.to_string()))?;
        self.state = ConnectionState::Connected;

        // Join the room before acting on anything, then catch up on whatever
        // happened while we were away. Joining is idempotent, so this is
        // safe after a reconnect too.
        let join = json!({"action": "join-room", "game_code": self.game_code}).to_string();
        if stream.send(Message::Text(join)).await.is_err() {
            return Ok(());
        }
        info!("Joined relay room for game {}", self.game_code);
        if let Err(e) = self.reconcile().await {
            warn!("Initial reconcile failed: {}", e);
        }

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(payload)) => {
                    if let Err(e) = self.handle_notification(&payload).await {
                        warn!("Reconcile after notification failed: {}", e);
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use shared::models::game::{Color, ColorPreference, GameStatus};
    use shared::models::move_request::MoveRequest;
    use shared::models::responses::MoveResponse;

    /// Stands in for the session API: always answers with the same
    /// authoritative state, counting how often it gets asked.
    struct StubApi {
        game: Game,
        moves: Vec<MoveRecord>,
        fail_fetches: bool,
        fetches: AtomicUsize,
    }

    impl StubApi {
        fn serving(game: Game, moves: Vec<MoveRecord>) -> Self {
            StubApi {
                game,
                moves,
                fail_fetches: false,
                fetches: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            StubApi {
                game: authoritative_game(),
                moves: Vec::new(),
                fail_fetches: true,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GameApi for StubApi {
        async fn create_game(
            &self,
            _preference: ColorPreference,
            _player_id: Option<&str>,
        ) -> Result<Game, ClientError> {
            unimplemented!("not exercised by synchronizer tests")
        }

        async fn join_game(
            &self,
            _game_code: &str,
            _player_id: &str,
        ) -> Result<Game, ClientError> {
            unimplemented!("not exercised by synchronizer tests")
        }

        async fn apply_move(
            &self,
            _game_code: &str,
            _request: &MoveRequest,
        ) -> Result<MoveResponse, ClientError> {
            unimplemented!("not exercised by synchronizer tests")
        }

        async fn resign(&self, _game_code: &str, _side: Color) -> Result<Game, ClientError> {
            unimplemented!("not exercised by synchronizer tests")
        }

        async fn declare_draw(&self, _game_code: &str) -> Result<Game, ClientError> {
            unimplemented!("not exercised by synchronizer tests")
        }

        async fn get_game(&self, _game_code: &str) -> Result<Game, ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetches {
                Err(ClientError::Api {
                    status: 404,
                    message: "Game not found".to_string(),
                })
            } else {
                Ok(self.game.clone())
            }
        }

        async fn list_moves(&self, _game_code: &str) -> Result<Vec<MoveRecord>, ClientError> {
            Ok(self.moves.clone())
        }
    }

    fn authoritative_game() -> Game {
        let mut game = Game::new("ABC123".to_string(), Some("p1".to_string()), None);
        game.next_turn = Color::Black;
        game
    }

    fn authoritative_move() -> MoveRecord {
        MoveRecord {
            game_code: "ABC123".to_string(),
            move_notation: "e4".to_string(),
            fen_after_move: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
                .to_string(),
            piece_moved: "pawn".to_string(),
            from_square: "e2".to_string(),
            to_square: "e4".to_string(),
            is_capture: false,
            is_check: false,
            is_checkmate: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notification_payload_is_never_trusted() {
        let stub = Arc::new(StubApi::serving(
            authoritative_game(),
            vec![authoritative_move()],
        ));
        let (mut sync, view_rx) = GameSynchronizer::new(stub.clone(), "abc123");

        // A garbage payload still converges on the authoritative fetch.
        let view = sync.handle_notification("{not json at all").await.unwrap();
        assert_eq!(view.game.next_turn, Color::Black);
        assert_eq!(view.moves.len(), 1);
        assert_eq!(stub.fetches.load(Ordering::SeqCst), 1);

        let published = view_rx.borrow().clone().unwrap();
        assert_eq!(published.game.game_code, "ABC123");
        assert_eq!(published.moves[0].move_notation, "e4");
    }

    #[tokio::test]
    async fn test_stale_and_duplicate_notifications_converge() {
        let stub = Arc::new(StubApi::serving(
            authoritative_game(),
            vec![authoritative_move()],
        ));
        let (mut sync, view_rx) = GameSynchronizer::new(stub.clone(), "ABC123");

        // The same notification delivered three times never regresses the
        // view; every delivery resolves to current authoritative state.
        for _ in 0..3 {
            let view = sync
                .handle_notification("{\"action\":\"move\",\"move\":\"stale\"}")
                .await
                .unwrap();
            assert_eq!(view.game.status, GameStatus::Active);
            assert_eq!(view.moves.len(), 1);
        }
        assert_eq!(stub.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(view_rx.borrow().clone().unwrap().moves.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_error_is_surfaced_and_view_unchanged() {
        let stub = Arc::new(StubApi::failing());
        let (mut sync, view_rx) = GameSynchronizer::new(stub, "ABC123");

        let err = sync.reconcile().await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
        assert!(view_rx.borrow().is_none());
    }

    #[test]
    fn test_starts_disconnected_with_normalized_code() {
        let stub = Arc::new(StubApi::serving(authoritative_game(), Vec::new()));
        let (sync, _view_rx) = GameSynchronizer::new(stub, " abc123 ");
        assert_eq!(sync.connection_state(), ConnectionState::Disconnected);
        assert_eq!(sync.game_code, "ABC123");
    }
}
