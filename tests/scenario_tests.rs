use chesslink_tests::spawn_app;
use game_client::api::{GameApi, HttpGameApi};
use game_client::errors::ClientError;
use shared::models::game::{Color, ColorPreference, GameStatus, INITIAL_FEN};
use shared::models::move_request::MoveRequest;

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app().await;

    let response = reqwest::get(format!("{}/health", app.base_url))
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_full_game_flow_over_http() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    // Create as white with p1.
    let game = client
        .create_game(ColorPreference::White, Some("p1"))
        .await
        .unwrap();
    assert_eq!(game.white_player_id.as_deref(), Some("p1"));
    assert!(game.black_player_id.is_none());
    assert_eq!(game.status, GameStatus::Active);
    assert_eq!(game.next_turn, Color::White);
    assert_eq!(game.fen_position, INITIAL_FEN);

    // p2 joins and takes the open black seat.
    let joined = client.join_game(&game.game_code, "p2").await.unwrap();
    assert_eq!(joined.black_player_id.as_deref(), Some("p2"));

    // White plays e2-e4.
    let response = client
        .apply_move(&game.game_code, &MoveRequest::new("e2", "e4"))
        .await
        .unwrap();
    assert_eq!(response.game.next_turn, Color::Black);
    assert_eq!(response.move_record.from_square, "e2");
    assert_eq!(response.move_record.to_square, "e4");
    assert!(!response.move_record.is_capture);

    let moves = client.list_moves(&game.game_code).await.unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].fen_after_move, response.game.fen_position);

    // A second white move before black has replied is a conflict.
    let err = client
        .apply_move(&game.game_code, &MoveRequest::new("d2", "d4"))
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 409),
        other => panic!("expected API error, got {}", other),
    }
}

#[tokio::test]
async fn test_join_full_game_is_conflict() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let game = client
        .create_game(ColorPreference::White, Some("p1"))
        .await
        .unwrap();
    client.join_game(&game.game_code, "p2").await.unwrap();

    let err = client.join_game(&game.game_code, "p3").await.unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 409),
        other => panic!("expected API error, got {}", other),
    }

    // The seats are untouched.
    let game = client.get_game(&game.game_code).await.unwrap();
    assert_eq!(game.white_player_id.as_deref(), Some("p1"));
    assert_eq!(game.black_player_id.as_deref(), Some("p2"));
}

#[tokio::test]
async fn test_unknown_game_is_not_found() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let err = client.get_game("NOSUCH").await.unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 404),
        other => panic!("expected API error, got {}", other),
    }
}

#[tokio::test]
async fn test_illegal_move_is_bad_request_and_mutates_nothing() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let game = client
        .create_game(ColorPreference::White, Some("p1"))
        .await
        .unwrap();

    let err = client
        .apply_move(&game.game_code, &MoveRequest::new("e2", "e5"))
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 400),
        other => panic!("expected API error, got {}", other),
    }

    let game = client.get_game(&game.game_code).await.unwrap();
    assert_eq!(game.fen_position, INITIAL_FEN);
    assert!(client.list_moves(&game.game_code).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resign_ends_the_game() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let game = client
        .create_game(ColorPreference::White, Some("p1"))
        .await
        .unwrap();
    client.join_game(&game.game_code, "p2").await.unwrap();

    let resigned = client.resign(&game.game_code, Color::Black).await.unwrap();
    assert_eq!(resigned.status, GameStatus::Resigned);

    let err = client
        .apply_move(&game.game_code, &MoveRequest::new("e2", "e4"))
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 409),
        other => panic!("expected API error, got {}", other),
    }
}

#[tokio::test]
async fn test_draw_is_terminal() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let game = client
        .create_game(ColorPreference::Random, None)
        .await
        .unwrap();
    let drawn = client.declare_draw(&game.game_code).await.unwrap();
    assert_eq!(drawn.status, GameStatus::Draw);

    let err = client.declare_draw(&game.game_code).await.unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, 409),
        other => panic!("expected API error, got {}", other),
    }
}

#[tokio::test]
async fn test_game_codes_are_case_insensitive() {
    let app = spawn_app().await;
    let client = HttpGameApi::new(&app.base_url);

    let game = client
        .create_game(ColorPreference::White, Some("p1"))
        .await
        .unwrap();
    let fetched = client
        .get_game(&game.game_code.to_ascii_lowercase())
        .await
        .unwrap();
    assert_eq!(fetched.game_code, game.game_code);
}
