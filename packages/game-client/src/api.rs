use async_trait::async_trait;
use serde::de::DeserializeOwned;

use shared::models::game::{Color, ColorPreference, Game};
use shared::models::game_move::MoveRecord;
use shared::models::move_request::MoveRequest;
use shared::models::requests::{CreateGameRequest, JoinGameRequest, ResignRequest};
use shared::models::responses::{ErrorResponse, MoveResponse};

use crate::errors::ClientError;

/// The Session Manager surface as seen from a client. Behind a trait so the
/// reconciliation loop can be exercised against a mock.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn create_game(
        &self,
        preference: ColorPreference,
        player_id: Option<&str>,
    ) -> Result<Game, ClientError>;

    async fn join_game(&self, game_code: &str, player_id: &str) -> Result<Game, ClientError>;

    async fn apply_move(
        &self,
        game_code: &str,
        request: &MoveRequest,
    ) -> Result<MoveResponse, ClientError>;

    async fn resign(&self, game_code: &str, side: Color) -> Result<Game, ClientError>;

    async fn declare_draw(&self, game_code: &str) -> Result<Game, ClientError>;

    async fn get_game(&self, game_code: &str) -> Result<Game, ClientError>;

    async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, ClientError>;
}

pub struct HttpGameApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGameApi {
    pub fn new(base_url: &str) -> Self {
        HttpGameApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn create_game(
        &self,
        preference: ColorPreference,
        player_id: Option<&str>,
    ) -> Result<Game, ClientError> {
        let response = self
            .http
            .post(format!("{}/games", self.base_url))
            .json(&CreateGameRequest {
                color_preference: Some(preference),
                player_id: player_id.map(str::to_string),
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn join_game(&self, game_code: &str, player_id: &str) -> Result<Game, ClientError> {
        let response = self
            .http
            .post(format!("{}/games/{}/join", self.base_url, game_code))
            .json(&JoinGameRequest {
                player_id: player_id.to_string(),
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn apply_move(
        &self,
        game_code: &str,
        request: &MoveRequest,
    ) -> Result<MoveResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/games/{}/moves", self.base_url, game_code))
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn resign(&self, game_code: &str, side: Color) -> Result<Game, ClientError> {
        let response = self
            .http
            .post(format!("{}/games/{}/resign", self.base_url, game_code))
            .json(&ResignRequest { side })
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn declare_draw(&self, game_code: &str) -> Result<Game, ClientError> {
        let response = self
            .http
            .post(format!("{}/games/{}/draw", self.base_url, game_code))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get_game(&self, game_code: &str) -> Result<Game, ClientError> {
        let response = self
            .http
            .get(format!("{}/games/{}", self.base_url, game_code))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn list_moves(&self, game_code: &str) -> Result<Vec<MoveRecord>, ClientError> {
        let response = self
            .http
            .get(format!("{}/games/{}/moves", self.base_url, game_code))
            .send()
            .await?;
        Self::parse(response).await
    }
}
