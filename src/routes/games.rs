use crate::{
    game::GameError,
    models::PlayerId,
    session::{self, Session},
    websocket::messages::ServerMessage,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_HOST_NAME: &str = "Anonymous Host";
const DEFAULT_PLAYER_NAME: &str = "Anonymous Player";

pub type ApiError = (StatusCode, Json<Value>);

#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub host_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub game_id: String,
    /// Link players open to join; the presentation layer renders it as a QR code
    pub join_url: String,
    /// Host session for the WebSocket connection
    pub session_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinGameRequest {
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinGameResponse {
    pub player_id: PlayerId,
    pub card: Vec<String>,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: String,
    pub host_name: String,
    pub player_count: usize,
    pub called_words: Vec<String>,
    pub winner: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayState {
    pub card: Vec<String>,
    pub marked: Vec<bool>,
    pub called_words: Vec<String>,
    pub winner: Option<String>,
}

/// Create a new game and hand the host a session
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let host_name = display_name(payload.host_name, DEFAULT_HOST_NAME);
    let game = state.engine.create_game(&host_name);
    state.games.create(&game).await;

    let session_token = sign(&state, &Session::host(&game.game_id))?;

    Ok(Json(CreateGameResponse {
        join_url: state.config.join_url(&game.game_id),
        game_id: game.game_id,
        session_token,
    }))
}

/// Public view of a game, used by the join page to check the code
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Result<Json<GameSummary>, ApiError> {
    let game = state
        .games
        .get(&normalize_code(&game_id))
        .await
        .map_err(not_found)?;

    Ok(Json(GameSummary {
        player_count: game.player_count(),
        game_id: game.game_id,
        host_name: game.host_name,
        called_words: game.called_words,
        winner: game.winner,
        is_active: game.is_active,
    }))
}

/// Join a game with a fresh player id and card
pub async fn join_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let game_id = normalize_code(&game_id);
    let player_name = display_name(payload.player_name, DEFAULT_PLAYER_NAME);
    let player_id = Uuid::new_v4();

    let (player, count) = state
        .games
        .update(&game_id, |game| {
            let player = state.engine.add_player(game, player_id, &player_name);
            Ok((player.into_player(), game.player_count()))
        })
        .await
        .map_err(not_found)?;

    tracing::info!("{} joined game {} ({} players)", player.name, game_id, count);

    // Keep a connected host dashboard current
    state
        .rooms
        .broadcast(&game_id, ServerMessage::PlayerCount { count })
        .await;

    let session_token = sign(&state, &Session::player(&game_id, player_id))?;

    Ok(Json(JoinGameResponse {
        player_id,
        card: player.card,
        session_token,
    }))
}

/// A player's card, marks and the calls so far
pub async fn get_play_state(
    State(state): State<Arc<AppState>>,
    Path((game_id, player_id)): Path<(String, PlayerId)>,
) -> Result<Json<PlayState>, ApiError> {
    let game = state
        .games
        .get(&normalize_code(&game_id))
        .await
        .map_err(not_found)?;

    let player = game
        .player(&player_id)
        .ok_or_else(|| not_found(GameError::UnknownPlayer(player_id)))?;

    Ok(Json(PlayState {
        card: player.card.clone(),
        marked: player.marked.clone(),
        called_words: game.called_words.clone(),
        winner: game.winner.clone(),
    }))
}

fn sign(state: &AppState, session: &Session) -> Result<String, ApiError> {
    session::issue_token(
        session,
        &state.config.session.secret,
        state.config.session.ttl_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to sign session token: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
    })
}

fn not_found(e: GameError) -> ApiError {
    let message = match e {
        GameError::UnknownPlayer(_) => "player not found",
        _ => "game not found",
    };
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

fn display_name(raw: Option<String>, fallback: &str) -> String {
    raw.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Codes are typed by hand, so accept lowercase and stray whitespace
fn normalize_code(game_id: &str) -> String {
    game_id.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{routes, session::decode_token, test_state, websocket::ConnectionId};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        Router,
    };
    use serde::de::DeserializeOwned;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        routes::create_routes().with_state(state)
    }

    async fn send<T: DeserializeOwned>(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, T) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name(None, "Anon"), "Anon");
        assert_eq!(display_name(Some("   ".to_string()), "Anon"), "Anon");
        assert_eq!(display_name(Some(" Ana ".to_string()), "Anon"), "Ana");
    }

    #[tokio::test]
    async fn test_create_game() {
        let state = test_state();
        let (status, created): (_, CreateGameResponse) = send(
            app(state.clone()),
            Method::POST,
            "/api/games",
            Some(json!({ "host_name": "Alice" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(created.game_id.len(), 6);
        assert_eq!(
            created.join_url,
            format!("http://party.test/join/{}", created.game_id)
        );

        let session = decode_token(&created.session_token, &state.config.session.secret).unwrap();
        assert!(session.is_host());
        assert_eq!(session.game_id, created.game_id);

        let game = state.games.get(&created.game_id).await.unwrap();
        assert_eq!(game.host_name, "Alice");
    }

    #[tokio::test]
    async fn test_create_game_default_host_name() {
        let state = test_state();
        let (_, created): (_, CreateGameResponse) =
            send(app(state.clone()), Method::POST, "/api/games", Some(json!({}))).await;

        let game = state.games.get(&created.game_id).await.unwrap();
        assert_eq!(game.host_name, DEFAULT_HOST_NAME);
    }

    #[tokio::test]
    async fn test_join_and_fetch_play_state() {
        let state = test_state();
        let game = state.engine.create_game("Host");
        state.games.create(&game).await;

        // a connected host hears about the new player
        let (tx, mut host_rx) = mpsc::channel(4);
        state.rooms.join(&game.game_id, ConnectionId::new(), tx);

        let (status, joined): (_, JoinGameResponse) = send(
            app(state.clone()),
            Method::POST,
            &format!("/api/games/{}/players", game.game_id.to_lowercase()),
            Some(json!({ "player_name": "Bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(joined.card.len(), 25);
        assert_eq!(host_rx.recv().await, Some(ServerMessage::PlayerCount { count: 1 }));

        let session = decode_token(&joined.session_token, &state.config.session.secret).unwrap();
        assert_eq!(session.player_id(), Some(joined.player_id));

        let (status, play): (_, PlayState) = send(
            app(state.clone()),
            Method::GET,
            &format!("/api/games/{}/players/{}", game.game_id, joined.player_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(play.card, joined.card);
        assert_eq!(play.marked, vec![false; 25]);
        assert!(play.called_words.is_empty());
        assert!(play.winner.is_none());

        let (status, summary): (_, GameSummary) = send(
            app(state),
            Method::GET,
            &format!("/api/games/{}", game.game_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary.player_count, 1);
        assert_eq!(summary.host_name, "Host");
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let state = test_state();

        let (status, body): (_, Value) = send(
            app(state.clone()),
            Method::POST,
            "/api/games/NOPE22/players",
            Some(json!({ "player_name": "Bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "game not found" }));

        let (status, _): (_, Value) =
            send(app(state), Method::GET, "/api/games/NOPE22", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_player_is_not_found() {
        let state = test_state();
        let game = state.engine.create_game("Host");
        state.games.create(&game).await;

        let (status, body): (_, Value) = send(
            app(state),
            Method::GET,
            &format!("/api/games/{}/players/{}", game.game_id, Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "player not found" }));
    }
}
