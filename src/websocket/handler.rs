use crate::{
    game::{GameError, GameResult},
    session::Session,
    websocket::{
        messages::{ClientMessage, ServerMessage},
        ConnectionId,
    },
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// WebSocket upgrade handler; the session token says which game and role
pub async fn handle_websocket(
    session: Session,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket upgrade for game {} ({:?})",
        session.game_id,
        session.role
    );
    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);
    let conn = ConnectionId::new();

    if let Err(e) = on_connect(&state, &session, conn, tx.clone()).await {
        tracing::info!("Refusing connection {} to game {}: {}", conn, session.game_id, e);
        let error_msg = ServerMessage::Error {
            message: e.client_message(),
        };
        if let Ok(json) = serde_json::to_string(&error_msg) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    tracing::info!(
        "Connection {} joined room {} ({:?})",
        conn,
        session.game_id,
        session.role
    );

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let session_for_recv = session.clone();
    let state_for_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        if let Err(e) =
                            handle_client_message(client_msg, &state_for_recv, &tx, &session_for_recv)
                                .await
                        {
                            tracing::debug!(
                                "Declined action in game {}: {}",
                                session_for_recv.game_id,
                                e
                            );
                            let declined = ServerMessage::ActionDeclined {
                                reason: e.client_message(),
                            };
                            let _ = tx.send(declined).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse message: {}", e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        };
                        let _ = tx.send(error_msg).await;
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    on_disconnect(&state, &session, conn);

    tracing::info!("Connection {} left room {}", conn, session.game_id);
}

/// Subscribe a new connection to its game's room. A host connecting
/// announces the current player count to the room.
pub async fn on_connect(
    state: &AppState,
    session: &Session,
    conn: ConnectionId,
    tx: mpsc::Sender<ServerMessage>,
) -> GameResult<()> {
    let game = state.games.get(&session.game_id).await?;

    state.rooms.join(&game.game_id, conn, tx);
    tracing::debug!(
        "Room {} now has {} connections",
        game.game_id,
        state.rooms.member_count(&game.game_id)
    );

    if session.is_host() {
        state
            .rooms
            .broadcast(
                &game.game_id,
                ServerMessage::PlayerCount {
                    count: game.player_count(),
                },
            )
            .await;
    }

    Ok(())
}

pub fn on_disconnect(state: &AppState, session: &Session, conn: ConnectionId) {
    state.rooms.leave(&session.game_id, conn);
}

/// Handle individual client messages. Errors mean the action was declined
/// and nothing was broadcast.
pub async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    tx: &mpsc::Sender<ServerMessage>,
    session: &Session,
) -> GameResult<()> {
    match msg {
        ClientMessage::CallWord { word } => {
            if !session.is_host() {
                return Err(GameError::NotHost);
            }

            let calls = state
                .games
                .update(&session.game_id, |game| {
                    state.engine.call_word(game, &word)?;
                    Ok(game.called_words.clone())
                })
                .await?;

            tracing::info!(
                "Game {}: called '{}' ({} calls)",
                session.game_id,
                word,
                calls.len()
            );

            state
                .rooms
                .broadcast(&session.game_id, ServerMessage::WordCalled { word })
                .await;
            state
                .rooms
                .broadcast(&session.game_id, ServerMessage::UpdateCalls { calls })
                .await;
        }
        ClientMessage::MarkSquare { square_index } => {
            let player_id = session.player_id().ok_or(GameError::NotAPlayer)?;

            let new_winner = state
                .games
                .update(&session.game_id, |game| {
                    state.engine.mark_square(game, &player_id, square_index)?;
                    if state.engine.check_winner(game, &player_id) {
                        Ok(state.engine.record_winner(game, &player_id))
                    } else {
                        Ok(None)
                    }
                })
                .await?;

            let _ = tx.send(ServerMessage::SquareMarked { square_index }).await;

            if let Some(winner) = new_winner {
                tracing::info!("Game {}: {} wins", session.game_id, winner);
                state
                    .rooms
                    .broadcast(&session.game_id, ServerMessage::GameWinner { winner })
                    .await;
            }
        }
    }

    Ok(())
}
