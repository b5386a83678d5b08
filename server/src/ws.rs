use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};

use crate::game_loop::{GameBroadcast, GameCommand};
use crate::protocol::{parse_client_msg, ClientEvent, JoinRequest, ServerMsg};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub connection_semaphore: Arc<Semaphore>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(mut socket: WebSocket, app_state: AppState) {
    let Ok(_permit) = app_state.connection_semaphore.clone().try_acquire_owned() else {
        tracing::warn!("Connection limit reached, rejecting client");
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    let (mut sink, mut stream) = socket.split();

    // Nothing reaches the game until the client has joined
    let Some(request) = wait_for_join(&mut stream).await else {
        return;
    };

    // Subscribe before joining: updates queued ahead of the welcome replay onto its snapshot
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::PlayerJoin {
            request,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send PlayerJoin command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Player {} connected", my_id);

    let sent = match serde_json::to_string(&ServerMsg::Welcome(welcome)) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode welcome: {}", e);
            false
        }
    };

    if sent {
        loop {
            tokio::select! {
                // Client -> Server
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => match parse_client_msg(&text) {
                            Some(ClientEvent::Move { dx, dz }) => {
                                if app_state
                                    .game_tx
                                    .send(GameCommand::PlayerInput { id: my_id, dx, dz })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Some(ClientEvent::Join(_)) => {
                                tracing::debug!("Player {} sent a second join", my_id);
                            }
                            None => {
                                tracing::debug!("Player {} sent an invalid message", my_id);
                            }
                        },
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        _ => {} // Ignore ping/pong/binary
                    }
                }

                // Server -> Client (broadcast)
                result = broadcast_rx.recv() => {
                    match result {
                        Ok(broadcast) => {
                            let json = match broadcast {
                                GameBroadcast::PlayersState(msg) => {
                                    serde_json::to_string(&ServerMsg::PlayersState(msg))
                                }
                                GameBroadcast::TerritoryUpdate(msg) => {
                                    serde_json::to_string(&ServerMsg::TerritoryUpdate(msg))
                                }
                                GameBroadcast::TeamScore(msg) => {
                                    serde_json::to_string(&ServerMsg::TeamScore(msg))
                                }
                                GameBroadcast::Crafted(msg) => {
                                    serde_json::to_string(&ServerMsg::Crafted(msg))
                                }
                            };

                            if let Ok(json) = json {
                                if sink.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("Player {} lagged by {} messages", my_id, n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::PlayerLeave { id: my_id })
        .await;
    tracing::info!("Player {} disconnected", my_id);
}

/// Read frames until a valid join arrives. None if the client goes away first.
async fn wait_for_join(stream: &mut SplitStream<WebSocket>) -> Option<JoinRequest> {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Some(ClientEvent::Join(request)) = parse_client_msg(&text) {
                    return Some(request);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {}
        }
    }
    None
}
