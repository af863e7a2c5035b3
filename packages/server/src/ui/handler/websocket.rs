//! WebSocket connection handlers.
//!
//! Every upgraded socket runs two pumps:
//!
//! - read pump: frames from the peer, decoded and handed to the dispatcher
//! - write pump: events from the connection's outbound queue, serialized and
//!   written to the peer, plus periodic pings
//!
//! Whichever pump stops first ends the connection. Removal from the registry
//! closes the outbound queue, which makes the write pump send a Close frame.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant},
};

use crate::{
    config::ServerConfig,
    domain::{ClientId, ClientIdFactory, RoomError},
    infrastructure::{
        connection::{Connection, RegistryError},
        dto::websocket::{IncomingMessage, ServerEvent},
        serializer::{Frame, Serializer, serializer_for},
    },
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Generated when absent
    pub client_id: Option<String>,
    /// `json` (default) or `fragments`
    pub format: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let client_id = match query.client_id {
        Some(raw) => match ClientId::try_from(raw.clone()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Invalid client_id '{}': {}", raw, e);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => ClientIdFactory::generate(),
    };
    let serializer = serializer_for(query.format.as_deref());

    let (conn, rx) = match state.connect_client_usecase.execute(client_id) {
        Ok(connected) => connected,
        Err(RegistryError::DuplicateClientId(id)) => {
            tracing::warn!(
                "Client with ID '{}' is already connected. Rejecting connection.",
                id
            );
            return Err(StatusCode::CONFLICT);
        }
    };
    tracing::info!(
        "Client '{}' connected ({} serializer)",
        conn.id(),
        serializer.name()
    );

    let max_message_size = state.config.max_message_size;
    let failed_conn = conn.clone();
    let failed_state = state.clone();
    Ok(ws
        .max_message_size(max_message_size)
        .max_frame_size(max_message_size)
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", failed_conn.id(), e);
            failed_state
                .disconnect_client_usecase
                .execute(&failed_conn);
        })
        .on_upgrade(move |socket| handle_socket(socket, state, conn, rx, serializer)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    conn: Arc<Connection>,
    rx: mpsc::Receiver<ServerEvent>,
    serializer: Arc<dyn Serializer>,
) {
    let (sender, receiver) = socket.split();
    let config = state.config.clone();
    let mut shutdown = state.shutdown.clone();

    let mut write_task = tokio::spawn(write_loop(
        sender,
        rx,
        serializer,
        config.clone(),
        conn.id().clone(),
    ));
    let mut read_task = tokio::spawn(read_loop(receiver, state.clone(), conn.clone()));

    tokio::select! {
        _ = &mut read_task => {},
        _ = &mut write_task => read_task.abort(),
        _ = shutdown_requested(&mut shutdown) => read_task.abort(),
    }

    state.disconnect_client_usecase.execute(&conn);

    // Let the write pump flush what is queued and send the Close frame.
    if !write_task.is_finished() {
        let _ = time::timeout(config.write_wait, &mut write_task).await;
    }
    tracing::info!("Client '{}' disconnected", conn.id());
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Reads frames until the peer closes, errors, or stays silent past `pong_wait`.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    conn: Arc<Connection>,
) {
    let pong_wait = state.config.pong_wait;

    loop {
        let msg = match time::timeout(pong_wait, receiver.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                tracing::debug!("WebSocket error from '{}': {}", conn.id(), e);
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!("Client '{}' silent for {:?}, dropping", conn.id(), pong_wait);
                break;
            }
        };

        match msg {
            Message::Text(text) => handle_text(&state, &conn, text.as_str()),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_text(&state, &conn, text),
                Err(e) => conn.report_error(&RoomError::DecodeFailure(e.to_string())),
            },
            Message::Ping(_) | Message::Pong(_) => {
                tracing::trace!("Keepalive from '{}'", conn.id());
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", conn.id());
                break;
            }
        }
    }
}

fn handle_text(state: &AppState, conn: &Arc<Connection>, text: &str) {
    match serde_json::from_str::<IncomingMessage>(text) {
        Ok(msg) => state.dispatcher.dispatch(conn, &msg),
        Err(e) => {
            tracing::debug!("Malformed message from '{}': {}", conn.id(), e);
            conn.report_error(&RoomError::DecodeFailure(e.to_string()));
        }
    }
}

/// Drains the outbound queue to the peer and keeps the link alive with pings.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerEvent>,
    serializer: Arc<dyn Serializer>,
    config: ServerConfig,
    client_id: ClientId,
) {
    let mut ping = time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    // Queue closed by the registry.
                    let close = Message::Close(None);
                    write_frame(&mut sender, close, config.write_wait, &client_id).await;
                    break;
                };
                for frame in serializer.serialize(&event) {
                    let message = match frame {
                        Frame::Text(text) => Message::Text(text.into()),
                        Frame::Binary(bytes) => Message::Binary(bytes.into()),
                    };
                    if !write_frame(&mut sender, message, config.write_wait, &client_id).await {
                        return;
                    }
                }
            }
            _ = ping.tick() => {
                let ping_frame = Message::Ping(Bytes::new());
                if !write_frame(&mut sender, ping_frame, config.write_wait, &client_id).await {
                    break;
                }
            }
        }
    }
}

async fn write_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    message: Message,
    write_wait: Duration,
    client_id: &ClientId,
) -> bool {
    match time::timeout(write_wait, sender.send(message)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!("Failed to write to '{}': {}", client_id, e);
            false
        }
        Err(_) => {
            tracing::warn!("Write to '{}' timed out after {:?}", client_id, write_wait);
            false
        }
    }
}
