//! WebSocket and HTTP handlers
//!
//! The credential is checked before the upgrade; once upgraded, every text
//! frame is handed to the lifecycle handler and rejected events are answered
//! with an `error` event on the same socket.

use crate::connection::OUTBOUND_BUFFER_SIZE;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use estate_common::{AppError, ErrorResponse};
use estate_core::{
    ConnectionId, ConnectionLifecycle, Flow, OutboundEvent, PresenceEntry,
};
use futures_util::{stream::SplitStream, SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the send task may keep flushing after the connection is torn down
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Query parameters accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Alternative to the `Authorization` header for browser clients
    pub token: Option<String>,
}

/// WebSocket gateway handler
pub async fn socket_handler(
    State(state): State<GatewayState>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let mut lifecycle = ConnectionLifecycle::new(ConnectionId::generate());

    let token = authorization(&headers).or(params.token.as_deref());
    if let Err(rejection) = lifecycle.authenticate(state.verifier(), token) {
        tracing::info!(
            connection_id = %lifecycle.connection_id(),
            reason = rejection.code(),
            "Connection rejected"
        );
        return error_response(&AppError::from(rejection));
    }

    ws.on_upgrade(move |socket| handle_socket(state, socket, lifecycle))
}

/// Current presence snapshot, for operators
pub async fn presence_handler(State(state): State<GatewayState>) -> Json<Vec<PresenceEntry>> {
    Json(state.registry().list_all().await)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Render an application error as a JSON HTTP response
pub(crate) fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Raw `Authorization` value; the scheme is stripped during authentication
fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, mut lifecycle: ConnectionLifecycle) {
    let connection_id = lifecycle.connection_id().clone();

    // Create channel for outgoing events
    let (tx, mut rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_BUFFER_SIZE);
    state
        .connection_manager()
        .add_connection(connection_id.clone(), tx);

    tracing::info!(
        connection_id = %connection_id,
        user_id = ?lifecycle.identity().map(|i| i.user_id.as_str()),
        connections = state.connection_manager().connection_count(),
        "WebSocket connection established"
    );

    let (mut ws_sink, ws_stream) = socket.split();

    // Spawn task to send events to the WebSocket
    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(connection_id = %send_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                tracing::warn!(connection_id = %send_id, "Failed to send event to WebSocket");
                break;
            }
        }

        // Close the WebSocket when the channel is closed
        let _ = ws_sink.close().await;
    });

    // Wait for either side to finish
    let send_finished = tokio::select! {
        () = receive_events(&state, &mut lifecycle, ws_stream) => false,
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            true
        }
    };

    // Clean up: presence first so the snapshot skips this connection
    state.lifecycle().disconnect(&mut lifecycle).await;
    state.connection_manager().remove_connection(&connection_id);

    if !send_finished && tokio::time::timeout(CLOSE_GRACE_PERIOD, send_task).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Send task did not finish in time");
    }

    tracing::info!(connection_id = %connection_id, "Connection closed");
}

/// Read frames until the client leaves or the socket fails
async fn receive_events(
    state: &GatewayState,
    lifecycle: &mut ConnectionLifecycle,
    mut ws_stream: SplitStream<WebSocket>,
) {
    let handler = state.lifecycle();

    while let Some(msg) = ws_stream.next().await {
        let result = match msg {
            Ok(Message::Text(text)) => handler.handle_frame(lifecycle, &text).await,
            Ok(Message::Binary(_)) => Err(handler.reject_binary(lifecycle)),
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pong is handled automatically by axum
                continue;
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %lifecycle.connection_id(), "Client closed connection");
                return;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %lifecycle.connection_id(),
                    error = %e,
                    "WebSocket error"
                );
                return;
            }
        };

        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => return,
            Err(err) => {
                tracing::debug!(
                    connection_id = %lifecycle.connection_id(),
                    code = err.code(),
                    error = %err,
                    "Event rejected"
                );
                handler
                    .relay()
                    .send_to(lifecycle.connection_id(), &OutboundEvent::error(&err))
                    .await;
            }
        }
    }
}
