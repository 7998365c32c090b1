//! Control surface
//!
//! HTTP interface for driving the actuator from outside: configure a field,
//! start and stop the traversal, tear everything down, and watch progress.
//! Handlers never touch the grid directly. Writes go through the command
//! channel and take effect at the controller's next tick; reads come from
//! the watch channel the controller publishes on.
//!
//! # Endpoints
//!
//! - GET    /sowing           - Current position, or completed/inactive
//! - POST   /sowing           - Configure a field and start sowing
//! - PUT    /sowing           - "start" / "stop" control tokens
//! - DELETE /sowing           - Tear down field state, stop the controller
//! - GET    /sowing/status    - Two-flag status payload
//! - GET    /sowing/status/ws - WebSocket pushing status on every change

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use tokio::sync::{mpsc, oneshot, watch};

use sdk::errors::ActuatorError;
use sdk::types::GridConfigRequest;

use crate::controller::{ControlCommand, StatusSnapshot};

/// Shared handler state: a way in (commands) and a way out (status).
#[derive(Clone)]
struct ServerState {
    commands: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<StatusSnapshot>,
}

/// Build the control surface router.
pub fn router(
    commands: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<StatusSnapshot>,
) -> Router {
    let state = ServerState { commands, status };
    Router::new()
        .route(
            "/sowing",
            get(position_handler)
                .post(configure_handler)
                .put(control_handler)
                .delete(teardown_handler),
        )
        .route("/sowing/status", get(status_handler))
        .route("/sowing/status/ws", get(websocket_handler))
        .with_state(state)
}

/// Bind the control surface and serve it on a background task.
///
/// Returns the bound address and a shutdown handle; dropping or firing the
/// handle stops the server gracefully.
pub async fn start_server(
    listen_addr: &str,
    commands: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<StatusSnapshot>,
) -> Result<(SocketAddr, oneshot::Sender<()>), ActuatorError> {
    let listener = TcpListener::bind(listen_addr)
        .map_err(|e| ActuatorError::Config(format!("Failed to bind {}: {}", listen_addr, e)))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ActuatorError::Config(format!("Failed to get local address: {}", e)))?;

    listener
        .set_nonblocking(true)
        .map_err(|e| ActuatorError::Config(format!("Failed to set non-blocking: {}", e)))?;
    let tokio_listener = tokio::net::TcpListener::from_std(listener)
        .map_err(|e| ActuatorError::Config(format!("Failed to convert listener: {}", e)))?;

    let app = router(commands, status);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        tracing::info!("Control surface listening on http://{}", addr);

        axum::serve(tokio_listener, app)
            .with_graceful_shutdown(async move {
                shutdown_rx.await.ok();
                tracing::info!("Control surface shutting down gracefully");
            })
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Control surface error: {}", e);
            });
    });

    Ok((addr, shutdown_tx))
}

/// The GET /sowing payload for a given status.
fn position_payload(status: &StatusSnapshot) -> Value {
    if status.complete {
        json!({"status": "completed"})
    } else if status.active {
        json!({"current_row": status.row, "current_col": status.col})
    } else {
        json!({"status": "inactive"})
    }
}

async fn position_handler(State(state): State<ServerState>) -> Json<Value> {
    Json(position_payload(&state.status.borrow()))
}

async fn status_handler(State(state): State<ServerState>) -> Json<Value> {
    let event = state.status.borrow().event();
    Json(json!(event))
}

/// Configure a field and start sowing it.
async fn configure_handler(
    State(state): State<ServerState>,
    Json(req): Json<GridConfigRequest>,
) -> Response {
    if !req.is_valid() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "length, width, square_size and field_id must be positive"})),
        )
            .into_response();
    }

    if state.status.borrow().active {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Traversal already in progress"})),
        )
            .into_response();
    }

    if enqueue(&state, ControlCommand::Configure(req)).await.is_err()
        || enqueue(&state, ControlCommand::Start).await.is_err()
    {
        return controller_gone();
    }

    (StatusCode::OK, Json(json!({"status": "accepted"}))).into_response()
}

/// Start/stop control tokens.
async fn control_handler(State(state): State<ServerState>, body: String) -> Response {
    match body.trim() {
        "start" => {
            // A finished field stays finished; acknowledge without resending
            if state.status.borrow().complete {
                return (
                    StatusCode::OK,
                    Json(json!({"status": "completed", "message": "Movement already completed"})),
                )
                    .into_response();
            }
            match enqueue(&state, ControlCommand::Start).await {
                Ok(()) => (StatusCode::OK, Json(json!({"status": "accepted"}))).into_response(),
                Err(()) => controller_gone(),
            }
        }
        "stop" => match enqueue(&state, ControlCommand::Stop).await {
            Ok(()) => (StatusCode::OK, Json(json!({"status": "accepted"}))).into_response(),
            Err(()) => controller_gone(),
        },
        other => {
            tracing::warn!(token = other, "Unknown control token");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Expected \"start\" or \"stop\""})),
            )
                .into_response()
        }
    }
}

async fn teardown_handler(State(state): State<ServerState>) -> Response {
    match enqueue(&state, ControlCommand::Teardown).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "accepted"}))).into_response(),
        Err(()) => controller_gone(),
    }
}

async fn enqueue(state: &ServerState, cmd: ControlCommand) -> Result<(), ()> {
    state.commands.send(cmd).await.map_err(|_| ())
}

fn controller_gone() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "Controller is not running"})),
    )
        .into_response()
}

/// Status stream upgrade.
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state.status))
}

/// Push the status payload on connect and on every subsequent change.
async fn handle_websocket(mut socket: WebSocket, mut status: watch::Receiver<StatusSnapshot>) {
    tracing::info!("Status stream connected");

    let initial = json!(status.borrow_and_update().event()).to_string();
    if socket.send(Message::Text(initial)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    // Controller gone; nothing more will ever change
                    break;
                }
                let payload = json!(status.borrow_and_update().event()).to_string();
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Status stream error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!("Status stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_payload_variants() {
        let mut status = StatusSnapshot {
            configured: true,
            active: true,
            complete: false,
            row: 2,
            col: 1,
            field_id: 7,
        };
        assert_eq!(
            position_payload(&status),
            json!({"current_row": 2, "current_col": 1})
        );

        status.active = false;
        assert_eq!(position_payload(&status), json!({"status": "inactive"}));

        status.complete = true;
        assert_eq!(position_payload(&status), json!({"status": "completed"}));
    }

    #[test]
    fn test_status_event_shape() {
        let status = StatusSnapshot {
            active: true,
            ..StatusSnapshot::default()
        };
        assert_eq!(
            serde_json::to_string(&status.event()).unwrap(),
            r#"{"complete":0,"active":1}"#
        );
    }
}
