//! Control surface tests against a live listener.
//!
//! The controller is stubbed out: the tests hold the command receiver and
//! the status sender themselves, so every route's effect on the channels is
//! observable directly.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use sower_engine::controller::{ControlCommand, StatusSnapshot};
use sower_engine::server::start_server;

struct Surface {
    addr: SocketAddr,
    commands: mpsc::Receiver<ControlCommand>,
    status: watch::Sender<StatusSnapshot>,
    _shutdown: oneshot::Sender<()>,
}

async fn start() -> Surface {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
    let (addr, shutdown) = start_server("127.0.0.1:0", cmd_tx, status_rx)
        .await
        .expect("bind control surface");
    Surface {
        addr,
        commands: cmd_rx,
        status: status_tx,
        _shutdown: shutdown,
    }
}

fn url(surface: &Surface, path: &str) -> String {
    format!("http://{}{}", surface.addr, path)
}

async fn recv_command(surface: &mut Surface) -> ControlCommand {
    tokio::time::timeout(Duration::from_secs(2), surface.commands.recv())
        .await
        .expect("no command arrived")
        .expect("command channel closed")
}

#[tokio::test]
async fn test_position_reflects_published_status() {
    let surface = start().await;
    let client = reqwest::Client::new();

    // Nothing configured yet
    let body: Value = client
        .get(url(&surface, "/sowing"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "inactive"}));

    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: true,
            complete: false,
            row: 1,
            col: 2,
            field_id: 7,
        })
        .unwrap();

    let body: Value = client
        .get(url(&surface, "/sowing"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"current_row": 1, "current_col": 2}));

    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: false,
            complete: true,
            row: 1,
            col: 2,
            field_id: 7,
        })
        .unwrap();

    let body: Value = client
        .get(url(&surface, "/sowing"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "completed"}));
}

#[tokio::test]
async fn test_configure_enqueues_configure_then_start() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(&surface, "/sowing"))
        .json(&json!({"length": 4, "width": 6, "square_size": 2, "field_id": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    match recv_command(&mut surface).await {
        ControlCommand::Configure(req) => {
            assert_eq!(req.length, 4);
            assert_eq!(req.width, 6);
            assert_eq!(req.square_size, 2);
            assert_eq!(req.field_id, 9);
        }
        other => panic!("expected Configure, got {:?}", other),
    }
    assert!(matches!(
        recv_command(&mut surface).await,
        ControlCommand::Start
    ));
}

#[tokio::test]
async fn test_out_of_range_dimensions_rejected_without_commands() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(&surface, "/sowing"))
        .json(&json!({"length": 0, "width": 6, "square_size": 2, "field_id": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(url(&surface, "/sowing"))
        .json(&json!({"length": 4, "width": -1, "square_size": 2, "field_id": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Past u32 range: would truncate to a tiny field if accepted
    let response = client
        .post(url(&surface, "/sowing"))
        .json(&json!({"length": 4_294_967_297i64, "width": 1, "square_size": 1, "field_id": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // No command leaked through
    assert!(surface.commands.try_recv().is_err());
}

#[tokio::test]
async fn test_configure_while_active_conflicts() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: true,
            ..StatusSnapshot::default()
        })
        .unwrap();

    let response = client
        .post(url(&surface, "/sowing"))
        .json(&json!({"length": 4, "width": 6, "square_size": 2, "field_id": 9}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    assert!(surface.commands.try_recv().is_err());
}

#[tokio::test]
async fn test_control_tokens() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    let response = client
        .put(url(&surface, "/sowing"))
        .body("start")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(matches!(
        recv_command(&mut surface).await,
        ControlCommand::Start
    ));

    let response = client
        .put(url(&surface, "/sowing"))
        .body("stop")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(matches!(
        recv_command(&mut surface).await,
        ControlCommand::Stop
    ));

    let response = client
        .put(url(&surface, "/sowing"))
        .body("reverse")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(surface.commands.try_recv().is_err());
}

#[tokio::test]
async fn test_start_after_completion_is_acknowledged_without_command() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: false,
            complete: true,
            row: 1,
            col: 1,
            field_id: 7,
        })
        .unwrap();

    let response = client
        .put(url(&surface, "/sowing"))
        .body("start")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Movement already completed");

    assert!(surface.commands.try_recv().is_err());
}

#[tokio::test]
async fn test_delete_enqueues_teardown() {
    let mut surface = start().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(url(&surface, "/sowing"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(matches!(
        recv_command(&mut surface).await,
        ControlCommand::Teardown
    ));
}

#[tokio::test]
async fn test_status_route_two_flag_payload() {
    let surface = start().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(url(&surface, "/sowing/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"complete": 0, "active": 0}));

    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: true,
            ..StatusSnapshot::default()
        })
        .unwrap();

    let body: Value = client
        .get(url(&surface, "/sowing/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"complete": 0, "active": 1}));
}

#[tokio::test]
async fn test_websocket_pushes_status_changes() {
    let surface = start().await;

    let ws_url = format!("ws://{}/sowing/status/ws", surface.addr);
    let (mut stream, _) = connect_async(ws_url.as_str()).await.expect("ws connect");

    // Initial payload on connect
    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("no initial frame")
        .expect("stream ended")
        .expect("ws error");
    let payload: Value = match first {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    };
    assert_eq!(payload, json!({"complete": 0, "active": 0}));

    // Push a change and expect it on the stream
    surface
        .status
        .send(StatusSnapshot {
            configured: true,
            active: true,
            ..StatusSnapshot::default()
        })
        .unwrap();

    let next = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("no change frame")
        .expect("stream ended")
        .expect("ws error");
    let payload: Value = match next {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    };
    assert_eq!(payload, json!({"complete": 0, "active": 1}));
}
