use futures_util::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::{ServerError, SessionError};
use crate::pomodoro::{EventReceiver, SessionController, SessionEvent, SessionSnapshot};

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Start,
    Reset,
    Status,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// Frames the daemon writes besides plain session events.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot(SessionSnapshot),
    Response(WebSocketResponse),
}

pub type EventBroadcast = broadcast::Sender<SessionEvent>;

/// Forwards the controller's events to every connected client.
pub fn spawn_event_fanout(mut events: EventReceiver) -> EventBroadcast {
    let (tx, _) = broadcast::channel(EVENT_BUFFER);
    let fanout = tx.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            // No clients connected is fine.
            let _ = fanout.send(event);
        }
    });
    tx
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

pub async fn start_websocket_server(
    addr: SocketAddr,
    controller: SessionController,
    events: EventBroadcast,
) -> Result<(), ServerError> {
    let listener = bind(addr).await?;
    serve(listener, controller, events).await;
    Ok(())
}

pub async fn serve(listener: TcpListener, controller: SessionController, events: EventBroadcast) {
    if let Ok(addr) = listener.local_addr() {
        info!("WebSocket server listening on: {}", addr);
    }

    while let Ok((stream, peer_addr)) = listener.accept().await {
        info!("New WebSocket connection from: {}", peer_addr);
        tokio::spawn(handle_connection(
            stream,
            peer_addr,
            controller.clone(),
            events.subscribe(),
        ));
    }
}

/// Applies one client frame to the session and builds the replies.
pub fn handle_command(controller: &SessionController, text: &str) -> Vec<ServerMessage> {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            warn!("Failed to parse message: {}", e);
            return vec![ServerMessage::Response(WebSocketResponse {
                success: false,
                message: Some(format!("Parse error: {}", e)),
            })];
        }
    };

    debug!("[WebSocket] Received: {:?}", command);
    match command {
        ClientCommand::Start => {
            let message = match controller.start() {
                Ok(()) => "started",
                Err(SessionError::AlreadyRunning) => "already running",
            };
            vec![ok(message)]
        }
        ClientCommand::Reset => {
            controller.reset();
            vec![ok("reset")]
        }
        ClientCommand::Status => vec![ok("status"), ServerMessage::Snapshot(controller.snapshot())],
    }
}

fn ok(message: &str) -> ServerMessage {
    ServerMessage::Response(WebSocketResponse {
        success: true,
        message: Some(message.to_string()),
    })
}

async fn send_json<T, S>(sender: &mut S, value: &T) -> Result<(), <S as Sink<Message>>::Error>
where
    T: Serialize,
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(value) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            warn!("Failed to serialize outgoing message: {}", e);
            Ok(())
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    controller: SessionController,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    debug!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let snapshot = ServerMessage::Snapshot(controller.snapshot());
    if let Err(e) = send_json(&mut ws_sender, &snapshot).await {
        warn!("Failed to send snapshot to {}: {}", peer_addr, e);
        return;
    }

    loop {
        tokio::select! {
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    for reply in handle_command(&controller, &text) {
                        if let Err(e) = send_json(&mut ws_sender, &reply).await {
                            warn!("Failed to send WebSocket response: {}", e);
                            return;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket connection closed by {}", peer_addr);
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                        warn!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error from {}: {}", peer_addr, e);
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = send_json(&mut ws_sender, &event).await {
                        warn!("Failed to push event to {}: {}", peer_addr, e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client {} lagged, skipped {} events", peer_addr, skipped);
                    let snapshot = ServerMessage::Snapshot(controller.snapshot());
                    if send_json(&mut ws_sender, &snapshot).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("WebSocket connection with {} terminated", peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentCue;
    use crate::pomodoro::{Phase, create_event_channel};
    use std::sync::Arc;

    fn controller() -> SessionController {
        let (tx, _rx) = create_event_channel();
        SessionController::new(tx, Arc::new(SilentCue))
    }

    #[test]
    fn test_command_parsing() {
        let start: ClientCommand = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_eq!(start, ClientCommand::Start);
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"pause"}"#).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_string(&ok("started")).unwrap();
        assert!(json.contains("\"type\":\"response\""));
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"started\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_acknowledged() {
        let controller = controller();

        assert_eq!(
            handle_command(&controller, r#"{"type":"start"}"#),
            vec![ok("started")]
        );
        assert_eq!(
            handle_command(&controller, r#"{"type":"start"}"#),
            vec![ok("already running")]
        );
        assert!(controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_and_status() {
        let controller = controller();
        handle_command(&controller, r#"{"type":"start"}"#);
        handle_command(&controller, r#"{"type":"reset"}"#);

        let replies = handle_command(&controller, r#"{"type":"status"}"#);
        assert_eq!(replies.len(), 2);
        match &replies[1] {
            ServerMessage::Snapshot(snapshot) => {
                assert_eq!(snapshot.phase, Phase::Idle);
                assert!(!snapshot.running);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frame() {
        let controller = controller();
        let replies = handle_command(&controller, "not json");
        match &replies[..] {
            [ServerMessage::Response(response)] => {
                assert!(!response.success);
                assert!(response.message.as_deref().unwrap().starts_with("Parse error"));
            }
            other => panic!("unexpected replies {:?}", other),
        }
    }
}
