//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{PlayerId, RoomSession};
use crate::ws::protocol::{ClientMsg, JoinRequest, ServerMsg};

/// Outbound messages queued per connection before backpressure
const OUTBOUND_BUFFER: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    // The connection id doubles as the player id
    let player_id = Uuid::new_v4();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER);

    let writer = tokio::spawn(write_loop(player_id, ws_sink, out_rx));

    let mut connection = Connection {
        player_id,
        state,
        out_tx,
        session: None,
        forwarder: None,
    };
    connection.read_loop(ws_stream).await;
    connection.close().await;

    writer.abort();
    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Serialize queued messages onto the socket
async fn write_loop(
    player_id: PlayerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = out_rx.recv().await {
        let json = match msg.encode() {
            Ok(json) => json,
            Err(e) => {
                error!(player_id = %player_id, error = %e, "Failed to encode message");
                continue;
            }
        };
        if let Err(e) = ws_sink.send(Message::Text(json)).await {
            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// Per-connection protocol state
struct Connection {
    player_id: PlayerId,
    state: AppState,
    out_tx: mpsc::Sender<ServerMsg>,
    /// Set once the connection has joined a room
    session: Option<RoomSession>,
    /// Room snapshots -> outbound queue
    forwarder: Option<JoinHandle<()>>,
}

impl Connection {
    async fn read_loop(&mut self, mut ws_stream: SplitStream<WebSocket>) {
        while let Some(result) = ws_stream.next().await {
            match result {
                Ok(Message::Text(text)) => self.handle_text(&text).await,
                Ok(Message::Binary(_)) => {
                    warn!(player_id = %self.player_id, "Received binary message, ignoring");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    info!(player_id = %self.player_id, "Client initiated close");
                    break;
                }
                Err(e) => {
                    debug!(player_id = %self.player_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    async fn handle_text(&mut self, text: &str) {
        let msg = match ClientMsg::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(player_id = %self.player_id, error = %e, "Dropped malformed client message");
                return;
            }
        };

        match msg {
            ClientMsg::Join(request) => self.handle_join(request).await,
            ClientMsg::Input(input) => {
                let Some(session) = &self.session else {
                    debug!(player_id = %self.player_id, seq = input.seq, "Input before join dropped");
                    return;
                };
                if !session.send_input(input).await {
                    // Room is gone; allow a fresh join
                    warn!(player_id = %self.player_id, room = %session.room_code, "Room closed under session");
                    self.detach();
                }
            }
            ClientMsg::LatencyPing { nonce } => {
                trace!(player_id = %self.player_id, nonce, "Latency ping");
                self.send(ServerMsg::LatencyResponse { nonce }).await;
            }
        }
    }

    async fn handle_join(&mut self, request: JoinRequest) {
        if self.session.is_some() {
            debug!(player_id = %self.player_id, "Duplicate join ignored");
            return;
        }

        let rooms = self.state.rooms.clone();
        match rooms
            .join(self.player_id, request.room_code.as_deref(), request.name)
            .await
        {
            Ok((session, snapshots)) => {
                // Welcome goes out before the first snapshot
                self.send(ServerMsg::Welcome {
                    player_id: self.player_id,
                    room_code: session.room_code.clone(),
                })
                .await;
                self.forwarder = Some(spawn_forwarder(
                    self.player_id,
                    snapshots,
                    self.out_tx.clone(),
                ));
                self.session = Some(session);
            }
            Err(err) => {
                info!(player_id = %self.player_id, error = %err, "Join rejected");
                self.send(ServerMsg::Error {
                    message: err.to_string(),
                })
                .await;
            }
        }
    }

    async fn send(&self, msg: ServerMsg) {
        if self.out_tx.send(msg).await.is_err() {
            debug!(player_id = %self.player_id, "Outbound queue closed");
        }
    }

    fn detach(&mut self) {
        self.session = None;
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }

    /// Leave the room, if any, and stop forwarding
    async fn close(mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        if let Some(session) = self.session.take() {
            session.leave().await;
        }
    }
}

/// Relay room broadcasts to one connection's outbound queue
fn spawn_forwarder(
    player_id: PlayerId,
    mut snapshots: broadcast::Receiver<ServerMsg>,
    out_tx: mpsc::Sender<ServerMsg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(msg) => {
                    if out_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Newer snapshots supersede the skipped ones
                    warn!(player_id = %player_id, lagged_count = n, "Client lagged, skipping snapshots");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(player_id = %player_id, "Snapshot channel closed");
                    break;
                }
            }
        }
    })
}
