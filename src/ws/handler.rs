//! WebSocket transport: one socket per player, bridged to the coordinator

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::rate_limit::MessageLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// `GET /ws`. Oversized client messages fail the socket before they are
/// buffered or parsed.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limit = state.config.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| serve_player(socket, state))
}

async fn serve_player(socket: WebSocket, state: AppState) {
    let (player_id, outbound) = state.coordinator.connect();
    let (sink, stream) = socket.split();

    let writer = tokio::spawn(write_outbound(player_id, sink, outbound));
    let dropped = read_inbound(player_id, stream, &state).await;

    // The match must learn about the departure even if the writer is
    // still flushing.
    state.coordinator.disconnect(player_id).await;
    writer.abort();

    info!(player_id = %player_id, rate_limited = dropped, "Socket closed");
}

/// Forward queued server messages to the socket until either side closes
async fn write_outbound(
    player_id: Uuid,
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<ServerMsg>,
) {
    while let Some(msg) = outbound.recv().await {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "Could not encode server message");
                continue;
            }
        };
        if let Err(err) = sink.send(Message::Text(text)).await {
            debug!(player_id = %player_id, error = %err, "Socket write failed");
            break;
        }
    }
}

/// Feed client messages into the coordinator. Returns how many messages
/// were dropped by the rate limiter.
async fn read_inbound(
    player_id: Uuid,
    mut stream: SplitStream<WebSocket>,
    state: &AppState,
) -> u64 {
    let mut limiter = MessageLimiter::per_second(state.config.input_rate_limit);

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                debug!(player_id = %player_id, "Ignoring binary frame");
                continue;
            }
            Ok(_) => continue,
            Err(err) => {
                debug!(player_id = %player_id, error = %err, "Socket read failed");
                break;
            }
        };

        if !limiter.admit() {
            warn!(player_id = %player_id, "Client message over rate limit");
            continue;
        }

        match serde_json::from_str::<ClientMsg>(&text) {
            Ok(msg) => state.coordinator.handle_message(player_id, msg).await,
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "Malformed client message");
            }
        }
    }

    limiter.dropped()
}
